pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod validation;

pub use config::AppConfig;
pub use directory::{AgentDirectory, ServiceOutcome, VectorStore};
pub use error::{DeckError, Result};
pub use persistence::{DocumentStore, MemoryStore};

pub mod agent;
pub mod message;
pub mod project;

pub use agent::*;
pub use message::*;
pub use project::*;

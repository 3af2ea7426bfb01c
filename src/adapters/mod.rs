pub mod api_server;
pub mod chroma;
pub mod postgres;

pub use api_server::{build_state, connect_directory, start_api_server};
pub use chroma::ChromaClient;
pub use postgres::PostgresStore;

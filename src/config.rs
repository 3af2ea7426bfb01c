use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Deployment environment (development, production, ...)
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen port
    pub port: u16,
    /// Browser origin allowed by CORS
    pub frontend_url: String,
    /// Directory served under /uploads
    pub uploads_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VectorStoreConfig {
    /// Base URL of the vector store; unset disables agent messaging
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_vars(config_dir, &vars)
    }

    /// Load configuration using an explicit set of environment variables
    pub fn load_with_vars<P: AsRef<Path>>(
        config_dir: P,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let environment = vars
            .get("AGENTDECK_ENV")
            .cloned()
            .unwrap_or_else(default_environment);
        let flat = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.port", 5000)?
            .set_default("server.frontend_url", "http://localhost:3000")?
            .set_default("server.uploads_dir", "uploads")?
            .set_default("database.url", "postgres://localhost/agentdeck")?
            .set_default("database.max_connections", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("environment", environment.as_str())?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(File::from(config_dir.join(format!("{environment}.toml"))).required(false))
            // Override with environment variables (AGENTDECK__SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("AGENTDECK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            // Conventional flat variables win over everything else
            .set_override_option("server.port", flat("PORT"))?
            .set_override_option("server.frontend_url", flat("FRONTEND_URL"))?
            .set_override_option("database.url", flat("DATABASE_URL"))?
            .set_override_option(
                "vector_store.url",
                flat("VECTOR_STORE_URL").or_else(|| flat("CHROMA_URL")),
            )?;

        builder.build()?.try_deserialize()
    }

    /// Whether error details may be echoed back to API clients
    pub fn expose_error_details(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }

        if url::Url::parse(&self.server.frontend_url).is_err() {
            errors.push(format!(
                "server.frontend_url is not a valid URL: {}",
                self.server.frontend_url
            ));
        }

        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be positive".to_string());
        }

        if let Some(ref raw) = self.vector_store.url {
            if url::Url::parse(raw).is_err() {
                errors.push(format!("vector_store.url is not a valid URL: {raw}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

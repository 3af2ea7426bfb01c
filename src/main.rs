use agentdeck::adapters::{build_state, start_api_server, PostgresStore};
use agentdeck::cli::{Cli, Commands};
use agentdeck::config::AppConfig;
use agentdeck::error::{DeckError, Result};
use agentdeck::logging::{init_logging, init_logging_simple};
use agentdeck::persistence::seed_default_agents;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config_dir)?;

    match cli.command() {
        Commands::Serve { port, ephemeral } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            init_logging(&config.logging);
            validate_config(&config)?;

            info!(
                "Starting agentdeck v{} ({} environment)",
                env!("CARGO_PKG_VERSION"),
                config.environment
            );
            let state = build_state(&config, ephemeral).await?;
            start_api_server(&config, state).await?;
        }
        Commands::Migrate => {
            init_logging_simple();
            let store = open_store(&config).await?;
            store.migrate().await?;
            println!("Migrations applied");
        }
        Commands::Seed => {
            init_logging_simple();
            let store = open_store(&config).await?;
            store.migrate().await?;
            let seeded = seed_default_agents(&store).await?;
            println!("Seeded {} agents", seeded);
        }
    }

    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<PostgresStore> {
    PostgresStore::new(&config.database.url, config.database.max_connections).await
}

fn validate_config(config: &AppConfig) -> Result<()> {
    config.validate().map_err(|errors| {
        for e in &errors {
            error!("Invalid configuration: {}", e);
        }
        DeckError::Internal(format!("invalid configuration: {}", errors.join("; ")))
    })
}

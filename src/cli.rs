use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agentdeck")]
#[command(version)]
#[command(about = "Project and agent dashboard backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and <environment>.toml
    #[arg(short, long, default_value = "config", env = "AGENTDECK_CONFIG_DIR")]
    pub config_dir: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run the HTTP and WebSocket server (default)
    Serve {
        /// Listen port, overriding configuration
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep everything in memory instead of PostgreSQL
        #[arg(long)]
        ephemeral: bool,
    },
    /// Apply database migrations and exit
    Migrate,
    /// Seed the default agent roster if the agents table is empty
    Seed,
}

impl Cli {
    /// The command to run; `serve` with defaults when none is given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve {
            port: None,
            ephemeral: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::parse_from(["agentdeck"]);
        assert_eq!(
            cli.command(),
            Commands::Serve {
                port: None,
                ephemeral: false
            }
        );
        assert_eq!(cli.config_dir, "config");
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::parse_from(["agentdeck", "serve", "--port", "7000", "--ephemeral"]);
        assert_eq!(
            cli.command(),
            Commands::Serve {
                port: Some(7000),
                ephemeral: true
            }
        );
    }

    #[test]
    fn maintenance_commands_parse() {
        assert_eq!(Cli::parse_from(["agentdeck", "migrate"]).command(), Commands::Migrate);
        assert_eq!(Cli::parse_from(["agentdeck", "seed"]).command(), Commands::Seed);
    }
}

pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "workhub-cli")]
#[command(about = "WorkHub CLI - server, database and operator tooling")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to WORKHUB_PORT / PORT / 3000)")]
        port: Option<u16>,
    },

    #[command(about = "Database maintenance")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "Check the /health endpoint of a running server")]
    Ping {
        #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },

    #[command(about = "Mint a JWT for an existing account")]
    Token {
        #[arg(long, help = "Account id")]
        user: Uuid,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
        Commands::Ping { url } => commands::ping::handle(&url, output_format).await,
        Commands::Token { user } => commands::token::handle(user, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_db_command() {
        let cli = Cli::try_parse_from(["workhub-cli", "--json", "db", "migrate"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Db {
                cmd: commands::db::DbCommands::Migrate
            }
        ));
    }

    #[test]
    fn token_requires_a_uuid() {
        assert!(Cli::try_parse_from(["workhub-cli", "token", "--user", "not-a-uuid"]).is_err());
        let id = Uuid::new_v4().to_string();
        assert!(Cli::try_parse_from(["workhub-cli", "token", "--user", &id]).is_ok());
    }

    #[test]
    fn ping_defaults_to_localhost() {
        let cli = Cli::try_parse_from(["workhub-cli", "ping"]).unwrap();
        match cli.command {
            Commands::Ping { url } => assert_eq!(url, "http://localhost:3000"),
            _ => panic!("expected ping"),
        }
    }
}

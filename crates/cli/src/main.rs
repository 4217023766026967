//! Frontières CLI - site configuration and environment tools.
//!
//! # Usage
//!
//! ```bash
//! # Print the current site configuration
//! frontieres-cli config show
//!
//! # Write the bundled default configuration
//! frontieres-cli config seed
//!
//! # Check a configuration file before uploading it
//! frontieres-cli config validate data/siteConfig.json
//!
//! # Show which remote services are configured
//! frontieres-cli status
//! ```
//!
//! All commands read the same environment variables as the storefront.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "frontieres-cli")]
#[command(author, version, about = "Frontières CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage the site configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show which remote services are configured
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration as JSON
    Show,
    /// Store the bundled default configuration
    Seed {
        /// Overwrite an existing remote configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Path to a JSON configuration document
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show().await?,
            ConfigAction::Seed { force } => commands::config::seed(force).await?,
            ConfigAction::Validate { file } => commands::config::validate(&file).await?,
        },
        Commands::Status => commands::status::show()?,
    }
    Ok(())
}

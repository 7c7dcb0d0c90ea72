use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod check_config;
pub mod init_config;
pub mod inspect_state;
pub mod version;

#[derive(Parser)]
#[command(name = "stakegov")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the stakegov governance engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    InitConfig {
        /// Where to write the file
        #[arg(long)]
        output: PathBuf,

        /// Engine custody address (hex)
        #[arg(long)]
        engine_address: String,

        /// Initial administrator (hex)
        #[arg(long)]
        admin: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Load and validate a configuration file, then print the effective settings
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },

    /// Decode an engine state snapshot and print its proposals
    InspectState {
        /// CBOR snapshot produced by the engine
        #[arg(long)]
        state: PathBuf,

        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::InitConfig {
            output,
            engine_address,
            admin,
            force,
        } => init_config::execute(&output, &engine_address, &admin, force),
        Commands::CheckConfig { config } => check_config::execute(&config),
        Commands::InspectState { state, json } => inspect_state::execute(&state, json),
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

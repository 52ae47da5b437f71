//! rswupd CLI
//!
//! Command-line interface for the rswupd update agent

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "rswupd")]
#[command(about = "rswupd - swupd-protocol OS update agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Update the OS to the latest published version
    Update(commands::update::UpdateArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Update(args) => commands::update::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

use clap::{Parser, Subcommand};

mod check;

/// Dry-run tool for tenant delivery configurations.
#[derive(Debug, Parser)]
#[command(name = "entrega-app", about = "Delivery-area resolution CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve an address against a delivery configuration file.
    Check(check::CheckArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Check(args) => check::run(args).await,
        }
    }
}

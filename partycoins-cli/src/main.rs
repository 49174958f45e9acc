mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use partycoins_core::{Ledger, LedgerError};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "partycoins")]
#[command(about = "partycoins - coin ledger for party game players")]
#[command(version)]
struct Cli {
    /// Data directory holding the ledger database
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Player(commands::PlayerCommands),

    #[command(flatten)]
    Coins(commands::CoinsCommands),

    #[command(flatten)]
    Ledger(commands::LedgerCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = CliConfig::resolve(cli.data_dir, cli.verbose);

    // Initialize logging
    let log_level = if config.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "partycoins={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Using data directory {}", config.data_dir.display());
    let ledger = Ledger::open(config.ledger_config()).await?;

    // Execute command
    let result = match cli.command {
        Commands::Player(cmd) => commands::handle_player_command(cmd, &ledger).await,
        Commands::Coins(cmd) => commands::handle_coins_command(cmd, &ledger).await,
        Commands::Ledger(cmd) => commands::handle_ledger_command(cmd, &ledger).await,
    };
    ledger.close()?;

    if let Err(e) = result {
        match e {
            LedgerError::InsufficientFunds { need, available } => {
                eprintln!("Error: Insufficient coins");
                eprintln!("Need: {}, Available: {}", need, available);
            }
            LedgerError::InvalidInput(msg) => {
                eprintln!("Error: {}", msg);
                eprintln!("Use 'partycoins --help' to see expected arguments");
            }
            LedgerError::TransactionConflict { attempts } => {
                eprintln!(
                    "Error: Ledger is busy (gave up after {} attempts), try again",
                    attempts
                );
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

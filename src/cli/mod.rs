use crate::errors::AppResult;
use clap::{Parser, Subcommand};

pub mod commands;

/// Bitcoin UTXO Set Dust Analyser
#[derive(Parser)]
#[command(name = "utxo-dust-analyser")]
#[command(about = "Decode a Bitcoin Core chainstate and measure dust and unprofitable outputs")]
#[command(version)]
pub struct Cli {
    /// Log progress at info level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Dump every decoded output as JSON lines or CSV
    Parse(commands::parse::ParseCommand),
    /// Cumulative dust and non-profitable histograms over the UTXO set
    Dust(commands::dust::DustCommand),
    /// Dump one summary line per transaction with unspent outputs
    Txs(commands::txs::TxsCommand),
    /// Look up and classify a single output by txid and index
    Utxo(commands::utxo::UtxoCommand),
    /// Decode one hex key/value pair without opening a database
    Decode(commands::decode::DecodeCommand),
    /// Print the effective configuration or a sample config.toml
    Config(commands::config::ConfigCommand),
}

pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // Uses RUST_LOG environment variable (defaults to "error", or "info" with --verbose)
    let default_level = if cli.verbose { "info" } else { "error" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Commands::Parse(command) => command.run(),
        Commands::Dust(command) => command.run(),
        Commands::Txs(command) => command.run(),
        Commands::Utxo(command) => command.run(),
        Commands::Decode(command) => command.run(),
        Commands::Config(command) => command.run(),
    }
}

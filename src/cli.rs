use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::Result;
use crate::models::AppConfig;

#[derive(Parser)]
#[command(name = "alphaagent")]
#[command(about = "Multi-source crypto aggregation with trust scoring", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one aggregation cycle and print the ranked assets
    Top {
        /// Number of assets to show
        #[arg(short, long, default_value_t = 25)]
        limit: usize,

        /// Only show assets scoring at least this much
        #[arg(long)]
        min_score: Option<f64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one asset's score breakdown, weights and field provenance
    Inspect {
        /// Symbol, id or name (e.g. BTC, bitcoin)
        symbol: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await,
        Commands::Top {
            limit,
            min_score,
            json,
        } => commands::top::run(config, limit, min_score, json).await,
        Commands::Inspect { symbol, json } => commands::inspect::run(config, &symbol, json).await,
    }
}

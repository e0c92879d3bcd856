mod backtest;
mod chart;
mod config;
mod errors;
mod feed;
mod loader;
mod models;
mod normalize;
mod notify;
mod pipeline;
mod render;
mod utils;
mod view;
mod vwap;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::backtest::StrategyMode;
use crate::config::AppConfig;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "vwap-dash",
    about = "End-of-day VWAP dashboard, pre-market scan and intraday chart viewer",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// End-of-day VWAP summary table (data/vwap_<date>.json)
    Dashboard {
        /// Trading date, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Sort by a column header instead of the default ticker order
        #[arg(long)]
        sort: Option<String>,

        /// Push the Markdown summary to Telegram
        #[arg(long)]
        notify: bool,
    },

    /// Pre-market scanner table (data/premarket_<date>.json)
    Premarket {
        /// Trading date, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Sort by a column header instead of the default score order
        #[arg(long)]
        sort: Option<String>,

        /// Push the Markdown summary to Telegram
        #[arg(long)]
        notify: bool,
    },

    /// Compose candlestick/VWAP/volume chart series JSON for a symbol
    Chart {
        /// Ticker symbol (case-insensitive)
        #[arg(short, long)]
        symbol: String,

        /// Trading date; omit to chart the full available history
        #[arg(short, long)]
        date: Option<String>,

        /// Write the payload to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Fetch one symbol's intraday bars, aggregate the day VWAP and classify it
    Analyze {
        /// Ticker symbol (case-insensitive)
        #[arg(short, long)]
        symbol: String,

        /// Trading date, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Replay stored intraday files with the close-vs-VWAP crossing rule
    Backtest {
        /// Data directory (default: from config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Also take short positions below VWAP
        #[arg(long)]
        long_short: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "vwap_dashboard=info,warn",
        1 => "vwap_dashboard=debug,info",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .compact()
        .with_target(false)
        .init();

    let config = AppConfig::load()?;
    let pipeline = Pipeline::new(config.clone());

    match cli.command {
        Command::Dashboard { date, sort, notify } => {
            let _t = utils::Timer::start("EOD dashboard");
            pipeline.run_dashboard(date, sort.as_deref(), notify).await?;
        }

        Command::Premarket { date, sort, notify } => {
            let _t = utils::Timer::start("Pre-market scan");
            pipeline.run_premarket(date, sort.as_deref(), notify).await?;
        }

        Command::Chart { symbol, date, out } => {
            let _t = utils::Timer::start(format!("Chart {}", symbol.to_uppercase()));
            pipeline.run_chart(&symbol, date, out.as_deref()).await?;
        }

        Command::Analyze { symbol, date } => {
            pipeline.run_analyze(&symbol, date).await?;
        }

        Command::Backtest { dir, long_short } => {
            let _t = utils::Timer::start("VWAP crossing backtest");
            let dir = dir.unwrap_or_else(|| config.data.dir.clone());
            let mode = if long_short { StrategyMode::LongShort } else { StrategyMode::LongOnly };
            let report = backtest::run(&dir, mode)?;
            println!("{}", report);
        }
    }

    Ok(())
}

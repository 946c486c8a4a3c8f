//! lyft - request and manage Lyft rides from the command line.
//!
//! Main entry point for the lyft CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod geocode;
mod notify;
mod prompt;
mod session;
mod store;

use commands::{RideOptions, RideTypeArg, auth, estimate, place, ride};
use config::{Overrides, Settings};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// lyft - request and manage Lyft rides from the command line
#[derive(Parser)]
#[command(name = "lyft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Ride type (default: line)
    #[arg(short = 'c', long = "ride-type", global = true, value_enum)]
    pub ride_type: Option<RideTypeArg>,

    /// Don't actually create or modify rides
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Saved place to use as the start location
    #[arg(long, global = true, value_name = "PLACE")]
    pub start: Option<String>,

    /// Saved place to use as the end location
    #[arg(long, global = true, value_name = "PLACE")]
    pub end: Option<String>,

    /// Show desktop notifications (macOS only); implies --watch
    #[arg(long, global = true)]
    pub notify: bool,

    /// Keep watching ride status updates
    #[arg(long, global = true)]
    pub watch: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory (default: ~/.lyft)
    #[arg(long, global = true, env = "LYFT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// API base URL (default: https://api.lyft.com)
    #[arg(long, global = true, env = "LYFT_BASE_URL")]
    pub base_url: Option<String>,

    /// Lyft app client id
    #[arg(long, global = true, env = "LYFT_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Lyft app client secret
    #[arg(long, global = true, env = "LYFT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Google Maps Geocoding API key
    #[arg(long, global = true, env = "GOOG_GEOCODE_KEY", hide_env_values = true)]
    pub geocode_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, cancel and track rides
    Ride(ride::RideArgs),

    /// Manage saved places
    Place(place::PlaceArgs),

    /// Show ride types, prices and pickup times
    Estimate(estimate::EstimateArgs),

    /// Authorization management
    Auth(auth::AuthArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(
        cli.data_dir,
        Overrides {
            client_id: cli.client_id,
            client_secret: cli.client_secret,
            geocode_key: cli.geocode_key,
            base_url: cli.base_url,
        },
    )?;

    // Console on stderr, plus a daily JSON log file
    let filter = if cli.verbose {
        "lyft=debug,lyft_client=debug,lyft_oauth=debug,warn"
    } else {
        "lyft=warn,lyft_client=warn,lyft_oauth=warn,error"
    };

    let log_dir = settings.data_dir.join("logs");
    let file_appender = tracing_appender::rolling::daily(&log_dir, "lyft.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "lyft=debug,lyft_client=debug,lyft_oauth=debug,info",
                )),
        )
        .init();

    let http = reqwest::Client::builder()
        .user_agent(format!("lyft-cli/{}", env!("CARGO_PKG_VERSION")))
        .timeout(lyft_client::client::DEFAULT_TIMEOUT)
        .build()?;

    // Create context for commands
    let ctx = commands::Context {
        settings,
        ride: RideOptions {
            ride_type: cli.ride_type,
            dry_run: cli.dry_run,
            start: cli.start,
            end: cli.end,
            notify: cli.notify,
            watch: cli.watch || cli.notify,
        },
        json_output: cli.json,
        verbose: cli.verbose,
        http,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Ride(args) => ride::run(args, &ctx).await,
        Commands::Place(args) => place::run(args, &ctx).await,
        Commands::Estimate(args) => estimate::run(args, &ctx).await,
        Commands::Auth(args) => auth::run(args, &ctx).await,
    }
}

//! GeoLayer CLI - headless driver for the viewport feature loader.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use geolayer::logging::{self, LogLevel};

use commands::fetch::FetchArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "geolayer")]
#[command(version, about = "Load vector features for a viewport from a geometry API", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the features visible in a bounding box
    ///
    /// Polls until every visible tile is fully loaded. Failed requests are
    /// retried every 100 ms; pass --max-steps to bound a run against an
    /// unreachable or unauthorized API.
    Fetch {
        /// Resource (map) id; overrides block_id in the config file
        #[arg(long)]
        block: Option<String>,

        /// Layer id; overrides layer_id in the config file
        #[arg(long)]
        layer: Option<String>,

        /// Viewport as xmin,ymin,xmax,ymax in degrees
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,

        /// Host map zoom level
        #[arg(long)]
        zoom: f64,

        /// Bearer token; overrides the config file
        #[arg(long)]
        token: Option<String>,

        /// Config file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Page through the whole dataset instead of the viewport tiles
        #[arg(long)]
        load_all: bool,

        /// Stop after this many load steps. Without it, failing requests
        /// (e.g. HTTP 401 or 404) are retried until Ctrl-C
        #[arg(long)]
        max_steps: Option<usize>,

        /// Write the final feature collection as GeoJSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Config file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(LogLevel::from_verbosity(cli.verbose));

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Fetch {
            block,
            layer,
            bbox,
            zoom,
            token,
            config,
            load_all,
            max_steps,
            output,
        } => {
            commands::fetch::run(FetchArgs {
                block,
                layer,
                bbox,
                zoom,
                token,
                config,
                load_all,
                max_steps,
                output,
            })
            .await
        }
        Commands::Config { config } => commands::config::run(config.as_deref()),
    }
}

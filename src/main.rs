mod errors;
mod handlers;
mod operations;
mod state;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use errors::map_command_error;
use handlers::{FilterArgs, ShareArgs, ValidateArgs};
use state::{AppState, Settings};
use ui::{print_diagnostics, set_status, StatusLevel};

const DEFAULT_LOG_FILTER: &str = "zoodir=info,zoodir_core=info";

/// Petting zoo directory - sanitize CMS exports and query listings
///
/// Examples:
///   # Check an export and write the sanitized listings
///   zoodir validate export.json --output clean.json
///
///   # Farms with goats within 25 miles, best rated first
///   zoodir filter export.json --zoo-type farm --animal Goat \
///       --distance 25 --near 40.71,-74.00 --sort rating
///
///   # Link that restores a search
///   zoodir share --search alpaca --price low
#[derive(Parser, Debug)]
#[command(name = "zoodir")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Filtering Logic:\n  \
    - Multiple values of the same flag are combined with OR\n  \
    - Different flags are combined with AND\n  \
    - --distance needs --near or a configured default_location\n\n\
Configuration:\n  \
    - zoodir.toml in the working directory, or --config FILE\n  \
    - ZOODIR_* environment variables override the file\n  \
    - RUST_LOG overrides log_filter")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sanitize a payload and report errors and warnings
    Validate(ValidateArgs),
    /// Search, filter and sort listings
    Filter(FilterArgs),
    /// List the zoo types, animals and amenities present in a payload
    Options {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a shareable link for a search and filters
    Share(ShareArgs),
    /// Plan markers, centre and zoom for a map of all listings
    Map {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show image and link decisions for each listing card
    Cards {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn init_tracing(settings: Option<&Settings>) {
    let fallback = settings
        .map(|s| s.log_filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run a command. Returns `false` when it completed but found problems
/// that should fail the process.
fn run(state: &mut AppState, command: &Command) -> Result<bool> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Validate(args) => handlers::run_validate(state, args),
        Command::Filter(args) => handlers::run_filter(state, args, &mut out).map(|_| true),
        Command::Options { file, json } => {
            handlers::run_options(state, file, *json, &mut out).map(|_| true)
        }
        Command::Share(args) => handlers::run_share(state, args).map(|_| true),
        Command::Map { file, json } => {
            handlers::run_map(state, file, *json, &mut out).map(|_| true)
        }
        Command::Cards { file } => handlers::run_cards(state, file).map(|_| true),
    }
}

fn report(error: &anyhow::Error) {
    let (title, message, details) = map_command_error(error);
    set_status(&format!("{}: {}", title, message), StatusLevel::Error);
    eprintln!("\n{}", details);
}

fn main() {
    let cli = Cli::parse();

    let settings = Settings::new(cli.config.as_deref());
    init_tracing(settings.as_ref().ok());

    let settings = settings.unwrap_or_else(|err| {
        report(&err);
        process::exit(1);
    });

    let mut state = AppState::new(settings);
    let outcome = run(&mut state, &cli.command);

    if state.monitor.is_enabled() {
        print_diagnostics(&state.monitor.stats(), &state.monitor.daily_trend());
    }

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(err) => {
            report(&err);
            process::exit(1);
        }
    }
}

//! Build Monitor - live terminal dashboard for long-running circuit builds.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use build_monitor::commands::{self, CommandError};
use build_monitor::config::{ConfigError, ConfigLoader, MonitorConfig};
use build_monitor::display::print_error;

#[derive(Parser)]
#[command(
    name = "build-monitor",
    about = "Live terminal dashboard for long-running circuit builds",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    trace_log: Option<PathBuf>,

    /// Without a subcommand, attach to the current status.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a build profile and monitor it.
    Run {
        /// Profile name (128, 128-mini, mini, or one from the config file).
        profile: String,
    },
    /// Show recent compilation history.
    History,
    /// Delete the dashboard status.
    Reset,
}

fn init_tracing(verbosity: u8, trace_log: Option<&PathBuf>) -> Result<(), std::io::Error> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match trace_log {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<MonitorConfig, CommandError> {
    let loader = match path {
        // An explicit path must exist; only the default search may fall back.
        Some(path) if !path.exists() => {
            return Err(ConfigError::ReadError {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                path,
            }
            .into());
        }
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose, cli.trace_log.as_ref()) {
        print_error(&format!("Failed to open trace log: {e}"));
        return ExitCode::FAILURE;
    }

    let result = match load_config(cli.config) {
        Ok(config) => match cli.command {
            None => commands::attach(&config).await,
            Some(Commands::Run { profile }) => commands::run_profile(&config, &profile).await,
            Some(Commands::History) => commands::show_history(&config),
            Some(Commands::Reset) => commands::reset(&config),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

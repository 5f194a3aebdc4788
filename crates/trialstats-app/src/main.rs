// trialstats entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config
// 3. Initialize tracing (log to file; stdout carries JSON results)
// 4. Open database
// 5. Run the command and print its result

use anyhow::Context;
use clap::Parser;
use std::path::Path;
use tracing::{error, info};

use trialstats::app::App;
use trialstats::cli::Cli;
use trialstats::config::{self, LoggingConfig};
use trialstats_store::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config().context("failed to load configuration")?;

    init_tracing(&config.logging)?;
    info!("trialstats starting: {:?}", cli.command);

    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let app = App::new(db, config.default_period);
    match app.run(cli.command).await {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            error!("command failed: {:#}", e);
            Err(e)
        }
    }
}

/// Initialize tracing to log to a file under the configured log directory.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join(Path::new(&logging.dir));
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("trialstats.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

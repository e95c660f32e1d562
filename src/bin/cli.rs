//! Cover crawler CLI
//!
//! Fetches the configured listing and saves every cover locally.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cover_crawler::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, RunSummary},
};
use tokio_util::sync::CancellationToken;

/// Cover crawler - saves movie covers from a paginated listing
#[derive(Parser, Debug)]
#[command(name = "cover-crawler", version, about = "Movie cover crawler")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the listing and save every cover
    Run {
        /// Number of listing pages to fetch
        #[arg(long)]
        pages: Option<u32>,

        /// Items requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Directory covers are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        fetch_concurrency: Option<usize>,

        #[arg(long)]
        download_concurrency: Option<usize>,

        #[arg(long)]
        save_concurrency: Option<usize>,
    },

    /// Validate the configuration file
    Validate,

    /// Show the effective configuration and output directory state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn log_summary(summary: &RunSummary) {
    log::info!("Pages requested: {}", summary.pages_requested);
    for report in summary.stages() {
        log::info!(
            "  {:<8} attempted={} succeeded={} failed={} skipped={}",
            report.stage,
            report.attempted,
            report.succeeded,
            report.failed,
            report.skipped
        );
    }
    log::info!("{summary}");
}

/// Cancel the run on Ctrl-C; in-flight work is allowed to finish.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, finishing in-flight work...");
            token.cancel();
        }
    });
    cancel
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);

    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run {
            pages,
            page_size,
            output,
            fetch_concurrency,
            download_concurrency,
            save_concurrency,
        } => {
            if let Some(pages) = pages {
                config.pipeline.total_pages = pages;
            }
            if let Some(page_size) = page_size {
                config.pipeline.page_size = page_size;
            }
            if let Some(output) = output {
                config.output.destination_dir = output;
            }
            if let Some(n) = fetch_concurrency {
                config.pipeline.max_fetch_concurrency = n;
            }
            if let Some(n) = download_concurrency {
                config.pipeline.max_download_concurrency = n;
            }
            if let Some(n) = save_concurrency {
                config.pipeline.max_save_concurrency = n;
            }
            config.validate()?;

            match pipeline::run_crawler(&config, cancel_on_ctrl_c()).await {
                Ok(summary) => {
                    log_summary(&summary);
                    log::info!("Done!");
                }
                Err(e) => {
                    if let Some(summary) = e.summary() {
                        log_summary(summary);
                    }
                    log::error!("{e}");
                    return Err(e);
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let rendered = toml::to_string_pretty(&config)?;
            println!("{rendered}");

            let dest = &config.output.destination_dir;
            match std::fs::read_dir(dest) {
                Ok(entries) => {
                    let extension = config.output.extension.as_str();
                    let covers = entries
                        .filter_map(|e| e.ok())
                        .filter(|e| e.path().extension().is_some_and(|x| x == extension))
                        .count();
                    log::info!("{} contains {} covers", dest.display(), covers);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    log::info!("{} does not exist yet", dest.display());
                }
                Err(e) => return Err(AppError::Io(e)),
            }
        }
    }

    Ok(())
}

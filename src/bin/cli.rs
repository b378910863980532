//! dictcrawl CLI
//!
//! Local execution entry point for the browse and download pipelines.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dictcrawl::{
    error::Result,
    models::Config,
    pipeline,
    services::{Fetcher, RetryPolicy},
    storage::PageCache,
    utils::http,
};
use tokio::sync::watch;

/// dictcrawl - word-definition site harvester
#[derive(Parser, Debug)]
#[command(name = "dictcrawl", version, about = "Harvests a word-definition site")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "dictcrawl.toml")]
    config: PathBuf,

    /// Override the cache root directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the browse index from the seed word, filling the browse cache
    Browse {
        /// Start from this word instead of the configured seed
        #[arg(long)]
        seed: Option<String>,
    },

    /// Download definition pages for every cached browse page
    Download,

    /// Run the full pipeline: browse, then download
    Run,

    /// Validate the configuration file
    Validate,

    /// Show cache state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(dir) = cli.cache_dir {
        config.cache.root = Some(dir);
    }
    config.validate()?;

    let cache_root = config.cache.resolved_root()?;
    let cache = Arc::new(PageCache::new(&cache_root));
    log::info!("cache root: {}", cache_root.display());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("shutdown requested, finishing in-flight work...");
            let _ = shutdown_tx.send(true);
        }
    });

    let client = http::create_client(&config.site)?;
    let fetcher = Arc::new(Fetcher::new(
        client,
        RetryPolicy::from_config(&config.retry),
        shutdown_rx.clone(),
    ));

    match cli.command {
        Command::Browse { seed } => {
            if let Some(seed) = seed {
                config.crawl.seed_word = seed;
            }
            pipeline::run_browse(&config, cache, fetcher).await?;
        }

        Command::Download => {
            pipeline::run_download(&config, cache, fetcher, shutdown_rx).await?;
        }

        Command::Run => {
            let stats = pipeline::run_browse(&config, Arc::clone(&cache), Arc::clone(&fetcher)).await?;
            if stats.stopped_on_failure {
                log::warn!("continuing to downloads despite the interrupted walk");
            }
            pipeline::run_download(&config, cache, fetcher, shutdown_rx).await?;
        }

        Command::Validate => {
            // validate() already ran; getting here means the file is sound
            log::info!("configuration OK");
            log::info!("  site: {}", config.site.host);
            log::info!("  seed word: '{}'", config.crawl.seed_word);
            log::info!(
                "  workers: {} (queue capacity {})",
                config.crawl.workers,
                config.crawl.effective_queue_capacity()
            );
        }

        Command::Info => {
            cache.ensure_layout().await?;
            let keys = cache.browse_keys().await?;
            log::info!("browse cache entries: {}", keys.len());
            log::info!("browse dir: {}", cache.browse_dir().display());
            log::info!("dict dir: {}", cache.dict_dir().display());
        }
    }

    log::info!("Done!");

    Ok(())
}

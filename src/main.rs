//! Binary entry point
//!
//! Thin shell over the library: parse flags, load configuration, wire the
//! fetch backend and stores, then hand off to the pipeline. A run that
//! finishes with partial coverage still exits 0; only discovery,
//! configuration and durable-storage failures exit non-zero.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use gsmarena_scraper_lib::application::{RunMode, ScrapePipeline};
use gsmarena_scraper_lib::domain::repositories::SpecStore;
use gsmarena_scraper_lib::infrastructure::fetcher::{
    FetchOptions, FirecrawlFetcher, RateLimitedScheduler,
};
use gsmarena_scraper_lib::infrastructure::logging::init_logging;
use gsmarena_scraper_lib::infrastructure::phone_repository::SqliteSpecStore;
use gsmarena_scraper_lib::infrastructure::{AppConfig, ConfigManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Reconcile,
}

struct CliArgs {
    command: Command,
    mode: RunMode,
    rate_limit_secs: Option<u64>,
    page_size: Option<u32>,
    last_page_threshold: Option<u32>,
    max_pages_per_brand: Option<u32>,
}

const USAGE: &str = "\
Usage: gsmarena-scraper [run|reconcile] [options]

Commands:
  run                          Crawl the catalog (default)
  reconcile                    Replay backstop records into the database

Options:
  --fresh                      Discard checkpoint and catalog, start over
  --resume                     Continue from the checkpoint (default)
  --rate-limit-seconds=N       Minimum spacing between fetches
  --page-size=N                Phones per listing page
  --last-page-threshold=N      Short-page cutoff for pagination
  --max-pages-per-brand=N      Hard cap on listing pages per brand
  -h, --help                   Show this help
";

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        command: Command::Run,
        mode: RunMode::Resume,
        rate_limit_secs: None,
        page_size: None,
        last_page_threshold: None,
        max_pages_per_brand: None,
    };

    fn value<T: std::str::FromStr>(arg: &str) -> Result<T, String> {
        let (flag, raw) = arg
            .split_once('=')
            .ok_or_else(|| format!("{arg} requires a value, e.g. {arg}=5"))?;
        raw.parse()
            .map_err(|_| format!("invalid value for {flag}: {raw}"))
    }

    for arg in args {
        match arg.as_str() {
            "run" => parsed.command = Command::Run,
            "reconcile" => parsed.command = Command::Reconcile,
            "--fresh" => parsed.mode = RunMode::Fresh,
            "--resume" => parsed.mode = RunMode::Resume,
            "-h" | "--help" => return Err(USAGE.to_string()),
            a if a.starts_with("--rate-limit-seconds") => {
                parsed.rate_limit_secs = Some(value(a)?)
            }
            a if a.starts_with("--page-size") => parsed.page_size = Some(value(a)?),
            a if a.starts_with("--last-page-threshold") => {
                parsed.last_page_threshold = Some(value(a)?)
            }
            a if a.starts_with("--max-pages-per-brand") => {
                parsed.max_pages_per_brand = Some(value(a)?)
            }
            other => return Err(format!("unknown argument: {other}\n\n{USAGE}")),
        }
    }
    Ok(parsed)
}

fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(v) = args.rate_limit_secs {
        config.crawl.rate_limit_secs = v;
    }
    if let Some(v) = args.page_size {
        config.crawl.page_size = v;
    }
    if let Some(v) = args.last_page_threshold {
        config.crawl.last_page_threshold = v;
    }
    if let Some(v) = args.max_pages_per_brand {
        config.crawl.max_pages_per_brand = Some(v);
    }
}

async fn connect_store(config: &AppConfig) -> Option<Arc<dyn SpecStore>> {
    let url = config.storage.database_url.as_deref()?;
    match SqliteSpecStore::connect(url).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Database connection failed ({e:#}), backstop-only persistence");
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let config = match ConfigManager::new().load_config().await {
        Ok(mut config) => {
            apply_overrides(&mut config, &args);
            config
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging, &config.storage.data_dir) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let api_key = match config.require_fetch_capability() {
        Ok(key) => key.to_string(),
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let fetcher = match FirecrawlFetcher::new(&config.firecrawl, &api_key) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            error!("Failed to build fetch backend: {e}");
            return ExitCode::FAILURE;
        }
    };
    let scheduler = RateLimitedScheduler::new(
        fetcher,
        Duration::from_secs(config.crawl.rate_limit_secs),
        FetchOptions::from_crawl_config(&config.crawl),
    );

    let store = connect_store(&config).await;
    let pipeline = ScrapePipeline::new(config, scheduler, store);

    let outcome = match args.command {
        Command::Run => pipeline.run(args.mode).await.map(|_| ()),
        Command::Reconcile => pipeline.reconcile().await.map(|_| ()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run aborted: {e}");
            ExitCode::FAILURE
        }
    }
}

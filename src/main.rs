//! Spider main entry point
//!
//! This is the command-line interface for the Spider web crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use spider::config::{load_config_with_hash, Config};
use spider::crawler::{ConsoleProgress, Coordinator};
use spider::storage::{open_storage, RecordStore, SqliteStorage};
use spider::url::base_domain;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Spider: a recursive same-domain web crawler
///
/// Spider walks a site from a seed URL, follows links that stay within the
/// seed's base domain and stores each page's URL, title and HTML in SQLite.
#[derive(Parser, Debug)]
#[command(name = "spider")]
#[command(version)]
#[command(about = "A recursive same-domain web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the configuration file)
    #[arg(long, value_name = "PATH", global = true)]
    database: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a site starting from URL and store every page found
    Load {
        /// Seed URL
        url: String,

        /// How many links deep to follow from the seed
        #[arg(long, default_value_t = 0)]
        depth: u32,
    },

    /// Print stored pages that belong to URL's base domain
    Get {
        url: String,

        /// Number of pages to print
        #[arg(short = 'n', default_value_t = 1)]
        limit: usize,

        /// Number of matching pages to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Delete every stored page
    Truncate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let started = Instant::now();
    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }

    let peak_memory = peak_memory_bytes()
        .map(format_bytes)
        .unwrap_or_else(|| "unknown".to_string());
    println!(
        "ok, execution time: {:.2?}, peak memory usage: {}",
        started.elapsed(),
        peak_memory
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spider=info,warn"),
            1 => EnvFilter::new("spider=debug,info"),
            2 => EnvFilter::new("spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database.path = database.display().to_string();
    }

    let storage = open_storage(Path::new(&config.database.path))
        .with_context(|| format!("Failed to open database {}", config.database.path))?;

    match cli.command {
        Commands::Load { url, depth } => handle_load(&config, storage, &url, depth).await,
        Commands::Get { url, limit, offset } => handle_get(&storage, &url, limit, offset).await,
        Commands::Truncate => handle_truncate(&storage).await,
    }
}

/// Loads the configuration file if one was given, defaults otherwise
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Handles `load`: crawls and prints the outcome statistics
async fn handle_load(
    config: &Config,
    storage: SqliteStorage,
    url: &str,
    depth: u32,
) -> anyhow::Result<()> {
    let coordinator = Coordinator::from_config(config, Arc::new(storage))
        .context("Failed to build HTTP client")?
        .with_observer(Arc::new(ConsoleProgress::new()));

    let report = coordinator
        .run(url, depth)
        .await
        .with_context(|| format!("Crawl of {} failed", url))?;

    println!("{}/{} tasks done.", report.done, report.total);
    print!("{}", report.stats);

    Ok(())
}

/// Handles `get`: prints `url: "title"` lines for the URL's base domain
async fn handle_get(
    storage: &SqliteStorage,
    url: &str,
    limit: usize,
    offset: usize,
) -> anyhow::Result<()> {
    let domain = base_domain(url).with_context(|| format!("Invalid URL {}", url))?;

    let pages = storage
        .read_by_domain(&domain, limit, offset)
        .await
        .context("Failed to read pages")?;

    for page in pages {
        println!("{}", format_page_line(&page.url, &page.title));
    }

    Ok(())
}

fn format_page_line(url: &str, title: &str) -> String {
    format!("{}: \"{}\"", url, title)
}

/// Handles `truncate`: removes every stored page
async fn handle_truncate(storage: &SqliteStorage) -> anyhow::Result<()> {
    let removed = storage.count().await.context("Failed to count pages")?;
    storage.truncate().await.context("Failed to truncate pages")?;
    tracing::info!("Removed {} pages", removed);
    Ok(())
}

/// Peak resident set size of this process, from `/proc/self/status`
fn peak_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_hwm(&status)
}

fn parse_vm_hwm(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmHWM:"))?;
    let kib: u64 = line
        .trim_start_matches("VmHWM:")
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    Some(kib * 1024)
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

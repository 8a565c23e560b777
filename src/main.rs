//! bbcrawl main entry point
//!
//! This is the command-line interface for the bbcrawl thread crawler.

use anyhow::Context;
use bbcrawl::cli::Invocation;
use bbcrawl::config::{load_config, CrawlConfig, CrawlSettings};
use bbcrawl::{crawl, CrawlContext};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit status of runs ended by a configuration or crawl error
const EXIT_FAILURE: i32 = 2;

/// bbcrawl: downloads the media of paginated forum threads
///
/// The pager decides which pages are visited, the crawler what is
/// downloaded from every page:
///
///   bbcrawl [OPTIONS] <PAGER> [PAGER-OPTS] --crawler <CRAWLER> [CRAWLER-OPTS] <URL>
///
/// Pagers: vb4, query, format, cutter, posts.
/// Crawlers: file, img, vb-attachments, src.
#[derive(Parser, Debug)]
#[command(name = "bbcrawl")]
#[command(version)]
#[command(about = "Downloads the media of paginated forum threads")]
struct Cli {
    /// Output directory (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Netscape cookie file to load cookies from
    #[arg(long, value_name = "FILE")]
    cookie_file: Option<PathBuf>,

    /// Maximum number of concurrent downloads
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// User agent sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// TOML file with default options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Pager, pager options, crawler, crawler options and thread URL
    #[arg(
        value_name = "PAGER ... URL",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    invocation: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> CrawlConfig {
        CrawlConfig {
            output: self.output.clone(),
            jobs: self.jobs,
            timeout_secs: self.timeout,
            user_agent: self.user_agent.clone(),
            cookie_file: self.cookie_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bbcrawl=info,warn"),
            1 => EnvFilter::new("bbcrawl=debug,info"),
            2 => EnvFilter::new("bbcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file_config = match &cli.config {
        Some(path) => {
            tracing::debug!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
                .crawl
        }
        None => CrawlConfig::default(),
    };
    let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
    let settings = Arc::new(CrawlSettings::resolve(file_config.merge(cli.overrides()), &cwd)?);

    let invocation = Invocation::partition(&cli.invocation)?;
    let mut ctx = CrawlContext::new(&invocation.pager, &invocation.crawler, settings)?;
    ctx.pager.set_options(&invocation.pager_args)?;
    ctx.pager.set_url(&invocation.url)?;
    ctx.crawler.set_options(&invocation.crawler_args)?;

    tracing::info!(
        "Crawling {} with pager {} and crawler {} into {}",
        invocation.url,
        invocation.pager,
        invocation.crawler,
        ctx.settings.output.display()
    );

    // Download failures are reported but do not change the exit status
    let summary = crawl(ctx).await?;
    tracing::debug!("{:?}", summary);
    Ok(())
}

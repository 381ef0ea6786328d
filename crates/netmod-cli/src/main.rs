//! NetMod - Mastodon network moderation collector
//!
//! Discovers instances via the instances.social directory, fetches each
//! instance's public domain-block list, and persists normalized moderation
//! events to the configured export targets. The run is strictly sequential:
//! fetch, then collect, then export.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use collector::Crawler;
use mastodon_client::blocklist::{BlocklistClient, BlocklistClientConfig};
use mastodon_client::directory::{DirectoryClient, DirectoryClientConfig, DirectoryError};
use mastodon_client::rest::RestClientConfig;
use storage::database::DatabaseConfig;
use storage::{EventSink, JsonlExporter, SqliteExporter};

mod config;

use config::{Config, OutputTarget};

#[derive(Debug, Parser)]
#[command(name = "netmod", about = "Collect Mastodon network moderation data")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Crawl only the first N discovered instances
    #[arg(long)]
    limit: Option<usize>,

    /// Suppress informational output
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("netmod error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let rest_config = rest_config(&config);

    // Stage 1: instance directory. Auth failure here is fatal.
    let directory = DirectoryClient::new(
        rest_config.clone(),
        DirectoryClientConfig::new(&config.api_token)
            .with_api_url(&config.api_url)
            .with_filters(config.api_params.clone()),
    );

    let mut instances = match directory.fetch_all().await {
        Ok(instances) => instances,
        Err(err @ DirectoryError::Auth(_)) => {
            return Err(anyhow::Error::new(err).context("instances.social rejected the API token"));
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(limit) = cli.limit {
        instances.truncate(limit);
    }
    tracing::info!(count = instances.len(), "Crawling instances");

    // Stage 2: block-list crawl, sequential, per-instance failures skipped.
    let crawler = Crawler::new(BlocklistClient::new(
        rest_config,
        BlocklistClientConfig::default(),
    ));
    let report = crawler.collect(&instances).await;

    // Stage 3: export to every configured target.
    for target in &config.output_targets {
        let stats = match target {
            OutputTarget::Sqlite { path } => {
                let exporter = SqliteExporter::open(DatabaseConfig::new(path))
                    .await
                    .with_context(|| format!("opening database {}", path))?;
                exporter.export(&instances, &report.events).await?
            }
            OutputTarget::Jsonl { path } => {
                JsonlExporter::new(path)
                    .export(&instances, &report.events)
                    .await?
            }
        };
        tracing::debug!(?target, ?stats, "Export target written");
    }

    tracing::info!(
        instances = instances.len(),
        processed = report.processed,
        not_exposed = report.not_exposed,
        failed = report.failed,
        events = report.events.len(),
        "Run complete"
    );

    Ok(())
}

fn rest_config(config: &Config) -> RestClientConfig {
    let mut rest = RestClientConfig::default()
        .with_timeout(Duration::from_secs(config.timeout_secs));
    if let Some(user_agent) = &config.user_agent {
        rest = rest.with_user_agent(user_agent);
    }
    rest
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

//! Sequential block-list crawl
//!
//! Walks the discovered instances one at a time, fetches each public block
//! list, and accumulates normalized events. Instances without an exposed
//! endpoint contribute zero events; transport failures are logged and the
//! crawl moves on.

use crate::events::ModerationEvent;
use chrono::Utc;
use mastodon_client::blocklist::{BlocklistClient, BlocklistError};
use mastodon_client::directory::InstanceRecord;

/// Outcome of one crawl pass
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Normalized events from all instances that answered
    pub events: Vec<ModerationEvent>,
    /// Instances whose block list was fetched (including empty ones)
    pub processed: usize,
    /// Instances that do not expose a public block list
    pub not_exposed: usize,
    /// Instances skipped because of a transport or upstream failure
    pub failed: usize,
}

impl CrawlReport {
    /// Instances visited in total
    pub fn visited(&self) -> usize {
        self.processed + self.not_exposed + self.failed
    }
}

/// Drives the sequential crawl over discovered instances
pub struct Crawler {
    blocklist: BlocklistClient,
}

impl Crawler {
    /// Create a new crawler over the given block-list client
    pub fn new(blocklist: BlocklistClient) -> Self {
        Self { blocklist }
    }

    /// Crawl all instances sequentially and collect their moderation events
    pub async fn collect(&self, instances: &[InstanceRecord]) -> CrawlReport {
        let mut report = CrawlReport::default();

        for instance in instances {
            let host = instance.name.as_str();

            match self.blocklist.fetch(host).await {
                Ok(blocks) => {
                    let observed_at = Utc::now();
                    let before = report.events.len();
                    report.events.extend(
                        blocks
                            .into_iter()
                            .filter_map(|b| ModerationEvent::from_domain_block(host, b, observed_at)),
                    );
                    report.processed += 1;

                    tracing::debug!(
                        host,
                        events = report.events.len() - before,
                        "Collected block list"
                    );
                }
                Err(BlocklistError::NotExposed(_)) => {
                    report.not_exposed += 1;
                    tracing::debug!(host, "No public block list");
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(host, error = %err, "Skipping instance");
                }
            }
        }

        tracing::info!(
            visited = report.visited(),
            processed = report.processed,
            not_exposed = report.not_exposed,
            failed = report.failed,
            events = report.events.len(),
            "Crawl complete"
        );

        report
    }
}

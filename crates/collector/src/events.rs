//! Normalized moderation events
//!
//! A moderation event records one instance's policy action against another.
//! The `(source_instance, target_instance)` pair is the natural key: a later
//! observation of the same pair replaces the earlier one rather than
//! producing a second record.

use chrono::{DateTime, Utc};
use mastodon_client::blocklist::{BlockSeverity, DomainBlock};
use serde::{Deserialize, Serialize};

/// A single observed moderation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationEvent {
    /// Instance applying the block
    pub source_instance: String,
    /// Instance being blocked
    pub target_instance: String,
    /// Block severity
    pub severity: BlockSeverity,
    /// Public comment attached to the block, if any
    pub reason: Option<String>,
    /// When this event was observed by the collector
    pub observed_at: DateTime<Utc>,
}

impl ModerationEvent {
    /// The natural key of this event
    pub fn key(&self) -> (&str, &str) {
        (&self.source_instance, &self.target_instance)
    }

    /// Normalize one raw block-list entry observed on `source` at `observed_at`
    ///
    /// Entries whose target domain is fully obfuscated (digest only) carry
    /// no usable target key and are dropped.
    pub fn from_domain_block(
        source: &str,
        block: DomainBlock,
        observed_at: DateTime<Utc>,
    ) -> Option<Self> {
        let target = match block.domain {
            Some(domain) if !domain.is_empty() => domain,
            _ => {
                tracing::debug!(source, "Skipping block entry without a target domain");
                return None;
            }
        };

        Some(Self {
            source_instance: source.to_string(),
            target_instance: target,
            severity: block.severity,
            reason: block.comment,
            observed_at,
        })
    }
}

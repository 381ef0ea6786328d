//! Moderation event collection for NetMod
//!
//! This crate turns raw per-instance block lists into normalized
//! moderation-event records and drives the sequential crawl across all
//! discovered instances.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crawl;
pub mod events;

pub use crawl::{CrawlReport, Crawler};
pub use events::ModerationEvent;

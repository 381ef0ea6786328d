//! Mastodon API Client Library
//!
//! This crate provides the HTTP plumbing for the NetMod collector: a small
//! JSON REST client with retry support, the instances.social directory
//! client, and the per-instance domain-block list client.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blocklist;
pub mod directory;
pub mod rest;

pub use blocklist::{BlockSeverity, BlocklistClient, DomainBlock};
pub use directory::{DirectoryClient, InstanceRecord};
pub use rest::{RestClient, RestClientConfig};

//! Storage layer for NetMod
//!
//! This crate provides the SQLite database layer (connection pooling,
//! migrations) and the export sinks that persist discovered instances and
//! moderation events.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod exporter;

pub use database::{DatabaseConfig, SqliteDatabase};
pub use exporter::{EventSink, ExportStats, JsonlExporter, SqliteExporter};

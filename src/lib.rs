//! # scanlink - batching client for remote code-scanning services
//!
//! Collects files from disk, splits them into size- and count-bounded batches and uploads
//! the batches to a scanning service on a bounded pool of worker threads. Per-batch failures
//! are collected alongside the results instead of aborting the whole scan.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scan the current directory for secrets
//! SCANLINK_API__TOKEN=... scanlink scan .
//!
//! # Show the merged configuration
//! scanlink config show --format json
//! ```
//!
//! ## Library use
//!
//! ```rust
//! use scanlink::batch::{BatchLimits, Document, split_documents_into_batches};
//!
//! let documents = vec![Document::new("a.txt", "hello"), Document::new("b.txt", "world")];
//! let batches = split_documents_into_batches(&documents, BatchLimits::new(8, 10).unwrap());
//! assert_eq!(batches.len(), 2);
//! ```

pub mod batch;
pub mod cli;
pub mod client;
pub mod collect;
pub mod config;
pub mod error;
pub mod parallel;
pub mod scan;

pub use config::ScanlinkConfig;
pub use error::ScanError;

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

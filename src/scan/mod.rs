//! Batched scanning
//!
//! [`BatchDispatcher`] is the entry point: it resolves the limits for a scan type, splits the
//! documents and fans the batches out over a [`BatchScanner`].

pub mod dispatch;
pub mod scanner;
pub mod types;

pub use dispatch::{BatchDispatcher, DispatchOutcome};
pub use scanner::{BatchScanner, RemoteBatchScanner};
pub use types::{CliError, LocalScanResult, ScanOutcome, ScanType};

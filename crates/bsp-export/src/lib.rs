//! Snapshot export pipeline.
//!
//! [`Exporter::export`] runs the aggregator over a ledger source, hashes the
//! leaf facts, builds the Merkle tree, and streams the account summaries
//! and proofs to disk before publishing the header.

pub mod error;
pub mod exporter;

pub use error::{ExportError, ExportResult};
pub use exporter::{ExportConfig, ExportSummary, Exporter};

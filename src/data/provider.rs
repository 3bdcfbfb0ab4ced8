//! Abstract resource access for the ingestion pipeline.
//!
//! The pipeline is parameterized over "list available resources; fetch bytes
//! by name" so local-directory and remote-folder ingestion share one
//! implementation instead of duplicating the whole normalization flow per
//! source kind.

use crate::error::AppError;

/// A source of named byte resources (monthly CSV batches plus the roster).
///
/// Implementations must be `Send + Sync`: the per-file ingest stage fans out
/// across worker threads.
pub trait ResourceProvider: Send + Sync {
    /// Human-readable location, used in diagnostics only.
    fn describe(&self) -> String;

    /// Names of ingestable resources (the `*.csv` batch), sorted by name so
    /// the batch order is deterministic.
    fn list(&self) -> Result<Vec<String>, AppError>;

    /// Fetch the raw bytes of a named resource.
    ///
    /// Roster candidates also go through this call and may name resources
    /// outside `list()` (e.g. a roster file next to the data folder).
    fn fetch(&self, name: &str) -> Result<Vec<u8>, AppError>;
}

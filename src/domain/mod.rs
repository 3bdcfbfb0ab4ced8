//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`IngestOptions`, `DecimalStyle`)
//! - the unified table and its rows (`UnifiedTable`, `CanonicalRow`)
//! - roster entries (`RosterEntry`)
//! - derived-metric enums (`MetricOp`, `NormalizeMode`)

pub mod types;

pub use types::*;

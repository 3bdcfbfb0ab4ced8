//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built once by the ingestion pipeline
//! - read by any presentation front-end through a narrow interface
//! - exported to CSV/JSON without extra conversion layers

use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How decimal and thousands separators in metric cells are interpreted.
///
/// Regulator CSV batches mix two conventions: `1.234,56` (comma decimal,
/// dot thousands) and `1,234.56` (dot decimal, comma thousands). Values where
/// both separators appear are unambiguous (the rightmost one is the decimal
/// separator); a value with a single separator is not, so the convention for
/// that case is a run-level setting rather than a per-value guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecimalStyle {
    /// Try comma-decimal first, fall back to dot-decimal.
    ///
    /// Each interpretation is accepted only when separator positions and digit
    /// grouping are structurally plausible, so `1,234.56` still parses as
    /// ≈ 1234.56 even though comma-decimal is tried first.
    Auto,
    /// `,` is the decimal separator; `.` separates thousands.
    Comma,
    /// `.` is the decimal separator; `,` separates thousands.
    Dot,
}

/// Binary operator for user-composed derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Per-series normalization applied to a derived (or plain) metric series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Identity.
    Raw,
    /// Divide by the first non-null value, times 100.
    Base100,
    /// `(x - min) / (max - min)`; degenerate range maps to all-zero.
    Minmax,
    /// `(x - mean) / stddev` (sample stddev); zero stddev maps to all-zero.
    Zscore,
}

/// One row of the unified table.
///
/// Every row that leaves the pipeline has a valid first-of-month `period` and
/// a non-empty `entity_code_norm`; rows that cannot satisfy this are dropped
/// during ingest and counted in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRow {
    /// Reporting month, canonicalized to its first day.
    pub period: NaiveDate,
    /// Entity code exactly as it appeared in the source file.
    pub entity_code_raw: String,
    /// Canonical join key (5-digit zero-padded, or a literal `AA…` marker).
    pub entity_code_norm: String,
    /// Originating file name (provenance).
    pub source_file: String,
    /// Metric column name -> coerced value (`None` = unparseable/missing).
    pub metric_values: BTreeMap<String, Option<f64>>,
    /// Display name: alias or roster name when available, else the raw code.
    pub entity_label: String,
}

/// One line of the entity roster: canonical code, display name, short alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub code_norm: String,
    pub name: String,
    /// Optional; empty string when the roster line has no alias.
    pub alias: String,
}

/// Run-level configuration for one ingestion call.
///
/// The pipeline holds no ambient state: everything that influences the output
/// table travels in this value (plus the provider it is applied to).
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Roster resource locators, tried in order (first readable wins).
    pub roster_candidates: Vec<String>,
    /// Keep rows whose raw code starts with the aggregate marker `AA`.
    pub include_aggregates: bool,
    /// Prefer the roster alias over the full name when both exist.
    pub prefer_alias: bool,
    /// Separator convention for numeric coercion.
    pub decimal_style: DecimalStyle,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            roster_candidates: vec!["Nomina.txt".to_string()],
            include_aggregates: false,
            prefer_alias: false,
            decimal_style: DecimalStyle::Auto,
        }
    }
}

/// The analysis-ready table: ordered rows plus the union of metric columns.
///
/// Rows are stable-sorted by `(period, entity_code_raw)`; ties keep the
/// original file-then-row input order. Metric columns are listed in
/// first-seen order across the batch.
#[derive(Debug, Clone, Default)]
pub struct UnifiedTable {
    pub rows: Vec<CanonicalRow>,
    pub metric_columns: Vec<String>,
}

impl UnifiedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest period present, if any rows exist.
    pub fn period_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.first()?.period;
        let last = self.rows.last()?.period;
        Some((first, last))
    }

    /// Distinct periods in ascending order.
    pub fn periods(&self) -> Vec<NaiveDate> {
        // Rows are sorted by period, so consecutive dedup is enough.
        let mut out: Vec<NaiveDate> = Vec::new();
        for row in &self.rows {
            if out.last() != Some(&row.period) {
                out.push(row.period);
            }
        }
        out
    }

    /// Distinct `(code_norm, label)` pairs in first-seen order.
    pub fn entities(&self) -> Vec<(String, String)> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            if seen.insert(row.entity_code_norm.clone()) {
                out.push((row.entity_code_norm.clone(), row.entity_label.clone()));
            }
        }
        out
    }

    /// Time series of one metric for one entity, in period order.
    ///
    /// `None` entries are months where the metric was missing or unparseable.
    pub fn series(&self, code_norm: &str, metric: &str) -> Vec<(NaiveDate, Option<f64>)> {
        self.rows
            .iter()
            .filter(|r| r.entity_code_norm == code_norm)
            .map(|r| (r.period, r.metric_values.get(metric).copied().flatten()))
            .collect()
    }

    /// All rows belonging to one reporting month.
    pub fn month_slice(&self, period: NaiveDate) -> Vec<&CanonicalRow> {
        self.rows.iter().filter(|r| r.period == period).collect()
    }

    /// Resolve a user-supplied entity selector to a canonical code.
    ///
    /// Accepts a raw/normalized code (`11`, `0011`, `00011`) or a label;
    /// label matching is case-insensitive, exact match before substring.
    pub fn find_entity(&self, selector: &str) -> Option<String> {
        let norm = crate::norm::ident::normalize_entity_code(selector);
        if self.rows.iter().any(|r| r.entity_code_norm == norm) {
            return Some(norm);
        }
        let wanted = selector.trim().to_lowercase();
        if let Some(row) = self
            .rows
            .iter()
            .find(|r| r.entity_label.to_lowercase() == wanted)
        {
            return Some(row.entity_code_norm.clone());
        }
        self.rows
            .iter()
            .find(|r| r.entity_label.to_lowercase().contains(&wanted))
            .map(|r| r.entity_code_norm.clone())
    }
}

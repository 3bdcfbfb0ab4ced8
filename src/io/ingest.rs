//! Batch ingest and normalization.
//!
//! This module turns a pile of heterogeneous monthly CSV files into one
//! analysis-ready `UnifiedTable`:
//!
//! - **Partial-failure tolerant**: one unreadable file never aborts the batch;
//!   every skip is reported.
//! - **Deterministic**: output order is a stable sort, never a function of
//!   worker completion order.
//! - **No ambient state**: everything that shapes the output travels in
//!   `IngestOptions`; repeated calls with identical inputs give identical
//!   results.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::data::provider::ResourceProvider;
use crate::domain::{CanonicalRow, IngestOptions, RosterEntry, UnifiedTable};
use crate::error::AppError;
use crate::io::sniff;
use crate::norm::ident::normalize_entity_code;
use crate::norm::numeric::coerce_numeric;
use crate::norm::period::parse_period;
use crate::roster;

/// Fuzzy needles for the entity-code column, tried in order.
const CODE_NEEDLES: [&str; 3] = [
    "código de la entidad",
    "codigo de la entidad",
    "entidad",
];
/// Exact header fallbacks when no fuzzy needle matches.
const CODE_LITERAL: &str = "Código de la entidad";
const DATE_NEEDLE: &str = "fecha";
const DATE_LITERAL: &str = "Fecha";
/// Some source files embed a display-name column; it is not a metric.
const NAME_COLUMN: &str = "Nombre de entidad";

/// Delimiter actually used for one file (diagnostic).
#[derive(Debug, Clone, Serialize)]
pub struct FileDelimiter {
    pub file: String,
    pub delimiter: String,
}

/// A file excluded from the batch, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Per-run diagnostics handed to the presentation layer alongside the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Human-readable source location.
    pub provider: String,
    /// Delimiter used per successfully parsed file.
    pub delimiters: Vec<FileDelimiter>,
    /// Files excluded from the batch.
    pub skipped: Vec<SkippedFile>,
    /// Rows dropped because their period cell could not be parsed.
    pub rows_dropped_no_period: usize,
    /// Rows dropped because the entity-code cell was empty.
    pub rows_dropped_no_code: usize,
    /// Roster candidate that resolved; empty when none did.
    pub roster_source: String,
}

/// Ingest output: the unified table plus run diagnostics.
#[derive(Debug, Clone, Default)]
pub struct IngestOutput {
    pub table: UnifiedTable,
    pub report: IngestReport,
}

/// Run the full ingestion pipeline against a resource provider.
///
/// An empty or fully-unusable batch yields an empty table (with the skips
/// reported), not an error; only provider-level failures (unreadable
/// directory, unreachable folder) propagate as `Err`.
pub fn ingest(
    provider: &dyn ResourceProvider,
    options: &IngestOptions,
) -> Result<IngestOutput, AppError> {
    let names = provider.list()?;

    // The per-file stage is a pure function of file contents, so it can fan
    // out; the indexed collect keeps input (name) order regardless of which
    // worker finishes first.
    let outcomes: Vec<FileOutcome> = names
        .par_iter()
        .map(|name| read_file(provider, name, options))
        .collect();

    let (roster_map, roster_source) = roster::resolve(provider, &options.roster_candidates);

    Ok(assemble(
        outcomes,
        &roster_map,
        roster_source,
        provider.describe(),
        options,
    ))
}

enum FileOutcome {
    Parsed(FileData),
    Skipped { file: String, reason: String },
}

struct FileData {
    file: String,
    delimiter: Option<u8>,
    metric_columns: Vec<String>,
    rows: Vec<ParsedRow>,
    rows_dropped_no_period: usize,
    rows_dropped_no_code: usize,
}

struct ParsedRow {
    period: NaiveDate,
    code_raw: String,
    metrics: BTreeMap<String, Option<f64>>,
}

/// Fetch, sniff, and normalize one file. Never fails the batch: every
/// problem becomes a `Skipped` outcome.
fn read_file(provider: &dyn ResourceProvider, name: &str, options: &IngestOptions) -> FileOutcome {
    let skipped = |reason: String| FileOutcome::Skipped {
        file: name.to_string(),
        reason,
    };

    let bytes = match provider.fetch(name) {
        Ok(b) => b,
        Err(e) => return skipped(format!("fetch failed: {e}")),
    };

    let Some((raw, delimiter)) = sniff::sniff(&bytes) else {
        return skipped("no encoding/delimiter combination parsed".to_string());
    };

    let Some(date_idx) = find_column(&raw.headers, DATE_NEEDLE, DATE_LITERAL) else {
        return skipped("no date column".to_string());
    };
    let Some(code_idx) = find_code_column(&raw.headers) else {
        return skipped("no entity-code column".to_string());
    };

    // Everything that is not an identifier/provenance column is a metric.
    let metric_cols: Vec<(usize, String)> = raw
        .headers
        .iter()
        .enumerate()
        .filter(|&(idx, header)| {
            idx != date_idx && idx != code_idx && !header.is_empty() && header != NAME_COLUMN
        })
        .map(|(idx, header)| (idx, header.clone()))
        .collect();

    let mut rows = Vec::with_capacity(raw.rows.len());
    let mut rows_dropped_no_period = 0usize;
    let mut rows_dropped_no_code = 0usize;

    for record in &raw.rows {
        let code_raw = record.get(code_idx).map(|s| s.trim()).unwrap_or("");
        if code_raw.is_empty() {
            rows_dropped_no_code += 1;
            continue;
        }
        if !options.include_aggregates && code_raw.to_uppercase().starts_with("AA") {
            continue;
        }

        let Some(period) = record.get(date_idx).and_then(|s| parse_period(s)) else {
            rows_dropped_no_period += 1;
            continue;
        };

        let metrics = metric_cols
            .iter()
            .map(|(idx, header)| {
                let value = record
                    .get(*idx)
                    .and_then(|cell| coerce_numeric(cell, options.decimal_style));
                (header.clone(), value)
            })
            .collect();

        rows.push(ParsedRow {
            period,
            code_raw: code_raw.to_string(),
            metrics,
        });
    }

    FileOutcome::Parsed(FileData {
        file: name.to_string(),
        delimiter,
        metric_columns: metric_cols.into_iter().map(|(_, h)| h).collect(),
        rows,
        rows_dropped_no_period,
        rows_dropped_no_code,
    })
}

/// Concatenate per-file outputs in input order, join the roster, and apply
/// the deterministic final sort.
fn assemble(
    outcomes: Vec<FileOutcome>,
    roster_map: &HashMap<String, RosterEntry>,
    roster_source: String,
    provider_desc: String,
    options: &IngestOptions,
) -> IngestOutput {
    let mut report = IngestReport {
        provider: provider_desc,
        roster_source,
        ..Default::default()
    };

    let mut metric_columns: Vec<String> = Vec::new();
    let mut seen_columns: HashSet<String> = HashSet::new();
    let mut rows: Vec<CanonicalRow> = Vec::new();

    for outcome in outcomes {
        match outcome {
            FileOutcome::Skipped { file, reason } => {
                report.skipped.push(SkippedFile { file, reason });
            }
            FileOutcome::Parsed(data) => {
                report.delimiters.push(FileDelimiter {
                    file: data.file.clone(),
                    delimiter: sniff::delimiter_label(data.delimiter).to_string(),
                });
                report.rows_dropped_no_period += data.rows_dropped_no_period;
                report.rows_dropped_no_code += data.rows_dropped_no_code;

                for column in &data.metric_columns {
                    if seen_columns.insert(column.clone()) {
                        metric_columns.push(column.clone());
                    }
                }

                for row in data.rows {
                    let code_norm = normalize_entity_code(&row.code_raw);
                    let label = entity_label(
                        roster_map.get(&code_norm),
                        &row.code_raw,
                        options.prefer_alias,
                    );
                    rows.push(CanonicalRow {
                        period: row.period,
                        entity_code_raw: row.code_raw,
                        entity_code_norm: code_norm,
                        source_file: data.file.clone(),
                        metric_values: row.metrics,
                        entity_label: label,
                    });
                }
            }
        }
    }

    // Stable sort: ties keep file-then-row input order.
    rows.sort_by(|a, b| {
        (a.period, &a.entity_code_raw).cmp(&(b.period, &b.entity_code_raw))
    });

    IngestOutput {
        table: UnifiedTable {
            rows,
            metric_columns,
        },
        report,
    }
}

/// Display label with the three-tier fallback: alias (when preferred and
/// non-empty) -> roster name -> raw code. Never empty for a non-empty code.
fn entity_label(entry: Option<&RosterEntry>, code_raw: &str, prefer_alias: bool) -> String {
    if let Some(entry) = entry {
        if prefer_alias && !entry.alias.trim().is_empty() {
            return entry.alias.trim().to_string();
        }
        if !entry.name.trim().is_empty() {
            return entry.name.trim().to_string();
        }
    }
    code_raw.to_string()
}

/// First header containing `needle` (case-insensitive), else the exact
/// `literal`. Substring matching is ambiguous when several headers contain
/// the needle; the tie-break is deterministic: first match in column order.
fn find_column(headers: &[String], needle: &str, literal: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(needle))
        .or_else(|| headers.iter().position(|h| h == literal))
}

fn find_code_column(headers: &[String]) -> Option<usize> {
    for needle in CODE_NEEDLES {
        if let Some(idx) = headers.iter().position(|h| h.to_lowercase().contains(needle)) {
            return Some(idx);
        }
    }
    headers.iter().position(|h| h == CODE_LITERAL)
}

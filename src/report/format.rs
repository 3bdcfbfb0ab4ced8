//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline stays clean and testable
//! - output changes are localized

use chrono::NaiveDate;

use crate::domain::IngestOptions;
use crate::io::ingest::IngestOutput;

/// Format the full run summary (sources + diagnostics + table shape).
pub fn format_run_summary(output: &IngestOutput, options: &IngestOptions) -> String {
    let table = &output.table;
    let report = &output.report;
    let mut out = String::new();

    out.push_str("=== btab - monthly indicator ingest ===\n");
    out.push_str(&format!("Source: {}\n", report.provider));
    out.push_str(&format!(
        "Files: {} parsed, {} skipped\n",
        report.delimiters.len(),
        report.skipped.len()
    ));
    for fd in &report.delimiters {
        out.push_str(&format!("  {} [{}]\n", fd.file, fd.delimiter));
    }
    for skip in &report.skipped {
        out.push_str(&format!("  (skipped {}) {}\n", skip.file, skip.reason));
    }

    if report.roster_source.is_empty() {
        out.push_str("Roster: not found (showing raw codes)\n");
    } else {
        out.push_str(&format!("Roster: {}\n", report.roster_source));
    }

    out.push_str(&format!(
        "Rows: {} | dropped: {} without period, {} without code\n",
        table.len(),
        report.rows_dropped_no_period,
        report.rows_dropped_no_code
    ));
    if let Some((first, last)) = table.period_range() {
        out.push_str(&format!(
            "Periods: {} -> {}\n",
            first.format("%Y-%m"),
            last.format("%Y-%m")
        ));
    }
    out.push_str(&format!(
        "Metrics: {} | Entities: {} | aggregates {}\n",
        table.metric_columns.len(),
        table.entities().len(),
        if options.include_aggregates {
            "included"
        } else {
            "excluded"
        }
    ));

    out
}

/// Format a month leaderboard.
pub fn format_leaderboard(metric: &str, period: NaiveDate, ranked: &[(String, f64)]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Top {} in {} - {}\n",
        ranked.len(),
        period.format("%Y-%m"),
        metric
    ));
    let width = ranked
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    for (rank, (label, value)) in ranked.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {label:<width$}  {value:>12.2}\n",
            rank + 1
        ));
    }
    out
}

/// Format a per-month value series (derived metrics, single indicators).
pub fn format_series(title: &str, series: &[(NaiveDate, Option<f64>)]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}\n"));
    for (period, value) in series {
        out.push_str(&format!(
            "{}  {}\n",
            period.format("%Y-%m"),
            fmt_opt(*value)
        ));
    }
    out
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => "-".to_string(),
    }
}

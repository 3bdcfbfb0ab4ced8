//! Reporting-period parsing.
//!
//! Regulator files stamp rows with a compact `YYYYMM` token (e.g. `202504`).
//! Some batches carry full dates instead; either way the reporting granularity
//! is the month, so everything canonicalizes to the first day of the month.

use chrono::{Datelike, NaiveDate};

/// Parse a period cell into a first-of-month date.
///
/// The compact `YYYYMM` prefix is tried first; a failure there (e.g. month 13)
/// falls through to a small set of common date formats. Unparseable input
/// yields `None`, never an error.
pub fn parse_period(value: &str) -> Option<NaiveDate> {
    // Exports occasionally quote the period cell.
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|&c| c != '"' && c != '\'')
        .collect();
    let s = cleaned.trim();
    if s.is_empty() {
        return None;
    }
    parse_compact(s).or_else(|| parse_fallback(s))
}

fn parse_compact(s: &str) -> Option<NaiveDate> {
    let head = s.get(..6)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = head[..4].parse().ok()?;
    let month: u32 = head[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn parse_fallback(s: &str) -> Option<NaiveDate> {
    // Same deterministic format list the rest of the codebase accepts for
    // dates; anything parsed is snapped to day 1.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.with_day(1);
        }
    }
    None
}

//! Numeric coercion for metric cells.
//!
//! Metric values arrive as text in two separator conventions (`1.234,56`
//! vs `1,234.56`), sometimes with a trailing percent sign or embedded
//! (non-breaking) spaces. Coercion is per-cell and total: a value that cannot
//! be interpreted becomes `None`, never an error.
//!
//! An interpretation is accepted only when it is structurally plausible:
//! the decimal separator must be unique and rightmost, and a candidate
//! thousands separator must produce proper 3-digit grouping. This is what
//! lets `Auto` try comma-decimal first (the dominant convention in these
//! batches) without mangling dot-decimal values like `1,234.56`.

use crate::domain::DecimalStyle;

/// Coerce one metric cell to a float under the given separator convention.
pub fn coerce_numeric(raw: &str, style: DecimalStyle) -> Option<f64> {
    // NBSP and thin spaces count as whitespace here (regulator exports pad
    // thousands groups with U+00A0).
    let mut s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some(stripped) = s.strip_suffix('%') {
        s = stripped.to_string();
    }
    if s.is_empty() {
        return None;
    }
    match style {
        DecimalStyle::Comma => reinterpret(&s, ','),
        DecimalStyle::Dot => reinterpret(&s, '.'),
        DecimalStyle::Auto => reinterpret(&s, ',').or_else(|| reinterpret(&s, '.')),
    }
}

/// Parse `s` treating `decimal` as the decimal separator and the other of
/// `,`/`.` as a thousands separator. Returns `None` when the string does not
/// fit that reading.
fn reinterpret(s: &str, decimal: char) -> Option<f64> {
    let thousands = if decimal == ',' { '.' } else { ',' };
    if s.matches(decimal).count() > 1 {
        return None;
    }
    let parsed = match s.find(decimal) {
        Some(idx) => {
            let (int_part, frac_part) = (&s[..idx], &s[idx + 1..]);
            if frac_part.contains(thousands) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let int_digits = strip_grouping(int_part, thousands)?;
            format!("{int_digits}.{frac_part}").parse::<f64>().ok()
        }
        None => strip_grouping(s, thousands)?.parse::<f64>().ok(),
    };
    parsed.filter(|v| v.is_finite())
}

/// Validate the integer part and remove thousands separators.
///
/// With separators present, digit groups after the first must be exactly 3
/// wide (`1.234`, `12.345.678`); anything else rejects the interpretation.
fn strip_grouping(part: &str, thousands: char) -> Option<String> {
    let (sign, rest) = match part.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", part.strip_prefix('+').unwrap_or(part)),
    };
    if rest.is_empty() {
        // Allows ",5"-style fractions with an empty integer part.
        return Some(sign.to_string());
    }
    if !rest.contains(thousands) {
        if !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        return Some(format!("{sign}{rest}"));
    }
    let groups: Vec<&str> = rest.split(thousands).collect();
    let first = groups[0];
    if first.is_empty() || first.len() > 3 || !first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    for group in &groups[1..] {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    Some(format!("{sign}{}", groups.concat()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(raw: &str) -> Option<f64> {
        coerce_numeric(raw, DecimalStyle::Auto)
    }

    #[test]
    fn both_separator_conventions_resolve() {
        assert_eq!(auto("1.234,56"), Some(1234.56));
        assert_eq!(auto("1,234.56"), Some(1234.56));
        assert_eq!(auto("12.345.678,9"), Some(12_345_678.9));
    }

    #[test]
    fn trailing_percent_is_stripped() {
        assert_eq!(auto("12%"), Some(12.0));
        assert_eq!(auto("-3,5%"), Some(-3.5));
    }

    #[test]
    fn whitespace_and_nbsp_are_ignored() {
        assert_eq!(auto(" 1\u{a0}234,5 "), Some(1234.5));
        assert_eq!(auto("  42  "), Some(42.0));
    }

    #[test]
    fn lone_separator_prefers_comma_decimal() {
        // Genuinely ambiguous; run-level precedence decides.
        assert_eq!(auto("12,5"), Some(12.5));
        assert_eq!(auto("1,234"), Some(1.234));
        // A lone dot with non-3-digit grouping cannot be thousands, so the
        // comma-decimal reading rejects it and dot-decimal applies.
        assert_eq!(auto("12.5"), Some(12.5));
        // A lone dot with exact grouping reads as thousands under the
        // preferred convention.
        assert_eq!(auto("1.234"), Some(1234.0));
    }

    #[test]
    fn explicit_styles_override_the_heuristic() {
        assert_eq!(coerce_numeric("1.234", DecimalStyle::Dot), Some(1.234));
        assert_eq!(coerce_numeric("1.234", DecimalStyle::Comma), Some(1234.0));
        assert_eq!(coerce_numeric("12,5", DecimalStyle::Dot), None);
    }

    #[test]
    fn unparseable_cells_become_none() {
        assert_eq!(auto(""), None);
        assert_eq!(auto("s/d"), None);
        assert_eq!(auto("1.2.3"), None);
        assert_eq!(auto("--5"), None);
    }

    #[test]
    fn plain_numbers_pass_through() {
        assert_eq!(auto("0"), Some(0.0));
        assert_eq!(auto("-17"), Some(-17.0));
        assert_eq!(auto("100.0"), Some(100.0));
    }
}

//! Run reporting: leaderboards and formatted terminal output.

use chrono::NaiveDate;

use crate::domain::UnifiedTable;

pub mod format;

pub use format::*;

/// Rank entities by one metric within one reporting month, highest first.
///
/// Rows whose metric is null are left out; ties keep table order.
pub fn top_entities(
    table: &UnifiedTable,
    metric: &str,
    period: NaiveDate,
    top_n: usize,
) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = table
        .month_slice(period)
        .into_iter()
        .filter_map(|row| {
            row.metric_values
                .get(metric)
                .copied()
                .flatten()
                .map(|v| (row.entity_label.clone(), v))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CanonicalRow;
    use std::collections::BTreeMap;

    fn row(period: NaiveDate, code: &str, label: &str, value: Option<f64>) -> CanonicalRow {
        let mut metrics = BTreeMap::new();
        metrics.insert("ROE".to_string(), value);
        CanonicalRow {
            period,
            entity_code_raw: code.to_string(),
            entity_code_norm: crate::norm::ident::normalize_entity_code(code),
            source_file: "test.csv".to_string(),
            metric_values: metrics,
            entity_label: label.to_string(),
        }
    }

    #[test]
    fn ranks_one_month_highest_first() {
        let april = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let may = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let table = UnifiedTable {
            rows: vec![
                row(april, "11", "BX", Some(3.0)),
                row(april, "14", "BY", Some(9.0)),
                row(april, "20", "BZ", None),
                row(may, "11", "BX", Some(99.0)),
            ],
            metric_columns: vec!["ROE".to_string()],
        };

        let ranked = top_entities(&table, "ROE", april, 10);
        assert_eq!(
            ranked,
            vec![("BY".to_string(), 9.0), ("BX".to_string(), 3.0)]
        );

        let ranked = top_entities(&table, "ROE", april, 1);
        assert_eq!(ranked.len(), 1);
    }
}

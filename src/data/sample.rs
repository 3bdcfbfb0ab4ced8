//! Synthetic demo batch generation.
//!
//! Writes a deterministic batch of monthly indicator CSVs the way real ones
//! arrive (delimiters and encodings vary per file, decimal conventions
//! follow the delimiter, an aggregate `AA000` row closes each month) plus a
//! `Nomina.txt` roster. Useful for demos and as a realistic fixture for
//! exercising the full pipeline.

use std::fs;
use std::path::Path;

use chrono::{Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;

/// Metric columns emitted in every generated file.
const METRICS: [&str; 4] = [
    "R1 - Rendimiento anual del patrimonio (ROE) (%)",
    "R2 - Rendimiento anual del activo (ROA) (%)",
    "Liquidez (%)",
    "Activo total (millones)",
];

/// Per-metric (base level, monthly step scale) for the random walk.
const METRIC_LEVELS: [(f64, f64); 4] = [(10.0, 2.5), (2.0, 0.6), (45.0, 6.0), (3500.0, 250.0)];

/// Roster entries cycled over the generated entities.
const BANK_NAMES: [(&str, &str); 10] = [
    ("Banco de la Plaza", "BPL"),
    ("Banco del Sur", "SUR"),
    ("Banco Galés", "BG"),
    ("Banco Andino", "BA"),
    ("Banco de Comercio", "BCO"),
    ("Banco Provincial", "BPR"),
    ("Banco Cooperativo", "COOP"),
    ("Banco de Inversiones", "BINV"),
    ("Banco Rural", "BR"),
    ("Banco Metropolitano", "BM"),
];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub months: usize,
    pub entities: usize,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            months: 6,
            entities: 8,
            seed: 42,
        }
    }
}

/// Write a synthetic batch into `dir`, returning the file names written.
pub fn write_sample_batch(dir: &Path, config: &SampleConfig) -> Result<Vec<String>, AppError> {
    if config.months == 0 || config.entities == 0 {
        return Err(AppError::usage("Sample months and entities must be > 0."));
    }

    fs::create_dir_all(dir)
        .map_err(|e| AppError::usage(format!("Failed to create '{}': {e}", dir.display())))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::usage(format!("Noise distribution error: {e}")))?;

    let codes: Vec<u32> = (0..config.entities).map(|i| 7 + 3 * i as u32).collect();

    // Random-walk levels per entity × metric.
    let mut levels: Vec<Vec<f64>> = codes
        .iter()
        .map(|_| {
            METRIC_LEVELS
                .iter()
                .map(|&(base, step)| base + normal.sample(&mut rng) * step)
                .collect()
        })
        .collect();

    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .ok_or_else(|| AppError::usage("Invalid sample start period."))?;

    let mut written = Vec::new();
    let mut period = start;

    for month in 0..config.months {
        // Delimiter/encoding rotate the way mixed real batches do.
        let (delimiter, comma_decimals, latin1) = match month % 3 {
            0 => (';', true, true),
            1 => (',', false, false),
            _ => ('\t', false, false),
        };

        let token = period.format("%Y%m").to_string();
        let mut body = String::new();
        body.push_str("Fecha");
        body.push(delimiter);
        body.push_str("Código de la entidad");
        for metric in METRICS {
            body.push(delimiter);
            body.push_str(metric);
        }
        body.push('\n');

        let mut totals = vec![0.0f64; METRICS.len()];
        for (entity, entity_levels) in levels.iter_mut().enumerate() {
            body.push_str(&token);
            body.push(delimiter);
            body.push_str(&codes[entity].to_string());
            for (m, level) in entity_levels.iter_mut().enumerate() {
                *level += normal.sample(&mut rng) * METRIC_LEVELS[m].1 * 0.25;
                totals[m] += *level;
                body.push(delimiter);
                body.push_str(&format_value(*level, comma_decimals));
            }
            body.push('\n');
        }

        // System-wide aggregate row.
        body.push_str(&token);
        body.push(delimiter);
        body.push_str("AA000");
        for total in totals {
            body.push(delimiter);
            body.push_str(&format_value(total, comma_decimals));
        }
        body.push('\n');

        let name = format!("indicadores_{token}.csv");
        let bytes = if latin1 {
            encode_latin1(&body)
        } else {
            body.into_bytes()
        };
        fs::write(dir.join(&name), bytes)
            .map_err(|e| AppError::usage(format!("Failed to write '{name}': {e}")))?;
        written.push(name);

        period = period.checked_add_months(Months::new(1)).unwrap_or(period);
    }

    let mut roster = String::new();
    for (entity, code) in codes.iter().enumerate() {
        let (name, alias) = BANK_NAMES[entity % BANK_NAMES.len()];
        roster.push_str(&format!("{code:05}\t{name}\t{alias}\n"));
    }
    roster.push_str("AA000\tSistema financiero\t\n");
    fs::write(dir.join("Nomina.txt"), encode_latin1(&roster))
        .map_err(|e| AppError::usage(format!("Failed to write 'Nomina.txt': {e}")))?;
    written.push("Nomina.txt".to_string());

    Ok(written)
}

fn format_value(value: f64, comma_decimals: bool) -> String {
    let text = format!("{value:.2}");
    if comma_decimals {
        text.replace('.', ",")
    } else {
        text
    }
}

/// Latin-1 encode, replacing anything outside the byte range.
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::local::LocalDirProvider;
    use crate::domain::IngestOptions;
    use crate::io::ingest::ingest;

    #[test]
    fn generated_batches_flow_through_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let config = SampleConfig {
            months: 4,
            entities: 5,
            seed: 7,
        };
        let written = write_sample_batch(dir.path(), &config).unwrap();
        assert_eq!(written.len(), 4 + 1); // csv files + roster

        let provider = LocalDirProvider::new(dir.path());
        let out = ingest(&provider, &IngestOptions::default()).unwrap();

        // Aggregates are filtered by default.
        assert_eq!(out.table.len(), 4 * 5);
        assert_eq!(out.table.metric_columns.len(), METRICS.len());
        assert_eq!(out.report.skipped.len(), 0);
        assert_eq!(out.report.roster_source, "Nomina.txt");
        // Roster labels replace raw codes (code 7 -> first roster name).
        assert!(
            out.table
                .rows
                .iter()
                .any(|r| r.entity_label == "Banco de la Plaza")
        );

        let mut options = IngestOptions::default();
        options.include_aggregates = true;
        let out = ingest(&provider, &options).unwrap();
        assert_eq!(out.table.len(), 4 * 6);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let config = SampleConfig::default();
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write_sample_batch(a.path(), &config).unwrap();
        write_sample_batch(b.path(), &config).unwrap();

        let read = |dir: &Path| fs::read(dir.join("indicadores_202401.csv")).unwrap();
        assert_eq!(read(a.path()), read(b.path()));
    }

    #[test]
    fn zero_sized_configs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = SampleConfig {
            months: 0,
            entities: 3,
            seed: 1,
        };
        assert!(write_sample_batch(dir.path(), &config).is_err());
    }
}

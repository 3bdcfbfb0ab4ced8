//! Exports: the unified table back to CSV, run diagnostics to JSON.
//!
//! The CSV export keeps the canonical source headers (`Fecha`,
//! `Código de la entidad`) and the compact `YYYYMM` period token, so an
//! exported file is itself ingestable.

use std::fs::File;
use std::path::Path;

use crate::domain::UnifiedTable;
use crate::error::AppError;
use crate::io::ingest::IngestReport;

/// Write the unified table as delimited text (UTF-8).
pub fn write_table_csv(path: &Path, table: &UnifiedTable, delimiter: u8) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(file);

    let mut header = vec![
        "Fecha".to_string(),
        "Código de la entidad".to_string(),
        "Etiqueta".to_string(),
    ];
    header.extend(table.metric_columns.iter().cloned());
    header.push("Archivo".to_string());
    writer
        .write_record(&header)
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for row in &table.rows {
        let mut record = vec![
            row.period.format("%Y%m").to_string(),
            row.entity_code_raw.clone(),
            row.entity_label.clone(),
        ];
        for column in &table.metric_columns {
            let cell = row
                .metric_values
                .get(column)
                .copied()
                .flatten()
                .map(|v| format!("{v}"))
                .unwrap_or_default();
            record.push(cell);
        }
        record.push(row.source_file.clone());
        writer
            .write_record(&record)
            .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to flush export CSV: {e}")))
}

/// Write the run diagnostics as pretty JSON.
pub fn write_report_json(path: &Path, report: &IngestReport) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::usage(format!("Failed to create report JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::usage(format!("Failed to write report JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::local::LocalDirProvider;
    use crate::domain::IngestOptions;
    use crate::io::ingest::ingest;
    use std::fs;

    #[test]
    fn exported_tables_are_ingestable_again() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.csv"),
            "Fecha;Entidad;ROE\n202504;11;\"12,5\"\n202505;14;3\n",
        )
        .unwrap();

        let provider = LocalDirProvider::new(dir.path());
        let out = ingest(&provider, &IngestOptions::default()).unwrap();

        let export_dir = tempfile::tempdir().unwrap();
        let export_path = export_dir.path().join("export.csv");
        write_table_csv(&export_path, &out.table, b';').unwrap();

        let provider = LocalDirProvider::new(export_dir.path());
        let again = ingest(&provider, &IngestOptions::default()).unwrap();
        assert_eq!(again.table.len(), out.table.len());
        assert_eq!(
            again.table.rows[0].metric_values["ROE"],
            out.table.rows[0].metric_values["ROE"]
        );
        assert_eq!(again.table.rows[0].period, out.table.rows[0].period);
    }

    #[test]
    fn report_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "Fecha;Entidad;X\n202504;11;1\n").unwrap();

        let provider = LocalDirProvider::new(dir.path());
        let out = ingest(&provider, &IngestOptions::default()).unwrap();

        let path = dir.path().join("report.json");
        write_report_json(&path, &out.report).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["delimiters"][0]["delimiter"], ";");
        assert_eq!(parsed["rows_dropped_no_period"], 0);
    }
}

//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the resource provider (local directory or remote folder)
//! - runs the ingestion pipeline
//! - prints summaries/leaderboards/series
//! - writes optional exports

use clap::Parser;

use crate::calc;
use crate::cli::{CalcArgs, Command, LoadArgs, SampleArgs, SourceArgs, TopArgs};
use crate::data::local::LocalDirProvider;
use crate::data::provider::ResourceProvider;
use crate::data::remote::RemoteFolderProvider;
use crate::data::sample::{SampleConfig, write_sample_batch};
use crate::domain::{IngestOptions, MetricOp, UnifiedTable};
use crate::error::AppError;
use crate::io::export;
use crate::io::ingest::{IngestOutput, ingest};
use crate::norm::period::parse_period;
use crate::report;

/// Entry point for the `btab` binary.
pub fn run() -> Result<(), AppError> {
    // We want bare `btab` (and `btab -d dir`) to behave like `btab load ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Load(args) => handle_load(args),
        Command::Top(args) => handle_top(args),
        Command::Calc(args) => handle_calc(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_load(args: LoadArgs) -> Result<(), AppError> {
    let (output, options) = run_ingest(&args.source)?;

    println!("{}", report::format_run_summary(&output, &options));

    if output.table.is_empty() {
        println!("No usable rows in the batch; nothing to export.");
        return Ok(());
    }

    if let Some(path) = &args.export {
        let delimiter = parse_export_delimiter(&args.export_delimiter)?;
        export::write_table_csv(path, &output.table, delimiter)?;
        println!("Exported table to '{}'.", path.display());
    }
    if let Some(path) = &args.export_report {
        export::write_report_json(path, &output.report)?;
        println!("Exported run report to '{}'.", path.display());
    }

    Ok(())
}

fn handle_top(args: TopArgs) -> Result<(), AppError> {
    let (output, _) = run_ingest(&args.source)?;
    let table = &output.table;
    require_rows(table)?;
    require_metric(table, &args.metric)?;

    let period = match &args.month {
        Some(month) => parse_period(month)
            .ok_or_else(|| AppError::usage(format!("Invalid month '{month}' (expected YYYYMM).")))?,
        None => {
            // Safe: require_rows guarantees at least one period.
            let (_, last) = table.period_range().ok_or_else(|| no_data())?;
            last
        }
    };

    let ranked = report::top_entities(table, &args.metric, period, args.top);
    if ranked.is_empty() {
        println!(
            "No values for '{}' in {}.",
            args.metric,
            period.format("%Y-%m")
        );
        return Ok(());
    }
    println!("{}", report::format_leaderboard(&args.metric, period, &ranked));
    Ok(())
}

fn handle_calc(args: CalcArgs) -> Result<(), AppError> {
    let (output, _) = run_ingest(&args.source)?;
    let table = &output.table;
    require_rows(table)?;

    require_metric(table, &args.a)?;
    require_metric(table, &args.b)?;
    if let Some(c) = &args.c {
        require_metric(table, c)?;
    }

    let code = match &args.entity {
        Some(selector) => table.find_entity(selector).ok_or_else(|| {
            AppError::usage(format!("No entity matches '{selector}' (code or label)."))
        })?,
        None => {
            let (code, _) = table.entities().into_iter().next().ok_or_else(no_data)?;
            code
        }
    };
    let label = table
        .rows
        .iter()
        .find(|r| r.entity_code_norm == code)
        .map(|r| r.entity_label.clone())
        .unwrap_or_else(|| code.clone());

    let series_a = table.series(&code, &args.a);
    let periods: Vec<_> = series_a.iter().map(|(p, _)| *p).collect();
    let values_a: Vec<_> = series_a.iter().map(|(_, v)| *v).collect();
    let values_b: Vec<_> = table.series(&code, &args.b).iter().map(|(_, v)| *v).collect();

    let mut values = calc::apply_op(&values_a, args.op1, &values_b);
    let mut title = format!("{} {} {}", args.a, op_symbol(args.op1), args.b);
    if let (Some(op2), Some(c)) = (args.op2, &args.c) {
        let values_c: Vec<_> = table.series(&code, c).iter().map(|(_, v)| *v).collect();
        values = calc::apply_op(&values, op2, &values_c);
        title = format!("({title}) {} {c}", op_symbol(op2));
    }
    values = calc::normalize_series(&values, args.normalize);

    let series: Vec<_> = periods.into_iter().zip(values).collect();
    println!(
        "{}",
        report::format_series(&format!("{title} [{label}]"), &series)
    );
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        months: args.months,
        entities: args.entities,
        seed: args.seed,
    };
    let written = write_sample_batch(&args.out, &config)?;
    println!(
        "Wrote {} files to '{}' (seed {}).",
        written.len(),
        args.out.display(),
        args.seed
    );
    Ok(())
}

/// Build the provider and options from CLI flags and run the pipeline.
fn run_ingest(source: &SourceArgs) -> Result<(IngestOutput, IngestOptions), AppError> {
    let provider = make_provider(source)?;
    let options = ingest_options(source);
    let output = ingest(provider.as_ref(), &options)?;
    Ok((output, options))
}

fn make_provider(source: &SourceArgs) -> Result<Box<dyn ResourceProvider>, AppError> {
    if let Some(url) = &source.url {
        return Ok(Box::new(RemoteFolderProvider::new(url)));
    }
    if source.remote {
        return Ok(Box::new(RemoteFolderProvider::from_env()?));
    }
    Ok(Box::new(LocalDirProvider::new(&source.data)))
}

fn ingest_options(source: &SourceArgs) -> IngestOptions {
    IngestOptions {
        roster_candidates: roster_candidates(&source.roster),
        include_aggregates: source.include_aggregates,
        prefer_alias: source.prefer_alias,
        decimal_style: source.decimal,
    }
}

/// Candidate order: the configured name first, then the conventional default.
/// (Provider `fetch` also tries each name inside the data folder.)
fn roster_candidates(roster: &str) -> Vec<String> {
    let mut candidates = vec![roster.to_string()];
    if roster != "Nomina.txt" {
        candidates.push("Nomina.txt".to_string());
    }
    candidates
}

fn require_rows(table: &UnifiedTable) -> Result<(), AppError> {
    if table.is_empty() { Err(no_data()) } else { Ok(()) }
}

fn require_metric(table: &UnifiedTable, metric: &str) -> Result<(), AppError> {
    if table.metric_columns.iter().any(|m| m == metric) {
        return Ok(());
    }
    let mut available = table.metric_columns.join(", ");
    if available.is_empty() {
        available = "none".to_string();
    }
    Err(AppError::usage(format!(
        "Unknown metric '{metric}'. Available: {available}"
    )))
}

fn no_data() -> AppError {
    AppError::new(3, "No usable rows in the batch.")
}

fn parse_export_delimiter(text: &str) -> Result<u8, AppError> {
    match text {
        ";" => Ok(b';'),
        "," => Ok(b','),
        "tab" | "\t" => Ok(b'\t'),
        other => Err(AppError::usage(format!(
            "Invalid export delimiter '{other}' (expected \";\", \",\" or \"tab\")."
        ))),
    }
}

fn op_symbol(op: MetricOp) -> &'static str {
    match op {
        MetricOp::Add => "+",
        MetricOp::Sub => "-",
        MetricOp::Mul => "*",
        MetricOp::Div => "/",
    }
}

/// Rewrite argv so `btab` defaults to `btab load`.
///
/// Rules:
/// - `btab`                    -> `btab load`
/// - `btab -d dir ...`         -> `btab load -d dir ...`
/// - `btab --help/--version`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("load".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "load" | "top" | "calc" | "sample");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "load flags".
    if arg1.starts_with('-') {
        argv.insert(1, "load".to_string());
        return argv;
    }

    // Otherwise, leave as-is (clap will produce the usage error).
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_load() {
        assert_eq!(rewrite_args(args(&["btab"])), args(&["btab", "load"]));
        assert_eq!(
            rewrite_args(args(&["btab", "-d", "data"])),
            args(&["btab", "load", "-d", "data"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["btab", "top", "-m", "ROE"])),
            args(&["btab", "top", "-m", "ROE"])
        );
        assert_eq!(rewrite_args(args(&["btab", "--help"])), args(&["btab", "--help"]));
    }

    #[test]
    fn roster_candidates_always_include_the_default() {
        assert_eq!(
            roster_candidates("custom.txt"),
            vec!["custom.txt".to_string(), "Nomina.txt".to_string()]
        );
        assert_eq!(roster_candidates("Nomina.txt"), vec!["Nomina.txt".to_string()]);
    }
}

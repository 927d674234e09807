//! The `aggregate` command: wires the file-level collaborator contract
//! around the pure pipeline. Reads the input, runs the stages, writes the
//! grouped export, and optionally writes the excluded-rows CSV (in input
//! conventions) and the JSON reconciliation report.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::UTF_8;
use log::{info, warn};

use crate::{
    classify::InclusionPolicy,
    cli::AggregateArgs,
    data::ISO_DATE_FORMAT,
    io_utils,
    pipeline::{self, PipelineOptions, PipelineOutput},
    report::{ReconciliationReport, SkuSelector},
    schema::RenameTable,
};

pub const GROUPED_HEADERS: [&str; 3] = ["Fecha de Venta", "SKU", "Cantidad Total"];
pub const EXCLUSION_REASON_HEADER: &str = "motivo_exclusion";

pub fn execute(args: &AggregateArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(io_utils::DEFAULT_INPUT_DELIMITER);
    let input_encoding = io_utils::resolve_encoding(
        args.input_encoding.as_deref(),
        io_utils::default_input_encoding(),
    )?;
    let options = PipelineOptions {
        renames: RenameTable::with_overrides(&args.renames)?,
        recover_dates: args.recover_dates,
        policy: if args.include_corrected {
            InclusionPolicy::IncludeCorrected
        } else {
            InclusionPolicy::Strict
        },
        selector: SkuSelector::from_arg(args.sku.as_deref()),
    };

    info!(
        "Aggregating '{}' (delimiter '{}', encoding {}, policy {:?})",
        args.input.display(),
        crate::printable_delimiter(delimiter),
        input_encoding.name(),
        options.policy,
    );
    let reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let output = pipeline::run_pipeline(reader, input_encoding, &options)
        .with_context(|| format!("Processing {:?}", args.input))?;

    write_grouped(args, &output)?;
    if let Some(path) = &args.excluded_output {
        write_excluded(path, &output, delimiter, input_encoding)?;
    }
    if let Some(path) = &args.report_output {
        write_report(path, &output.report)?;
    }
    log_summary(&output);
    Ok(())
}

fn write_grouped(args: &AggregateArgs, output: &PipelineOutput) -> Result<()> {
    let delimiter = args
        .output_delimiter
        .unwrap_or(io_utils::DEFAULT_OUTPUT_DELIMITER);
    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), delimiter, UTF_8)?;
    writer
        .write_record(GROUPED_HEADERS)
        .context("Writing grouped headers")?;
    for row in &output.aggregate {
        writer
            .write_record([
                row.sale_date.format(ISO_DATE_FORMAT).to_string(),
                row.sku.clone(),
                row.total_quantity.to_string(),
            ])
            .context("Writing grouped row")?;
    }
    writer.flush().context("Flushing grouped output")?;
    Ok(())
}

/// Excluded rows are exported with their original source columns plus a
/// trailing reason column, using the input delimiter and encoding so the
/// analyst can diff them against the source file directly.
fn write_excluded(
    path: &Path,
    output: &PipelineOutput,
    delimiter: u8,
    encoding: &'static encoding_rs::Encoding,
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path), delimiter, encoding)?;
    let mut headers = output.table.raw.headers.clone();
    headers.push(EXCLUSION_REASON_HEADER.to_string());
    writer
        .write_record(&headers)
        .context("Writing excluded headers")?;
    for record in output.classified.iter().filter(|r| r.class.is_excluded()) {
        let raw = &output.table.raw.rows[record.record.row];
        let mut fields = raw.fields.clone();
        fields.push(record.class.reason().to_string());
        writer
            .write_record(&fields)
            .with_context(|| format!("Writing excluded row from line {}", raw.line))?;
    }
    writer.flush().context("Flushing excluded output")?;
    info!("Excluded rows written to {path:?}");
    Ok(())
}

fn write_report(path: &Path, report: &ReconciliationReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Serializing report")?;
    std::fs::write(path, json).with_context(|| format!("Writing report to {path:?}"))?;
    info!("Reconciliation report written to {path:?}");
    Ok(())
}

fn log_summary(output: &PipelineOutput) {
    let report = &output.report;
    let recovered = output
        .classified
        .iter()
        .filter(|r| r.record.recovered)
        .count();
    info!(
        "Rows for SKU filter '{}': {} ({} valid, {} corrected, {} excluded)",
        report.sku_filter,
        report.rows_considered,
        report.counts.valid,
        report.counts.corrected,
        report.excluded.len(),
    );
    if recovered > 0 {
        info!("Sale dates recovered via order number: {recovered}");
    }
    info!(
        "Total original: {} | total aggregated: {}",
        report.total_original, report.total_aggregated
    );
    for row in &report.excluded {
        warn!("Excluded line {} (SKU {}): {}", row.line, row.sku, row.reason);
    }
}

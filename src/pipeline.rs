//! Stage composition: raw CSV in, aggregate plus reconciliation report out.
//!
//! The pipeline is a pure function of (decoded rows, rename table, policy,
//! selector). Each stage owns its output outright; nothing mutates an
//! earlier stage's collection, so any aggregate cell can be traced back to
//! the raw rows that produced it. Terminal failures (`Io`, `Parse`,
//! `Schema`) happen before any aggregate is produced; bad fields within a
//! row are data, not errors.

use std::io::Read;

use encoding_rs::Encoding;
use log::debug;

use crate::{
    aggregate::aggregate,
    classify::{InclusionPolicy, classify},
    data::{AggregateRow, ClassifiedRecord, RawRow, RawTable, TypedRecord, parse_quantity,
        parse_sale_date},
    error::PipelineError,
    io_utils,
    recover::recover_dates,
    report::{ReconciliationReport, SkuSelector, build_report},
    schema::{CanonicalTable, RenameTable, normalize},
};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub renames: RenameTable,
    pub recover_dates: bool,
    pub policy: InclusionPolicy,
    pub selector: SkuSelector,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            renames: RenameTable::default(),
            recover_dates: false,
            policy: InclusionPolicy::Strict,
            selector: SkuSelector::All,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: CanonicalTable,
    pub classified: Vec<ClassifiedRecord>,
    pub aggregate: Vec<AggregateRow>,
    pub report: ReconciliationReport,
}

/// Runs the full pipeline over an open CSV reader.
pub fn run_pipeline<R: Read>(
    reader: csv::Reader<R>,
    encoding: &'static Encoding,
    options: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    let raw = read_raw(reader, encoding)?;
    debug!("Read {} data row(s)", raw.rows.len());

    let table = normalize(raw, &options.renames, options.recover_dates)?;
    let typed = coerce_records(&table);
    let typed = if options.recover_dates {
        recover_dates(typed)
    } else {
        typed
    };
    let classified = classify(typed, options.policy);
    let aggregate = aggregate(&classified);
    let report = build_report(&classified, &aggregate, &options.selector);

    Ok(PipelineOutput {
        table,
        classified,
        aggregate,
        report,
    })
}

/// Reads and decodes every row up front. Structural CSV errors or
/// undecodable bytes abort the run before any stage output exists.
fn read_raw<R: Read>(
    mut reader: csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<RawTable, PipelineError> {
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record?;
        let fields = io_utils::decode_record(&record, encoding)?;
        rows.push(RawRow {
            line: idx as u64 + 2,
            fields,
        });
    }
    Ok(RawTable { headers, rows })
}

/// Coerces each canonical row into a typed record. Failures become null
/// fields; this step itself cannot fail.
pub fn coerce_records(table: &CanonicalTable) -> Vec<TypedRecord> {
    let index = table.index;
    table
        .raw
        .rows
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            let field = |pos: usize| raw.fields.get(pos).map(String::as_str).unwrap_or("");
            let order_id = index.order_id.map(field).map(str::trim).and_then(|id| {
                (!id.is_empty()).then(|| id.to_string())
            });
            TypedRecord {
                row,
                line: raw.line,
                sku: field(index.sku).trim().to_string(),
                quantity: parse_quantity(field(index.quantity)),
                sale_date: parse_sale_date(field(index.sale_date)),
                order_id,
                recovered: false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use encoding_rs::WINDOWS_1252;
    use rust_decimal::Decimal;
    use std::io::Cursor;

    fn run(input: &[u8], options: &PipelineOptions) -> Result<PipelineOutput, PipelineError> {
        let reader = io_utils::open_csv_reader(Cursor::new(input.to_vec()), b';');
        run_pipeline(reader, WINDOWS_1252, options)
    }

    #[test]
    fn coercion_failures_become_null_fields() {
        let input = b"Fecha;SKU;Cantidad del producto\n01/01/2024;EC_237;abc\nbogus;EC_237;4\n";
        let output = run(input, &PipelineOptions::default()).unwrap();
        let typed: Vec<&TypedRecord> =
            output.classified.iter().map(|c| &c.record).collect();
        assert_eq!(typed[0].quantity, None);
        assert_eq!(
            typed[0].sale_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(typed[1].quantity, Some(Decimal::from(4)));
        assert_eq!(typed[1].sale_date, None);
    }

    #[test]
    fn ragged_rows_are_a_parse_error() {
        let input = b"Fecha;SKU;Cantidad del producto\n01/01/2024;EC_237\n";
        let err = run(input, &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn missing_required_columns_abort_before_any_output() {
        let input = b"Fecha;Cantidad del producto\n01/01/2024;5\n";
        let err = run(input, &PipelineOptions::default()).unwrap_err();
        match err {
            PipelineError::Schema { missing } => assert_eq!(missing, vec!["sku".to_string()]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn latin1_headers_decode() {
        let mut input = Vec::new();
        input.extend_from_slice(b"Fecha;SKU;Cantidad del producto;N\xFAmero de orden\n");
        input.extend_from_slice(b"01/01/2024;EC_237;5;ORD1\n");
        let options = PipelineOptions {
            recover_dates: true,
            ..PipelineOptions::default()
        };
        let output = run(&input, &options).unwrap();
        assert_eq!(output.classified.len(), 1);
        assert_eq!(
            output.classified[0].record.order_id.as_deref(),
            Some("ORD1")
        );
    }

    #[test]
    fn pipeline_is_deterministic() {
        let input = b"Fecha;SKU;Cantidad del producto;N\xC3\xBAmero de orden\n\
            ;EC_237;5;ORD1\n01/02/2024;EC_237;3;ORD1\n02/02/2024;EC_101;1;ORD2\n";
        let options = PipelineOptions {
            recover_dates: true,
            ..PipelineOptions::default()
        };
        let reader = io_utils::open_csv_reader(Cursor::new(input.to_vec()), b';');
        let first = run_pipeline(reader, encoding_rs::UTF_8, &options).unwrap();
        let reader = io_utils::open_csv_reader(Cursor::new(input.to_vec()), b';');
        let second = run_pipeline(reader, encoding_rs::UTF_8, &options).unwrap();
        assert_eq!(first.classified, second.classified);
        assert_eq!(first.aggregate, second.aggregate);
        assert_eq!(first.report, second.report);
    }
}

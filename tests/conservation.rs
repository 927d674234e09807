//! Property tests for the accounting invariants: no unit is ever silently
//! lost or invented, whatever shape the input rows take.

use std::io::Cursor;

use proptest::prelude::*;
use rust_decimal::Decimal;

use sales_recon::{
    classify::InclusionPolicy,
    io_utils,
    pipeline::{PipelineOptions, run_pipeline},
};

#[derive(Debug, Clone)]
struct InputRow {
    date: String,
    sku: String,
    quantity: String,
    order_id: String,
}

fn row_strategy() -> impl Strategy<Value = InputRow> {
    let date = prop_oneof![
        Just("01/01/2024".to_string()),
        Just("15/06/2024".to_string()),
        Just("31/12/2024".to_string()),
        Just(String::new()),
        Just("garbage".to_string()),
        Just("99/99/2024".to_string()),
    ];
    let sku = prop_oneof![
        Just("EC_101".to_string()),
        Just("EC_237".to_string()),
        Just("EC_500".to_string()),
    ];
    let quantity = prop_oneof![
        (-5i64..50).prop_map(|q| q.to_string()),
        Just(String::new()),
        Just("abc".to_string()),
        Just("3,5".to_string()),
    ];
    let order_id = prop_oneof![
        Just(String::new()),
        Just("ORD1".to_string()),
        Just("ORD2".to_string()),
        Just("ORD3".to_string()),
    ];
    (date, sku, quantity, order_id).prop_map(|(date, sku, quantity, order_id)| InputRow {
        date,
        sku,
        quantity,
        order_id,
    })
}

fn render_csv(rows: &[InputRow]) -> Vec<u8> {
    let mut out = String::from("Fecha;SKU;Cantidad del producto;Orden\n");
    for row in rows {
        out.push_str(&format!(
            "{};{};{};{}\n",
            row.date, row.sku, row.quantity, row.order_id
        ));
    }
    out.into_bytes()
}

proptest! {
    #[test]
    fn quantities_are_conserved_under_include_corrected(rows in prop::collection::vec(row_strategy(), 0..40)) {
        let input = render_csv(&rows);
        let options = PipelineOptions {
            renames: sales_recon::schema::RenameTable::with_overrides(
                &["Orden=order_id".to_string()],
            ).unwrap(),
            recover_dates: true,
            policy: InclusionPolicy::IncludeCorrected,
            ..PipelineOptions::default()
        };
        let reader = io_utils::open_csv_reader(Cursor::new(input), b';');
        let output = run_pipeline(reader, encoding_rs::UTF_8, &options).unwrap();

        let typed_total: Decimal = output
            .classified
            .iter()
            .map(|r| r.record.quantity.unwrap_or(Decimal::ZERO))
            .sum();
        let excluded_total: Decimal = output
            .classified
            .iter()
            .filter(|r| r.class.is_excluded())
            .map(|r| r.record.quantity.unwrap_or(Decimal::ZERO))
            .sum();
        let aggregated_total: Decimal = output
            .aggregate
            .iter()
            .map(|row| row.total_quantity)
            .sum();

        prop_assert_eq!(excluded_total + aggregated_total, typed_total);
    }

    #[test]
    fn every_row_ends_in_exactly_one_class(rows in prop::collection::vec(row_strategy(), 0..40)) {
        let input = render_csv(&rows);
        for policy in [InclusionPolicy::Strict, InclusionPolicy::IncludeCorrected] {
            let options = PipelineOptions {
                renames: sales_recon::schema::RenameTable::with_overrides(
                    &["Orden=order_id".to_string()],
                ).unwrap(),
                recover_dates: true,
                policy,
                ..PipelineOptions::default()
            };
            let reader = io_utils::open_csv_reader(Cursor::new(input.clone()), b';');
            let output = run_pipeline(reader, encoding_rs::UTF_8, &options).unwrap();

            prop_assert_eq!(output.classified.len(), rows.len());
            let counts = &output.report.counts;
            let classified_total = counts.valid
                + counts.corrected
                + counts.null_quantity
                + counts.null_date
                + counts.nonpositive_quantity;
            prop_assert_eq!(classified_total, rows.len());
        }
    }
}

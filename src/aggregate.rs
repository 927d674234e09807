//! Grouped summation of included rows.
//!
//! Valid and corrected rows are grouped by the exact (sale_date, sku) pair
//! and their quantities summed with `Decimal` arithmetic, so integer unit
//! counts never drift. Output rows are ordered by sale date ascending, then
//! SKU ascending (the `BTreeMap` key order).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::data::{AggregateRow, ClassifiedRecord};

pub fn aggregate(records: &[ClassifiedRecord]) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(NaiveDate, String), Decimal> = BTreeMap::new();
    for record in records {
        let (Some(date), Some(quantity)) = (record.effective_date(), record.effective_quantity())
        else {
            continue;
        };
        *groups
            .entry((date, record.record.sku.clone()))
            .or_insert(Decimal::ZERO) += quantity;
    }
    groups
        .into_iter()
        .map(|((sale_date, sku), total_quantity)| AggregateRow {
            sale_date,
            sku,
            total_quantity,
        })
        .collect()
}

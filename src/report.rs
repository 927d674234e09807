//! Reconciliation reporting: proves no silent data loss.
//!
//! For a SKU selector (exact match or all), the report compares the total
//! quantity present in the typed input (null counted as zero) against the
//! total that survived into the aggregate, and lists every excluded row
//! with its reason. Pure, read-only, deterministic.

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::{AggregateRow, ClassifiedRecord, RowClass};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkuSelector {
    All,
    Exact(String),
}

impl SkuSelector {
    pub fn from_arg(sku: Option<&str>) -> Self {
        match sku.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sku) => SkuSelector::Exact(sku.to_string()),
            None => SkuSelector::All,
        }
    }

    pub fn matches(&self, sku: &str) -> bool {
        match self {
            SkuSelector::All => true,
            SkuSelector::Exact(wanted) => wanted == sku,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SkuSelector::All => "all".to_string(),
            SkuSelector::Exact(sku) => sku.clone(),
        }
    }
}

/// An excluded row as it appears in the report, traceable to its source line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExcludedRow {
    pub line: u64,
    pub sku: String,
    pub quantity: Option<Decimal>,
    pub sale_date: Option<NaiveDate>,
    pub order_id: Option<String>,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ClassCounts {
    pub valid: usize,
    pub corrected: usize,
    pub null_quantity: usize,
    pub null_date: usize,
    pub nonpositive_quantity: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub sku_filter: String,
    pub rows_considered: usize,
    pub total_original: Decimal,
    pub total_aggregated: Decimal,
    pub counts: ClassCounts,
    pub excluded: Vec<ExcludedRow>,
}

pub fn build_report(
    classified: &[ClassifiedRecord],
    aggregate: &[AggregateRow],
    selector: &SkuSelector,
) -> ReconciliationReport {
    let selected = || {
        classified
            .iter()
            .filter(|record| selector.matches(&record.record.sku))
    };

    let total_original = selected()
        .map(|record| record.record.quantity.unwrap_or(Decimal::ZERO))
        .sum();
    let total_aggregated = aggregate
        .iter()
        .filter(|row| selector.matches(&row.sku))
        .map(|row| row.total_quantity)
        .sum();

    let by_class = selected().counts_by(|record| record.class);
    let counts = ClassCounts {
        valid: by_class.get(&RowClass::Valid).copied().unwrap_or(0),
        corrected: by_class.get(&RowClass::Corrected).copied().unwrap_or(0),
        null_quantity: by_class.get(&RowClass::NullQuantity).copied().unwrap_or(0),
        null_date: by_class.get(&RowClass::NullDate).copied().unwrap_or(0),
        nonpositive_quantity: by_class
            .get(&RowClass::NonPositiveQuantity)
            .copied()
            .unwrap_or(0),
    };

    let excluded = selected()
        .filter(|record| record.class.is_excluded())
        .map(|record| ExcludedRow {
            line: record.record.line,
            sku: record.record.sku.clone(),
            quantity: record.record.quantity,
            sale_date: record.record.sale_date,
            order_id: record.record.order_id.clone(),
            reason: record.class.reason(),
        })
        .collect();

    ReconciliationReport {
        sku_filter: selector.describe(),
        rows_considered: selected().count(),
        total_original,
        total_aggregated,
        counts,
        excluded,
    }
}

//! Record types for each pipeline stage plus the coercion primitives that
//! turn raw text into typed quantity and sale-date values.
//!
//! Coercion never raises for a single bad row: an unparsable quantity or date
//! becomes `None` and is accounted for during classification. Sale dates are
//! parsed strictly; anything that does not match a known exact pattern stays
//! null rather than being guessed.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Date pattern used by the upstream sales export.
pub const SALE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Date pattern used by our own grouped export, accepted on re-ingest.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Substituted for null sale dates when the include-corrected policy is on.
pub const SENTINEL_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => panic!("sentinel date is valid"),
};

/// One decoded input row, tagged with its 1-based source line for audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: u64,
    pub fields: Vec<String>,
}

/// Decoded header row plus all data rows, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// A row after type coercion. `row` indexes into the originating table so
/// every downstream record can be traced back to its raw fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedRecord {
    pub row: usize,
    pub line: u64,
    pub sku: String,
    pub quantity: Option<Decimal>,
    pub sale_date: Option<NaiveDate>,
    pub order_id: Option<String>,
    /// True when the sale date was filled in by the order-number join.
    pub recovered: bool,
}

/// Outcome of classification; every typed record lands in exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowClass {
    Valid,
    NullQuantity,
    NullDate,
    NonPositiveQuantity,
    Corrected,
}

impl RowClass {
    pub fn is_included(self) -> bool {
        matches!(self, RowClass::Valid | RowClass::Corrected)
    }

    pub fn is_excluded(self) -> bool {
        !self.is_included()
    }

    /// Reason token written to the excluded-rows export.
    pub fn reason(self) -> &'static str {
        match self {
            RowClass::Valid => "valida",
            RowClass::NullQuantity => "cantidad-invalida",
            RowClass::NullDate => "fecha-invalida",
            RowClass::NonPositiveQuantity => "cantidad-no-positiva",
            RowClass::Corrected => "corregida",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub record: TypedRecord,
    pub class: RowClass,
}

impl ClassifiedRecord {
    /// Quantity contributed to the aggregate: the parsed quantity for valid
    /// rows, zero for corrected rows with a null quantity, none otherwise.
    pub fn effective_quantity(&self) -> Option<Decimal> {
        match self.class {
            RowClass::Valid => self.record.quantity,
            RowClass::Corrected => Some(self.record.quantity.unwrap_or(Decimal::ZERO)),
            _ => None,
        }
    }

    /// Grouping date for the aggregate: the sentinel stands in for null dates
    /// on corrected rows.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        match self.class {
            RowClass::Valid => self.record.sale_date,
            RowClass::Corrected => Some(self.record.sale_date.unwrap_or(SENTINEL_DATE)),
            _ => None,
        }
    }
}

/// One cell of the grouped output: total units for a (date, SKU) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub sale_date: NaiveDate,
    pub sku: String,
    pub total_quantity: Decimal,
}

/// Parses a quantity field. Empty, non-numeric, or locale-mismatched text
/// (e.g. a comma decimal separator) yields `None`.
pub fn parse_quantity(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Parses a sale date. Accepts the upstream `%d/%m/%Y` pattern and our own
/// ISO export pattern, nothing else; out-of-range or malformed text is null.
pub fn parse_sale_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in [SALE_DATE_FORMAT, ISO_DATE_FORMAT] {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    None
}

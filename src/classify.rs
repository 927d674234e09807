//! Row classification under a configurable inclusion policy.
//!
//! Rules apply in a fixed order: null quantity, then null date (after the
//! recovery attempt), then non-positive quantity, otherwise valid. The
//! include-corrected policy downgrades the two null exclusions to
//! `Corrected` so that every input row contributes to the aggregate;
//! non-positive quantities stay excluded under every policy.

use rust_decimal::Decimal;

use crate::data::{ClassifiedRecord, RowClass, TypedRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InclusionPolicy {
    /// Exclude rows with null or non-positive fields (the default).
    #[default]
    Strict,
    /// Reclassify null-quantity and null-date rows as corrected, with
    /// quantity zero and the sentinel date substituted.
    IncludeCorrected,
}

pub fn classify(records: Vec<TypedRecord>, policy: InclusionPolicy) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| {
            let class = classify_one(&record, policy);
            ClassifiedRecord { record, class }
        })
        .collect()
}

fn classify_one(record: &TypedRecord, policy: InclusionPolicy) -> RowClass {
    let base = match (record.quantity, record.sale_date) {
        (None, _) => RowClass::NullQuantity,
        (Some(_), None) => RowClass::NullDate,
        (Some(quantity), Some(_)) if quantity <= Decimal::ZERO => RowClass::NonPositiveQuantity,
        (Some(_), Some(_)) => RowClass::Valid,
    };
    match (policy, base) {
        (InclusionPolicy::IncludeCorrected, RowClass::NullQuantity | RowClass::NullDate) => {
            RowClass::Corrected
        }
        (_, class) => class,
    }
}

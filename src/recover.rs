//! Date recovery by join on the order number.
//!
//! Rows that parsed without a sale date can borrow one from another row of
//! the same order: the donor map holds the first date seen per order number
//! in input order, which keeps the join deterministic even when donors
//! disagree. Only the date is ever patched; quantities are never recovered,
//! and the combined sequence keeps its original ordering.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;

use crate::data::TypedRecord;

pub fn recover_dates(records: Vec<TypedRecord>) -> Vec<TypedRecord> {
    let mut donors: HashMap<String, NaiveDate> = HashMap::new();
    for record in &records {
        if let (Some(order_id), Some(date)) = (&record.order_id, record.sale_date) {
            donors.entry(order_id.clone()).or_insert(date);
        }
    }

    let mut recovered = 0usize;
    let records = records
        .into_iter()
        .map(|mut record| {
            if record.sale_date.is_none()
                && let Some(order_id) = &record.order_id
                && let Some(date) = donors.get(order_id)
            {
                record.sale_date = Some(*date);
                record.recovered = true;
                recovered += 1;
            }
            record
        })
        .collect();
    debug!("Recovered {recovered} sale date(s) via order-number join");
    records
}

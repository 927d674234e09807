//! Column renaming and required-field validation.
//!
//! Source headers are mapped to canonical semantic field names through a
//! rename table; unmapped columns pass through untouched. After renaming,
//! the required set must resolve or the run fails naming every missing
//! field at once, so the analyst can fix the source file in one pass.

use crate::{
    data::RawTable,
    error::PipelineError,
};

pub const FIELD_SALE_DATE: &str = "sale_date";
pub const FIELD_SKU: &str = "sku";
pub const FIELD_QUANTITY: &str = "quantity";
pub const FIELD_ORDER_ID: &str = "order_id";

/// Ordered source-header → canonical-field mapping. Entries earlier in the
/// list win, so CLI overrides are prepended to the defaults.
#[derive(Debug, Clone)]
pub struct RenameTable {
    entries: Vec<(String, String)>,
}

impl Default for RenameTable {
    fn default() -> Self {
        let entries = [
            ("Fecha", FIELD_SALE_DATE),
            ("SKU", FIELD_SKU),
            ("Cantidad del producto", FIELD_QUANTITY),
            ("Número de orden", FIELD_ORDER_ID),
        ]
        .into_iter()
        .map(|(source, field)| (source.to_string(), field.to_string()))
        .collect();
        Self { entries }
    }
}

impl RenameTable {
    /// Builds the default table with `Header=field` overrides applied ahead
    /// of the built-in entries.
    pub fn with_overrides(overrides: &[String]) -> anyhow::Result<Self> {
        let mut entries = Vec::with_capacity(overrides.len());
        for spec in overrides {
            let (source, field) = spec.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("Invalid rename '{spec}'; expected the form 'Header=field'")
            })?;
            let source = source.trim();
            let field = field.trim();
            if source.is_empty() || field.is_empty() {
                anyhow::bail!("Invalid rename '{spec}'; header and field must be non-empty");
            }
            entries.push((source.to_string(), field.to_string()));
        }
        entries.extend(RenameTable::default().entries);
        Ok(Self { entries })
    }

    /// Canonical name for a source header; headers without a mapping pass
    /// through unchanged.
    pub fn apply(&self, header: &str) -> String {
        self.entries
            .iter()
            .find(|(source, _)| source == header.trim())
            .map(|(_, field)| field.clone())
            .unwrap_or_else(|| header.to_string())
    }
}

/// Positions of the canonical fields within a renamed header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIndex {
    pub sale_date: usize,
    pub sku: usize,
    pub quantity: usize,
    pub order_id: Option<usize>,
}

/// Raw rows plus renamed headers and resolved field positions. Owns the raw
/// table so every record can be traced back to its source fields.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    pub headers: Vec<String>,
    pub index: FieldIndex,
    pub raw: RawTable,
}

/// Applies renames to a header row and validates the required field set.
/// `order_id` joins the required set only when date recovery is requested.
pub fn resolve_fields(
    headers: &[String],
    renames: &RenameTable,
    require_order_id: bool,
) -> Result<FieldIndex, PipelineError> {
    let renamed: Vec<String> = headers.iter().map(|h| renames.apply(h)).collect();
    let position = |field: &str| renamed.iter().position(|name| name == field);

    let sale_date = position(FIELD_SALE_DATE);
    let sku = position(FIELD_SKU);
    let quantity = position(FIELD_QUANTITY);
    let order_id = position(FIELD_ORDER_ID);

    let mut missing = Vec::new();
    for (field, found) in [
        (FIELD_SALE_DATE, sale_date),
        (FIELD_SKU, sku),
        (FIELD_QUANTITY, quantity),
    ] {
        if found.is_none() {
            missing.push(field.to_string());
        }
    }
    if require_order_id && order_id.is_none() {
        missing.push(FIELD_ORDER_ID.to_string());
    }
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }

    // The positions are present by the check above.
    match (sale_date, sku, quantity) {
        (Some(sale_date), Some(sku), Some(quantity)) => Ok(FieldIndex {
            sale_date,
            sku,
            quantity,
            order_id,
        }),
        _ => Err(PipelineError::Schema { missing }),
    }
}

/// Renames the table's headers and resolves the required fields, producing
/// the canonical view consumed by the rest of the pipeline.
pub fn normalize(
    raw: RawTable,
    renames: &RenameTable,
    require_order_id: bool,
) -> Result<CanonicalTable, PipelineError> {
    let index = resolve_fields(&raw.headers, renames, require_order_id)?;
    let headers = raw.headers.iter().map(|h| renames.apply(h)).collect();
    Ok(CanonicalTable {
        headers,
        index,
        raw,
    })
}

// Sub-table rows (land parcels, residents, ...)
//
// A table entity is kept in memory as a row list, serialized to a JSON string
// and stored as a single FormValues entry, then parsed back only when read or
// submitted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One row of an array sub-form. `fields` holds the entity-specific scalars;
/// `id` is local-only and regenerated on decode paths that lack one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubFormRow {
    #[serde(default = "new_row_id")]
    pub id: String,
    /// 1-based position within the table.
    #[serde(default)]
    pub serial_number: u32,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

impl SubFormRow {
    pub fn new(serial_number: u32, fields: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            id: new_row_id(),
            serial_number,
            fields,
        }
    }
}

/// Serialize a row list for storage in one FormValues entry.
pub fn encode_rows(rows: &[SubFormRow]) -> String {
    serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a stored row list back. Blank input is an empty table; anything else
/// must be a JSON array of rows.
pub fn decode_rows(raw: &str) -> Result<Vec<SubFormRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).with_context(|| "Failed to parse stored sub-table rows")
}

/// Reassign 1-based serial numbers after insert/delete.
pub fn renumber(rows: &mut [SubFormRow]) {
    for (idx, row) in rows.iter_mut().enumerate() {
        row.serial_number = (idx + 1) as u32;
    }
}

// Record loading and normalization
//
// Fetches an existing record through the management service and coalesces it
// into form values. The engine is permissive here: fields absent or of an
// unexpected shape in the response become empty text / false, so a partially
// populated backend record never crashes the wizard.
//
// A load carries a cancellation token set when the wizard unmounts or its
// record identifier changes; a response arriving after cancellation is
// discarded rather than applied.

use log::{debug, info};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::cascade::CascadeResolver;
use crate::models::{
    encode_rows, DisplayShadow, FieldKind, FieldValue, FormSchema, FormValues, SubFormRow,
    SubTableBinding,
};

use super::management::{ManagementAction, ManagementService, ServiceError};

/// Values and display shadows recovered from a READ_ONE response.
#[derive(Debug, Clone)]
pub struct LoadedRecord {
    pub values: FormValues,
    pub shadows: DisplayShadow,
}

/// Fetch and normalize one record. `Ok(None)` means the load was superseded
/// and its result must not be applied.
pub async fn load_record(
    service: &dyn ManagementService,
    schema: &FormSchema,
    resolver: Option<&CascadeResolver>,
    record_id: &str,
    token: &CancellationToken,
) -> Result<Option<LoadedRecord>, ServiceError> {
    if token.is_cancelled() {
        return Ok(None);
    }

    let response = tokio::select! {
        _ = token.cancelled() => {
            debug!("[PHASE: load] [STEP: read_one] superseded before the response arrived");
            return Ok(None);
        }
        result = service.invoke(ManagementAction::ReadOne, json!({ "id": record_id })) => result?,
    };

    // The identifier may have changed while the response was in flight.
    if token.is_cancelled() {
        debug!("[PHASE: load] [STEP: read_one] superseded, discarding the response");
        return Ok(None);
    }

    let values = normalize_record(schema, &response.data);
    let shadows = resolver
        .map(|r| r.seed_shadows(&values))
        .unwrap_or_default();
    info!(
        "[PHASE: load] [STEP: read_one] normalized record ({} field(s))",
        values.len()
    );
    Ok(Some(LoadedRecord { values, shadows }))
}

/// Coalesce a response object into form values, field by declared field.
pub fn normalize_record(schema: &FormSchema, data: &Value) -> FormValues {
    let mut values = FormValues::new();

    for step in &schema.steps {
        for field in &step.fields {
            if let Some(binding) = schema.sub_table_covering(&field.name) {
                if binding.field == field.name {
                    values.insert(field.name.clone(), decode_sub_table(binding, data));
                    values.insert(
                        binding.certified_field.clone(),
                        FieldValue::flag(truthy(data.get(&binding.certified_key))),
                    );
                }
                continue;
            }

            let raw = data.get(&field.name);
            let value = match field.kind {
                FieldKind::Checkbox => FieldValue::flag(truthy(raw)),
                _ => FieldValue::text(coalesce_text(raw)),
            };
            values.insert(field.name.clone(), value);
        }
    }

    values
}

/// Saved sub-table arrays come back under the external key with external row
/// keys; map them back to the local representation (fresh local ids, 1-based
/// serials re-derived from position).
fn decode_sub_table(binding: &SubTableBinding, data: &Value) -> FieldValue {
    let Some(Value::Array(items)) = data.get(&binding.payload_key) else {
        return FieldValue::text("");
    };

    let rows: Vec<SubFormRow> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let object = item.as_object()?;
            let mut fields = std::collections::BTreeMap::new();
            for (local, external) in &binding.column_map {
                if local == "serialNumber" {
                    continue;
                }
                if let Some(value) = object.get(external) {
                    fields.insert(local.clone(), value.clone());
                }
            }
            Some(SubFormRow::new((idx + 1) as u32, fields))
        })
        .collect();

    FieldValue::text(encode_rows(&rows))
}

fn coalesce_text(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn truthy(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

// Submission mapper
//
// Slices the in-memory form into per-step partial payloads or one aggregate
// payload. A partial payload's key set is a strict function of the step's
// declared fields plus its sub-table/constant keys; it never carries keys
// owned by a different step.

use chrono::NaiveDate;
use log::warn;
use serde_json::{Map, Value};

use crate::models::{
    decode_rows, FieldDescriptor, FieldKind, FormSchema, FormValues, StepDescriptor,
    SubTableBinding,
};
use crate::validation::DATE_FORMAT;

/// Build the partial payload for one step's save action.
pub fn build_partial_payload(
    step: &StepDescriptor,
    schema: &FormSchema,
    values: &FormValues,
) -> Map<String, Value> {
    let mut payload = Map::new();

    for field in &step.fields {
        if let Some(binding) = schema.sub_table_covering(&field.name) {
            // The binding is attached once, keyed off its JSON field; the
            // certification checkbox rides along as the sibling flag.
            if binding.field == field.name {
                attach_sub_table(&mut payload, binding, values);
            }
            continue;
        }
        encode_field(&mut payload, field, values);
    }

    payload
}

/// Union of every step's partial payload plus the schema's fixed constants.
pub fn build_full_payload(
    schema: &FormSchema,
    step_ids: &[u32],
    values: &FormValues,
) -> Map<String, Value> {
    let mut payload = Map::new();
    for step_id in step_ids {
        if let Some(step) = schema.step(*step_id) {
            payload.extend(build_partial_payload(step, schema, values));
        }
    }
    for (key, value) in &schema.constants {
        payload.insert(key.clone(), value.clone());
    }
    payload
}

fn encode_field(payload: &mut Map<String, Value>, field: &FieldDescriptor, values: &FormValues) {
    let value = values.get(&field.name);

    let encoded = match field.kind {
        FieldKind::Checkbox => Value::Bool(value.map(|v| v.as_flag()).unwrap_or(false)),
        FieldKind::Date => Value::String(canonical_date(
            value.map(|v| v.as_text()).unwrap_or(""),
        )),
        FieldKind::ShortText
        | FieldKind::Email
        | FieldKind::Phone
        | FieldKind::LongText
        | FieldKind::Select => {
            Value::String(value.map(|v| v.as_text().trim().to_string()).unwrap_or_default())
        }
    };

    // Designated numeric-looking fields additionally carry the parsed integer
    // under the counter key, alongside the original string.
    if let Some(counter_key) = &field.counter_key {
        let count = value
            .map(|v| v.as_text().trim().parse::<i64>().unwrap_or(0))
            .unwrap_or(0);
        payload.insert(counter_key.clone(), Value::Number(count.into()));
    }

    payload.insert(field.name.clone(), encoded);
}

/// Normalize a stored date to the canonical calendar-date string. Accepts the
/// canonical form and the day-first picker form; anything else passes through
/// trimmed (validation has already flagged it inline).
fn canonical_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    for format in [DATE_FORMAT, "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format(DATE_FORMAT).to_string();
        }
    }
    trimmed.to_string()
}

fn attach_sub_table(
    payload: &mut Map<String, Value>,
    binding: &SubTableBinding,
    values: &FormValues,
) {
    let raw = values
        .get(&binding.field)
        .map(|v| v.as_text())
        .unwrap_or("");
    let rows = match decode_rows(raw) {
        Ok(rows) => rows,
        Err(err) => {
            // A corrupt stored table becomes an empty one rather than a crash.
            warn!(
                "[PHASE: submission] [STEP: sub_table] discarding malformed rows for '{}': {err:#}",
                binding.field
            );
            Vec::new()
        }
    };

    let renamed: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut out = Map::new();
            for (local, external) in &binding.column_map {
                let value = if local == "serialNumber" {
                    Value::Number(row.serial_number.into())
                } else {
                    row.fields.get(local).cloned().unwrap_or(Value::String(String::new()))
                };
                out.insert(external.clone(), value);
            }
            Value::Object(out)
        })
        .collect();

    payload.insert(binding.payload_key.clone(), Value::Array(renamed));
    payload.insert(
        binding.certified_key.clone(),
        Value::Bool(
            values
                .get(&binding.certified_field)
                .map(|v| v.as_flag())
                .unwrap_or(false),
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{encode_rows, FieldValue, SubFormRow};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn values(pairs: &[(&str, FieldValue)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn schema() -> FormSchema {
        let mut constants = Map::new();
        constants.insert("recordSubType".to_string(), json!("REG-07"));
        FormSchema::linear(
            "institution",
            vec![
                StepDescriptor::new(
                    1,
                    "Identity",
                    vec![
                        FieldDescriptor::new("name", "Name", FieldKind::ShortText),
                        FieldDescriptor::new("establishedOn", "Established on", FieldKind::Date),
                        FieldDescriptor::new("memberCount", "Members", FieldKind::ShortText)
                            .with_counter_key("memberCountNumber"),
                    ],
                ),
                StepDescriptor::new(
                    2,
                    "Contact",
                    vec![
                        FieldDescriptor::new("email", "Email", FieldKind::Email),
                        FieldDescriptor::new("postalOk", "Postal OK", FieldKind::Checkbox),
                    ],
                ),
                StepDescriptor::new(
                    3,
                    "Land",
                    vec![
                        FieldDescriptor::new("landParcels", "Land parcels", FieldKind::LongText),
                        FieldDescriptor::new(
                            "landParcelsCertified",
                            "Certified",
                            FieldKind::Checkbox,
                        ),
                    ],
                ),
            ],
        )
        .with_sub_tables(vec![SubTableBinding {
            field: "landParcels".to_string(),
            certified_field: "landParcelsCertified".to_string(),
            payload_key: "landList".to_string(),
            certified_key: "landListCertified".to_string(),
            column_map: vec![
                ("serialNumber".to_string(), "slNo".to_string()),
                ("lotNumber".to_string(), "lot_no".to_string()),
                ("extent".to_string(), "extent_text".to_string()),
            ],
        }])
        .with_constants(constants)
    }

    // -------------------------------------------------------------------------
    // Key ownership: partial payload keys map 1:1 to the step's fields
    // -------------------------------------------------------------------------

    #[test]
    fn partial_payload_owns_exactly_the_steps_keys() {
        let schema = schema();
        let vals = values(&[
            ("name", FieldValue::text("Sri Vihara")),
            ("establishedOn", FieldValue::text("1901-02-03")),
            ("memberCount", FieldValue::text("12")),
            ("email", FieldValue::text("leak@other.step")),
        ]);
        let payload = build_partial_payload(schema.step(1).unwrap(), &schema, &vals);

        let mut keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["establishedOn", "memberCount", "memberCountNumber", "name"],
            "Step 1's payload must carry its own keys and never step 2's"
        );
    }

    #[test]
    fn counter_field_carries_parsed_integer_alongside_string() {
        let schema = schema();
        let vals = values(&[("memberCount", FieldValue::text(" 42 "))]);
        let payload = build_partial_payload(schema.step(1).unwrap(), &schema, &vals);
        assert_eq!(payload.get("memberCount"), Some(&json!("42")));
        assert_eq!(payload.get("memberCountNumber"), Some(&json!(42)));
    }

    #[test]
    fn non_numeric_counter_value_parses_to_zero() {
        let schema = schema();
        let vals = values(&[("memberCount", FieldValue::text("many"))]);
        let payload = build_partial_payload(schema.step(1).unwrap(), &schema, &vals);
        assert_eq!(payload.get("memberCountNumber"), Some(&json!(0)));
    }

    // -------------------------------------------------------------------------
    // Type-specific encoding
    // -------------------------------------------------------------------------

    #[test]
    fn dates_are_normalized_to_canonical_form() {
        let schema = schema();
        let vals = values(&[("establishedOn", FieldValue::text("03/02/1901"))]);
        let payload = build_partial_payload(schema.step(1).unwrap(), &schema, &vals);
        assert_eq!(payload.get("establishedOn"), Some(&json!("1901-02-03")));
    }

    #[test]
    fn booleans_pass_through_as_booleans() {
        let schema = schema();
        let vals = values(&[("postalOk", FieldValue::flag(true))]);
        let payload = build_partial_payload(schema.step(2).unwrap(), &schema, &vals);
        assert_eq!(payload.get("postalOk"), Some(&json!(true)));
        assert_eq!(payload.get("email"), Some(&json!("")));
    }

    // -------------------------------------------------------------------------
    // Sub-table attachment
    // -------------------------------------------------------------------------

    fn parcel_rows() -> String {
        let mut fields = BTreeMap::new();
        fields.insert("lotNumber".to_string(), json!("L-42"));
        fields.insert("extent".to_string(), json!("2.5 ha"));
        encode_rows(&[SubFormRow::new(1, fields)])
    }

    #[test]
    fn sub_table_rows_are_renamed_to_external_keys() {
        let schema = schema();
        let vals = values(&[
            ("landParcels", FieldValue::text(&parcel_rows())),
            ("landParcelsCertified", FieldValue::flag(true)),
        ]);
        let payload = build_partial_payload(schema.step(3).unwrap(), &schema, &vals);

        assert_eq!(
            payload.get("landList"),
            Some(&json!([{"slNo": 1, "lot_no": "L-42", "extent_text": "2.5 ha"}])),
            "Local row keys must be renamed to the backend's key set"
        );
        assert_eq!(payload.get("landListCertified"), Some(&json!(true)));
        assert!(
            !payload.contains_key("landParcels") && !payload.contains_key("landParcelsCertified"),
            "The local field names must not leak into the payload"
        );
    }

    #[test]
    fn malformed_sub_table_json_becomes_an_empty_list() {
        let schema = schema();
        let vals = values(&[("landParcels", FieldValue::text("{broken"))]);
        let payload = build_partial_payload(schema.step(3).unwrap(), &schema, &vals);
        assert_eq!(payload.get("landList"), Some(&json!([])));
        assert_eq!(payload.get("landListCertified"), Some(&json!(false)));
    }

    // -------------------------------------------------------------------------
    // Full payload
    // -------------------------------------------------------------------------

    #[test]
    fn full_payload_is_the_union_plus_constants() {
        let schema = schema();
        let vals = values(&[
            ("name", FieldValue::text("Sri Vihara")),
            ("email", FieldValue::text("office@vihara.lk")),
        ]);
        let payload = build_full_payload(&schema, &[1, 2, 3], &vals);
        assert_eq!(payload.get("name"), Some(&json!("Sri Vihara")));
        assert_eq!(payload.get("email"), Some(&json!("office@vihara.lk")));
        assert_eq!(payload.get("landList"), Some(&json!([])));
        assert_eq!(
            payload.get("recordSubType"),
            Some(&json!("REG-07")),
            "Fixed constants ride on the full payload"
        );
    }

    #[test]
    fn full_payload_respects_flow_step_subset() {
        let schema = schema();
        let payload = build_full_payload(&schema, &[1], &FormValues::new());
        assert!(payload.contains_key("name"));
        assert!(
            !payload.contains_key("email"),
            "Steps outside the flow subset contribute nothing"
        );
    }
}

// Review aggregator
//
// Read-only projection over the step descriptors, current values and display
// shadows for the human-readable summary screen. Each section carries its
// owning step id so the caller can wire "Edit" to JumpTo.

use crate::models::{decode_rows, DisplayShadow, FieldKind, FormSchema, FormValues};

/// Glyph shown for fields with no value at all.
pub const EMPTY_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub label: String,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSection {
    /// Step that owns these rows; target for the Edit link.
    pub step_id: u32,
    pub title: String,
    pub rows: Vec<ReviewRow>,
}

/// Build the summary for the given flow subset.
pub fn summarize(
    schema: &FormSchema,
    step_ids: &[u32],
    values: &FormValues,
    shadows: &DisplayShadow,
) -> Vec<ReviewSection> {
    let mut sections = Vec::new();

    for step_id in step_ids {
        let Some(step) = schema.step(*step_id) else {
            continue;
        };
        let mut rows = Vec::new();
        for field in &step.fields {
            if let Some(binding) = schema.sub_table_covering(&field.name) {
                if binding.field == field.name {
                    let raw = values.get(&field.name).map(|v| v.as_text()).unwrap_or("");
                    let count = decode_rows(raw).map(|rows| rows.len()).unwrap_or(0);
                    rows.push(ReviewRow {
                        label: field.label.clone(),
                        display: format!("{count} record(s) entered"),
                    });
                }
                // Certification checkboxes are table plumbing, not summary rows.
                continue;
            }
            rows.push(ReviewRow {
                label: field.label.clone(),
                display: display_value(schema, &field.name, values, shadows),
            });
        }
        sections.push(ReviewSection {
            step_id: step.id,
            title: step.title.clone(),
            rows,
        });
    }

    sections
}

/// Shadow label if cached, else the raw value, else the empty placeholder.
/// Flags render as Yes/No.
fn display_value(
    schema: &FormSchema,
    name: &str,
    values: &FormValues,
    shadows: &DisplayShadow,
) -> String {
    if let Some(field) = schema.field(name) {
        if field.kind == FieldKind::Checkbox {
            let ticked = values.get(name).map(|v| v.as_flag()).unwrap_or(false);
            return if ticked { "Yes" } else { "No" }.to_string();
        }
    }
    if let Some(label) = shadows.get(name) {
        if !label.trim().is_empty() {
            return label.clone();
        }
    }
    match values.get(name) {
        Some(value) if !value.is_empty_text() => value.as_text().trim().to_string(),
        _ => EMPTY_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        encode_rows, FieldDescriptor, FieldValue, StepDescriptor, SubFormRow, SubTableBinding,
    };
    use std::collections::BTreeMap;

    fn schema() -> FormSchema {
        FormSchema::linear(
            "institution",
            vec![
                StepDescriptor::new(
                    1,
                    "Identity",
                    vec![
                        FieldDescriptor::new("name", "Name", FieldKind::ShortText),
                        FieldDescriptor::new("district", "District", FieldKind::Select),
                        FieldDescriptor::new("postalOk", "Accepts post", FieldKind::Checkbox),
                    ],
                ),
                StepDescriptor::new(
                    2,
                    "Land",
                    vec![
                        FieldDescriptor::new("landParcels", "Land records", FieldKind::LongText),
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
            column_map: vec![],
        }])
    }

    #[test]
    fn shadow_wins_over_raw_value() {
        let schema = schema();
        let mut values = FormValues::new();
        values.insert("district".to_string(), FieldValue::text("D1"));
        let mut shadows = DisplayShadow::new();
        shadows.insert("district".to_string(), "Colombo".to_string());

        let sections = summarize(&schema, &[1], &values, &shadows);
        let row = sections[0].rows.iter().find(|r| r.label == "District").unwrap();
        assert_eq!(row.display, "Colombo", "The cached label beats the raw code");
    }

    #[test]
    fn raw_value_used_without_shadow_and_placeholder_when_empty() {
        let schema = schema();
        let mut values = FormValues::new();
        values.insert("name".to_string(), FieldValue::text("Sri Vihara"));

        let sections = summarize(&schema, &[1], &values, &DisplayShadow::new());
        let by_label = |label: &str| {
            sections[0]
                .rows
                .iter()
                .find(|r| r.label == label)
                .unwrap()
                .display
                .clone()
        };
        assert_eq!(by_label("Name"), "Sri Vihara");
        assert_eq!(by_label("District"), EMPTY_PLACEHOLDER);
    }

    #[test]
    fn flags_render_yes_no() {
        let schema = schema();
        let mut values = FormValues::new();
        values.insert("postalOk".to_string(), FieldValue::flag(true));
        let sections = summarize(&schema, &[1], &values, &DisplayShadow::new());
        let row = sections[0].rows.iter().find(|r| r.label == "Accepts post").unwrap();
        assert_eq!(row.display, "Yes");

        values.insert("postalOk".to_string(), FieldValue::flag(false));
        let sections = summarize(&schema, &[1], &values, &DisplayShadow::new());
        let row = sections[0].rows.iter().find(|r| r.label == "Accepts post").unwrap();
        assert_eq!(row.display, "No");
    }

    #[test]
    fn tables_render_a_count_and_hide_the_certification_box() {
        let schema = schema();
        let mut fields = BTreeMap::new();
        fields.insert("lotNumber".to_string(), serde_json::json!("L-1"));
        let rows = encode_rows(&[SubFormRow::new(1, fields.clone()), SubFormRow::new(2, fields)]);
        let mut values = FormValues::new();
        values.insert("landParcels".to_string(), FieldValue::text(&rows));

        let sections = summarize(&schema, &[2], &values, &DisplayShadow::new());
        assert_eq!(sections[0].rows.len(), 1, "Only the table row, no checkbox row");
        assert_eq!(sections[0].rows[0].display, "2 record(s) entered");
        assert_eq!(sections[0].step_id, 2, "Edit links target the owning step");
    }

    #[test]
    fn malformed_table_counts_zero() {
        let schema = schema();
        let mut values = FormValues::new();
        values.insert("landParcels".to_string(), FieldValue::text("{broken"));
        let sections = summarize(&schema, &[2], &values, &DisplayShadow::new());
        assert_eq!(sections[0].rows[0].display, "0 record(s) entered");
    }
}

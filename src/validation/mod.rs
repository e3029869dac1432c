// Validation engine
//
// Pure functions over descriptors + current values. Per field, the first
// failing check wins; per form, every field error is accumulated so the whole
// picture is flagged before navigation jumps to the first invalid step.

use chrono::NaiveDate;

use crate::models::{
    ErrorMap, FieldDescriptor, FieldKind, FieldValue, FormSchema, FormValues, StepDescriptor,
};

pub const MSG_REQUIRED: &str = "Required";
pub const MSG_FUTURE_DATE: &str = "Date cannot be in the future";
pub const MSG_INVALID_DATE: &str = "Enter a valid date";

/// Canonical calendar-date format used across stored values and payloads.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate one field against the current values. Returns the first failing
/// rule's message; `None` means valid.
///
/// Check order: required, date boundary, pattern, custom.
pub fn validate_field(
    field: &FieldDescriptor,
    value: Option<&FieldValue>,
    all: &FormValues,
    today: NaiveDate,
) -> Option<String> {
    let empty = FieldValue::Text(String::new());
    let value = value.unwrap_or(&empty);

    if field.rules.required {
        let missing = match field.kind {
            // A required certification/consent box must actually be ticked.
            FieldKind::Checkbox => !value.as_flag(),
            _ => value.is_empty_text(),
        };
        if missing {
            return Some(MSG_REQUIRED.to_string());
        }
    }

    if field.kind == FieldKind::Date && field.rules.max_date_is_today {
        let raw = value.as_text().trim();
        if !raw.is_empty() {
            match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) if date > today => return Some(MSG_FUTURE_DATE.to_string()),
                Ok(_) => {}
                Err(_) => return Some(MSG_INVALID_DATE.to_string()),
            }
        }
    }

    if let Some(pattern) = &field.rules.pattern {
        let raw = value.as_text();
        if !raw.trim().is_empty() && !pattern.matches.is_match(raw) {
            return Some(pattern.message.clone());
        }
    }

    if let Some(custom) = &field.rules.custom {
        if let Some(message) = custom.check(value, all) {
            return Some(message);
        }
    }

    None
}

/// Result of validating one step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub valid: bool,
    /// Error patch for this step's fields only.
    pub errors: ErrorMap,
}

/// Validate every field of one step. Sub-table JSON fields and their
/// certification markers are skipped; the checkbox stands in for the table
/// and is validated like any other field where it appears in the step.
/// The step's extra check (composite-picker rules and the like) is merged
/// into the same patch.
pub fn validate_step(
    step: &StepDescriptor,
    schema: &FormSchema,
    values: &FormValues,
    today: NaiveDate,
) -> StepOutcome {
    let mut errors = ErrorMap::new();

    for field in &step.fields {
        // The row list itself is never validated field-by-field here.
        if schema
            .sub_table_for(&field.name)
            .is_some()
        {
            continue;
        }
        if let Some(message) = validate_field(field, values.get(&field.name), values, today) {
            errors.insert(field.name.clone(), message);
        }
    }

    if let Some(check) = &step.extra_check {
        for (name, message) in check.run(values) {
            errors.insert(name, message);
        }
    }

    StepOutcome {
        valid: errors.is_empty(),
        errors,
    }
}

/// Result of validating a whole flow.
#[derive(Debug, Clone)]
pub struct FormOutcome {
    pub ok: bool,
    /// First step (in flow order) with at least one error, for navigation.
    pub first_invalid_step_id: Option<u32>,
    /// Accumulated errors across every step, so all invalid fields are
    /// already flagged when the caller jumps to the first invalid step.
    pub errors: ErrorMap,
}

/// Validate every step of a flow, accumulating all field errors.
pub fn validate_all(
    schema: &FormSchema,
    step_ids: &[u32],
    values: &FormValues,
    today: NaiveDate,
) -> FormOutcome {
    let mut errors = ErrorMap::new();
    let mut first_invalid_step_id = None;

    for step_id in step_ids {
        let Some(step) = schema.step(*step_id) else {
            continue;
        };
        let outcome = validate_step(step, schema, values, today);
        if !outcome.valid && first_invalid_step_id.is_none() {
            first_invalid_step_id = Some(step.id);
        }
        errors.extend(outcome.errors);
    }

    FormOutcome {
        ok: first_invalid_step_id.is_none(),
        first_invalid_step_id,
        errors,
    }
}

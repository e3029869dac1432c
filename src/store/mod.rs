// Form value store
//
// In-memory values, errors and display shadows for the active wizard
// instance. NOT persisted; created at mount (blank defaults or a normalized
// loaded record) and dropped at unmount. All mutations are synchronous and
// total: invalid values are stored as-is with an error attached, so the UI
// always renders the latest input.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::cascade::CascadePatch;
use crate::models::{
    DisplayShadow, ErrorMap, FieldKind, FieldValue, FormSchema, FormValues,
};
use crate::validation::validate_field;

pub struct FormStore {
    schema: Arc<FormSchema>,
    values: FormValues,
    errors: ErrorMap,
    shadows: DisplayShadow,
    today: NaiveDate,
}

impl FormStore {
    /// Blank store: every declared field gets its kind's default value
    /// (unticked flag for checkboxes, empty text otherwise).
    pub fn new(schema: Arc<FormSchema>, today: NaiveDate) -> Self {
        let mut values = FormValues::new();
        for step in &schema.steps {
            for field in &step.fields {
                let default = match field.kind {
                    FieldKind::Checkbox => FieldValue::flag(false),
                    _ => FieldValue::text(""),
                };
                values.insert(field.name.clone(), default);
            }
        }
        Self {
            schema,
            values,
            errors: ErrorMap::new(),
            shadows: DisplayShadow::new(),
            today,
        }
    }

    /// Store seeded from an already-normalized record (edit mode). Unknown
    /// keys in `values` are dropped; declared fields missing from `values`
    /// get defaults.
    pub fn from_record(
        schema: Arc<FormSchema>,
        today: NaiveDate,
        values: FormValues,
        shadows: DisplayShadow,
    ) -> Self {
        let mut store = Self::new(schema, today);
        for (name, value) in values {
            if store.schema.field(&name).is_some() {
                store.values.insert(name, value);
            }
        }
        store.shadows = shadows;
        store
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Cheap handle for callers that must hold the schema across mutations.
    pub fn schema_handle(&self) -> Arc<FormSchema> {
        self.schema.clone()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text content of a field, "" when absent or a flag.
    pub fn text(&self, name: &str) -> &str {
        self.values.get(name).map(FieldValue::as_text).unwrap_or("")
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn shadow(&self, name: &str) -> Option<&str> {
        self.shadows.get(name).map(String::as_str)
    }

    pub fn shadows(&self) -> &DisplayShadow {
        &self.shadows
    }

    /// Update one entry, then re-validate that field only.
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        self.values.insert(name.clone(), value);
        self.revalidate(&name);
    }

    /// Apply a batch of pairs atomically, then re-validate exactly the
    /// patched keys (not the whole form). Used by cascading updates and by
    /// composite pickers updating several related fields together.
    pub fn set_many(&mut self, patch: Vec<(String, FieldValue)>) {
        let names: Vec<String> = patch.iter().map(|(n, _)| n.clone()).collect();
        for (name, value) in patch {
            self.values.insert(name, value);
        }
        for name in &names {
            self.revalidate(name);
        }
    }

    /// Apply a cascade patch: values plus shadow updates (a `None` shadow
    /// clears the cached label).
    pub fn apply_cascade(&mut self, patch: CascadePatch) {
        for (name, shadow) in patch.shadows {
            match shadow {
                Some(label) => {
                    self.shadows.insert(name, label);
                }
                None => {
                    self.shadows.remove(&name);
                }
            }
        }
        self.set_many(patch.values);
    }

    /// Cache a human-readable label for an opaque code value (autocomplete
    /// pickers resolve these outside the catalogs).
    pub fn set_shadow(&mut self, name: impl Into<String>, label: impl Into<String>) {
        self.shadows.insert(name.into(), label.into());
    }

    /// Merge a validation patch produced by step/form validation into the
    /// error map, replacing entries for the patched step's fields.
    pub fn merge_errors(&mut self, patch: ErrorMap, step_field_names: &[String]) {
        for name in step_field_names {
            self.errors.remove(name);
        }
        self.errors.extend(patch);
    }

    /// Replace the whole error map (whole-form validation before submit).
    pub fn replace_errors(&mut self, errors: ErrorMap) {
        self.errors = errors;
    }

    fn revalidate(&mut self, name: &str) {
        let Some(field) = self.schema.field(name) else {
            return;
        };
        match validate_field(field, self.values.get(name), &self.values, self.today) {
            Some(message) => {
                self.errors.insert(name.to_string(), message);
            }
            None => {
                self.errors.remove(name);
            }
        }
    }
}

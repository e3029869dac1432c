// Discriminated form values
//
// Most registry fields are text-like (including opaque catalog codes), but
// certification and consent fields are real booleans. Values live in one map
// so a single change handler can service every input kind.

use std::collections::HashMap;

/// One stored form value: free text (possibly an opaque code) or a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn flag(value: bool) -> Self {
        FieldValue::Flag(value)
    }

    /// Text content, or "" for flags. Submission and validation treat flags
    /// through `as_flag`, never through this accessor.
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Flag(_) => "",
        }
    }

    pub fn as_flag(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(_) => false,
        }
    }

    /// "Empty" for required-field purposes: blank text. A flag always carries
    /// a value; required checkboxes are checked separately against `true`.
    pub fn is_empty_text(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Flag(_) => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Flag(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Current values, keyed by field name.
pub type FormValues = HashMap<String, FieldValue>;

/// Field name -> inline error message. Absence means "not yet validated or
/// valid"; errors are never surfaced as global notifications.
pub type ErrorMap = HashMap<String, String>;

/// Field name -> human-readable label for fields whose stored value is an
/// opaque code. A best-effort rendering cache only; `FormValues` remains the
/// source of truth for submission.
pub type DisplayShadow = HashMap<String, String>;

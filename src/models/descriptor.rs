// Declarative field/step/flow descriptors
//
// Per-entity schemas (person, institution, ...) are plain data built from
// these types by the caller; the engine never hard-codes an entity's fields.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::value::{FieldValue, FormValues};

/// Closed set of input kinds. All dispatch goes through exhaustive `match`;
/// there is intentionally no string tag to compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    ShortText,
    Email,
    Phone,
    LongText,
    Date,
    Checkbox,
    Select,
}

/// Regex rule with its own failure message.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub matches: Regex,
    pub message: String,
}

impl PatternRule {
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            matches: Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

/// Last-resort rule that may inspect sibling fields (conditional requirement,
/// digit-count checks, ...). Returns a message on failure.
#[derive(Clone)]
pub struct CustomRule(Arc<dyn Fn(&FieldValue, &FormValues) -> Option<String> + Send + Sync>);

impl CustomRule {
    pub fn new(
        check: impl Fn(&FieldValue, &FormValues) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(check))
    }

    pub fn check(&self, value: &FieldValue, all: &FormValues) -> Option<String> {
        (self.0)(value, all)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(..)")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub pattern: Option<PatternRule>,
    /// Date fields only: the value may not be after "today" (same-day is valid).
    pub max_date_is_today: bool,
    pub custom: Option<CustomRule>,
}

impl ValidationRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }
}

/// Static declaration of one input: identity, label, kind, validation.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Symbolic key, unique within the owning entity's whole schema.
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub placeholder: Option<String>,
    /// LongText only: rendered row count.
    pub rows: Option<u16>,
    /// When set, the submission payload additionally carries this field's
    /// value parsed as an integer under the given key.
    pub counter_key: Option<String>,
    pub rules: ValidationRule,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            placeholder: None,
            rows: None,
            counter_key: None,
            rules: ValidationRule::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.rules.required = true;
        self
    }

    pub fn with_pattern(mut self, pattern: PatternRule) -> Self {
        self.rules.pattern = Some(pattern);
        self
    }

    pub fn with_max_date_today(mut self) -> Self {
        self.rules.max_date_is_today = true;
        self
    }

    pub fn with_custom(mut self, rule: CustomRule) -> Self {
        self.rules.custom = Some(rule);
        self
    }

    pub fn with_counter_key(mut self, key: impl Into<String>) -> Self {
        self.counter_key = Some(key.into());
        self
    }
}

/// Ad hoc per-step rule merged into the step's error patch, for checks that
/// do not belong to a single input (e.g. a composite region picker whose
/// top-level selection is required on that step).
#[derive(Clone)]
pub struct StepCheck(Arc<dyn Fn(&FormValues) -> Vec<(String, String)> + Send + Sync>);

impl StepCheck {
    pub fn new(check: impl Fn(&FormValues) -> Vec<(String, String)> + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    pub fn run(&self, values: &FormValues) -> Vec<(String, String)> {
        (self.0)(values)
    }
}

impl fmt::Debug for StepCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StepCheck(..)")
    }
}

/// Ordered group of fields presented as one wizard page.
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    /// Ordinal, unique within a flow.
    pub id: u32,
    pub title: String,
    /// Insertion order is display order.
    pub fields: Vec<FieldDescriptor>,
    pub extra_check: Option<StepCheck>,
}

impl StepDescriptor {
    pub fn new(id: u32, title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            id,
            title: title.into(),
            fields,
            extra_check: None,
        }
    }

    pub fn with_extra_check(mut self, check: StepCheck) -> Self {
        self.extra_check = Some(check);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Binding between a sub-table stored as one JSON-string form value and its
/// external payload shape. The certification checkbox stands in for the
/// table's validity; step validation skips both fields.
#[derive(Debug, Clone)]
pub struct SubTableBinding {
    /// FormValues entry holding the serialized row list.
    pub field: String,
    /// Checkbox asserting the table is complete and correct.
    pub certified_field: String,
    /// External key the renamed row array is attached under.
    pub payload_key: String,
    /// External key for the sibling "certified" boolean.
    pub certified_key: String,
    /// Local row key -> external row key. `serialNumber` is a valid local key.
    pub column_map: Vec<(String, String)>,
}

impl SubTableBinding {
    pub fn covers(&self, field_name: &str) -> bool {
        self.field == field_name || self.certified_field == field_name
    }
}

/// Per-flow submission action, mapped onto the management service by the
/// driver (Stage 1 creates the record, Stage 2 updates the same identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    Create,
    Update,
}

/// Named subset of the step sequence with its own entry point and submission
/// action, for records completed across multiple sittings.
#[derive(Debug, Clone)]
pub struct FlowDescriptor {
    pub id: String,
    pub title: String,
    /// Ordered subset of step ids owned by this flow.
    pub step_ids: Vec<u32>,
    pub submit_action: SubmitAction,
}

/// Complete declarative schema for one entity's wizard.
#[derive(Debug, Clone)]
pub struct FormSchema {
    pub entity: String,
    pub steps: Vec<StepDescriptor>,
    pub flows: Vec<FlowDescriptor>,
    pub sub_tables: Vec<SubTableBinding>,
    /// Fixed, non-editable payload fields (e.g. a hard-coded subtype code)
    /// added to the full payload only.
    pub constants: serde_json::Map<String, serde_json::Value>,
}

impl FormSchema {
    /// Schema with a single implicit flow covering every step in order.
    pub fn linear(entity: impl Into<String>, steps: Vec<StepDescriptor>) -> Self {
        let step_ids = steps.iter().map(|s| s.id).collect();
        let flow = FlowDescriptor {
            id: "main".to_string(),
            title: "Main".to_string(),
            step_ids,
            submit_action: SubmitAction::Create,
        };
        Self {
            entity: entity.into(),
            steps,
            flows: vec![flow],
            sub_tables: Vec::new(),
            constants: serde_json::Map::new(),
        }
    }

    pub fn with_sub_tables(mut self, sub_tables: Vec<SubTableBinding>) -> Self {
        self.sub_tables = sub_tables;
        self
    }

    pub fn with_flows(mut self, flows: Vec<FlowDescriptor>) -> Self {
        self.flows = flows;
        self
    }

    pub fn with_constants(mut self, constants: serde_json::Map<String, serde_json::Value>) -> Self {
        self.constants = constants;
        self
    }

    pub fn step(&self, id: u32) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn flow(&self, id: &str) -> Option<&FlowDescriptor> {
        self.flows.iter().find(|f| f.id == id)
    }

    /// Descriptor lookup across every step.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.steps.iter().find_map(|s| s.field(name))
    }

    pub fn sub_table_covering(&self, field_name: &str) -> Option<&SubTableBinding> {
        self.sub_tables.iter().find(|t| t.covers(field_name))
    }

    /// Binding whose JSON-string field is exactly `field_name`.
    pub fn sub_table_for(&self, field_name: &str) -> Option<&SubTableBinding> {
        self.sub_tables.iter().find(|t| t.field == field_name)
    }
}

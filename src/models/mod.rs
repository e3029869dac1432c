// Form engine data model
// Field/step/flow descriptors, discriminated field values, sub-table rows.

mod descriptor;
mod subform;
mod value;

pub use descriptor::{
    CustomRule, FieldDescriptor, FieldKind, FlowDescriptor, FormSchema, PatternRule, StepCheck,
    StepDescriptor, SubTableBinding, SubmitAction, ValidationRule,
};
pub use subform::{decode_rows, encode_rows, renumber, SubFormRow};
pub use value::{DisplayShadow, ErrorMap, FieldValue, FormValues};

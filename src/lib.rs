// Registry intake dynamic form engine
// Main library entry point
//
// Declarative field/step descriptors, a validation engine, a cascading
// selection resolver over read-only reference catalogs, a wizard navigation
// state machine (linear and staged flows), a submission mapper and a review
// aggregator, behind an abstract per-entity management service.

pub mod api;
pub mod cascade;
pub mod catalog;
pub mod models;
pub mod review;
pub mod store;
pub mod submission;
pub mod utils;
pub mod validation;
pub mod wizard;

pub use api::{
    approve, load_record, normalize_record, reject, save_step, submit_flow, ActionGate,
    LoadedRecord, ManagementAction, ManagementService, ServiceError, ServiceResponse,
    SubmitOutcome,
};
pub use cascade::{CascadePatch, CascadeResolver, CascadeRule};
pub use catalog::{
    CatalogProvider, CategoryCatalog, CategoryEntry, ReferenceCatalogs, RegionCatalog, RegionNode,
    ResponsibleOfficer,
};
pub use models::{
    decode_rows, encode_rows, renumber, CustomRule, DisplayShadow, ErrorMap, FieldDescriptor, FieldKind,
    FieldValue, FlowDescriptor, FormSchema, FormValues, PatternRule, StepCheck, StepDescriptor,
    SubFormRow, SubTableBinding, SubmitAction, ValidationRule,
};
pub use review::{summarize, ReviewRow, ReviewSection, EMPTY_PLACEHOLDER};
pub use store::FormStore;
pub use submission::{build_full_payload, build_partial_payload};
pub use validation::{
    validate_all, validate_field, validate_step, FormOutcome, StepOutcome, DATE_FORMAT,
    MSG_FUTURE_DATE, MSG_INVALID_DATE, MSG_REQUIRED,
};
pub use wizard::{FlowAccess, NavOutcome, SubmitDecision, WizardController, WizardError};

// External interface layer
// Management service contract, per-action gating, record loading, drivers.

mod driver;
mod loader;
mod management;

pub use driver::{approve, reject, save_step, submit_flow, SubmitOutcome};
pub use loader::{load_record, normalize_record, LoadedRecord};
pub use management::{
    ActionGate, GatePass, ManagementAction, ManagementService, ServiceError, ServiceResponse,
};

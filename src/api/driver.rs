// Action drivers
//
// Thin async orchestration between the wizard/store and the management
// service: per-step partial saves, whole-flow submission, and the approval
// workflow. Every driver claims its action's gate first, so a double-click
// cannot dispatch the same action twice; a failed call leaves the in-memory
// form untouched for retry.

use log::{info, warn};
use serde_json::{Map, Value};

use crate::models::SubmitAction;
use crate::store::FormStore;
use crate::submission::build_partial_payload;
use crate::validation::validate_step;
use crate::wizard::{SubmitDecision, WizardController};

use super::management::{ActionGate, ManagementAction, ManagementService, ServiceError, ServiceResponse};

/// Outcome of a submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(ServiceResponse),
    /// Validation blocked the submission; the controller already jumped to
    /// the first invalid step and no network call was made.
    Blocked { first_invalid_step_id: u32 },
}

/// Save one step as a partial update against an existing record. The step
/// being saved is validated; fields derived from other sections are not
/// re-validated here (they are checked when their own section is entered).
pub async fn save_step(
    service: &dyn ManagementService,
    gate: &ActionGate,
    store: &mut FormStore,
    step_id: u32,
    record_id: &str,
) -> Result<(), ServiceError> {
    let Some(_pass) = gate.try_begin() else {
        return Err(ServiceError::Invalid("Save is already in progress".to_string()));
    };

    let schema = store.schema_handle();
    let Some(step) = schema.step(step_id) else {
        return Err(ServiceError::Invalid(format!("Unknown step {step_id}")));
    };

    let outcome = validate_step(step, &schema, store.values(), store.today());
    if !outcome.valid {
        let field_names: Vec<String> = step.fields.iter().map(|f| f.name.clone()).collect();
        store.merge_errors(outcome.errors, &field_names);
        return Err(ServiceError::Invalid(
            "Fix the highlighted fields before saving".to_string(),
        ));
    }

    let mut payload = build_partial_payload(step, &schema, store.values());
    payload.insert("id".to_string(), Value::String(record_id.to_string()));

    info!(
        "[PHASE: save] [STEP: step_{step_id}] dispatching partial update ({} key(s))",
        payload.len()
    );
    service
        .invoke(ManagementAction::Update, Value::Object(payload))
        .await?;
    Ok(())
}

/// Run the submit gate and, if the flow validates, dispatch its submission
/// action. A blocked submission performs no network call.
pub async fn submit_flow(
    service: &dyn ManagementService,
    gate: &ActionGate,
    wizard: &mut WizardController,
    store: &mut FormStore,
    record_id: Option<&str>,
) -> Result<SubmitOutcome, ServiceError> {
    let decision = wizard.prepare_submit(store);
    let (action, mut payload) = match decision {
        SubmitDecision::Invalid {
            first_invalid_step_id,
        } => {
            return Ok(SubmitOutcome::Blocked {
                first_invalid_step_id,
            })
        }
        SubmitDecision::Ready { action, payload } => (action, payload),
    };

    let Some(_pass) = gate.try_begin() else {
        return Err(ServiceError::Invalid(
            "Submission is already in progress".to_string(),
        ));
    };

    let action = match action {
        SubmitAction::Create => ManagementAction::Create,
        SubmitAction::Update => {
            let Some(id) = record_id else {
                return Err(ServiceError::Invalid(
                    "An existing record identifier is required to complete this flow".to_string(),
                ));
            };
            payload.insert("id".to_string(), Value::String(id.to_string()));
            ManagementAction::Update
        }
    };

    info!(
        "[PHASE: submit] [STEP: {}] dispatching flow '{}' payload",
        action.as_str(),
        wizard.active_flow()
    );
    match service.invoke(action, Value::Object(payload)).await {
        Ok(response) => Ok(SubmitOutcome::Submitted(response)),
        Err(err) => {
            // Values stay in memory; the user retries without re-entering.
            warn!("[PHASE: submit] [STEP: {}] failed: {err}", action.as_str());
            Err(err)
        }
    }
}

pub async fn approve(
    service: &dyn ManagementService,
    gate: &ActionGate,
    record_id: &str,
) -> Result<(), ServiceError> {
    let Some(_pass) = gate.try_begin() else {
        return Err(ServiceError::Invalid(
            "Approval is already in progress".to_string(),
        ));
    };
    let mut payload = Map::new();
    payload.insert("id".to_string(), Value::String(record_id.to_string()));
    service
        .invoke(ManagementAction::Approve, Value::Object(payload))
        .await?;
    info!("[PHASE: approval] [STEP: approve] record approved");
    Ok(())
}

/// Reject with a free-text reason; an empty reason never leaves the process.
pub async fn reject(
    service: &dyn ManagementService,
    gate: &ActionGate,
    record_id: &str,
    reason: &str,
) -> Result<(), ServiceError> {
    if reason.trim().is_empty() {
        return Err(ServiceError::Invalid(
            "A rejection reason is required".to_string(),
        ));
    }
    let Some(_pass) = gate.try_begin() else {
        return Err(ServiceError::Invalid(
            "Rejection is already in progress".to_string(),
        ));
    };
    let mut payload = Map::new();
    payload.insert("id".to_string(), Value::String(record_id.to_string()));
    payload.insert("reason".to_string(), Value::String(reason.trim().to_string()));
    service
        .invoke(ManagementAction::Reject, Value::Object(payload))
        .await?;
    info!("[PHASE: approval] [STEP: reject] record rejected");
    Ok(())
}

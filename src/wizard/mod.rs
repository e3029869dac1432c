// Wizard navigation controller
//
// Owns the current-step pointer and transition rules for the active flow.
// Next validates the step being left; Previous and JumpTo do not, which
// intentionally allows leaving a step invalid mid-session (top tab bar and
// review-screen Edit links). Submit validates the whole flow and refuses to
// hand a payload over until every step passes.
//
// Auxiliary side-panels (certificate viewing, document upload) are not part
// of this state machine; they do not participate in step validation or order.

use log::info;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{FormSchema, StepDescriptor, SubmitAction};
use crate::store::FormStore;
use crate::submission::build_full_payload;
use crate::validation::{validate_all, validate_step};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("unknown flow '{0}'")]
    UnknownFlow(String),
    #[error("step {0} is not part of the active flow")]
    UnknownStep(u32),
    #[error("role '{role}' is not permitted to enter flow '{flow}'")]
    FlowNotAllowed { flow: String, role: String },
}

/// Role -> permitted flows. Staged entities declare who may enter which flow
/// explicitly instead of inferring it from incidental request parameters.
#[derive(Debug, Clone, Default)]
pub struct FlowAccess {
    rules: HashMap<String, Vec<String>>,
    permissive: bool,
}

impl FlowAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access table that lets every role into every flow (single-flow
    /// wizards have nothing to gate).
    pub fn permissive() -> Self {
        Self {
            rules: HashMap::new(),
            permissive: true,
        }
    }

    pub fn allow(mut self, role: impl Into<String>, flow: impl Into<String>) -> Self {
        self.rules.entry(role.into()).or_default().push(flow.into());
        self
    }

    pub fn allows(&self, role: &str, flow: &str) -> bool {
        if self.permissive {
            return true;
        }
        self.rules
            .get(role)
            .map(|flows| flows.iter().any(|f| f == flow))
            .unwrap_or(false)
    }
}

/// Result of a navigation attempt. `scroll_to_top` fires on every Next, both
/// to open the new step at its top and to reveal the first inline error when
/// the step refused to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavOutcome {
    pub moved: bool,
    pub scroll_to_top: bool,
}

/// What Submit decided before any network activity.
#[derive(Debug, Clone)]
pub enum SubmitDecision {
    /// Every step of the active flow validated; the payload is ready for the
    /// flow's submission action.
    Ready {
        action: SubmitAction,
        payload: Map<String, Value>,
    },
    /// At least one step is invalid; the controller has already jumped to it
    /// and the store carries every field error. No network call may happen.
    Invalid { first_invalid_step_id: u32 },
}

pub struct WizardController {
    schema: Arc<FormSchema>,
    active_flow: String,
    /// 1-based ordinal into the active flow's step sequence.
    current_index: usize,
    access: FlowAccess,
}

impl WizardController {
    pub fn new(
        schema: Arc<FormSchema>,
        flow_id: &str,
        access: FlowAccess,
    ) -> Result<Self, WizardError> {
        let Some(flow) = schema.flow(flow_id) else {
            return Err(WizardError::UnknownFlow(flow_id.to_string()));
        };
        // Every flow step id must resolve against the schema, so navigation
        // can index the flow's step list without re-checking.
        for declared in &schema.flows {
            if let Some(bad) = declared.step_ids.iter().find(|id| schema.step(**id).is_none()) {
                return Err(WizardError::UnknownStep(*bad));
            }
        }
        if flow.step_ids.is_empty() {
            return Err(WizardError::UnknownFlow(flow_id.to_string()));
        }
        Ok(Self {
            schema,
            active_flow: flow_id.to_string(),
            current_index: 1,
            access,
        })
    }

    pub fn active_flow(&self) -> &str {
        &self.active_flow
    }

    /// 1-based position within the active flow.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    fn flow_step_ids(&self) -> &[u32] {
        self.schema
            .flow(&self.active_flow)
            .map(|f| f.step_ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn step_count(&self) -> usize {
        self.flow_step_ids().len()
    }

    pub fn current_step_id(&self) -> u32 {
        self.flow_step_ids()[self.current_index - 1]
    }

    pub fn current_step(&self) -> &StepDescriptor {
        self.schema
            .step(self.current_step_id())
            .expect("flow step ids always resolve against the schema")
    }

    pub fn is_last_step(&self) -> bool {
        self.current_index == self.step_count()
    }

    /// Validate the current step; advance only if it passes. Errors are
    /// merged into the store either way.
    pub fn next(&mut self, store: &mut FormStore) -> NavOutcome {
        let step = self.current_step();
        let field_names: Vec<String> = step.fields.iter().map(|f| f.name.clone()).collect();
        let outcome = validate_step(step, &self.schema, store.values(), store.today());
        let valid = outcome.valid;
        store.merge_errors(outcome.errors, &field_names);

        if valid && !self.is_last_step() {
            self.current_index += 1;
            info!(
                "[PHASE: wizard] [STEP: next] advanced to step {} of flow '{}'",
                self.current_step_id(),
                self.active_flow
            );
            return NavOutcome {
                moved: true,
                scroll_to_top: true,
            };
        }
        NavOutcome {
            moved: false,
            scroll_to_top: true,
        }
    }

    /// Unconditional decrement; no validation is performed.
    pub fn previous(&mut self) -> NavOutcome {
        if self.current_index > 1 {
            self.current_index -= 1;
            return NavOutcome {
                moved: true,
                scroll_to_top: true,
            };
        }
        NavOutcome {
            moved: false,
            scroll_to_top: false,
        }
    }

    /// Jump without validating the step being left.
    pub fn jump_to(&mut self, step_id: u32) -> Result<(), WizardError> {
        match self.flow_step_ids().iter().position(|id| *id == step_id) {
            Some(position) => {
                self.current_index = position + 1;
                Ok(())
            }
            None => Err(WizardError::UnknownStep(step_id)),
        }
    }

    /// Switch to another flow's first step. Permitted only when the caller's
    /// role may enter both the current and the target flow.
    pub fn switch_flow(&mut self, flow_id: &str, role: &str) -> Result<(), WizardError> {
        if self.schema.flow(flow_id).is_none() {
            return Err(WizardError::UnknownFlow(flow_id.to_string()));
        }
        if !self.access.allows(role, &self.active_flow) || !self.access.allows(role, flow_id) {
            return Err(WizardError::FlowNotAllowed {
                flow: flow_id.to_string(),
                role: role.to_string(),
            });
        }
        info!(
            "[PHASE: wizard] [STEP: switch_flow] '{}' -> '{}' (role={})",
            self.active_flow, flow_id, role
        );
        self.active_flow = flow_id.to_string();
        self.current_index = 1;
        Ok(())
    }

    /// Whole-flow validation gate in front of submission. On failure the
    /// controller jumps to the first invalid step and the store is left
    /// carrying every field error, so the caller renders all of them at once.
    pub fn prepare_submit(&mut self, store: &mut FormStore) -> SubmitDecision {
        let step_ids: Vec<u32> = self.flow_step_ids().to_vec();
        let outcome = validate_all(&self.schema, &step_ids, store.values(), store.today());
        store.replace_errors(outcome.errors);

        match outcome.first_invalid_step_id {
            Some(step_id) => {
                // The id came from the flow's own step list; jump cannot fail.
                let _ = self.jump_to(step_id);
                info!(
                    "[PHASE: wizard] [STEP: submit] blocked, first invalid step is {step_id}"
                );
                SubmitDecision::Invalid {
                    first_invalid_step_id: step_id,
                }
            }
            None => {
                let action = self
                    .schema
                    .flow(&self.active_flow)
                    .map(|f| f.submit_action)
                    .unwrap_or(SubmitAction::Create);
                let payload = build_full_payload(&self.schema, &step_ids, store.values());
                SubmitDecision::Ready { action, payload }
            }
        }
    }
}

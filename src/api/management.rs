// Management service contract
//
// The engine talks to one abstract per-entity "management" service shaped as
// invoke(action, payload). No HTTP specifics are assumed; only a future that
// resolves to a JSON-bearing response or an error carrying an optional
// user-facing message and optional field-level detail.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Actions every entity's management service understands, plus the
/// entity-specific side actions (certificates, scanned documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagementAction {
    ReadOne,
    Create,
    Update,
    Approve,
    Reject,
    MarkPrinted,
    ListCertificates,
    GenerateCertificate,
    DownloadCertificate,
    UploadDocument,
}

impl ManagementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagementAction::ReadOne => "READ_ONE",
            ManagementAction::Create => "CREATE",
            ManagementAction::Update => "UPDATE",
            ManagementAction::Approve => "APPROVE",
            ManagementAction::Reject => "REJECT",
            ManagementAction::MarkPrinted => "MARK_PRINTED",
            ManagementAction::ListCertificates => "LIST_CERTIFICATES",
            ManagementAction::GenerateCertificate => "GENERATE_CERTIFICATE",
            ManagementAction::DownloadCertificate => "DOWNLOAD_CERTIFICATE",
            ManagementAction::UploadDocument => "UPLOAD_DOCUMENT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub data: Value,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Local pre-network guard failure (action already in flight, missing
    /// rejection reason, ...). Nothing left the process.
    #[error("{0}")]
    Invalid(String),
    /// Transient network/server failure. Surfaced as a dismissible
    /// notification; in-memory form values are untouched so the user can
    /// retry without re-entering data.
    #[error("{message}")]
    Network {
        message: String,
        field_errors: HashMap<String, String>,
    },
    /// Role/department mismatch at wizard entry. Not recoverable within the
    /// page; the caller redirects away before constructing wizard state.
    #[error("not authorized for this record")]
    Authorization,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait ManagementService: Send + Sync {
    async fn invoke(
        &self,
        action: ManagementAction,
        payload: Value,
    ) -> Result<ServiceResponse, ServiceError>;
}

/// Per-action in-flight guard. Disables duplicate concurrent triggers of the
/// same action; different actions own different gates and may race (accepted,
/// not prevented).
#[derive(Debug, Default)]
pub struct ActionGate {
    busy: AtomicBool,
}

impl ActionGate {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the gate; `None` while a previous claim is still alive. The
    /// returned pass releases the gate on drop.
    pub fn try_begin(&self) -> Option<GatePass<'_>> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(GatePass { gate: self })
    }
}

pub struct GatePass<'a> {
    gate: &'a ActionGate,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::SeqCst);
    }
}

//! API client facade.
//!
//! RULE: Callers talk to the backend only through `CourtroomApi`. Whether a
//! call lands on the in-process mock store or on the REST service is decided
//! once, by `connect`.

mod http;
mod mock;
mod poll;
pub mod wire;

pub use http::HttpBackend;
pub use mock::MockBackend;
pub use poll::{poll_run_status, poll_transcript, PollHandle};
pub use wire::{CreateCaseRequest, PolicyList, StartDebateRequest, StartDebateResponse};

use crate::{
    config::CourtroomConfig,
    error::CourtroomResult,
    model::{
        ApplicantPayload, AuditEvent, Case, CaseList, DashboardStats, DecisionBundle, Document,
        DocumentUpload, FraudSignals, Policy, PolicyClause, PolicyType, RunStatus, Transcript,
    },
    store::CaseQuery,
};
use async_trait::async_trait;
use std::sync::Arc;

/// One method per backend endpoint.
#[async_trait]
pub trait CourtroomApi: Send + Sync {
    // ── Cases ──

    async fn create_case(&self, request: CreateCaseRequest) -> CourtroomResult<Case>;
    async fn list_cases(&self, query: CaseQuery) -> CourtroomResult<CaseList>;
    async fn get_case(&self, case_id: &str) -> CourtroomResult<Case>;
    async fn update_applicant(&self, case_id: &str, patch: ApplicantPayload) -> CourtroomResult<Case>;

    // ── Documents ──

    async fn upload_document(&self, case_id: &str, upload: DocumentUpload) -> CourtroomResult<Document>;
    async fn list_documents(&self, case_id: &str) -> CourtroomResult<Vec<Document>>;

    // ── Debate ──

    async fn start_debate(
        &self,
        case_id: &str,
        request: StartDebateRequest,
    ) -> CourtroomResult<StartDebateResponse>;
    async fn run_status(&self, run_id: &str) -> CourtroomResult<RunStatus>;
    async fn transcript(&self, run_id: &str) -> CourtroomResult<Transcript>;
    /// `DecisionNotReady` until the run reaches `done`.
    async fn decision(&self, run_id: &str) -> CourtroomResult<DecisionBundle>;

    // ── Audit, dashboard, export ──

    async fn audit_events(&self, case_id: &str) -> CourtroomResult<Vec<AuditEvent>>;
    async fn dashboard_stats(&self) -> CourtroomResult<DashboardStats>;
    async fn export_report(&self, case_id: &str) -> CourtroomResult<Vec<u8>>;

    // ── Fraud signals and policies ──

    async fn fraud_signals(&self, case_id: &str) -> CourtroomResult<FraudSignals>;
    async fn list_policies(&self) -> CourtroomResult<PolicyList>;
    async fn get_policy(&self, policy_id: &str) -> CourtroomResult<Policy>;
    async fn upload_policy(
        &self,
        upload: DocumentUpload,
        name: &str,
        document_type: PolicyType,
    ) -> CourtroomResult<Policy>;
    async fn policy_evidence(&self, case_id: &str) -> CourtroomResult<Vec<PolicyClause>>;
}

/// Build the backend selected by `config.api.use_mock`.
pub fn connect(config: &CourtroomConfig) -> CourtroomResult<Arc<dyn CourtroomApi>> {
    if config.api.use_mock {
        log::info!("Using mock backend (seed {})", config.simulation.seed);
        Ok(Arc::new(MockBackend::new(config)?))
    } else {
        log::info!("Using HTTP backend at {}{}", config.api.api_origin, config.api.api_base_url);
        Ok(Arc::new(HttpBackend::new(&config.api)?))
    }
}

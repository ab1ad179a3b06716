//! In-process backend over the mock data store.
//!
//! RULE: The store lock is taken after the artificial latency has elapsed and
//! released before the call returns. It is never held across an `.await`.

use super::{
    wire::{CreateCaseRequest, PolicyList, StartDebateRequest, StartDebateResponse},
    CourtroomApi,
};
use crate::{
    config::{CourtroomConfig, LatencyConfig},
    error::{CourtroomError, CourtroomResult},
    model::{
        ApplicantPayload, AuditEvent, Case, CaseList, CaseStatus, DashboardStats, DecisionBundle,
        Document, DocumentUpload, FraudSignals, Policy, PolicyClause, PolicyType, RunStatus,
        Transcript,
    },
    store::{CaseQuery, MockDataStore},
    types::Millis,
};
use async_trait::async_trait;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::{sleep, Instant};

pub struct MockBackend {
    store: Arc<Mutex<MockDataStore>>,
    latency: LatencyConfig,
    /// Store time zero, on the tokio clock.
    started: Instant,
}

impl MockBackend {
    pub fn new(config: &CourtroomConfig) -> CourtroomResult<Self> {
        let store = MockDataStore::new(config.simulation.clone())?;
        Ok(Self::with_store(store, config.latency.clone()))
    }

    pub fn with_store(store: MockDataStore, latency: LatencyConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            latency,
            started: Instant::now(),
        }
    }

    /// Shared handle on the underlying store, for fault injection and inspection.
    pub fn store(&self) -> Arc<Mutex<MockDataStore>> {
        Arc::clone(&self.store)
    }

    /// Sleep `latency_ms`, bring the store clock up to tokio time, then run `op`.
    async fn call<T, F>(&self, latency_ms: Millis, op: F) -> CourtroomResult<T>
    where
        F: FnOnce(&mut MockDataStore) -> CourtroomResult<T> + Send,
        T: Send,
    {
        if latency_ms > 0 {
            sleep(Duration::from_millis(latency_ms)).await;
        }
        let elapsed = self.started.elapsed().as_millis() as Millis;
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("mock store lock poisoned"))?;
        store.advance_to(elapsed)?;
        op(&mut store)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Ok(mut store) = self.store.lock() {
            store.dispose();
        }
    }
}

#[async_trait]
impl CourtroomApi for MockBackend {
    async fn create_case(&self, request: CreateCaseRequest) -> CourtroomResult<Case> {
        self.call(self.latency.create_case, |s| s.create_case(request.applicant))
            .await
    }

    async fn list_cases(&self, query: CaseQuery) -> CourtroomResult<CaseList> {
        self.call(self.latency.list_cases, |s| Ok(s.list_cases(&query)))
            .await
    }

    async fn get_case(&self, case_id: &str) -> CourtroomResult<Case> {
        self.call(self.latency.get_case, |s| s.case(case_id)).await
    }

    async fn update_applicant(&self, case_id: &str, patch: ApplicantPayload) -> CourtroomResult<Case> {
        self.call(self.latency.update_applicant, |s| s.update_applicant(case_id, &patch))
            .await
    }

    async fn upload_document(&self, case_id: &str, upload: DocumentUpload) -> CourtroomResult<Document> {
        self.call(self.latency.upload_document, |s| s.add_document(case_id, upload))
            .await
    }

    async fn list_documents(&self, case_id: &str) -> CourtroomResult<Vec<Document>> {
        self.call(self.latency.list_documents, |s| s.documents(case_id))
            .await
    }

    async fn start_debate(
        &self,
        case_id: &str,
        request: StartDebateRequest,
    ) -> CourtroomResult<StartDebateResponse> {
        self.call(self.latency.start_debate, |s| {
            let run_id = s.start_debate(case_id, request.top_k, request.mode.unwrap_or_default())?;
            Ok(StartDebateResponse {
                run_id,
                status: CaseStatus::Running,
                case_id: case_id.to_string(),
            })
        })
        .await
    }

    async fn run_status(&self, run_id: &str) -> CourtroomResult<RunStatus> {
        self.call(self.latency.run_status, |s| s.run_status(run_id)).await
    }

    async fn transcript(&self, run_id: &str) -> CourtroomResult<Transcript> {
        self.call(self.latency.transcript, |s| s.transcript(run_id)).await
    }

    async fn decision(&self, run_id: &str) -> CourtroomResult<DecisionBundle> {
        self.call(self.latency.decision, |s| s.decision(run_id)).await
    }

    async fn audit_events(&self, case_id: &str) -> CourtroomResult<Vec<AuditEvent>> {
        self.call(self.latency.audit_events, |s| s.audit_events(case_id))
            .await
    }

    async fn dashboard_stats(&self) -> CourtroomResult<DashboardStats> {
        self.call(self.latency.dashboard_stats, |s| Ok(s.stats())).await
    }

    async fn export_report(&self, case_id: &str) -> CourtroomResult<Vec<u8>> {
        self.call(self.latency.export_report, |s| s.export_report(case_id))
            .await
    }

    async fn fraud_signals(&self, case_id: &str) -> CourtroomResult<FraudSignals> {
        self.call(self.latency.fraud_signals, |s| s.fraud_signals(case_id))
            .await
    }

    async fn list_policies(&self) -> CourtroomResult<PolicyList> {
        self.call(self.latency.policies, |s| {
            let items = s.policies();
            Ok(PolicyList {
                total: items.len() as u32,
                items,
            })
        })
        .await
    }

    async fn get_policy(&self, policy_id: &str) -> CourtroomResult<Policy> {
        self.call(self.latency.policies, |s| s.policy(policy_id)).await
    }

    async fn upload_policy(
        &self,
        upload: DocumentUpload,
        name: &str,
        document_type: PolicyType,
    ) -> CourtroomResult<Policy> {
        if upload.filename.trim().is_empty() {
            return Err(CourtroomError::UploadFailed {
                status_text: "missing filename".into(),
            });
        }
        self.call(self.latency.upload_policy, |s| {
            s.upload_policy(name, document_type, &upload.filename)
        })
        .await
    }

    async fn policy_evidence(&self, case_id: &str) -> CourtroomResult<Vec<PolicyClause>> {
        self.call(self.latency.policy_evidence, |s| s.policy_evidence(case_id))
            .await
    }
}

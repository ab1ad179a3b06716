//! The mock data store: an in-process stand-in for the courtroom backend.
//!
//! RULES:
//!   - The store owns every entity exactly once. Cases hold ids of their
//!     documents and current run; snapshots are materialized on read.
//!   - All deferred mutations go through the `Schedule` and fire only inside
//!     `advance_to`, in due order, each one running to completion.
//!   - All randomness flows through the `RngBank`.
//!   - Every state change a user would care about is appended to the audit log.

mod audit;
mod debate;
mod documents;
mod fraud;
mod policy;
mod query;
mod report;
mod seed;

pub use audit::AuditLog;
pub use query::CaseQuery;

use crate::{
    clock::SimClock,
    config::SimulationConfig,
    error::{CourtroomError, CourtroomResult},
    model::{
        ApplicantPayload, AuditEvent, AuditEventType, Case, CaseStatus, Decision, Document,
        FraudSignals, JsonMap, Policy, PolicyClause, RetrievalSummary, DebateRun,
    },
    rng::RngBank,
    schedule::{Schedule, TaskHandle, Transition},
    types::{CaseId, DocumentId, Millis, PolicyId, RunId},
    validation::Validate,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Internal, id-linked form of a case.
#[derive(Debug, Clone)]
struct CaseRecord {
    case_id: CaseId,
    /// Creation order; breaks `updated_at` ties when listing.
    seq: u64,
    status: CaseStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    applicant: Option<ApplicantPayload>,
    document_ids: Vec<DocumentId>,
    retrieval: Option<RetrievalSummary>,
    run_id: Option<RunId>,
    decision: Option<Decision>,
    fraud_signals: Option<FraudSignals>,
}

#[derive(Debug, Clone)]
struct RunRecord {
    run: DebateRun,
    case_id: CaseId,
    top_k: u32,
    schedule: Option<TaskHandle>,
    /// Index of the next scripted message to emit.
    cursor: usize,
    /// Its pending stages were dropped before `done`.
    cancelled: bool,
    retrieval: RetrievalSummary,
    decision: Option<Decision>,
}

pub struct MockDataStore {
    config: SimulationConfig,
    clock: SimClock,
    rng: RngBank,
    schedule: Schedule,
    audit: AuditLog,
    cases: HashMap<CaseId, CaseRecord>,
    documents: HashMap<DocumentId, Document>,
    document_tasks: HashMap<DocumentId, TaskHandle>,
    runs: HashMap<RunId, RunRecord>,
    policies: Vec<Policy>,
    policy_clauses: HashMap<PolicyId, Vec<PolicyClause>>,
    next_case_seq: u64,
}

impl MockDataStore {
    /// Build a store whose virtual clock starts at the current wall time.
    pub fn new(config: SimulationConfig) -> CourtroomResult<Self> {
        Self::with_origin(config, Utc::now())
    }

    /// Build a store whose virtual clock starts at `origin`.
    pub fn with_origin(config: SimulationConfig, origin: DateTime<Utc>) -> CourtroomResult<Self> {
        let audit = match &config.audit_db_path {
            Some(path) => AuditLog::open(path)?,
            None => AuditLog::in_memory()?,
        };
        let mut store = Self {
            clock: SimClock::new(origin),
            rng: RngBank::new(config.seed),
            schedule: Schedule::new(),
            audit,
            cases: HashMap::new(),
            documents: HashMap::new(),
            document_tasks: HashMap::new(),
            runs: HashMap::new(),
            policies: Vec::new(),
            policy_clauses: HashMap::new(),
            next_case_seq: 0,
            config,
        };
        store.seed_policies();
        if store.config.seed_demo_data {
            store.seed_demo_cases()?;
        }
        log::info!(
            "Mock store ready: {} cases, {} policies, seed {}",
            store.cases.len(),
            store.policies.len(),
            store.config.seed
        );
        Ok(store)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ── Time ───────────────────────────────────────────────────────

    pub fn now_ms(&self) -> Millis {
        self.clock.elapsed_ms
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fire every transition due at or before `ms`, in due order, then move
    /// the clock to `ms`. Returns how many transitions fired.
    pub fn advance_to(&mut self, ms: Millis) -> CourtroomResult<usize> {
        let from_ms = self.clock.elapsed_ms;
        if self.clock.at(ms).is_none() {
            return Err(CourtroomError::ClockOverflow {
                from_ms,
                step_ms: ms.saturating_sub(from_ms),
            });
        }
        let mut fired = 0;
        while let Some((due, transition)) = self.schedule.pop_due(ms) {
            self.clock.advance_to(due);
            self.apply(transition)?;
            fired += 1;
        }
        self.clock.advance_to(ms);
        Ok(fired)
    }

    pub fn advance_by(&mut self, ms: Millis) -> CourtroomResult<usize> {
        let from_ms = self.clock.elapsed_ms;
        let target = from_ms
            .checked_add(ms)
            .ok_or(CourtroomError::ClockOverflow { from_ms, step_ms: ms })?;
        self.advance_to(target)
    }

    pub fn pending_transitions(&self) -> usize {
        self.schedule.pending()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.schedule.next_due()
    }

    /// Cancel every outstanding transition of one case.
    pub fn cancel_case_tasks(&mut self, case_id: &str) -> CourtroomResult<usize> {
        let document_ids = self.case_record(case_id)?.document_ids.clone();
        let dropped = self.schedule.cancel_case(case_id);
        for id in &document_ids {
            self.document_tasks.remove(id);
        }
        self.halt_runs(Some(case_id));
        log::debug!("Cancelled {dropped} pending transitions for {case_id}");
        Ok(dropped)
    }

    /// Cancel every outstanding transition in the store. Unfinished debates
    /// end `failed`.
    pub fn dispose(&mut self) -> usize {
        let dropped = self.schedule.clear();
        self.document_tasks.clear();
        self.halt_runs(None);
        log::info!("Mock store disposed, {dropped} pending transitions dropped");
        dropped
    }

    fn apply(&mut self, transition: Transition) -> CourtroomResult<()> {
        match transition {
            Transition::DocumentStatus { document_id, status } => {
                self.apply_document_status(&document_id, status);
                Ok(())
            }
            Transition::DebateStage { run_id, stage } => self.apply_stage(&run_id, stage),
        }
    }

    // ── Cases ──────────────────────────────────────────────────────

    pub fn create_case(&mut self, applicant: Option<ApplicantPayload>) -> CourtroomResult<Case> {
        if let Some(applicant) = &applicant {
            applicant.validate()?;
        }
        let now = self.clock.now();
        let case_id = self.rng.ids.next_id("case");
        let record = CaseRecord {
            case_id: case_id.clone(),
            seq: self.next_seq(),
            status: CaseStatus::Draft,
            created_at: now,
            updated_at: now,
            applicant: applicant.filter(|a| !a.is_empty()),
            document_ids: Vec::new(),
            retrieval: None,
            run_id: None,
            decision: None,
            fraud_signals: None,
        };
        self.cases.insert(case_id.clone(), record);
        self.record(&case_id, AuditEventType::CreatedCase, json!({ "created_by": "analyst_001" }))?;
        log::info!("Created case {case_id}");
        self.case(&case_id)
    }

    pub fn update_applicant(
        &mut self,
        case_id: &str,
        patch: &ApplicantPayload,
    ) -> CourtroomResult<Case> {
        self.case_record(case_id)?;
        patch.validate()?;
        let now = self.clock.now();
        let record = self.case_record_mut(case_id)?;
        let changed = record
            .applicant
            .get_or_insert_with(ApplicantPayload::default)
            .merge(patch);
        record.updated_at = now;
        if record.status == CaseStatus::Draft {
            record.status = CaseStatus::Ready;
        }
        self.record(
            case_id,
            AuditEventType::UpdatedApplicant,
            json!({ "fields_updated": changed }),
        )?;
        self.case(case_id)
    }

    pub fn case(&self, case_id: &str) -> CourtroomResult<Case> {
        self.case_record(case_id).map(|record| self.snapshot(record))
    }

    pub fn audit_events(&self, case_id: &str) -> CourtroomResult<Vec<AuditEvent>> {
        self.case_record(case_id)?;
        self.audit.for_case(case_id)
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    // ── Internals shared by the submodules ─────────────────────────

    fn next_seq(&mut self) -> u64 {
        self.next_case_seq += 1;
        self.next_case_seq
    }

    fn case_record(&self, case_id: &str) -> CourtroomResult<&CaseRecord> {
        self.cases
            .get(case_id)
            .ok_or_else(|| CourtroomError::not_found("Case", case_id))
    }

    fn case_record_mut(&mut self, case_id: &str) -> CourtroomResult<&mut CaseRecord> {
        self.cases
            .get_mut(case_id)
            .ok_or_else(|| CourtroomError::not_found("Case", case_id))
    }

    fn run_record(&self, run_id: &str) -> CourtroomResult<&RunRecord> {
        self.runs
            .get(run_id)
            .ok_or_else(|| CourtroomError::not_found("Run", run_id))
    }

    /// Materialize the public view of a case from the id-linked records.
    fn snapshot(&self, record: &CaseRecord) -> Case {
        Case {
            case_id: record.case_id.clone(),
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            applicant: record.applicant.clone(),
            documents: record
                .document_ids
                .iter()
                .filter_map(|id| self.documents.get(id).cloned())
                .collect(),
            retrieval: record.retrieval.clone(),
            debate: record
                .run_id
                .as_ref()
                .and_then(|id| self.runs.get(id))
                .map(|r| r.run.clone()),
            decision: record.decision.clone(),
            fraud_signals: record.fraud_signals.clone(),
        }
    }

    fn record(&mut self, case_id: &str, event_type: AuditEventType, metadata: Value) -> CourtroomResult<()> {
        let timestamp = self.clock.now();
        self.record_at(case_id, event_type, metadata, timestamp)
    }

    fn record_at(
        &mut self,
        case_id: &str,
        event_type: AuditEventType,
        metadata: Value,
        timestamp: DateTime<Utc>,
    ) -> CourtroomResult<()> {
        let metadata = match metadata {
            Value::Object(map) => map,
            other => {
                let mut map = JsonMap::new();
                map.insert("value".into(), other);
                map
            }
        };
        let event = AuditEvent {
            event_id: self.rng.ids.next_id("evt"),
            case_id: case_id.to_string(),
            event_type,
            timestamp,
            metadata,
        };
        self.audit.append(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CourtroomConfig;

    fn store() -> MockDataStore {
        MockDataStore::new(CourtroomConfig::default_test().simulation).expect("store")
    }

    #[test]
    fn new_case_is_draft_without_decision() {
        let mut store = store();
        let case = store.create_case(None).unwrap();
        assert_eq!(case.status, CaseStatus::Draft);
        assert!(case.decision.is_none());
        assert!(case.applicant.is_none());
        assert!(case.documents.is_empty());
        let events = store.audit_events(&case.case_id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::CreatedCase);
    }

    #[test]
    fn invalid_patch_changes_nothing() {
        let mut store = store();
        let case = store.create_case(None).unwrap();
        let patch = ApplicantPayload {
            credit_score: Some(10.0),
            ..Default::default()
        };
        let err = store.update_applicant(&case.case_id, &patch).unwrap_err();
        assert!(matches!(err, CourtroomError::Validation(_)));
        let after = store.case(&case.case_id).unwrap();
        assert_eq!(after.status, CaseStatus::Draft);
        assert!(after.applicant.is_none());
        assert_eq!(store.audit_events(&case.case_id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_case_is_not_found() {
        let mut store = store();
        let err = store
            .update_applicant("case_missing", &ApplicantPayload::default())
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Case not found: case_missing");
        assert!(store.audit_events("case_missing").unwrap_err().is_not_found());
    }

    #[test]
    fn advance_moves_clock_without_pending_work() {
        let mut store = store();
        assert_eq!(store.advance_to(1234).unwrap(), 0);
        assert_eq!(store.now_ms(), 1234);
        assert_eq!(store.advance_by(6).unwrap(), 0);
        assert_eq!(store.now_ms(), 1240);
    }

    #[test]
    fn advancing_past_the_timeline_is_an_error() {
        let mut store = store();
        store.advance_to(1000).unwrap();
        let err = store.advance_by(u64::MAX).unwrap_err();
        assert!(matches!(err, CourtroomError::ClockOverflow { from_ms: 1000, step_ms: u64::MAX }));
        let err = store.advance_to(u64::MAX).unwrap_err();
        assert!(matches!(err, CourtroomError::ClockOverflow { from_ms: 1000, .. }));
        assert_eq!(store.now_ms(), 1000);
        assert!(store.create_case(None).is_ok());
    }
}

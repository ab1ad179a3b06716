//! The Credit Courtroom data model.
//!
//! Every entity is a plain serde record whose wire shape matches the REST API.
//! Entities are owned by the store; everything handed to callers is a snapshot.

use crate::types::{CaseId, DocumentId, PolicyId, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object (extracted fields, previews, audit metadata).
pub type JsonMap = Map<String, Value>;

// ── Enumerations ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Draft,
    Ready,
    Running,
    Decided,
    Failed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Decided => "decided",
            Self::Failed => "failed",
        }
    }

    /// Terminal for the run-status poll loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Decided | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    Parsing,
    Extracted,
    Error,
}

/// Debate stages in the only order a run may visit them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DebateStage {
    Opening,
    Rebuttal,
    Counter,
    Final,
    Verdict,
    Done,
}

impl DebateStage {
    pub const ALL: [DebateStage; 6] = [
        Self::Opening,
        Self::Rebuttal,
        Self::Counter,
        Self::Final,
        Self::Verdict,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Rebuttal => "rebuttal",
            Self::Counter => "counter",
            Self::Final => "final",
            Self::Verdict => "verdict",
            Self::Done => "done",
        }
    }

    /// Percentage reported by the run-status endpoint.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Opening => 20,
            Self::Rebuttal => 40,
            Self::Counter => 60,
            Self::Final => 80,
            Self::Verdict => 90,
            Self::Done => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebateRole {
    Risk,
    Advocate,
    Moderator,
    Judge,
}

impl DebateRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "RISK",
            Self::Advocate => "ADVOCATE",
            Self::Moderator => "MODERATOR",
            Self::Judge => "JUDGE",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Reject,
    ManualReview,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::ManualReview => "manual_review",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NeighborOutcome {
    Repaid,
    Default,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Eligibility,
    RiskThreshold,
    Regulatory,
    ManualReview,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    Archived,
}

// ── Applicant categorical fields ───────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmploymentStatus {
    Employed,
    #[serde(rename = "Self-employed")]
    SelfEmployed,
    Unemployed,
    Retired,
    Student,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EducationLevel {
    #[serde(rename = "High School")]
    HighSchool,
    #[serde(rename = "Associate's")]
    Associates,
    #[serde(rename = "Bachelor's")]
    Bachelors,
    #[serde(rename = "Master's")]
    Masters,
    Doctorate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoanPurpose {
    Car,
    Home,
    Education,
    Medical,
    Business,
    #[serde(rename = "Debt Consolidation")]
    DebtConsolidation,
    Personal,
    Other,
}

impl LoanPurpose {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Home => "Home",
            Self::Education => "Education",
            Self::Medical => "Medical",
            Self::Business => "Business",
            Self::DebtConsolidation => "Debt Consolidation",
            Self::Personal => "Personal",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResidenceType {
    Rent,
    Own,
    Mortgage,
    Other,
}

// ── Applicant ──────────────────────────────────────────────────────

/// Underwriting profile. Intake fills it in piecemeal, so every field is optional
/// and a payload doubles as a merge patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApplicantPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_term: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_to_income_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_level: Option<EducationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_purpose: Option<LoanPurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delinquency_history: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_records: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_of_open_accounts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_of_credit_inquiries: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence_type: Option<ResidenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_at_current_residence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_at_current_job: Option<f64>,
}

macro_rules! merge_fields {
    ($target:ident, $patch:ident, $changed:ident; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = Some(value);
                $changed.push(stringify!($field));
            }
        )+
    };
}

impl ApplicantPayload {
    /// Shallow merge: every field present in `patch` overwrites, the rest stay.
    /// Returns the names of the fields the patch carried, in declaration order.
    pub fn merge(&mut self, patch: &ApplicantPayload) -> Vec<&'static str> {
        let mut changed = Vec::new();
        merge_fields!(self, patch, changed;
            age,
            annual_income,
            credit_score,
            loan_amount,
            loan_term,
            interest_rate,
            debt_to_income_ratio,
            employment_status,
            education_level,
            loan_purpose,
            marital_status,
            gender,
            delinquency_history,
            public_records,
            num_of_open_accounts,
            num_of_credit_inquiries,
            residence_type,
            years_at_current_residence,
            years_at_current_job,
        );
        changed
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── Documents ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub document_id: DocumentId,
    pub case_id: CaseId,
    pub filename: String,
    pub content_type: String,
    pub status: DocumentStatus,
    pub extracted_fields: Option<JsonMap>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A file handed to the upload endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// ── Retrieval ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeighborCase {
    pub neighbor_id: String,
    pub similarity: f64,
    pub outcome: NeighborOutcome,
    pub highlights: Vec<String>,
    pub payload_preview: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalStats {
    pub default_rate: f64,
    pub average_credit_score: f64,
    pub median_income: f64,
    pub total_neighbors: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSummary {
    pub top_k: u32,
    pub neighbors: Vec<NeighborCase>,
    pub stats: RetrievalStats,
}

impl RetrievalSummary {
    /// Build a summary whose stats are derived from `neighbors`.
    pub fn from_neighbors(top_k: u32, neighbors: Vec<NeighborCase>) -> Self {
        let n = neighbors.len();
        let preview_mean = |key: &str| -> f64 {
            if n == 0 {
                return 0.0;
            }
            let sum: f64 = neighbors
                .iter()
                .map(|nb| nb.payload_preview.get(key).and_then(Value::as_f64).unwrap_or(0.0))
                .sum();
            (sum / n as f64).round()
        };
        let defaults = neighbors
            .iter()
            .filter(|nb| nb.outcome == NeighborOutcome::Default)
            .count();
        let default_rate = if n == 0 {
            0.0
        } else {
            (defaults as f64 / n as f64 * 100.0).round()
        };
        let stats = RetrievalStats {
            default_rate,
            average_credit_score: preview_mean("credit_score"),
            // Mean under the historical wire name.
            median_income: preview_mean("annual_income"),
            total_neighbors: n as u32,
        };
        Self { top_k, neighbors, stats }
    }
}

// ── Debate ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebateMessage {
    pub role: DebateRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub stage: DebateStage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebateRun {
    pub run_id: RunId,
    pub stage: DebateStage,
    pub messages: Vec<DebateMessage>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Decision and policies ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyClause {
    pub clause_id: String,
    pub policy_id: PolicyId,
    pub section: String,
    pub text: String,
    pub policy_type: PolicyType,
    pub document_name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyReference {
    pub policy_id: PolicyId,
    pub clause: PolicyClause,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub policy_id: PolicyId,
    pub name: String,
    pub document_type: PolicyType,
    pub filename: String,
    pub version: String,
    pub uploaded_at: DateTime<Utc>,
    pub clauses_count: u32,
    pub status: PolicyStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub verdict: Verdict,
    pub justification: Vec<String>,
    pub evidence_refs: Vec<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_refs: Option<Vec<PolicyReference>>,
}

// ── Fraud graph signals ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudSignals {
    pub shared_device_count: u32,
    pub shared_ip_count: u32,
    pub shared_merchant_count: u32,
    pub known_fraud_neighbor_count: u32,
    pub fraud_cluster_score: f64,
    pub fraud_flags: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

// ── Case ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub case_id: CaseId,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applicant: Option<ApplicantPayload>,
    pub documents: Vec<Document>,
    pub retrieval: Option<RetrievalSummary>,
    pub debate: Option<DebateRun>,
    pub decision: Option<Decision>,
    pub fraud_signals: Option<FraudSignals>,
}

// ── Run views ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebateMode {
    #[default]
    Standard,
    Adversarial,
}

impl DebateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Adversarial => "adversarial",
        }
    }
}

/// Progress of one run as reported by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunStatus {
    pub run_id: RunId,
    pub case_id: CaseId,
    pub status: CaseStatus,
    pub stage: DebateStage,
    pub progress: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    pub messages: Vec<DebateMessage>,
    pub stage: DebateStage,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionBundle {
    pub decision: Decision,
    pub retrieval: RetrievalSummary,
}

/// One page of cases plus the number of matches before pagination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseList {
    pub items: Vec<Case>,
    pub total: u32,
}

// ── Audit ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    CreatedCase,
    UpdatedApplicant,
    UploadedDocs,
    RetrievedNeighbors,
    DebateStarted,
    DebateMessage,
    JudgeDecision,
    ExportedReport,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedCase => "created_case",
            Self::UpdatedApplicant => "updated_applicant",
            Self::UploadedDocs => "uploaded_docs",
            Self::RetrievedNeighbors => "retrieved_neighbors",
            Self::DebateStarted => "debate_started",
            Self::DebateMessage => "debate_message",
            Self::JudgeDecision => "judge_decision",
            Self::ExportedReport => "exported_report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "created_case" => Self::CreatedCase,
            "updated_applicant" => Self::UpdatedApplicant,
            "uploaded_docs" => Self::UploadedDocs,
            "retrieved_neighbors" => Self::RetrievedNeighbors,
            "debate_started" => Self::DebateStarted,
            "debate_message" => Self::DebateMessage,
            "judge_decision" => Self::JudgeDecision,
            "exported_report" => Self::ExportedReport,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub event_id: String,
    pub case_id: CaseId,
    pub event_type: AuditEventType,
    pub timestamp: DateTime<Utc>,
    pub metadata: JsonMap,
}

// ── Dashboard ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_cases: u32,
    pub approvals: u32,
    pub rejects: u32,
    pub manual_reviews: u32,
    pub draft_cases: u32,
    pub running_cases: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut base = ApplicantPayload {
            age: Some(32.0),
            credit_score: Some(640.0),
            loan_purpose: Some(LoanPurpose::Car),
            ..Default::default()
        };
        let patch = ApplicantPayload {
            credit_score: Some(700.0),
            ..Default::default()
        };
        let changed = base.merge(&patch);
        assert_eq!(changed, vec!["credit_score"]);
        assert_eq!(base.credit_score, Some(700.0));
        assert_eq!(base.age, Some(32.0));
        assert_eq!(base.loan_purpose, Some(LoanPurpose::Car));
    }

    #[test]
    fn categorical_fields_use_display_strings() {
        let applicant: ApplicantPayload = serde_json::from_value(json!({
            "employment_status": "Self-employed",
            "education_level": "Master's",
            "loan_purpose": "Debt Consolidation",
        }))
        .expect("parse applicant");
        assert_eq!(applicant.employment_status, Some(EmploymentStatus::SelfEmployed));
        assert_eq!(applicant.education_level, Some(EducationLevel::Masters));
        assert_eq!(applicant.loan_purpose, Some(LoanPurpose::DebtConsolidation));
    }

    #[test]
    fn unknown_applicant_fields_are_rejected() {
        let parsed = serde_json::from_value::<ApplicantPayload>(json!({ "shoe_size": 44 }));
        assert!(parsed.is_err());
    }

    #[test]
    fn retrieval_stats_follow_neighbors() {
        let preview = |score: f64, income: f64| {
            json!({ "credit_score": score, "annual_income": income })
                .as_object()
                .cloned()
                .unwrap_or_default()
        };
        let summary = RetrievalSummary::from_neighbors(
            2,
            vec![
                NeighborCase {
                    neighbor_id: "a".into(),
                    similarity: 0.9,
                    outcome: NeighborOutcome::Repaid,
                    highlights: vec![],
                    payload_preview: preview(700.0, 60000.0),
                },
                NeighborCase {
                    neighbor_id: "b".into(),
                    similarity: 0.8,
                    outcome: NeighborOutcome::Default,
                    highlights: vec![],
                    payload_preview: preview(601.0, 40000.0),
                },
            ],
        );
        assert_eq!(summary.stats.default_rate, 50.0);
        assert_eq!(summary.stats.average_credit_score, 651.0);
        assert_eq!(summary.stats.median_income, 50000.0);
        assert_eq!(summary.stats.total_neighbors, 2);
    }

    #[test]
    fn stages_are_strictly_ordered() {
        for pair in DebateStage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].progress() < pair[1].progress());
        }
    }
}

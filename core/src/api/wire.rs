//! Request bodies and response envelopes as they travel over HTTP.

use crate::{
    model::{
        ApplicantPayload, Case, CaseStatus, DebateMode, Document, FraudSignals, Policy,
        PolicyClause,
    },
    types::{CaseId, RunId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateCaseRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StartDebateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DebateMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartDebateResponse {
    pub run_id: RunId,
    pub status: CaseStatus,
    pub case_id: CaseId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseEnvelope {
    pub case: Case,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    pub items: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudSignalsEnvelope {
    pub fraud_signals: FraudSignals,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyList {
    pub items: Vec<Policy>,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEnvelope {
    pub policy: Policy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseList {
    pub clauses: Vec<PolicyClause>,
}

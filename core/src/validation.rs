//! Contract checks applied at every external boundary.
//!
//! Serde enforces shape (types, enum strings, required keys). This module
//! enforces the numeric domains and cross-field invariants that serde cannot.

use crate::{
    api::StartDebateResponse,
    model::{
        ApplicantPayload, AuditEvent, Case, CaseList, CaseStatus, DebateRun,
        DebateStage, Decision, DecisionBundle, Document, FraudSignals, NeighborCase, Policy,
        PolicyClause, PolicyReference, RetrievalSummary, RunStatus, Transcript,
    },
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Prefix the path with the enclosing field.
    pub fn within(mut self, parent: &str) -> Self {
        self.path = format!("{parent}.{}", self.path);
        self
    }
}

pub type ValidationResult = Result<(), ValidationError>;

pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> ValidationResult {
        for (i, item) in self.iter().enumerate() {
            item.validate().map_err(|e| e.within(&format!("[{i}]")))?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> ValidationResult {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

fn in_range(path: &str, value: f64, min: f64, max: f64) -> ValidationResult {
    if !value.is_finite() {
        return Err(ValidationError::new(path, "must be a finite number"));
    }
    if value < min || value > max {
        return Err(ValidationError::new(
            path,
            format!("{value} outside [{min}, {max}]"),
        ));
    }
    Ok(())
}

fn non_negative(path: &str, value: f64) -> ValidationResult {
    in_range(path, value, 0.0, f64::MAX)
}

fn unit_interval(path: &str, value: f64) -> ValidationResult {
    in_range(path, value, 0.0, 1.0)
}

fn non_empty(path: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(path, "must not be empty"));
    }
    Ok(())
}

impl Validate for ApplicantPayload {
    fn validate(&self) -> ValidationResult {
        let bounded = [
            ("age", self.age, 18.0, 100.0),
            ("credit_score", self.credit_score, 300.0, 850.0),
            ("loan_term", self.loan_term, 12.0, 360.0),
            ("interest_rate", self.interest_rate, 0.0, 30.0),
            ("debt_to_income_ratio", self.debt_to_income_ratio, 0.0, 100.0),
        ];
        for (path, value, min, max) in bounded {
            if let Some(v) = value {
                in_range(path, v, min, max)?;
            }
        }

        let counts = [
            ("annual_income", self.annual_income),
            ("loan_amount", self.loan_amount),
            ("delinquency_history", self.delinquency_history),
            ("public_records", self.public_records),
            ("num_of_open_accounts", self.num_of_open_accounts),
            ("num_of_credit_inquiries", self.num_of_credit_inquiries),
            ("years_at_current_residence", self.years_at_current_residence),
            ("years_at_current_job", self.years_at_current_job),
        ];
        for (path, value) in counts {
            if let Some(v) = value {
                non_negative(path, v)?;
            }
        }
        Ok(())
    }
}

impl Validate for Document {
    fn validate(&self) -> ValidationResult {
        non_empty("document_id", &self.document_id)?;
        non_empty("case_id", &self.case_id)?;
        non_empty("filename", &self.filename)
    }
}

impl Validate for NeighborCase {
    fn validate(&self) -> ValidationResult {
        non_empty("neighbor_id", &self.neighbor_id)?;
        unit_interval("similarity", self.similarity)
    }
}

impl Validate for RetrievalSummary {
    fn validate(&self) -> ValidationResult {
        self.neighbors.validate().map_err(|e| e.within("neighbors"))?;
        in_range("stats.default_rate", self.stats.default_rate, 0.0, 100.0)?;
        non_negative("stats.average_credit_score", self.stats.average_credit_score)?;
        non_negative("stats.median_income", self.stats.median_income)
    }
}

impl Validate for DebateRun {
    fn validate(&self) -> ValidationResult {
        non_empty("run_id", &self.run_id)?;
        let mut previous = DebateStage::Opening;
        for (i, message) in self.messages.iter().enumerate() {
            if message.stage < previous {
                return Err(ValidationError::new(
                    format!("messages[{i}].stage"),
                    format!("{} appears after {}", message.stage.as_str(), previous.as_str()),
                ));
            }
            if message.stage > self.stage {
                return Err(ValidationError::new(
                    format!("messages[{i}].stage"),
                    format!("{} is ahead of run stage {}", message.stage.as_str(), self.stage.as_str()),
                ));
            }
            previous = message.stage;
        }
        if self.updated_at < self.started_at {
            return Err(ValidationError::new("updated_at", "precedes started_at"));
        }
        Ok(())
    }
}

impl Validate for PolicyReference {
    fn validate(&self) -> ValidationResult {
        if self.clause.policy_id != self.policy_id {
            return Err(ValidationError::new(
                "clause.policy_id",
                format!("{} does not match {}", self.clause.policy_id, self.policy_id),
            ));
        }
        Ok(())
    }
}

impl Validate for Decision {
    fn validate(&self) -> ValidationResult {
        unit_interval("confidence", self.confidence)?;
        self.policy_refs.validate().map_err(|e| e.within("policy_refs"))
    }
}

impl Validate for FraudSignals {
    fn validate(&self) -> ValidationResult {
        unit_interval("fraud_cluster_score", self.fraud_cluster_score)
    }
}

impl Validate for Policy {
    fn validate(&self) -> ValidationResult {
        non_empty("policy_id", &self.policy_id)?;
        non_empty("name", &self.name)
    }
}

impl Validate for AuditEvent {
    fn validate(&self) -> ValidationResult {
        non_empty("event_id", &self.event_id)?;
        non_empty("case_id", &self.case_id)
    }
}

impl Validate for Case {
    fn validate(&self) -> ValidationResult {
        non_empty("case_id", &self.case_id)?;
        self.applicant.validate().map_err(|e| e.within("applicant"))?;
        self.documents.validate().map_err(|e| e.within("documents"))?;
        self.retrieval.validate().map_err(|e| e.within("retrieval"))?;
        self.debate.validate().map_err(|e| e.within("debate"))?;
        self.decision.validate().map_err(|e| e.within("decision"))?;
        self.fraud_signals.validate().map_err(|e| e.within("fraud_signals"))?;

        for doc in &self.documents {
            if doc.case_id != self.case_id {
                return Err(ValidationError::new(
                    "documents",
                    format!("{} belongs to {}", doc.document_id, doc.case_id),
                ));
            }
        }

        let decided = self.status == CaseStatus::Decided;
        if decided != self.decision.is_some() {
            return Err(ValidationError::new(
                "status",
                "decided status and presence of a decision disagree",
            ));
        }
        let debating = self
            .debate
            .as_ref()
            .is_some_and(|run| run.stage != DebateStage::Done);
        let consistent = match self.status {
            CaseStatus::Running => debating,
            // A cancelled debate stays unfinished on a failed case.
            CaseStatus::Failed => true,
            _ => !debating,
        };
        if !consistent {
            return Err(ValidationError::new(
                "status",
                "running status and an unfinished debate disagree",
            ));
        }
        Ok(())
    }
}

impl Validate for CaseList {
    fn validate(&self) -> ValidationResult {
        self.items.validate().map_err(|e| e.within("items"))?;
        if self.items.len() as u64 > u64::from(self.total) {
            return Err(ValidationError::new("total", "smaller than the page it came with"));
        }
        Ok(())
    }
}

impl Validate for RunStatus {
    fn validate(&self) -> ValidationResult {
        non_empty("run_id", &self.run_id)?;
        if self.progress != self.stage.progress() {
            return Err(ValidationError::new(
                "progress",
                format!("{} does not match stage {}", self.progress, self.stage.as_str()),
            ));
        }
        if self.status == CaseStatus::Decided && self.stage != DebateStage::Done {
            return Err(ValidationError::new("status", "decided before stage done"));
        }
        Ok(())
    }
}

impl Validate for Transcript {
    fn validate(&self) -> ValidationResult {
        for (i, message) in self.messages.iter().enumerate() {
            if message.stage > self.stage {
                return Err(ValidationError::new(
                    format!("messages[{i}].stage"),
                    format!("{} is ahead of {}", message.stage.as_str(), self.stage.as_str()),
                ));
            }
        }
        Ok(())
    }
}

impl Validate for DecisionBundle {
    fn validate(&self) -> ValidationResult {
        self.decision.validate().map_err(|e| e.within("decision"))?;
        self.retrieval.validate().map_err(|e| e.within("retrieval"))
    }
}

impl Validate for StartDebateResponse {
    fn validate(&self) -> ValidationResult {
        non_empty("run_id", &self.run_id)?;
        non_empty("case_id", &self.case_id)
    }
}

impl Validate for PolicyClause {
    fn validate(&self) -> ValidationResult {
        non_empty("clause_id", &self.clause_id)?;
        non_empty("policy_id", &self.policy_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DebateMessage, DebateRole};
    use chrono::Utc;

    #[test]
    fn credit_score_domain_enforced() {
        let applicant = ApplicantPayload {
            credit_score: Some(900.0),
            ..Default::default()
        };
        let err = applicant.validate().expect_err("900 is out of range");
        assert_eq!(err.path, "credit_score");
    }

    #[test]
    fn absent_fields_are_not_checked() {
        assert!(ApplicantPayload::default().validate().is_ok());
    }

    #[test]
    fn nan_is_rejected() {
        let applicant = ApplicantPayload {
            annual_income: Some(f64::NAN),
            ..Default::default()
        };
        assert!(applicant.validate().is_err());
    }

    #[test]
    fn messages_cannot_run_ahead_of_stage() {
        let now = Utc::now();
        let run = DebateRun {
            run_id: "run_x".into(),
            stage: DebateStage::Opening,
            messages: vec![DebateMessage {
                role: DebateRole::Judge,
                content: "early".into(),
                timestamp: now,
                stage: DebateStage::Verdict,
            }],
            started_at: now,
            updated_at: now,
        };
        let err = run.validate().expect_err("verdict message during opening");
        assert_eq!(err.path, "messages[0].stage");
    }
}

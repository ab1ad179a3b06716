//! Demo data loaded into a fresh store when `seed_demo_data` is set.
//!
//! Five cases covering every lifecycle state, each with an audit trail that
//! matches its state. `case_002` is mid-debate; its remaining stages are
//! scheduled from store start so it finishes like any other run.

use super::{CaseRecord, MockDataStore, RunRecord};
use crate::{
    error::CourtroomResult,
    fixtures,
    model::{
        ApplicantPayload, AuditEventType, CaseStatus, DebateMessage, DebateRun, DebateStage,
        Decision, Document, DocumentStatus, RiskTier,
    },
    schedule::Transition,
    types::RunId,
};
use chrono::{DateTime, Utc};
use serde_json::json;

struct DemoCase {
    case_id: &'static str,
    status: CaseStatus,
    created_days_ago: i64,
    updated_days_ago: i64,
    with_documents: bool,
    /// Stage the seeded run has reached, if any.
    run_stage: Option<DebateStage>,
    decision: Option<Decision>,
    fraud_tier: Option<RiskTier>,
}

fn demo_cases() -> Vec<DemoCase> {
    vec![
        DemoCase {
            case_id: "case_001",
            status: CaseStatus::Decided,
            created_days_ago: 5,
            updated_days_ago: 0,
            with_documents: true,
            run_stage: Some(DebateStage::Done),
            decision: Some(fixtures::synthesized_decision()),
            fraud_tier: Some(RiskTier::Low),
        },
        DemoCase {
            case_id: "case_002",
            status: CaseStatus::Running,
            created_days_ago: 3,
            updated_days_ago: 0,
            with_documents: true,
            run_stage: Some(DebateStage::Rebuttal),
            decision: None,
            fraud_tier: Some(RiskTier::Medium),
        },
        DemoCase {
            case_id: "case_003",
            status: CaseStatus::Draft,
            created_days_ago: 2,
            updated_days_ago: 1,
            with_documents: false,
            run_stage: None,
            decision: None,
            fraud_tier: None,
        },
        DemoCase {
            case_id: "case_004",
            status: CaseStatus::Decided,
            created_days_ago: 7,
            updated_days_ago: 6,
            with_documents: true,
            run_stage: Some(DebateStage::Done),
            decision: Some(fixtures::demo_reject_decision()),
            fraud_tier: Some(RiskTier::High),
        },
        DemoCase {
            case_id: "case_005",
            status: CaseStatus::Decided,
            created_days_ago: 10,
            updated_days_ago: 8,
            with_documents: true,
            run_stage: Some(DebateStage::Done),
            decision: Some(fixtures::demo_approve_decision()),
            fraud_tier: Some(RiskTier::Low),
        },
    ]
}

impl MockDataStore {
    pub(super) fn seed_demo_cases(&mut self) -> CourtroomResult<()> {
        for (demo, applicant) in demo_cases().into_iter().zip(fixtures::demo_applicants()) {
            self.seed_case(demo, applicant)?;
        }
        Ok(())
    }

    fn seed_case(&mut self, demo: DemoCase, applicant: ApplicantPayload) -> CourtroomResult<()> {
        let case_id = demo.case_id;
        let created_at = self.clock.days_ago(demo.created_days_ago);
        let updated_at = self.clock.days_ago(demo.updated_days_ago);
        // Spread the history between creation and the last update.
        let step = (updated_at - created_at) / 6;
        let at = |n: i32| created_at + step * n;

        self.record_at(case_id, AuditEventType::CreatedCase, json!({ "created_by": "analyst_001" }), at(0))?;
        self.record_at(
            case_id,
            AuditEventType::UpdatedApplicant,
            json!({ "fields_updated": ["annual_income", "employment_status"] }),
            at(1),
        )?;

        let document_ids = if demo.with_documents {
            self.seed_documents(case_id, at(2))?
        } else {
            Vec::new()
        };

        let (run_id, retrieval) = match demo.run_stage {
            Some(stage) => {
                let retrieval = fixtures::retrieval_summary();
                self.record_at(
                    case_id,
                    AuditEventType::RetrievedNeighbors,
                    json!({ "top_k": retrieval.top_k, "default_rate": retrieval.stats.default_rate }),
                    at(3),
                )?;
                let run_id = self.seed_run(case_id, stage, demo.decision.clone(), at(4), updated_at);
                self.record_at(
                    case_id,
                    AuditEventType::DebateStarted,
                    json!({ "run_id": run_id, "top_k": retrieval.top_k, "mode": "standard" }),
                    at(4),
                )?;
                if let Some(decision) = &demo.decision {
                    self.record_at(
                        case_id,
                        AuditEventType::JudgeDecision,
                        json!({
                            "run_id": run_id,
                            "verdict": decision.verdict.as_str(),
                            "confidence": decision.confidence,
                        }),
                        updated_at,
                    )?;
                }
                (Some(run_id), Some(retrieval))
            }
            None => (None, None),
        };

        let record = CaseRecord {
            case_id: case_id.to_string(),
            seq: self.next_seq(),
            status: demo.status,
            created_at,
            updated_at,
            applicant: Some(applicant),
            document_ids,
            retrieval,
            run_id,
            decision: demo.decision,
            fraud_signals: demo.fraud_tier.map(|tier| fixtures::fraud_signals(tier, updated_at)),
        };
        self.cases.insert(case_id.to_string(), record);
        Ok(())
    }

    fn seed_documents(
        &mut self,
        case_id: &str,
        uploaded_at: DateTime<Utc>,
    ) -> CourtroomResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut filenames = Vec::new();
        for (filename, content_type, size, fields) in fixtures::demo_documents() {
            let document = Document {
                document_id: self.rng.ids.next_id("doc"),
                case_id: case_id.to_string(),
                filename: filename.to_string(),
                content_type: content_type.to_string(),
                status: DocumentStatus::Extracted,
                extracted_fields: Some(fields),
                created_at: uploaded_at,
                size: Some(size),
            };
            ids.push(document.document_id.clone());
            filenames.push(filename);
            self.documents.insert(document.document_id.clone(), document);
        }
        self.record_at(
            case_id,
            AuditEventType::UploadedDocs,
            json!({ "document_count": ids.len(), "filenames": filenames }),
            uploaded_at,
        )?;
        Ok(ids)
    }

    /// A run that has reached `stage`, with every scripted message up to it.
    /// Unfinished runs get their remaining stages scheduled from store start.
    fn seed_run(
        &mut self,
        case_id: &str,
        stage: DebateStage,
        decision: Option<Decision>,
        started_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> RunId {
        let run_id = self.rng.ids.next_id("run");
        let messages: Vec<DebateMessage> = fixtures::debate_script()
            .iter()
            .filter(|line| line.stage <= stage)
            .map(|line| DebateMessage {
                role: line.role,
                content: line.content.to_string(),
                timestamp: updated_at,
                stage: line.stage,
            })
            .collect();

        let remaining: Vec<DebateStage> = DebateStage::ALL.into_iter().filter(|s| *s > stage).collect();
        let schedule = if remaining.is_empty() {
            None
        } else {
            let handle = self.schedule.new_handle();
            let base = self.clock.elapsed_ms;
            for (i, next) in remaining.into_iter().enumerate() {
                self.schedule.schedule(
                    handle,
                    case_id,
                    base.saturating_add((i as u64 + 1).saturating_mul(self.config.stage_interval_ms)),
                    Transition::DebateStage {
                        run_id: run_id.clone(),
                        stage: next,
                    },
                );
            }
            Some(handle)
        };

        let retrieval = fixtures::retrieval_summary();
        self.runs.insert(
            run_id.clone(),
            RunRecord {
                case_id: case_id.to_string(),
                top_k: retrieval.top_k,
                schedule,
                cursor: messages.len(),
                cancelled: false,
                run: DebateRun {
                    run_id: run_id.clone(),
                    stage,
                    messages,
                    started_at,
                    updated_at: updated_at.max(started_at),
                },
                retrieval,
                decision,
            },
        );
        run_id
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::SimulationConfig,
        model::{AuditEventType, CaseStatus, DebateStage},
        store::MockDataStore,
        validation::Validate,
    };

    fn seeded() -> MockDataStore {
        MockDataStore::new(SimulationConfig {
            seed_demo_data: true,
            ..SimulationConfig::default()
        })
        .expect("seeded store")
    }

    #[test]
    fn demo_cases_cover_every_state_and_validate() {
        let store = seeded();
        let cases = store.cases();
        assert_eq!(cases.len(), 5);
        for case in &cases {
            case.validate().unwrap_or_else(|e| panic!("{} invalid: {e}", case.case_id));
        }
        let stats = store.stats();
        assert_eq!(stats.running_cases, 1);
        assert_eq!(stats.draft_cases, 1);
        assert_eq!(stats.approvals, 1);
        assert_eq!(stats.rejects, 1);
        assert_eq!(stats.manual_reviews, 1);
    }

    #[test]
    fn running_demo_case_finishes() {
        let mut store = seeded();
        let case = store.case("case_002").unwrap();
        let run = case.debate.expect("seeded run");
        assert_eq!(run.stage, DebateStage::Rebuttal);
        assert_eq!(run.messages.len(), 3);

        store.advance_to(8000).unwrap();
        let case = store.case("case_002").unwrap();
        assert_eq!(case.status, CaseStatus::Decided);
        assert_eq!(case.debate.unwrap().messages.len(), 8);
        assert_eq!(
            store.audit_log().count_of_type("case_002", AuditEventType::JudgeDecision).unwrap(),
            1
        );
    }

    #[test]
    fn decided_demo_case_has_full_history() {
        let store = seeded();
        let events = store.audit_events("case_004").unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0].event_type, AuditEventType::CreatedCase);
        assert_eq!(events[5].event_type, AuditEventType::JudgeDecision);
        assert_eq!(events[5].metadata["verdict"], "reject");
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}

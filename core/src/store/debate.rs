//! Debate runs.
//!
//! RULES:
//!   - A run visits the stages in order; all six transitions are scheduled up
//!     front under one handle when the run starts.
//!   - The scripted transcript is consumed through the run's cursor, so each
//!     scripted message is emitted at most once per run.
//!   - A superseded run keeps its own record but never touches the case again.

use super::{MockDataStore, RunRecord};
use crate::{
    config::RerunPolicy,
    error::{CourtroomError, CourtroomResult},
    fixtures,
    model::{
        AuditEventType, CaseStatus, DebateMessage, DebateMode, DebateRun, DebateStage,
        DecisionBundle, RunStatus, Transcript,
    },
    schedule::Transition,
    types::RunId,
};
use serde_json::json;

impl MockDataStore {
    /// Start a new debate run on a case. Returns the run id.
    pub fn start_debate(
        &mut self,
        case_id: &str,
        top_k: Option<u32>,
        mode: DebateMode,
    ) -> CourtroomResult<RunId> {
        let previous = self.case_record(case_id)?.run_id.clone();
        if let Some(previous_id) = previous {
            self.resolve_previous_run(case_id, &previous_id)?;
        }

        let top_k = top_k.unwrap_or(self.config.default_top_k);
        let now = self.clock.now();
        let run_id = self.rng.ids.next_id("run");
        let retrieval = fixtures::retrieval_summary();
        let default_rate = retrieval.stats.default_rate;

        let handle = self.schedule.new_handle();
        let base = self.clock.elapsed_ms;
        for (i, stage) in DebateStage::ALL.iter().enumerate() {
            self.schedule.schedule(
                handle,
                case_id,
                base.saturating_add((i as u64 + 1).saturating_mul(self.config.stage_interval_ms)),
                Transition::DebateStage {
                    run_id: run_id.clone(),
                    stage: *stage,
                },
            );
        }

        self.runs.insert(
            run_id.clone(),
            RunRecord {
                run: DebateRun {
                    run_id: run_id.clone(),
                    stage: DebateStage::Opening,
                    messages: Vec::new(),
                    started_at: now,
                    updated_at: now,
                },
                case_id: case_id.to_string(),
                top_k,
                schedule: Some(handle),
                cursor: 0,
                cancelled: false,
                retrieval: retrieval.clone(),
                decision: None,
            },
        );

        let record = self.case_record_mut(case_id)?;
        record.run_id = Some(run_id.clone());
        record.status = CaseStatus::Running;
        record.decision = None;
        record.retrieval = Some(retrieval);
        record.updated_at = now;

        self.record(
            case_id,
            AuditEventType::RetrievedNeighbors,
            json!({ "top_k": top_k, "default_rate": default_rate }),
        )?;
        self.record(
            case_id,
            AuditEventType::DebateStarted,
            json!({ "run_id": run_id, "top_k": top_k, "mode": mode.as_str() }),
        )?;
        log::info!("Started debate {run_id} on {case_id} (top_k {top_k}, {})", mode.as_str());
        Ok(run_id)
    }

    /// Apply the rerun policy to the case's current run, if it is still going.
    fn resolve_previous_run(&mut self, case_id: &str, previous_id: &str) -> CourtroomResult<()> {
        let Some(previous) = self.runs.get_mut(previous_id) else {
            return Ok(());
        };
        if previous.run.stage == DebateStage::Done || previous.cancelled {
            return Ok(());
        }
        match self.config.rerun_policy {
            RerunPolicy::RejectWhileRunning => {
                log::warn!("Rejected rerun of {case_id}: {previous_id} still running");
                Err(CourtroomError::RunInProgress {
                    case_id: case_id.to_string(),
                    run_id: previous_id.to_string(),
                })
            }
            RerunPolicy::Supersede => {
                if let Some(handle) = previous.schedule.take() {
                    let dropped = self.schedule.cancel(handle);
                    log::info!("Superseded {previous_id} on {case_id}, {dropped} transitions dropped");
                }
                Ok(())
            }
        }
    }

    /// Mark the unfinished runs of one case (of every case for `None`) as
    /// cancelled once their stage transitions have been dropped. A case whose
    /// current run is halted moves to `failed`.
    pub(super) fn halt_runs(&mut self, case_id: Option<&str>) {
        let now = self.clock.now();
        let mut halted = Vec::new();
        for (run_id, record) in self.runs.iter_mut() {
            if case_id.is_some_and(|id| id != record.case_id) {
                continue;
            }
            if record.schedule.take().is_some() && record.run.stage != DebateStage::Done {
                record.cancelled = true;
                halted.push((run_id.clone(), record.case_id.clone()));
            }
        }
        for (run_id, case_id) in halted {
            if let Some(case) = self.cases.get_mut(&case_id) {
                if case.run_id.as_deref() == Some(run_id.as_str()) {
                    case.status = CaseStatus::Failed;
                    case.updated_at = now;
                }
            }
            log::info!("Run {run_id} on {case_id} cancelled before a verdict");
        }
    }

    pub(super) fn apply_stage(&mut self, run_id: &str, stage: DebateStage) -> CourtroomResult<()> {
        let now = self.clock.now();
        let Some(run) = self.runs.get_mut(run_id) else {
            return Ok(());
        };
        run.run.stage = stage;
        run.run.updated_at = now;

        let script = fixtures::debate_script();
        let mut emitted = Vec::new();
        while let Some(line) = script.get(run.cursor).filter(|line| line.stage == stage) {
            run.run.messages.push(DebateMessage {
                role: line.role,
                content: line.content.to_string(),
                timestamp: now,
                stage: line.stage,
            });
            emitted.push(line);
            run.cursor += 1;
        }

        let case_id = run.case_id.clone();
        let decision = (stage == DebateStage::Done).then(fixtures::synthesized_decision);
        if let Some(decision) = &decision {
            run.decision = Some(decision.clone());
            run.schedule = None;
        }
        log::debug!("Run {run_id} → {} ({} new messages)", stage.as_str(), emitted.len());

        for line in emitted {
            self.record(
                &case_id,
                AuditEventType::DebateMessage,
                json!({ "run_id": run_id, "role": line.role.as_str(), "stage": line.stage.as_str() }),
            )?;
        }

        let current = self
            .cases
            .get(&case_id)
            .is_some_and(|c| c.run_id.as_deref() == Some(run_id));
        if !current {
            return Ok(());
        }
        let record = self.case_record_mut(&case_id)?;
        record.updated_at = now;
        if let Some(decision) = decision {
            record.status = CaseStatus::Decided;
            record.decision = Some(decision.clone());
            self.record(
                &case_id,
                AuditEventType::JudgeDecision,
                json!({
                    "run_id": run_id,
                    "verdict": decision.verdict.as_str(),
                    "confidence": decision.confidence,
                }),
            )?;
            log::info!("Run {run_id} decided {} on {case_id}", decision.verdict.as_str());
        }
        Ok(())
    }

    pub fn run(&self, run_id: &str) -> CourtroomResult<DebateRun> {
        self.run_record(run_id).map(|r| r.run.clone())
    }

    pub fn run_status(&self, run_id: &str) -> CourtroomResult<RunStatus> {
        let record = self.run_record(run_id)?;
        let stage = record.run.stage;
        let current = self
            .cases
            .get(&record.case_id)
            .is_some_and(|c| c.run_id.as_deref() == Some(run_id));
        let status = if stage == DebateStage::Done {
            CaseStatus::Decided
        } else if current && !record.cancelled {
            CaseStatus::Running
        } else {
            CaseStatus::Failed
        };
        Ok(RunStatus {
            run_id: run_id.to_string(),
            case_id: record.case_id.clone(),
            status,
            stage,
            progress: stage.progress(),
        })
    }

    pub fn transcript(&self, run_id: &str) -> CourtroomResult<Transcript> {
        let record = self.run_record(run_id)?;
        Ok(Transcript {
            messages: record.run.messages.clone(),
            stage: record.run.stage,
            updated_at: record.run.updated_at,
        })
    }

    /// The decision a run reached, with the retrieval it was reached on.
    pub fn decision(&self, run_id: &str) -> CourtroomResult<DecisionBundle> {
        let record = self.run_record(run_id)?;
        let decision = record
            .decision
            .clone()
            .ok_or_else(|| CourtroomError::DecisionNotReady {
                run_id: run_id.to_string(),
            })?;
        Ok(DecisionBundle {
            decision,
            retrieval: record.retrieval.clone(),
        })
    }

    /// `top_k` the run was started with.
    pub fn run_top_k(&self, run_id: &str) -> CourtroomResult<u32> {
        self.run_record(run_id).map(|r| r.top_k)
    }
}

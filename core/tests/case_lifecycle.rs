//! A case from intake to verdict, driven directly against the store clock.

use courtroom_core::{
    config::{CourtroomConfig, RerunPolicy},
    error::CourtroomError,
    model::{
        ApplicantPayload, AuditEventType, CaseStatus, DebateMode, DebateRole, DebateStage,
        DocumentStatus, DocumentUpload, LoanPurpose, Verdict,
    },
    store::MockDataStore,
    validation::Validate,
};

fn store() -> MockDataStore {
    MockDataStore::new(CourtroomConfig::default_test().simulation).expect("store")
}

#[test]
fn intake_to_verdict() {
    let mut store = store();
    let case = store.create_case(None).expect("create");
    let case_id = case.case_id.clone();

    let updated = store
        .update_applicant(
            &case_id,
            &ApplicantPayload {
                credit_score: Some(640.0),
                debt_to_income_ratio: Some(42.0),
                loan_purpose: Some(LoanPurpose::Car),
                ..Default::default()
            },
        )
        .expect("update");
    assert_eq!(updated.status, CaseStatus::Ready);
    let applicant = updated.applicant.expect("applicant created by patch");
    assert_eq!(applicant.credit_score, Some(640.0));
    assert_eq!(applicant.age, None);

    store.advance_by(100).expect("advance");
    let doc = store
        .add_document(&case_id, DocumentUpload::new("bank.pdf", "application/pdf", vec![0; 512]))
        .expect("upload");
    let run_id = store
        .start_debate(&case_id, None, DebateMode::Standard)
        .expect("start");

    let running = store.case(&case_id).expect("case");
    assert_eq!(running.status, CaseStatus::Running);
    assert_eq!(running.debate.as_ref().map(|d| d.run_id.as_str()), Some(run_id.as_str()));
    assert!(running.retrieval.is_some());
    running.validate().expect("running case is consistent");

    store.advance_by(12_000).expect("advance");
    let decided = store.case(&case_id).expect("case");
    decided.validate().expect("decided case is consistent");
    assert_eq!(decided.status, CaseStatus::Decided);
    assert_eq!(decided.documents[0].document_id, doc.document_id);
    assert_eq!(decided.documents[0].status, DocumentStatus::Extracted);

    let debate = decided.debate.expect("debate");
    assert_eq!(debate.stage, DebateStage::Done);
    let roles: Vec<_> = debate.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles.first(), Some(&DebateRole::Moderator));
    assert_eq!(roles.last(), Some(&DebateRole::Judge));
    for pair in debate.messages.windows(2) {
        assert!(pair[0].stage <= pair[1].stage, "stages out of order");
    }

    let decision = decided.decision.expect("decision");
    assert_eq!(decision.verdict, Verdict::ManualReview);
    assert_eq!(decision.justification.len(), 5);
    assert_eq!(decision.evidence_refs.len(), 6);
    assert_eq!(decision.confidence, 0.72);
}

#[test]
fn audit_trail_records_the_lifecycle_in_order() {
    let mut store = store();
    let case = store.create_case(None).expect("create");
    let id = case.case_id.as_str();
    store
        .update_applicant(id, &ApplicantPayload { age: Some(30.0), ..Default::default() })
        .expect("update");
    store
        .add_document(id, DocumentUpload::new("id.jpg", "image/jpeg", vec![0; 64]))
        .expect("upload");
    let run_id = store.start_debate(id, Some(4), DebateMode::Standard).expect("start");
    store.advance_by(12_000).expect("advance");
    store.export_report(id).expect("export");

    let events = store.audit_events(id).expect("audit");
    let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
    use AuditEventType as A;
    let mut expected = vec![A::CreatedCase, A::UpdatedApplicant, A::UploadedDocs, A::RetrievedNeighbors, A::DebateStarted];
    expected.extend(std::iter::repeat(A::DebateMessage).take(8));
    expected.extend([A::JudgeDecision, A::ExportedReport]);
    assert_eq!(kinds, expected);

    assert_eq!(events[1].metadata["fields_updated"], serde_json::json!(["age"]));
    assert_eq!(events[3].metadata["top_k"], 4);
    assert_eq!(events[4].metadata["run_id"], run_id.as_str());
    assert_eq!(events[4].metadata["mode"], "standard");
    let judge = &events[13];
    assert_eq!(judge.metadata["verdict"], "manual_review");
    assert_eq!(judge.metadata["confidence"], 0.72);
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn reads_between_due_times_see_only_fired_transitions() {
    let mut store = store();
    let case = store.create_case(None).expect("create");
    let run_id = store
        .start_debate(&case.case_id, None, DebateMode::Standard)
        .expect("start");

    store.advance_to(5_999).expect("advance");
    let transcript = store.transcript(&run_id).expect("transcript");
    assert_eq!(transcript.stage, DebateStage::Rebuttal);
    assert_eq!(transcript.messages.len(), 3);
    assert_eq!(store.run_status(&run_id).expect("status").progress, 40);

    store.advance_to(6_000).expect("advance");
    let status = store.run_status(&run_id).expect("status");
    assert_eq!(status.stage, DebateStage::Counter);
    assert_eq!(status.progress, 60);
    assert_eq!(status.status, CaseStatus::Running);
}

#[test]
fn cancelled_case_stops_progressing() {
    let mut store = store();
    let case = store.create_case(None).expect("create");
    let run_id = store
        .start_debate(&case.case_id, None, DebateMode::Standard)
        .expect("start");
    store.advance_to(2_000).expect("advance");
    assert_eq!(store.cancel_case_tasks(&case.case_id).expect("cancel"), 5);

    store.advance_to(60_000).expect("advance");
    assert_eq!(store.run(&run_id).expect("run").stage, DebateStage::Opening);
    assert!(matches!(
        store.decision(&run_id),
        Err(CourtroomError::DecisionNotReady { .. })
    ));
}

#[test]
fn cancelled_debate_fails_and_the_case_can_rerun() {
    let mut simulation = CourtroomConfig::default_test().simulation;
    simulation.rerun_policy = RerunPolicy::RejectWhileRunning;
    let mut store = MockDataStore::new(simulation).expect("store");
    let case = store.create_case(None).expect("create");
    let first = store
        .start_debate(&case.case_id, None, DebateMode::Standard)
        .expect("start");
    store.advance_to(3_000).expect("advance");
    store.cancel_case_tasks(&case.case_id).expect("cancel");
    store.advance_to(1_000_000).expect("advance");

    assert_eq!(store.pending_transitions(), 0);
    let status = store.run_status(&first).expect("status");
    assert_eq!(status.status, CaseStatus::Failed);
    assert!(status.status.is_terminal());
    let failed = store.case(&case.case_id).expect("case");
    assert_eq!(failed.status, CaseStatus::Failed);
    failed.validate().expect("failed case is consistent");

    let second = store
        .start_debate(&case.case_id, None, DebateMode::Standard)
        .expect("rerun after cancel");
    assert_ne!(first, second);
    store.advance_by(12_000).expect("advance");
    assert_eq!(store.case(&case.case_id).expect("case").status, CaseStatus::Decided);
    assert_eq!(store.run_status(&first).expect("status").status, CaseStatus::Failed);
}

#[test]
fn dispose_fails_unfinished_debates() {
    let mut store = store();
    let case = store.create_case(None).expect("create");
    let run_id = store
        .start_debate(&case.case_id, None, DebateMode::Standard)
        .expect("start");
    store.dispose();
    assert_eq!(store.run_status(&run_id).expect("status").status, CaseStatus::Failed);
    assert_eq!(store.case(&case.case_id).expect("case").status, CaseStatus::Failed);
}

#[test]
fn rerun_after_verdict_keeps_earlier_history() {
    let mut store = store();
    let case = store.create_case(None).expect("create");
    let id = case.case_id.as_str();
    let first = store.start_debate(id, None, DebateMode::Standard).expect("start");
    store.advance_by(12_000).expect("drain first run");
    let before = store.audit_events(id).expect("audit");

    let second = store.start_debate(id, None, DebateMode::Standard).expect("rerun");
    assert_ne!(first, second);
    store.advance_by(12_000).expect("drain second run");
    let after = store.audit_events(id).expect("audit");

    assert!(after.len() > before.len());
    let kept: Vec<_> = after[..before.len()].iter().map(|e| &e.event_id).collect();
    let original: Vec<_> = before.iter().map(|e| &e.event_id).collect();
    assert_eq!(kept, original, "earlier audit events were rewritten");

    let count = |kind: AuditEventType| after.iter().filter(|e| e.event_type == kind).count();
    assert_eq!(count(AuditEventType::JudgeDecision), 2);
    assert_eq!(count(AuditEventType::DebateMessage), 16);

    assert_eq!(store.run(&first).expect("first run").messages.len(), 8);
    assert_eq!(store.run(&second).expect("second run").messages.len(), 8);
    assert!(store.decision(&first).is_ok());
    assert_eq!(store.run_status(&first).expect("status").status, CaseStatus::Decided);
}

#[test]
fn dispose_drops_everything_pending() {
    let mut store = store();
    for _ in 0..3 {
        let case = store.create_case(None).expect("create");
        store
            .add_document(&case.case_id, DocumentUpload::new("x.pdf", "application/pdf", vec![]))
            .expect("upload");
        store
            .start_debate(&case.case_id, None, DebateMode::Standard)
            .expect("start");
    }
    assert_eq!(store.pending_transitions(), 3 * (2 + 6));
    assert_eq!(store.dispose(), 24);
    assert_eq!(store.advance_by(60_000).expect("advance"), 0);
}

#[test]
fn invalid_applicant_on_create_is_rejected() {
    let mut store = store();
    let err = store
        .create_case(Some(ApplicantPayload {
            age: Some(12.0),
            ..Default::default()
        }))
        .expect_err("age below domain");
    match err {
        CourtroomError::Validation(v) => assert_eq!(v.path, "age"),
        other => panic!("expected validation error, got {other}"),
    }
    assert!(store.cases().is_empty());
}

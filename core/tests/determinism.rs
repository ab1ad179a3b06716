//! Two stores, same seed, same operations.
//! They must produce identical ids, transcripts and audit trails.
//! A divergence here means something reached for randomness outside the RngBank.

use chrono::{TimeZone, Utc};
use courtroom_core::{
    config::SimulationConfig,
    model::{ApplicantPayload, DebateMode, DocumentUpload},
    store::MockDataStore,
};

fn build_store(seed: u64) -> MockDataStore {
    let origin = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().expect("valid origin");
    MockDataStore::with_origin(
        SimulationConfig {
            seed,
            ..SimulationConfig::default()
        },
        origin,
    )
    .expect("store")
}

/// A fixed script of operations; returns every audit event as JSON.
fn run_script(store: &mut MockDataStore) -> Vec<String> {
    let mut case_ids = Vec::new();
    for score in [610.0, 700.0, 790.0] {
        let case = store
            .create_case(Some(ApplicantPayload {
                credit_score: Some(score),
                ..Default::default()
            }))
            .expect("create case");
        case_ids.push(case.case_id);
        store.advance_by(250).expect("advance");
    }
    for case_id in &case_ids {
        store
            .add_document(case_id, DocumentUpload::new("a.pdf", "application/pdf", vec![1; 10]))
            .expect("upload");
        store.fraud_signals(case_id).expect("fraud");
        store
            .start_debate(case_id, Some(6), DebateMode::Standard)
            .expect("start");
        store.advance_by(3_000).expect("advance");
    }
    store
        .start_debate(&case_ids[0], None, DebateMode::Adversarial)
        .expect("rerun");
    store.advance_by(60_000).expect("drain");

    let mut all = vec!["case_001".to_string(), "case_002".to_string()];
    all.extend(case_ids);
    all.iter()
        .flat_map(|id| store.audit_events(id).expect("audit"))
        .map(|e| serde_json::to_string(&e).expect("serialize event"))
        .collect()
}

#[test]
fn same_seed_produces_identical_audit_trails() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let mut store_a = build_store(SEED);
    let mut store_b = build_store(SEED);
    let log_a = run_script(&mut store_a);
    let log_b = run_script(&mut store_b);

    assert_eq!(log_a.len(), log_b.len(), "Audit trail lengths differ");
    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(a, b, "Audit trail diverged at entry {i}:\n  A: {a}\n  B: {b}");
    }
    assert_eq!(store_a.cases(), store_b.cases());
}

#[test]
fn different_seeds_produce_different_ids() {
    let mut store_a = build_store(1);
    let mut store_b = build_store(2);
    let a = store_a.create_case(None).expect("create a");
    let b = store_b.create_case(None).expect("create b");
    assert_ne!(a.case_id, b.case_id);
    assert!(a.case_id.starts_with("case_"));
    assert_eq!(a.case_id.len(), "case_".len() + 9);
}

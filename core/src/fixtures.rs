//! Canned content served by the mock store: the scripted debate, the neighbor
//! set, the synthesized decision, fraud tiers, policies and demo cases.

use crate::model::{
    ApplicantPayload, DebateRole, DebateStage, Decision, EducationLevel, EmploymentStatus,
    FraudSignals, Gender, JsonMap, LoanPurpose, MaritalStatus, NeighborCase, NeighborOutcome,
    Policy, PolicyClause, PolicyReference, PolicyStatus, PolicyType, ResidenceType, RetrievalSummary,
    RiskTier, Verdict,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

pub const MANUAL_REVIEW_CLAUSE: &str = "clause_004";

/// One line of the scripted debate, before it is timestamped.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedMessage {
    pub role: DebateRole,
    pub stage: DebateStage,
    pub content: &'static str,
}

const DEBATE_SCRIPT: [ScriptedMessage; 8] = [
    ScriptedMessage {
        role: DebateRole::Moderator,
        stage: DebateStage::Opening,
        content: "The court is now in session. We will evaluate loan application CASE-001. \
                  Risk Agent, please present your opening argument.",
    },
    ScriptedMessage {
        role: DebateRole::Risk,
        stage: DebateStage::Opening,
        content: "Your Honor, I must argue for REJECTION of this application. The applicant \
                  presents several concerning risk factors: First, the debt-to-income ratio of 42% \
                  exceeds our recommended threshold of 36%. Second, there are 2 recent \
                  delinquencies on record, indicating payment reliability issues. Third, the \
                  credit score of 640 is below prime lending standards. Historical analysis of \
                  similar profiles shows elevated default rates.",
    },
    ScriptedMessage {
        role: DebateRole::Advocate,
        stage: DebateStage::Rebuttal,
        content: "Your Honor, I respectfully disagree. While the Risk Agent raises valid points, \
                  context is crucial. The applicant's employment status is stable with 2 years at \
                  current job, demonstrating commitment. The loan purpose - vehicle financing - is \
                  a necessity for commuting to work, improving future earning potential. \
                  Furthermore, 4 out of 6 similar historical cases with comparable profiles \
                  resulted in successful repayment.",
    },
    ScriptedMessage {
        role: DebateRole::Risk,
        stage: DebateStage::Counter,
        content: "The Advocate's optimism overlooks critical warning signs. The applicant has 3 \
                  recent credit inquiries, suggesting financial distress or rejection from other \
                  lenders. The rent-to-income ratio combined with existing obligations creates \
                  vulnerability to economic shocks. Similar cases with these combined factors \
                  showed 33% default rates.",
    },
    ScriptedMessage {
        role: DebateRole::Advocate,
        stage: DebateStage::Counter,
        content: "The credit inquiries occurred during a single 30-day window for auto loan \
                  shopping, which credit scoring models treat as a single inquiry. The \
                  applicant's payment history on existing accounts shows 100% on-time payments \
                  for the past 18 months. The requested loan amount of $15,000 is conservative \
                  relative to income, with manageable monthly payments.",
    },
    ScriptedMessage {
        role: DebateRole::Risk,
        stage: DebateStage::Final,
        content: "Even with favorable interpretation, the risk-adjusted return does not justify \
                  approval. The interest rate required to compensate for default probability \
                  would be prohibitive. Manual review would delay decision without materially \
                  improving risk assessment.",
    },
    ScriptedMessage {
        role: DebateRole::Advocate,
        stage: DebateStage::Final,
        content: "The evidence supports conditional approval with standard underwriting. The \
                  applicant's improving trajectory - stable employment, recent payment \
                  discipline, and conservative loan request - indicates creditworthiness. \
                  Rejection would be an overreaction to manageable risk factors.",
    },
    ScriptedMessage {
        role: DebateRole::Judge,
        stage: DebateStage::Verdict,
        content: "After careful consideration of all arguments and evidence, I render the \
                  following verdict: MANUAL REVIEW RECOMMENDED. While the Advocate presents \
                  compelling evidence of the applicant's improving financial behavior, the Risk \
                  Agent's concerns about debt-to-income ratio and recent delinquencies warrant \
                  additional scrutiny. I recommend: (1) Verification of recent income stability, \
                  (2) Explanation for delinquencies, (3) Review of payment history on existing \
                  obligations. The split in similar case outcomes (67% repayment vs 33% default) \
                  supports this cautious approach.",
    },
];

/// The scripted transcript in emission order.
pub fn debate_script() -> &'static [ScriptedMessage] {
    &DEBATE_SCRIPT
}

fn object(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

fn neighbor(
    id: &str,
    similarity: f64,
    outcome: NeighborOutcome,
    highlights: &[&str],
    age: u32,
    credit_score: u32,
    annual_income: u32,
) -> NeighborCase {
    NeighborCase {
        neighbor_id: id.to_string(),
        similarity,
        outcome,
        highlights: highlights.iter().map(|h| h.to_string()).collect(),
        payload_preview: object(json!({
            "age": age,
            "credit_score": credit_score,
            "annual_income": annual_income,
        })),
    }
}

pub fn neighbors() -> Vec<NeighborCase> {
    use NeighborOutcome as O;
    vec![
        neighbor("neighbor_1", 0.92, O::Repaid,
            &["Similar credit score", "Same employment status", "Comparable income"], 33, 715, 72000),
        neighbor("neighbor_2", 0.88, O::Repaid,
            &["Same loan purpose", "Similar debt-to-income"], 30, 705, 68000),
        neighbor("neighbor_3", 0.85, O::Default,
            &["Similar age", "Higher delinquency history"], 31, 625, 48000),
        neighbor("neighbor_4", 0.81, O::Repaid,
            &["Same education level", "Stable employment"], 35, 735, 80000),
        neighbor("neighbor_5", 0.78, O::Default,
            &["Recent credit inquiries", "Shorter job tenure"], 27, 595, 42000),
        neighbor("neighbor_6", 0.75, O::Repaid,
            &["Low debt-to-income", "No delinquencies"], 40, 760, 90000),
    ]
}

/// The neighbor set is fixed; `top_k` reflects what was retrieved, not what was asked.
pub fn retrieval_summary() -> RetrievalSummary {
    let neighbors = neighbors();
    RetrievalSummary::from_neighbors(neighbors.len() as u32, neighbors)
}

pub fn policies(uploaded_at: impl Fn(i64) -> DateTime<Utc>) -> Vec<Policy> {
    let policy = |id: &str, name: &str, kind: PolicyType, filename: &str, version: &str, days: i64, clauses: u32| Policy {
        policy_id: id.into(),
        name: name.into(),
        document_type: kind,
        filename: filename.into(),
        version: version.into(),
        uploaded_at: uploaded_at(days),
        clauses_count: clauses,
        status: PolicyStatus::Active,
    };
    vec![
        policy("policy_001", "Credit Score Eligibility Policy", PolicyType::Eligibility,
            "credit_score_policy_v2.pdf", "v2.0", 30, 12),
        policy("policy_002", "Debt-to-Income Risk Thresholds", PolicyType::RiskThreshold,
            "dti_thresholds_v1.pdf", "v1.0", 60, 8),
        policy("policy_003", "Fair Lending Compliance Guide", PolicyType::Regulatory,
            "fair_lending_compliance_v3.pdf", "v3.0", 15, 24),
        policy("policy_004", "Manual Review Conditions", PolicyType::ManualReview,
            "manual_review_conditions_v1.pdf", "v1.0", 45, 15),
    ]
}

pub fn policy_clauses() -> Vec<PolicyClause> {
    let clause = |id: &str, policy: &str, section: &str, text: &str, kind: PolicyType, doc: &str, version: &str| PolicyClause {
        clause_id: id.into(),
        policy_id: policy.into(),
        section: section.into(),
        text: text.into(),
        policy_type: kind,
        document_name: doc.into(),
        version: version.into(),
    };
    vec![
        clause("clause_001", "policy_001", "3.2",
            "Applicants with credit scores below 600 require enhanced review and may be subject to \
             automatic rejection if additional risk factors are present.",
            PolicyType::Eligibility, "Credit Score Eligibility Policy", "v2.0"),
        clause("clause_002", "policy_002", "2.1",
            "Debt-to-income ratios exceeding 40% trigger mandatory manual review unless compensated \
             by exceptional factors.",
            PolicyType::RiskThreshold, "Debt-to-Income Risk Thresholds", "v1.0"),
        clause("clause_003", "policy_003", "4.5",
            "All lending decisions must be explainable and free from discriminatory bias based on \
             protected characteristics.",
            PolicyType::Regulatory, "Fair Lending Compliance Guide", "v3.0"),
        clause(MANUAL_REVIEW_CLAUSE, "policy_004", "1.3",
            "Cases with mixed evidence or confidence scores between 0.6 and 0.8 should be flagged \
             for manual review.",
            PolicyType::ManualReview, "Manual Review Conditions", "v1.0"),
    ]
}

fn cite(clause_id: &str, rationale: &str) -> Option<PolicyReference> {
    policy_clauses()
        .into_iter()
        .find(|c| c.clause_id == clause_id)
        .map(|clause| PolicyReference {
            policy_id: clause.policy_id.clone(),
            clause,
            rationale: rationale.to_string(),
        })
}

/// The decision every simulated run reaches when its `done` transition fires.
pub fn synthesized_decision() -> Decision {
    let confidence = 0.72;
    let rationale = format!(
        "Confidence score of {confidence:.2} falls within the manual review threshold range"
    );
    Decision {
        verdict: Verdict::ManualReview,
        justification: vec![
            "Debt-to-income ratio of 42% exceeds recommended threshold of 36%".into(),
            "2 recent delinquencies indicate payment reliability concerns".into(),
            "Mixed historical evidence: 67% repayment rate among similar cases".into(),
            "Recent credit inquiries require explanation".into(),
            "Stable employment history is a positive factor".into(),
        ],
        evidence_refs: (1..=6).map(|i| format!("neighbor_{i}")).collect(),
        confidence,
        policy_refs: cite(MANUAL_REVIEW_CLAUSE, &rationale).map(|r| vec![r]),
    }
}

pub fn fraud_signals(tier: RiskTier, computed_at: DateTime<Utc>) -> FraudSignals {
    let (device, ip, merchant, known, score, flags): (u32, u32, u32, u32, f64, &[&str]) = match tier {
        RiskTier::Low => (0, 1, 2, 0, 0.12, &[]),
        RiskTier::Medium => (1, 2, 3, 1, 0.45, &["shared_ip_with_1_defaulter"]),
        RiskTier::High => (
            3,
            4,
            5,
            3,
            0.74,
            &[
                "shared_device_with_3_defaulters",
                "shared_ip_with_2_defaulters",
                "high_fraud_cluster_score",
            ],
        ),
    };
    FraudSignals {
        shared_device_count: device,
        shared_ip_count: ip,
        shared_merchant_count: merchant,
        known_fraud_neighbor_count: known,
        fraud_cluster_score: score,
        fraud_flags: flags.iter().map(|f| f.to_string()).collect(),
        computed_at,
    }
}

#[allow(clippy::too_many_arguments)]
fn applicant(
    age: f64,
    annual_income: f64,
    credit_score: f64,
    loan_amount: f64,
    loan_term: f64,
    interest_rate: f64,
    debt_to_income_ratio: f64,
    employment_status: EmploymentStatus,
    education_level: EducationLevel,
    loan_purpose: LoanPurpose,
    marital_status: MaritalStatus,
    gender: Gender,
    counts: [f64; 4],
    residence_type: ResidenceType,
    years_at_current_residence: f64,
    years_at_current_job: f64,
) -> ApplicantPayload {
    let [delinquency_history, public_records, num_of_open_accounts, num_of_credit_inquiries] = counts;
    ApplicantPayload {
        age: Some(age),
        annual_income: Some(annual_income),
        credit_score: Some(credit_score),
        loan_amount: Some(loan_amount),
        loan_term: Some(loan_term),
        interest_rate: Some(interest_rate),
        debt_to_income_ratio: Some(debt_to_income_ratio),
        employment_status: Some(employment_status),
        education_level: Some(education_level),
        loan_purpose: Some(loan_purpose),
        marital_status: Some(marital_status),
        gender: Some(gender),
        delinquency_history: Some(delinquency_history),
        public_records: Some(public_records),
        num_of_open_accounts: Some(num_of_open_accounts),
        num_of_credit_inquiries: Some(num_of_credit_inquiries),
        residence_type: Some(residence_type),
        years_at_current_residence: Some(years_at_current_residence),
        years_at_current_job: Some(years_at_current_job),
    }
}

/// Applicant profiles backing the seeded demo cases, in case order.
pub fn demo_applicants() -> Vec<ApplicantPayload> {
    use EducationLevel as Ed;
    use EmploymentStatus as Emp;
    vec![
        applicant(32.0, 75000.0, 720.0, 25000.0, 60.0, 8.5, 28.0, Emp::Employed, Ed::Bachelors,
            LoanPurpose::Home, MaritalStatus::Married, Gender::Male, [0.0, 0.0, 5.0, 1.0],
            ResidenceType::Mortgage, 3.0, 5.0),
        applicant(28.0, 45000.0, 640.0, 15000.0, 48.0, 12.5, 42.0, Emp::Employed, Ed::Associates,
            LoanPurpose::Car, MaritalStatus::Single, Gender::Female, [2.0, 0.0, 3.0, 3.0],
            ResidenceType::Rent, 1.0, 2.0),
        applicant(45.0, 120000.0, 780.0, 50000.0, 84.0, 6.5, 18.0, Emp::SelfEmployed, Ed::Masters,
            LoanPurpose::Business, MaritalStatus::Married, Gender::Male, [0.0, 0.0, 8.0, 0.0],
            ResidenceType::Own, 10.0, 15.0),
        applicant(24.0, 38000.0, 580.0, 10000.0, 36.0, 15.9, 55.0, Emp::Employed, Ed::HighSchool,
            LoanPurpose::Personal, MaritalStatus::Single, Gender::Female, [3.0, 1.0, 2.0, 5.0],
            ResidenceType::Rent, 0.0, 1.0),
        applicant(52.0, 95000.0, 750.0, 35000.0, 72.0, 7.2, 22.0, Emp::Employed, Ed::Bachelors,
            LoanPurpose::DebtConsolidation, MaritalStatus::Divorced, Gender::Female, [1.0, 0.0, 6.0, 1.0],
            ResidenceType::Mortgage, 7.0, 12.0),
    ]
}

/// Decisions of the seeded decided cases (`case_004`, `case_005`).
pub fn demo_reject_decision() -> Decision {
    Decision {
        verdict: Verdict::Reject,
        justification: vec![
            "Credit score of 580 falls below minimum threshold".into(),
            "High debt-to-income ratio of 55% indicates severe financial stress".into(),
            "Multiple delinquencies and public record present".into(),
            "Short employment and residence history".into(),
        ],
        evidence_refs: vec!["neighbor_3".into(), "neighbor_5".into()],
        confidence: 0.91,
        policy_refs: Some(
            [
                cite("clause_001", "Credit score of 580 is below the 600 threshold requiring enhanced review"),
                cite("clause_002", "Debt-to-income ratio of 55% exceeds the 40% threshold"),
            ]
            .into_iter()
            .flatten()
            .collect(),
        ),
    }
}

pub fn demo_approve_decision() -> Decision {
    Decision {
        verdict: Verdict::Approve,
        justification: vec![
            "Strong credit score of 750 demonstrates excellent payment history".into(),
            "Low debt-to-income ratio of 22% provides comfortable margin".into(),
            "Stable employment with 12 years at current position".into(),
            "Home ownership indicates financial stability".into(),
            "Similar cases show 85% successful repayment rate".into(),
        ],
        evidence_refs: ["neighbor_1", "neighbor_2", "neighbor_4", "neighbor_6"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        confidence: 0.88,
        policy_refs: cite("clause_003", "Decision is explainable and free from discriminatory bias")
            .map(|r| vec![r]),
    }
}

/// (filename, content type, size, extracted fields) of the documents attached to seeded cases.
pub fn demo_documents() -> Vec<(&'static str, &'static str, u64, JsonMap)> {
    vec![
        ("paystub_jan2024.pdf", "application/pdf", 245_760, object(json!({ "income_verified": true }))),
        ("bank_statement_q4.pdf", "application/pdf", 512_000, object(json!({ "balance_avg": 15000 }))),
        ("id_verification.jpg", "image/jpeg", 102_400, object(json!({ "id_verified": true }))),
    ]
}

//! courtroom-runner: drives one case through the Credit Courtroom end to end.
//!
//! Usage:
//!   courtroom-runner --mock --seed 7 --credit-score 640 --dti 42
//!   courtroom-runner --origin http://localhost:8000
//!   courtroom-runner --config courtroom.json --json

use anyhow::{Context, Result};
use courtroom_core::{
    api::{poll_run_status, poll_transcript, CreateCaseRequest, StartDebateRequest},
    connect,
    model::{ApplicantPayload, DebateMode, DocumentUpload, EmploymentStatus, LoanPurpose},
    CourtroomApi, CourtroomConfig,
};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match find_arg(&args, "--config") {
        Some(path) => CourtroomConfig::load(path)?,
        None => CourtroomConfig::default(),
    }
    .apply_env();

    config.simulation.seed = parse_arg(&args, "--seed", config.simulation.seed);
    if args.iter().any(|a| a == "--mock") {
        config.api.use_mock = true;
    }
    if let Some(origin) = find_arg(&args, "--origin") {
        config.api.api_origin = origin.to_string();
        config.api.use_mock = false;
    }
    let credit_score = parse_arg(&args, "--credit-score", 640.0f64);
    let dti = parse_arg(&args, "--dti", 42.0f64);
    let as_json = args.iter().any(|a| a == "--json");

    println!("Credit Courtroom - courtroom-runner");
    if config.api.use_mock {
        println!("  backend:       mock (seed {})", config.simulation.seed);
    } else {
        println!("  backend:       {}{}", config.api.api_origin, config.api.api_base_url);
    }
    println!("  credit score:  {credit_score}");
    println!("  dti:           {dti}%");
    println!();

    let api = connect(&config).context("Cannot build API backend")?;
    run_case(api, &config, credit_score, dti, as_json).await
}

async fn run_case(
    api: Arc<dyn CourtroomApi>,
    config: &CourtroomConfig,
    credit_score: f64,
    dti: f64,
    as_json: bool,
) -> Result<()> {
    let case = api
        .create_case(CreateCaseRequest {
            applicant: Some(ApplicantPayload {
                age: Some(28.0),
                annual_income: Some(45_000.0),
                credit_score: Some(credit_score),
                loan_amount: Some(15_000.0),
                debt_to_income_ratio: Some(dti),
                employment_status: Some(EmploymentStatus::Employed),
                loan_purpose: Some(LoanPurpose::Car),
                ..Default::default()
            }),
        })
        .await?;
    let case_id = case.case_id.clone();
    println!("Created {case_id}");

    let doc = api
        .upload_document(
            &case_id,
            DocumentUpload::new("paystub.pdf", "application/pdf", b"%PDF-1.4 paystub".to_vec()),
        )
        .await?;
    println!("Uploaded {} ({})", doc.filename, doc.document_id);

    let started = api
        .start_debate(
            &case_id,
            StartDebateRequest {
                top_k: Some(config.simulation.default_top_k),
                mode: Some(DebateMode::Standard),
            },
        )
        .await?;
    let run_id = started.run_id;
    println!("Debate {run_id} started");
    println!();

    let polling = &config.polling;
    let mut printed = 0usize;
    let transcript = poll_transcript(
        Arc::clone(&api),
        &run_id,
        polling.transcript_interval_ms,
        polling.retry,
        move |t| {
            for message in t.messages.iter().skip(printed) {
                println!("[{:>9}] {}: {}", message.stage.as_str(), message.role.as_str(), message.content);
            }
            printed = t.messages.len();
        },
        |e| log::warn!("transcript poll: {e}"),
    );
    let status = poll_run_status(
        Arc::clone(&api),
        &run_id,
        polling.status_interval_ms,
        polling.retry,
        |s| log::info!("run {} {} {}%", s.run_id, s.stage.as_str(), s.progress),
        |e| log::warn!("status poll: {e}"),
    );
    status.join().await;
    transcript.join().await;

    let bundle = api.decision(&run_id).await?;
    let fraud = api.fraud_signals(&case_id).await?;
    let audit = api.audit_events(&case_id).await?;
    let stats = api.dashboard_stats().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    println!();
    println!("=== DECISION ===");
    println!("  verdict:       {}", bundle.decision.verdict.as_str());
    println!("  confidence:    {:.2}", bundle.decision.confidence);
    for line in &bundle.decision.justification {
        println!("    - {line}");
    }
    println!("  neighbors:     {} (default rate {}%)",
        bundle.retrieval.stats.total_neighbors, bundle.retrieval.stats.default_rate);
    println!("  fraud score:   {:.2} {:?}", fraud.fraud_cluster_score, fraud.fraud_flags);
    println!("  audit events:  {}", audit.len());
    println!();
    println!("=== DASHBOARD ===");
    println!("  total cases:   {}", stats.total_cases);
    println!("  approvals:     {}", stats.approvals);
    println!("  rejects:       {}", stats.rejects);
    println!("  manual review: {}", stats.manual_reviews);
    println!("  running:       {}", stats.running_cases);
    Ok(())
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

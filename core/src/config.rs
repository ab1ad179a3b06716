use crate::types::Millis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme + host the HTTP backend is reached on.
    pub api_origin: String,
    /// Path prefix of every endpoint.
    pub api_base_url: String,
    pub use_mock: bool,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_origin: "http://localhost:8000".into(),
            api_base_url: "/api/v1".into(),
            use_mock: false,
            timeout_ms: 30_000,
        }
    }
}

/// What `start_debate` does when the case already has an unfinished run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RerunPolicy {
    /// Start a new run; the previous run's pending transitions are cancelled
    /// and it reports `failed`.
    Supersede,
    /// Refuse with `RunInProgress`.
    RejectWhileRunning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub stage_interval_ms: Millis,
    pub parse_start_ms: Millis,
    pub extract_done_ms: Millis,
    pub default_top_k: u32,
    pub seed_demo_data: bool,
    pub rerun_policy: RerunPolicy,
    /// `None` keeps the audit log in memory.
    pub audit_db_path: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            stage_interval_ms: 2000,
            parse_start_ms: 1000,
            extract_done_ms: 3000,
            default_top_k: 8,
            seed_demo_data: true,
            rerun_policy: RerunPolicy::Supersede,
            audit_db_path: None,
        }
    }
}

/// Artificial per-operation latency of the mock backend, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub create_case: Millis,
    pub list_cases: Millis,
    pub get_case: Millis,
    pub update_applicant: Millis,
    pub upload_document: Millis,
    pub list_documents: Millis,
    pub start_debate: Millis,
    pub run_status: Millis,
    pub transcript: Millis,
    pub decision: Millis,
    pub audit_events: Millis,
    pub dashboard_stats: Millis,
    pub export_report: Millis,
    pub fraud_signals: Millis,
    pub policies: Millis,
    pub upload_policy: Millis,
    pub policy_evidence: Millis,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            create_case: 500,
            list_cases: 300,
            get_case: 300,
            update_applicant: 400,
            upload_document: 800,
            list_documents: 300,
            start_debate: 600,
            run_status: 200,
            transcript: 300,
            decision: 300,
            audit_events: 300,
            dashboard_stats: 300,
            export_report: 1000,
            fraud_signals: 400,
            policies: 300,
            upload_policy: 1000,
            policy_evidence: 300,
        }
    }
}

impl LatencyConfig {
    pub fn zero() -> Self {
        Self {
            create_case: 0,
            list_cases: 0,
            get_case: 0,
            update_applicant: 0,
            upload_document: 0,
            list_documents: 0,
            start_debate: 0,
            run_status: 0,
            transcript: 0,
            decision: 0,
            audit_events: 0,
            dashboard_stats: 0,
            export_report: 0,
            fraud_signals: 0,
            policies: 0,
            upload_policy: 0,
            policy_evidence: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry after the loop's regular interval.
    Fixed,
    /// interval * factor^(consecutive_errors - 1), capped at `max_ms`.
    Exponential { factor: f64, max_ms: Millis },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    pub backoff: Backoff,
    /// Stop after this many consecutive failed polls. `None` never stops.
    pub max_consecutive_errors: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Backoff::Fixed,
            max_consecutive_errors: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next poll after `consecutive_errors` failures in a row.
    pub fn delay_ms(&self, interval_ms: Millis, consecutive_errors: u32) -> Millis {
        match self.backoff {
            Backoff::Fixed => interval_ms,
            Backoff::Exponential { factor, max_ms } => {
                if consecutive_errors == 0 {
                    return interval_ms;
                }
                let scaled = interval_ms as f64 * factor.powi(consecutive_errors as i32 - 1);
                if scaled.is_finite() {
                    (scaled as Millis).min(max_ms)
                } else {
                    max_ms
                }
            }
        }
    }

    pub fn exhausted(&self, consecutive_errors: u32) -> bool {
        self.max_consecutive_errors
            .is_some_and(|max| consecutive_errors >= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub status_interval_ms: Millis,
    pub transcript_interval_ms: Millis,
    pub retry: RetryPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: 2000,
            transcript_interval_ms: 1500,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtroomConfig {
    pub api: ApiConfig,
    pub simulation: SimulationConfig,
    pub latency: LatencyConfig,
    pub polling: PollConfig,
}

impl CourtroomConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    /// In tests, use CourtroomConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: CourtroomConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Apply `COURTROOM_*` environment overrides on top of the loaded values.
    pub fn apply_env(mut self) -> Self {
        if let Ok(origin) = std::env::var("COURTROOM_API_ORIGIN") {
            self.api.api_origin = origin;
        }
        if let Ok(base) = std::env::var("COURTROOM_API_BASE_URL") {
            self.api.api_base_url = base;
        }
        if let Ok(flag) = std::env::var("COURTROOM_USE_MOCK") {
            self.api.use_mock = flag != "false" && flag != "0";
        }
        if let Some(seed) = std::env::var("COURTROOM_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.simulation.seed = seed;
        }
        self
    }

    /// Mock backend, no latency, no demo fixtures.
    pub fn default_test() -> Self {
        Self {
            api: ApiConfig {
                use_mock: true,
                ..ApiConfig::default()
            },
            simulation: SimulationConfig {
                seed: 0xC0FF_EE00,
                seed_demo_data: false,
                ..SimulationConfig::default()
            },
            latency: LatencyConfig::zero(),
            polling: PollConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CourtroomConfig = serde_json::from_str(
            r#"{ "simulation": { "seed": 7, "rerun_policy": "reject_while_running" } }"#,
        )
        .expect("parse config");
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.rerun_policy, RerunPolicy::RejectWhileRunning);
        assert_eq!(config.simulation.stage_interval_ms, 2000);
        assert_eq!(config.api.api_base_url, "/api/v1");
        assert_eq!(config.polling.transcript_interval_ms, 1500);
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = RetryPolicy {
            backoff: Backoff::Exponential { factor: 2.0, max_ms: 5000 },
            max_consecutive_errors: Some(3),
        };
        assert_eq!(policy.delay_ms(1000, 0), 1000);
        assert_eq!(policy.delay_ms(1000, 1), 1000);
        assert_eq!(policy.delay_ms(1000, 2), 2000);
        assert_eq!(policy.delay_ms(1000, 4), 5000);
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
    }

    #[test]
    fn default_retry_never_gives_up() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_ms(1500, 40), 1500);
        assert!(!policy.exhausted(u32::MAX));
    }
}

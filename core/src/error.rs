use thiserror::Error;

use crate::{types::Millis, validation::ValidationError};

#[derive(Error, Debug)]
pub enum CourtroomError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Decision not ready for run {run_id}")]
    DecisionNotReady { run_id: String },

    #[error("Case {case_id} already has a debate in progress ({run_id})")]
    RunInProgress { case_id: String, run_id: String },

    #[error("Clock overflow: cannot move {step_ms}ms past {from_ms}ms")]
    ClockOverflow { from_ms: Millis, step_ms: Millis },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("API Error: {status} {status_text}")]
    Transport { status: u16, status_text: String },

    #[error("Upload failed: {status_text}")]
    UploadFailed { status_text: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CourtroomError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// A missing decision is reported to callers the same way as a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::DecisionNotReady { .. })
    }

    /// HTTP status carried by a transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type CourtroomResult<T> = Result<T, CourtroomError>;

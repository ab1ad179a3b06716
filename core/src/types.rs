//! Shared primitive types used across the entire crate.

/// Milliseconds on the store's virtual clock, measured from store start.
pub type Millis = u64;

/// Stable identifier of a case (`case_xxxxxxxxx`).
pub type CaseId = String;

/// Stable identifier of a debate run (`run_xxxxxxxxx`).
pub type RunId = String;

/// Stable identifier of an uploaded document (`doc_xxxxxxxxx`).
pub type DocumentId = String;

/// Stable identifier of a policy document (`policy_xxxxxxxxx`).
pub type PolicyId = String;

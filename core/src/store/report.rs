use super::MockDataStore;
use crate::{error::CourtroomResult, model::AuditEventType};
use serde_json::json;
use std::fmt::Write;

impl MockDataStore {
    /// Render the case report. The mock renders plain text where the real
    /// backend renders a PDF.
    pub fn export_report(&mut self, case_id: &str) -> CourtroomResult<Vec<u8>> {
        let case = self.case(case_id)?;
        let generated_at = self.clock.now();

        let mut out = String::new();
        let _ = writeln!(out, "Credit Courtroom Report");
        let _ = writeln!(out, "Case ID: {}", case.case_id);
        let _ = writeln!(out, "Generated: {}", generated_at.to_rfc3339());
        let _ = writeln!(out, "Status: {}", case.status.as_str());
        if let Some(purpose) = case.applicant.as_ref().and_then(|a| a.loan_purpose) {
            let _ = writeln!(out, "Loan purpose: {}", purpose.label());
        }
        if let Some(decision) = &case.decision {
            let _ = writeln!(out, "Verdict: {}", decision.verdict.as_str());
            let _ = writeln!(out, "Confidence: {:.2}", decision.confidence);
            for line in &decision.justification {
                let _ = writeln!(out, "  - {line}");
            }
        }

        self.record(
            case_id,
            AuditEventType::ExportedReport,
            json!({ "format": "text", "bytes": out.len() }),
        )?;
        log::info!("Exported report for {case_id}");
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::CourtroomConfig,
        model::{AuditEventType, DebateMode},
        store::MockDataStore,
    };

    #[test]
    fn report_names_case_and_verdict() {
        let mut store = MockDataStore::new(CourtroomConfig::default_test().simulation).unwrap();
        let case = store.create_case(None).unwrap();
        let draft = String::from_utf8(store.export_report(&case.case_id).unwrap()).unwrap();
        assert!(draft.contains(&case.case_id));
        assert!(draft.contains("Status: draft"));
        assert!(!draft.contains("Verdict"));

        store.start_debate(&case.case_id, None, DebateMode::Standard).unwrap();
        store.advance_to(12_000).unwrap();
        let decided = String::from_utf8(store.export_report(&case.case_id).unwrap()).unwrap();
        assert!(decided.contains("Verdict: manual_review"));
        assert_eq!(
            store.audit_log().count_of_type(&case.case_id, AuditEventType::ExportedReport).unwrap(),
            2
        );
    }
}

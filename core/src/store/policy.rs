use super::MockDataStore;
use crate::{
    error::{CourtroomError, CourtroomResult},
    fixtures,
    model::{Policy, PolicyClause, PolicyStatus, PolicyType},
};

impl MockDataStore {
    pub(super) fn seed_policies(&mut self) {
        let clock = self.clock.clone();
        self.policies = fixtures::policies(|days| clock.days_ago(days));
        for clause in fixtures::policy_clauses() {
            self.policy_clauses
                .entry(clause.policy_id.clone())
                .or_default()
                .push(clause);
        }
    }

    pub fn policies(&self) -> Vec<Policy> {
        self.policies.clone()
    }

    pub fn policy(&self, policy_id: &str) -> CourtroomResult<Policy> {
        self.policies
            .iter()
            .find(|p| p.policy_id == policy_id)
            .cloned()
            .ok_or_else(|| CourtroomError::not_found("Policy", policy_id))
    }

    /// Clauses extracted from a policy document. Empty for uploads.
    pub fn policy_clauses(&self, policy_id: &str) -> CourtroomResult<Vec<PolicyClause>> {
        self.policy(policy_id)?;
        Ok(self.policy_clauses.get(policy_id).cloned().unwrap_or_default())
    }

    pub fn upload_policy(
        &mut self,
        name: &str,
        document_type: PolicyType,
        filename: &str,
    ) -> CourtroomResult<Policy> {
        let policy = Policy {
            policy_id: self.rng.ids.next_id("policy"),
            name: name.to_string(),
            document_type,
            filename: filename.to_string(),
            version: "v1.0".into(),
            uploaded_at: self.clock.now(),
            clauses_count: 5 + self.rng.policy.next_u64_below(20) as u32,
            status: PolicyStatus::Active,
        };
        self.policies.push(policy.clone());
        log::info!("Uploaded policy {} ({})", policy.policy_id, policy.name);
        Ok(policy)
    }

    /// Clauses cited by the case's decision. Empty while undecided.
    pub fn policy_evidence(&self, case_id: &str) -> CourtroomResult<Vec<PolicyClause>> {
        let record = self.case_record(case_id)?;
        Ok(record
            .decision
            .as_ref()
            .and_then(|d| d.policy_refs.as_ref())
            .map(|refs| refs.iter().map(|r| r.clause.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::CourtroomConfig,
        fixtures::MANUAL_REVIEW_CLAUSE,
        model::{DebateMode, PolicyStatus, PolicyType},
        store::MockDataStore,
    };

    #[test]
    fn builtin_policies_and_clauses() {
        let store = MockDataStore::new(CourtroomConfig::default_test().simulation).unwrap();
        assert_eq!(store.policies().len(), 4);
        let clauses = store.policy_clauses("policy_002").unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].section, "2.1");
        assert!(store.policy("policy_999").unwrap_err().is_not_found());
    }

    #[test]
    fn upload_adds_an_active_policy() {
        let mut store = MockDataStore::new(CourtroomConfig::default_test().simulation).unwrap();
        let policy = store
            .upload_policy("Income Verification", PolicyType::Eligibility, "income_v1.pdf")
            .unwrap();
        assert_eq!(policy.version, "v1.0");
        assert_eq!(policy.status, PolicyStatus::Active);
        assert!((5..25).contains(&policy.clauses_count));
        assert_eq!(store.policies().len(), 5);
        assert_eq!(store.policy(&policy.policy_id).unwrap(), policy);
        assert!(store.policy_clauses(&policy.policy_id).unwrap().is_empty());
    }

    #[test]
    fn evidence_follows_the_decision() {
        let mut store = MockDataStore::new(CourtroomConfig::default_test().simulation).unwrap();
        let case = store.create_case(None).unwrap();
        assert!(store.policy_evidence(&case.case_id).unwrap().is_empty());
        store.start_debate(&case.case_id, None, DebateMode::Standard).unwrap();
        store.advance_to(12_000).unwrap();
        let evidence = store.policy_evidence(&case.case_id).unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].clause_id, MANUAL_REVIEW_CLAUSE);
    }
}

use super::MockDataStore;
use crate::model::{Case, CaseList, CaseStatus, DashboardStats, Verdict};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filter and page of the case list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseQuery {
    /// Case-insensitive substring of the case id or the loan purpose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl CaseQuery {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    fn matches(&self, case: &Case) -> bool {
        if self.status.is_some_and(|s| s != case.status) {
            return false;
        }
        let Some(needle) = self.query.as_deref().map(str::to_lowercase) else {
            return true;
        };
        if case.case_id.to_lowercase().contains(&needle) {
            return true;
        }
        case.applicant
            .as_ref()
            .and_then(|a| a.loan_purpose)
            .is_some_and(|p| p.label().to_lowercase().contains(&needle))
    }
}

impl MockDataStore {
    /// All cases, most recently updated first; ties go to the newest case.
    pub fn cases(&self) -> Vec<Case> {
        let mut records: Vec<_> = self.cases.values().collect();
        records.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        records.into_iter().map(|r| self.snapshot(r)).collect()
    }

    pub fn list_cases(&self, query: &CaseQuery) -> CaseList {
        let matching: Vec<Case> = self.cases().into_iter().filter(|c| query.matches(c)).collect();
        let total = matching.len() as u32;
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
        let items = matching.into_iter().skip(offset).take(limit).collect();
        CaseList { items, total }
    }

    /// Dashboard counters, recomputed from the live cases.
    pub fn stats(&self) -> DashboardStats {
        let mut stats = DashboardStats {
            total_cases: self.cases.len() as u32,
            ..DashboardStats::default()
        };
        for record in self.cases.values() {
            match record.status {
                CaseStatus::Draft => stats.draft_cases += 1,
                CaseStatus::Running => stats.running_cases += 1,
                _ => {}
            }
            match record.decision.as_ref().map(|d| d.verdict) {
                Some(Verdict::Approve) => stats.approvals += 1,
                Some(Verdict::Reject) => stats.rejects += 1,
                Some(Verdict::ManualReview) => stats.manual_reviews += 1,
                None => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CourtroomConfig,
        model::{ApplicantPayload, DebateMode, LoanPurpose},
    };

    fn store() -> MockDataStore {
        MockDataStore::new(CourtroomConfig::default_test().simulation).unwrap()
    }

    #[test]
    fn newest_case_first_on_equal_timestamps() {
        let mut store = store();
        let a = store.create_case(None).unwrap();
        let b = store.create_case(None).unwrap();
        let ids: Vec<_> = store.cases().into_iter().map(|c| c.case_id).collect();
        assert_eq!(ids, vec![b.case_id, a.case_id]);
    }

    #[test]
    fn query_matches_loan_purpose_and_paginates() {
        let mut store = store();
        for purpose in [LoanPurpose::Car, LoanPurpose::DebtConsolidation, LoanPurpose::Car] {
            store
                .create_case(Some(ApplicantPayload {
                    loan_purpose: Some(purpose),
                    ..Default::default()
                }))
                .unwrap();
            store.advance_by(10).unwrap();
        }
        let cars = store.list_cases(&CaseQuery::search("CAR"));
        assert_eq!(cars.total, 2);
        let debt = store.list_cases(&CaseQuery::search("debt cons"));
        assert_eq!(debt.total, 1);

        let page = store.list_cases(&CaseQuery::default().page(1, 1));
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        let drafts = store.list_cases(&CaseQuery::default().with_status(CaseStatus::Running));
        assert_eq!(drafts.total, 0);
    }

    #[test]
    fn stats_follow_live_cases() {
        let mut store = store();
        let a = store.create_case(None).unwrap();
        store.create_case(None).unwrap();
        assert_eq!(store.stats().draft_cases, 2);

        store.start_debate(&a.case_id, None, DebateMode::Standard).unwrap();
        let running = store.stats();
        assert_eq!(running.running_cases, 1);
        assert_eq!(running.draft_cases, 1);

        store.advance_to(12_000).unwrap();
        let decided = store.stats();
        assert_eq!(decided.total_cases, 2);
        assert_eq!(decided.manual_reviews, 1);
        assert_eq!(decided.running_cases, 0);
    }
}

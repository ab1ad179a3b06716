use super::MockDataStore;
use crate::{
    error::CourtroomResult,
    fixtures,
    model::{FraudSignals, RiskTier},
};

impl MockDataStore {
    /// Graph-derived fraud signals of a case. The first call rolls a risk tier
    /// and caches the result on the case.
    pub fn fraud_signals(&mut self, case_id: &str) -> CourtroomResult<FraudSignals> {
        if let Some(cached) = &self.case_record(case_id)?.fraud_signals {
            return Ok(cached.clone());
        }
        let tier = self.roll_risk_tier();
        let signals = fixtures::fraud_signals(tier, self.clock.now());
        self.case_record_mut(case_id)?.fraud_signals = Some(signals.clone());
        log::info!("Fraud signals for {case_id}: {tier:?} tier");
        Ok(signals)
    }

    fn roll_risk_tier(&mut self) -> RiskTier {
        if self.rng.fraud.next_f64() > 0.7 {
            RiskTier::High
        } else if self.rng.fraud.next_f64() > 0.4 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{config::CourtroomConfig, store::MockDataStore};

    #[test]
    fn first_roll_is_cached() {
        let mut store = MockDataStore::new(CourtroomConfig::default_test().simulation).unwrap();
        let case = store.create_case(None).unwrap();
        let first = store.fraud_signals(&case.case_id).unwrap();
        store.advance_by(60_000).unwrap();
        let second = store.fraud_signals(&case.case_id).unwrap();
        assert_eq!(first, second);
        assert!([0.12, 0.45, 0.74].contains(&first.fraud_cluster_score));
        assert_eq!(store.case(&case.case_id).unwrap().fraud_signals, Some(first));
    }

    #[test]
    fn same_seed_rolls_same_tiers() {
        let tiers = |seed: u64| {
            let mut config = CourtroomConfig::default_test().simulation;
            config.seed = seed;
            let mut store = MockDataStore::new(config).unwrap();
            (0..10)
                .map(|_| {
                    let case = store.create_case(None).unwrap();
                    store.fraud_signals(&case.case_id).unwrap().fraud_cluster_score
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(tiers(11), tiers(11));
    }

    #[test]
    fn unknown_case_is_not_found() {
        let mut store = MockDataStore::new(CourtroomConfig::default_test().simulation).unwrap();
        assert!(store.fraud_signals("case_ghost").unwrap_err().is_not_found());
    }
}

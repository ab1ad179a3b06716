//! Deterministic random number generation.
//!
//! RULE: Nothing in the store may call any platform RNG.
//! All randomness (ids, fraud tiers, policy clause counts) flows through
//! streams derived from the single seed in `SimulationConfig`.
//!
//! Each concern gets its own stream, seeded from (seed XOR stream_index), so
//! drawing more ids never shifts the fraud-tier rolls and vice versa.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// A named, deterministic RNG for a single concern.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// `prefix_` followed by nine base-36 characters, e.g. `case_k3j9x0q2m`.
    pub fn next_id(&mut self, prefix: &str) -> String {
        let mut id = String::with_capacity(prefix.len() + 1 + ID_SUFFIX_LEN);
        id.push_str(prefix);
        id.push('_');
        for _ in 0..ID_SUFFIX_LEN {
            let idx = self.next_u64_below(ID_ALPHABET.len() as u64) as usize;
            id.push(ID_ALPHABET[idx] as char);
        }
        id
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries. Only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngStream {
    Ids = 0,
    Fraud = 1,
    Policy = 2,
}

impl RngStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ids => "ids",
            Self::Fraud => "fraud",
            Self::Policy => "policy",
        }
    }
}

/// Live RNG streams for one store instance.
pub struct RngBank {
    pub ids: StreamRng,
    pub fraud: StreamRng,
    pub policy: StreamRng,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        let stream = |s: RngStream| StreamRng::new(master_seed, s as u64).with_name(s.name());
        Self {
            ids: stream(RngStream::Ids),
            fraud: stream(RngStream::Fraud),
            policy: stream(RngStream::Policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_prefix_and_fixed_length() {
        let mut bank = RngBank::new(7);
        let id = bank.ids.next_id("case");
        assert!(id.starts_with("case_"));
        assert_eq!(id.len(), "case_".len() + 9);
        assert!(id[5..].chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = RngBank::new(42);
        let mut b = RngBank::new(42);
        assert_eq!(a.ids.next_id("run"), b.ids.next_id("run"));
        assert_eq!(a.fraud.next_f64(), b.fraud.next_f64());
    }

    #[test]
    fn streams_are_independent() {
        let mut a = RngBank::new(42);
        let mut b = RngBank::new(42);
        for _ in 0..10 {
            a.ids.next_id("case");
        }
        assert_eq!(a.fraud.next_f64(), b.fraud.next_f64());
    }
}

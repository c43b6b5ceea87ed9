//! Deterministic PRNG for graph generation.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, good statistical
//! properties, and trivially serializable. The generator is always passed
//! explicitly so a seed fully determines the topology and the trace.

/// SplitMix64 pseudo-random number generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform draw from `0..bound`. Returns 0 when `bound` is 0.
    ///
    /// Maps the upper 32 bits onto the range with a widening multiply, so
    /// every call consumes exactly one `u64` from the sequence.
    pub fn below(&mut self, bound: u32) -> u32 {
        let upper = self.next_u64() >> 32;
        ((upper * u64::from(bound)) >> 32) as u32
    }

    /// Uniform draw from `low..=high`. Returns `low` if the range is empty.
    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            self.next_u64();
            return low;
        }
        let span = high - low;
        match span.checked_add(1) {
            Some(bound) => low + self.below(bound),
            None => (self.next_u64() >> 32) as u32,
        }
    }

    /// Get the internal state (for hashing/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn below_stays_in_range() {
        let mut rng = SimRng::new(7);
        for bound in 1..50 {
            for _ in 0..100 {
                assert!(rng.below(bound) < bound);
            }
        }
    }

    #[test]
    fn below_zero_is_zero() {
        let mut rng = SimRng::new(7);
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn below_covers_every_value() {
        let mut rng = SimRng::new(12345);
        let mut seen = [0u32; 3];
        for _ in 0..3_000 {
            seen[rng.below(3) as usize] += 1;
        }
        // Expect ~1000 each; very generous tolerance.
        for (value, hits) in seen.iter().enumerate() {
            assert!((700..=1300).contains(hits), "value {value} drawn {hits} times");
        }
    }

    #[test]
    fn range_inclusive_bounds() {
        let mut rng = SimRng::new(99);
        for _ in 0..500 {
            let v = rng.range_inclusive(1, 3);
            assert!((1..=3).contains(&v));
        }
        assert_eq!(rng.range_inclusive(5, 5), 5);
        assert_eq!(rng.range_inclusive(5, 2), 5);
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = SimRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }

        let json = serde_json::to_string(&rng).unwrap();
        let restored: SimRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);

        let mut rng2 = restored;
        for _ in 0..10 {
            assert_eq!(rng.next_u64(), rng2.next_u64());
        }
    }
}

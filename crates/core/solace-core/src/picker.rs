//! Injectable randomness for template choice

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Pseudo-random source behind every template choice and coin flip.
/// A seeded picker replays the same sequence.
#[derive(Debug, Clone)]
pub struct TemplatePicker {
    rng: StdRng,
}

impl TemplatePicker {
    /// Deterministic picker
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picker seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when a seed is given, entropy otherwise
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }

    /// Choose one entry; `None` only for an empty pool
    pub fn choose<'a, T>(&mut self, pool: &'a [T]) -> Option<&'a T> {
        pool.choose(&mut self.rng)
    }

    /// True with probability `p` (clamped to [0, 1])
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }
}

impl Default for TemplatePicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let pool = ["a", "b", "c", "d", "e"];
        let mut first = TemplatePicker::seeded(7);
        let mut second = TemplatePicker::seeded(7);
        for _ in 0..20 {
            assert_eq!(first.choose(&pool), second.choose(&pool));
            assert_eq!(first.chance(0.5), second.chance(0.5));
        }
    }

    #[test]
    fn test_empty_pool() {
        let pool: [&str; 0] = [];
        assert!(TemplatePicker::seeded(1).choose(&pool).is_none());
    }

    #[test]
    fn test_chance_extremes() {
        let mut picker = TemplatePicker::seeded(3);
        assert!((0..50).all(|_| picker.chance(1.0)));
        assert!((0..50).all(|_| !picker.chance(0.0)));
        assert!(!picker.chance(-2.0));
    }
}

//! Random number generator abstraction for the solver.
//!
//! The `TileRng` trait defines the small interface the solver needs
//! (a uniform double for weighted draws, a bounded index for tie-breaking),
//! while `StdRandom` supplies the concrete generator.
//!
//! # Example
//!
//! ```ignore
//! use wfc_core::rng::{StdRandom, TileRng};
//!
//! let mut rng = StdRandom::from_u64_seed(42);
//! let roll = rng.next_double(); // 0.0..1.0
//! let pick = rng.next_usize_max(5); // 0..5
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Trait for random number generators used by the solver.
///
/// Object safe so a generator can hold a `Box<dyn TileRng>`, and
/// `Send + Sync` so that generator can live inside an ECS resource.
pub trait TileRng: Send + Sync {
    /// Returns a random double in [0.0, 1.0).
    fn next_double(&mut self) -> f64;

    /// Returns a random u64.
    fn next_u64(&mut self) -> u64;

    /// Returns a random usize in [0, max).
    /// Returns 0 when `max` is 0.
    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        let picked = (self.next_double() * max as f64) as usize;
        // next_double() < 1.0, but guard the float rounding edge anyway
        picked.min(max - 1)
    }
}

/// Standard Rust RNG wrapper using `rand::rngs::StdRng`.
#[derive(Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Create from a u64 seed. Same seed, same sequence.
    pub fn from_u64_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is `Some`, otherwise from entropy.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_u64_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl TileRng for StdRandom {
    fn next_double(&mut self) -> f64 {
        self.rng.gen()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_random_ranges() {
        let mut rng = StdRandom::from_u64_seed(42);

        for _ in 0..1000 {
            let v = rng.next_double();
            assert!((0.0..1.0).contains(&v));
        }

        for _ in 0..1000 {
            let v = rng.next_usize_max(7);
            assert!(v < 7, "Value {} out of range [0, 7)", v);
        }
    }

    #[test]
    fn test_next_usize_max_zero() {
        let mut rng = StdRandom::from_u64_seed(1);
        assert_eq!(rng.next_usize_max(0), 0);
        assert_eq!(rng.next_usize_max(1), 0);
    }

    #[test]
    fn test_std_random_is_deterministic() {
        let mut rng1 = StdRandom::from_u64_seed(123);
        let mut rng2 = StdRandom::from_u64_seed(123);
        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_usable_as_trait_object() {
        let mut boxed: Box<dyn TileRng> = Box::new(StdRandom::from_u64_seed(9));
        let v = boxed.next_usize_max(3);
        assert!(v < 3);
    }
}

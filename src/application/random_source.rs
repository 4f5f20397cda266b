// Random source strategy injected into the generator and monitor
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send {
    /// Uniform draw from the closed range `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// True with probability `probability`.
    fn chance(&mut self, probability: f64) -> bool;
}

/// `RandomSource` backed by a `rand` generator.
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        if !(high - low).is_finite() {
            // too wide for gen_range; interpolate instead
            let t: f64 = self.rng.gen_range(0.0..=1.0);
            return (low * (1.0 - t) + high * t).clamp(low, high);
        }
        self.rng.gen_range(low..=high)
    }

    fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            self.rng.gen_bool(probability)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed script of draws; `uniform` draws are fractions in `[0, 1]`
    /// of the requested range, `chance` draws are compared against the probability.
    pub(crate) struct ScriptedSource {
        fractions: VecDeque<f64>,
        rolls: VecDeque<f64>,
    }

    impl ScriptedSource {
        pub(crate) fn new(fractions: Vec<f64>, rolls: Vec<f64>) -> Self {
            Self {
                fractions: fractions.into(),
                rolls: rolls.into(),
            }
        }

        /// Always draws the top of the range and always passes the gate.
        pub(crate) fn maxed() -> Self {
            Self::new(Vec::new(), Vec::new())
        }
    }

    impl RandomSource for ScriptedSource {
        fn uniform(&mut self, low: f64, high: f64) -> f64 {
            let fraction = self.fractions.pop_front().unwrap_or(1.0);
            low + (high - low) * fraction
        }

        fn chance(&mut self, probability: f64) -> bool {
            let roll = self.rolls.pop_front().unwrap_or(0.0);
            probability > 0.0 && roll < probability
        }
    }

    #[test]
    fn test_seeded_sources_agree() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.uniform(-10.0, 10.0), b.uniform(-10.0, 10.0));
            assert_eq!(a.chance(0.3), b.chance(0.3));
        }
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let mut source = RngSource::seeded(1);
        for _ in 0..1_000 {
            let v = source.uniform(-15.0, 15.0);
            assert!((-15.0..=15.0).contains(&v));
        }
        assert_eq!(source.uniform(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_uniform_handles_range_wider_than_f64() {
        let mut source = RngSource::seeded(3);
        for _ in 0..1_000 {
            let v = source.uniform(-f64::MAX, f64::MAX);
            assert!(v.is_finite());
        }
        let v = source.uniform(-1e308, 1e308);
        assert!((-1e308..=1e308).contains(&v));
    }

    #[test]
    fn test_chance_extremes() {
        let mut source = RngSource::seeded(9);
        assert!((0..1_000).all(|_| !source.chance(0.0)));
        assert!((0..1_000).all(|_| source.chance(1.0)));
    }
}

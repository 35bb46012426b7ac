use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of probe vectors used when a user has no preference signal yet.
pub trait ProbeVectorSource: Send + Sync {
    fn probe(&self, dimension: usize) -> Vec<f32>;
}

/// Uniform random probe in [0, 1) per component.
#[derive(Debug, Default, Clone)]
pub struct RandomProbe;

impl ProbeVectorSource for RandomProbe {
    fn probe(&self, dimension: usize) -> Vec<f32> {
        let mut rng = rand::rng();
        (0..dimension).map(|_| rng.random::<f32>()).collect()
    }
}

/// Deterministic probe for reproducible runs and tests.
#[derive(Debug)]
pub struct SeededProbe {
    rng: Mutex<StdRng>,
}

impl SeededProbe {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ProbeVectorSource for SeededProbe {
    fn probe(&self, dimension: usize) -> Vec<f32> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (0..dimension).map(|_| rng.random::<f32>()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_probe_dimension_and_range() {
        let probe = RandomProbe.probe(512);
        assert_eq!(probe.len(), 512);
        assert!(probe.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_seeded_probe_is_reproducible() {
        let first = SeededProbe::new(42).probe(16);
        let second = SeededProbe::new(42).probe(16);
        assert_eq!(first, second);
    }

    #[test]
    fn test_seeded_probe_advances_between_calls() {
        let source = SeededProbe::new(7);
        assert_ne!(source.probe(16), source.probe(16));
    }
}

/// Time and randomness sources injected into the feed
use crate::domain::Satellite;
use crate::errors::FeedError;
use chrono::{DateTime, Utc};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Source of timestamps for `lastUpdate` and trend labels
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Widest allowed perturbation span, the full health domain
pub const MAX_PERTURBATION_SPAN: f64 = 100.0;

/// Source of per-tick health perturbations
pub trait Perturbation: Send {
    fn delta(&mut self, satellite: &Satellite) -> f64;
}

/// Symmetric uniform random walk step, δ ∈ [-span/2, +span/2]
#[derive(Debug)]
pub struct UniformPerturbation {
    rng: StdRng,
    step: Uniform<f64>,
}

impl UniformPerturbation {
    pub fn new(span: f64, seed: Option<u64>) -> Result<Self, FeedError> {
        if !(0.0..=MAX_PERTURBATION_SPAN).contains(&span) {
            return Err(FeedError::InvalidSpan(span));
        }
        let half = span / 2.0;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            step: Uniform::new_inclusive(-half, half),
        })
    }
}

impl Perturbation for UniformPerturbation {
    fn delta(&mut self, _satellite: &Satellite) -> f64 {
        self.step.sample(&mut self.rng)
    }
}

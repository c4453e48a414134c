// src/search/accept.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{AcceptStrategy, ScoreSource};
use crate::state::{Assignment, State};

/// Accepts strict improvements only.
#[derive(Debug, Clone, Copy)]
pub struct Strict {
    source: ScoreSource,
}

impl Strict {
    pub fn model() -> Self {
        Self {
            source: ScoreSource::Model,
        }
    }

    pub fn objective() -> Self {
        Self {
            source: ScoreSource::Objective,
        }
    }
}

impl<A: Assignment> AcceptStrategy<A> for Strict {
    fn is_accepted(&mut self, candidate: &State<A>, current: &State<A>) -> bool {
        self.source.read(candidate) > self.source.read(current)
    }

    fn uses_objective(&self) -> bool {
        self.source == ScoreSource::Objective
    }

    fn name(&self) -> &'static str {
        match self.source {
            ScoreSource::Model => "strict-model",
            ScoreSource::Objective => "strict-objective",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl<A: Assignment> AcceptStrategy<A> for Always {
    fn is_accepted(&mut self, _candidate: &State<A>, _current: &State<A>) -> bool {
        true
    }

    fn uses_objective(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "always"
    }
}

/// Metropolis-Hastings with a symmetric proposal: improvements are always
/// accepted, anything else with probability
/// `exp((s(candidate) - s(current)) / temperature)`, `s` read on the log
/// scale of [`ScoreSource::read`].
#[derive(Debug, Clone)]
pub struct MetropolisHastings {
    source: ScoreSource,
    temperature: f64,
    rng: StdRng,
}

impl MetropolisHastings {
    pub fn new(source: ScoreSource, temperature: f64, seed: u64) -> Self {
        debug_assert!(temperature > 0.0);
        Self {
            source,
            temperature,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn acceptance_probability(&self, candidate: f64, current: f64) -> f64 {
        let ratio = ((candidate - current) / self.temperature).exp();
        if ratio.is_nan() {
            return 0.0;
        }
        ratio.min(1.0)
    }
}

impl<A: Assignment> AcceptStrategy<A> for MetropolisHastings {
    fn is_accepted(&mut self, candidate: &State<A>, current: &State<A>) -> bool {
        let p = self.acceptance_probability(self.source.read(candidate), self.source.read(current));
        p >= 1.0 || self.rng.gen::<f64>() < p
    }

    fn uses_objective(&self) -> bool {
        self.source == ScoreSource::Objective
    }

    fn name(&self) -> &'static str {
        "metropolis-hastings"
    }
}

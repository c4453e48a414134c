// src/search/sampling.rs

//! Candidate selection.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{SamplingStrategy, ScoreSource};
use crate::state::{Assignment, State};

/// Index of the highest score, first one on ties. NaN never wins.
fn arg_max(scores: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, score) in scores.enumerate() {
        match best {
            None => best = Some((i, score)),
            Some((_, b)) if score > b || b.is_nan() => best = Some((i, score)),
            _ => {}
        }
    }
    best.map(|(i, _)| i)
}

/// Draws an index proportional to `weights`. Falls back to the maximum when
/// the weights cannot form a distribution and to a uniform draw when they
/// are all zero.
fn draw(rng: &mut StdRng, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return arg_max(weights.iter().copied());
    }
    match WeightedIndex::new(weights) {
        Ok(distribution) => Some(distribution.sample(rng)),
        Err(_) => Some(rng.gen_range(0..weights.len())),
    }
}

/// `exp(l - max(l))` for every log-scale score `l`: proportional to
/// `exp(l)` without overflowing. Uniform when no score is finite.
fn relative_potentials(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![1.0; logits.len()];
    }
    logits.iter().map(|l| (l - max).exp()).collect()
}

// ============================================================================
// Greedy
// ============================================================================

/// Always the best candidate.
#[derive(Debug, Clone, Copy)]
pub struct Greedy {
    source: ScoreSource,
}

impl Greedy {
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

impl<A: Assignment> SamplingStrategy<A> for Greedy {
    fn sample_candidate(&mut self, candidates: &[State<A>]) -> Option<usize> {
        arg_max(candidates.iter().map(|s| self.source.read(s)))
    }

    fn uses_objective(&self) -> bool {
        self.source == ScoreSource::Objective
    }

    fn name(&self) -> &'static str {
        match self.source {
            ScoreSource::Model => "greedy-model",
            ScoreSource::Objective => "greedy-objective",
        }
    }
}

// ============================================================================
// Linear
// ============================================================================

/// Probability proportional to the score: the potential for the model, the
/// raw value for the objective, where negative scores count as zero.
#[derive(Debug, Clone)]
pub struct Linear {
    source: ScoreSource,
    rng: StdRng,
}

impl Linear {
    pub fn new(source: ScoreSource, seed: u64) -> Self {
        Self {
            source,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<A: Assignment> SamplingStrategy<A> for Linear {
    fn sample_candidate(&mut self, candidates: &[State<A>]) -> Option<usize> {
        let scores: Vec<f64> = candidates.iter().map(|s| self.source.read(s)).collect();
        let weights = match self.source {
            ScoreSource::Model => relative_potentials(&scores),
            ScoreSource::Objective => scores.iter().map(|s| s.max(0.0)).collect(),
        };
        draw(&mut self.rng, &weights)
    }

    fn uses_objective(&self) -> bool {
        self.source == ScoreSource::Objective
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

// ============================================================================
// Softmax
// ============================================================================

/// Probability proportional to `exp(s / temperature)`, where `s` is the
/// linear score for the model and the raw value for the objective.
#[derive(Debug, Clone)]
pub struct Softmax {
    source: ScoreSource,
    temperature: f64,
    rng: StdRng,
}

impl Softmax {
    pub fn new(source: ScoreSource, temperature: f64, seed: u64) -> Self {
        debug_assert!(temperature > 0.0);
        Self {
            source,
            temperature,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<A: Assignment> SamplingStrategy<A> for Softmax {
    fn sample_candidate(&mut self, candidates: &[State<A>]) -> Option<usize> {
        let logits: Vec<f64> = candidates
            .iter()
            .map(|s| self.source.read(s) / self.temperature)
            .collect();
        draw(&mut self.rng, &relative_potentials(&logits))
    }

    fn uses_objective(&self) -> bool {
        self.source == ScoreSource::Objective
    }

    fn name(&self) -> &'static str {
        "softmax"
    }
}

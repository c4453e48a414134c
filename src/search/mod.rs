// src/search/mod.rs

//! Search pipeline traits.
//!
//! One sampling step runs every explorer once, in order:
//!
//! ```text
//! Explorer ─▶ score ─▶ SamplingStrategy ─▶ (Learner) ─▶ AcceptStrategy
//!    │          │            │                 │              │
//!    │          │            │                 │              └─ strict, always, MH
//!    │          │            │                 └─ training chains only
//!    │          │            └─ greedy, linear, softmax
//!    │          └─ model, plus objective with gold
//!    └─ domain specific neighborhood
//! ```
//!
//! and a [`StoppingCriterion`] is consulted before each step. The
//! [`Sampler`] wires these together.

use std::sync::Arc;

use crate::state::{Assignment, State};

// ============================================================================
// Neighborhood
// ============================================================================

/// Proposes the neighbors of a state. Every returned state must be a
/// [`State::successor`] of the input (or of another successor), never a
/// mutated clone, so its factor graph and scores start empty.
pub trait Explorer<A: Assignment>: Send + Sync {
    fn next_states(&self, state: &State<A>) -> Vec<State<A>>;

    fn name(&self) -> &'static str {
        "explorer"
    }
}

/// Builds the starting state of a chain.
pub trait Initializer<A: Assignment> {
    fn initial_state(&self, instance: &Arc<A::Instance>) -> State<A>;
}

impl<A, F> Initializer<A> for F
where
    A: Assignment,
    F: Fn(&Arc<A::Instance>) -> State<A>,
{
    fn initial_state(&self, instance: &Arc<A::Instance>) -> State<A> {
        self(instance)
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Which cached score a strategy reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Model,
    Objective,
}

impl ScoreSource {
    /// Score on a log scale: the linear score for the model, the raw value
    /// for the objective. Both order states the way their potentials do.
    pub fn read<A: Assignment>(self, state: &State<A>) -> f64 {
        match self {
            ScoreSource::Model => state.linear_score(),
            ScoreSource::Objective => state.objective_score(),
        }
    }
}

/// Picks one candidate out of a scored neighborhood.
pub trait SamplingStrategy<A: Assignment>: Send {
    /// Index of the chosen candidate, `None` for an empty slice.
    fn sample_candidate(&mut self, candidates: &[State<A>]) -> Option<usize>;

    fn uses_objective(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Decides whether the chain moves to the sampled candidate.
pub trait AcceptStrategy<A: Assignment>: Send {
    fn is_accepted(&mut self, candidate: &State<A>, current: &State<A>) -> bool;

    fn uses_objective(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Ends a chain. `chain` holds the states recorded so far and `step` the
/// number of completed sampling steps.
pub trait StoppingCriterion<A: Assignment>: Send + Sync {
    fn check_condition(&self, chain: &[State<A>], step: usize) -> bool;
}

/// A sampling strategy paired with an accept strategy.
pub struct SearchPolicy<A: Assignment> {
    pub sampling: Box<dyn SamplingStrategy<A>>,
    pub accept: Box<dyn AcceptStrategy<A>>,
}

impl<A: Assignment> SearchPolicy<A> {
    pub fn new(
        sampling: impl SamplingStrategy<A> + 'static,
        accept: impl AcceptStrategy<A> + 'static,
    ) -> Self {
        Self {
            sampling: Box::new(sampling),
            accept: Box::new(accept),
        }
    }

    /// Greedy by objective, accept only objective improvements.
    pub fn training() -> Self {
        Self::new(sampling::Greedy::objective(), accept::Strict::objective())
    }

    /// Greedy by model score, accept only model score improvements.
    pub fn prediction() -> Self {
        Self::new(sampling::Greedy::model(), accept::Strict::model())
    }

    pub fn uses_objective(&self) -> bool {
        self.sampling.uses_objective() || self.accept.uses_objective()
    }
}

impl<A: Assignment> std::fmt::Debug for SearchPolicy<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPolicy")
            .field("sampling", &self.sampling.name())
            .field("accept", &self.accept.name())
            .finish()
    }
}

pub mod accept;
pub mod sampler;
pub mod sampling;
pub mod stopping;

pub use sampler::{Chain, Sampler};
pub use stopping::{ScoreConvergence, StepLimit};

// src/state.rs

//! Search states.
//!
//! A [`State`] wraps a domain [`Assignment`] for one instance together with
//! its factor graph and two score caches. States are never edited in place
//! during search: [`State::successor`] clones the assignment, applies the
//! edit, and returns a new state with a fresh id, an empty factor graph and
//! invalidated scores. `Clone` on the other hand is a snapshot: same id,
//! same caches, same shared instance. The chain history stores snapshots.
//!
//! The model cache holds the linear score `Σ features·weights`; the
//! potential `exp(linear)` is derived on read and saturates to `inf` for
//! large inputs, so search strategies compare linear scores.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::factor::ScopeKey;
use crate::graph::FactorGraph;

/// Domain side of a state: the variable assignment being searched over.
pub trait Assignment: Clone + fmt::Debug + Send + Sync + 'static {
    /// The input this assignment annotates (a sentence, a document, ...).
    type Instance: fmt::Debug + Send + Sync + 'static;
    /// Variable values templates build their scopes from.
    type Key: ScopeKey;
}

static NEXT_STATE_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u64);

impl StateId {
    fn next() -> Self {
        StateId(NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Neutral model potential reported before a state was scored.
pub const UNSCORED_MODEL_SCORE: f64 = 1.0;

#[derive(Debug)]
pub struct State<A: Assignment> {
    id: StateId,
    instance: Arc<A::Instance>,
    assignment: A,
    factor_graph: FactorGraph<A::Key>,
    linear_score: Option<f64>,
    objective_score: Option<f64>,
}

// Written out so instances need not be `Clone`; they are shared.
impl<A: Assignment> Clone for State<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            instance: Arc::clone(&self.instance),
            assignment: self.assignment.clone(),
            factor_graph: self.factor_graph.clone(),
            linear_score: self.linear_score,
            objective_score: self.objective_score,
        }
    }
}

impl<A: Assignment> State<A> {
    pub fn new(instance: Arc<A::Instance>, assignment: A) -> Self {
        Self {
            id: StateId::next(),
            instance,
            assignment,
            factor_graph: FactorGraph::new(),
            linear_score: None,
            objective_score: None,
        }
    }

    /// A new state with `edit` applied to a copy of this assignment.
    pub fn successor(&self, edit: impl FnOnce(&mut A)) -> Self {
        let mut assignment = self.assignment.clone();
        edit(&mut assignment);
        Self::new(Arc::clone(&self.instance), assignment)
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn instance(&self) -> &Arc<A::Instance> {
        &self.instance
    }

    pub fn assignment(&self) -> &A {
        &self.assignment
    }

    pub fn factor_graph(&self) -> &FactorGraph<A::Key> {
        &self.factor_graph
    }

    pub(crate) fn factor_graph_mut(&mut self) -> &mut FactorGraph<A::Key> {
        &mut self.factor_graph
    }

    /// Model potential `exp(linear_score)`, [`UNSCORED_MODEL_SCORE`] if
    /// never scored.
    pub fn model_score(&self) -> f64 {
        self.linear_score.map_or(UNSCORED_MODEL_SCORE, f64::exp)
    }

    /// Cached `Σ features·weights`, `0.0` if never scored.
    pub fn linear_score(&self) -> f64 {
        self.linear_score.unwrap_or(0.0)
    }

    /// Cached objective score, `0.0` if never scored.
    pub fn objective_score(&self) -> f64 {
        self.objective_score.unwrap_or(0.0)
    }

    pub fn is_model_scored(&self) -> bool {
        self.linear_score.is_some()
    }

    pub fn is_objective_scored(&self) -> bool {
        self.objective_score.is_some()
    }

    pub(crate) fn set_linear_score(&mut self, score: f64) {
        self.linear_score = Some(score);
    }

    pub fn set_objective_score(&mut self, score: f64) {
        self.objective_score = Some(score);
    }
}

impl<A: Assignment> fmt::Display for State<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State{} linear={:.6} objective={:.4} {:?}",
            self.id,
            self.linear_score(),
            self.objective_score(),
            self.assignment
        )
    }
}

/// An instance paired with its gold annotation.
#[derive(Debug, Clone)]
pub struct LabeledInstance<I, G> {
    instance: Arc<I>,
    gold: G,
}

impl<I, G> LabeledInstance<I, G> {
    pub fn new(instance: I, gold: G) -> Self {
        Self {
            instance: Arc::new(instance),
            gold,
        }
    }

    pub fn instance(&self) -> &Arc<I> {
        &self.instance
    }

    pub fn gold(&self) -> &G {
        &self.gold
    }
}

// src/objective.rs

//! Objective functions: how good a state is with respect to the gold
//! annotation. Used for training and for evaluation, never for prediction
//! without gold.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use crate::state::{Assignment, State};

pub trait ObjectiveFunction<A: Assignment>: Send + Sync {
    type Gold: Send + Sync;

    /// Score in `[0, 1]`, higher is better.
    fn compute_score(&self, state: &State<A>, gold: &Self::Gold) -> f64;

    /// Computes the score and caches it on the state.
    fn score(&self, state: &mut State<A>, gold: &Self::Gold) -> f64 {
        let score = self.compute_score(state, gold);
        state.set_objective_score(score);
        score
    }

    /// Whether `a` should rank above `b`, by cached objective score.
    fn preference(&self, a: &State<A>, b: &State<A>) -> bool {
        a.objective_score() > b.objective_score()
    }
}

/// Precision/recall counts of a predicted set against a gold set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetComparison {
    pub true_positives: usize,
    pub predicted: usize,
    pub gold: usize,
}

impl SetComparison {
    pub fn of<T: Ord>(predicted: &BTreeSet<T>, gold: &BTreeSet<T>) -> Self {
        Self {
            true_positives: predicted.intersection(gold).count(),
            predicted: predicted.len(),
            gold: gold.len(),
        }
    }

    /// Two empty sets agree perfectly.
    fn both_empty(&self) -> bool {
        self.predicted == 0 && self.gold == 0
    }

    pub fn precision(&self) -> f64 {
        if self.both_empty() {
            return 1.0;
        }
        if self.predicted == 0 {
            return 0.0;
        }
        self.true_positives as f64 / self.predicted as f64
    }

    pub fn recall(&self) -> f64 {
        if self.both_empty() {
            return 1.0;
        }
        if self.gold == 0 {
            return 0.0;
        }
        self.true_positives as f64 / self.gold as f64
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }

    pub fn geometric_mean(&self) -> f64 {
        (self.precision() * self.recall()).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    F1,
    GeometricMean,
}

impl Measure {
    pub fn apply(self, comparison: &SetComparison) -> f64 {
        match self {
            Measure::F1 => comparison.f1(),
            Measure::GeometricMean => comparison.geometric_mean(),
        }
    }
}

/// Compares a set extracted from the assignment with a gold set.
pub struct SetObjective<A, T, F> {
    extract: F,
    measure: Measure,
    _marker: PhantomData<fn(&A) -> T>,
}

impl<A, T, F> SetObjective<A, T, F>
where
    A: Assignment,
    T: Ord + Send + Sync,
    F: Fn(&A) -> BTreeSet<T> + Send + Sync,
{
    pub fn new(measure: Measure, extract: F) -> Self {
        Self {
            extract,
            measure,
            _marker: PhantomData,
        }
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn compare(&self, state: &State<A>, gold: &BTreeSet<T>) -> SetComparison {
        SetComparison::of(&(self.extract)(state.assignment()), gold)
    }
}

impl<A, T, F> ObjectiveFunction<A> for SetObjective<A, T, F>
where
    A: Assignment,
    T: Ord + Send + Sync,
    F: Fn(&A) -> BTreeSet<T> + Send + Sync,
{
    type Gold = BTreeSet<T>;

    fn compute_score(&self, state: &State<A>, gold: &BTreeSet<T>) -> f64 {
        self.measure.apply(&self.compare(state, gold))
    }
}

impl<A, T, F> fmt::Debug for SetObjective<A, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetObjective")
            .field("measure", &self.measure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Clone)]
    struct Spans(BTreeSet<usize>);

    impl Assignment for Spans {
        type Instance = ();
        type Key = usize;
    }

    fn set(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    fn state(items: &[usize]) -> State<Spans> {
        State::new(Arc::new(()), Spans(set(items)))
    }

    #[test_log::test]
    fn comparison_counts() {
        let c = SetComparison::of(&set(&[1, 2, 3, 4]), &set(&[2, 4]));
        assert_eq!(c.precision(), 0.5);
        assert_eq!(c.recall(), 1.0);
        assert!((c.f1() - 2.0 / 3.0).abs() < 1e-12);
        assert!((c.geometric_mean() - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test_log::test]
    fn empty_sets() {
        assert_eq!(SetComparison::of::<usize>(&set(&[]), &set(&[])).f1(), 1.0);
        assert_eq!(SetComparison::of(&set(&[]), &set(&[1])).f1(), 0.0);
        assert_eq!(SetComparison::of(&set(&[1]), &set(&[])).geometric_mean(), 0.0);
    }

    #[test_log::test]
    fn score_caches_on_state() {
        let objective = SetObjective::new(Measure::F1, |s: &Spans| s.0.clone());
        let mut good = state(&[1, 2]);
        let mut bad = state(&[3]);
        let gold = set(&[1, 2]);

        assert_eq!(objective.score(&mut good, &gold), 1.0);
        assert_eq!(objective.score(&mut bad, &gold), 0.0);
        assert!(good.is_objective_scored());
        assert!(objective.preference(&good, &bad));
        assert!(!objective.preference(&bad, &good));
    }
}

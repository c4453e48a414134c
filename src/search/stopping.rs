// src/search/stopping.rs

use super::StoppingCriterion;
use crate::state::{Assignment, State};

/// Stops after a fixed number of sampling steps.
#[derive(Debug, Clone, Copy)]
pub struct StepLimit {
    max_steps: usize,
}

impl StepLimit {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }
}

impl<A: Assignment> StoppingCriterion<A> for StepLimit {
    fn check_condition(&self, _chain: &[State<A>], step: usize) -> bool {
        step >= self.max_steps
    }
}

/// Stops once the last `window` recorded states share one model score, or
/// after `max_steps`, whichever comes first.
#[derive(Debug, Clone, Copy)]
pub struct ScoreConvergence {
    max_steps: usize,
    window: usize,
}

impl ScoreConvergence {
    pub fn new(max_steps: usize, window: usize) -> Self {
        Self {
            max_steps,
            window: window.max(2),
        }
    }
}

impl<A: Assignment> StoppingCriterion<A> for ScoreConvergence {
    fn check_condition(&self, chain: &[State<A>], step: usize) -> bool {
        if step >= self.max_steps {
            return true;
        }
        if chain.len() < self.window {
            return false;
        }
        let tail = &chain[chain.len() - self.window..];
        let last = tail[tail.len() - 1].linear_score();
        tail.iter().all(|s| s.linear_score() == last)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Clone)]
    struct Unit;

    impl Assignment for Unit {
        type Instance = ();
        type Key = u8;
    }

    #[test_log::test]
    fn step_limit() {
        let limit = StepLimit::new(3);
        let chain: Vec<State<Unit>> = Vec::new();
        assert!(!limit.check_condition(&chain[..], 2));
        assert!(limit.check_condition(&chain[..], 3));
        assert!(StoppingCriterion::<Unit>::check_condition(&StepLimit::new(0), &[], 0));
    }

    #[test_log::test]
    fn convergence_needs_a_full_window() {
        let criterion = ScoreConvergence::new(100, 3);
        let state = State::new(Arc::new(()), Unit);
        let chain = vec![state.clone(), state.clone()];
        assert!(!criterion.check_condition(&chain[..], 2));
        let chain = vec![state.clone(), state.clone(), state];
        assert!(criterion.check_condition(&chain[..], 3));
    }
}

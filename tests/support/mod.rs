// tests/support/mod.rs

//! Toy word segmentation domain shared by the integration tests.
//!
//! An instance is a string; the assignment is the set of gap positions
//! that are word boundaries, gap `i` sitting between characters `i - 1` and
//! `i`. One factor per gap, with features over the character classes on both
//! sides, so the task is separable for the small corpora used here.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use samplerank::config::Config;
use samplerank::{
    Assignment, Explorer, FactorScope, LabeledInstance, Measure, SetObjective, State, Template,
    Vector,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundaries(pub BTreeSet<usize>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gap {
    pub position: usize,
    pub left: char,
    pub right: char,
    pub boundary: bool,
}

impl Assignment for Boundaries {
    type Instance = String;
    type Key = Gap;
}

fn class(c: char) -> &'static str {
    if c.is_whitespace() {
        "space"
    } else if c.is_alphabetic() {
        "alpha"
    } else {
        "other"
    }
}

pub struct GapTemplate;

impl Template<Boundaries> for GapTemplate {
    fn name(&self) -> &str {
        "gap"
    }

    fn generate_factor_scopes(&self, state: &State<Boundaries>) -> Vec<FactorScope<Gap>> {
        let chars: Vec<char> = state.instance().chars().collect();
        (1..chars.len())
            .map(|position| {
                self.scope(vec![Gap {
                    position,
                    left: chars[position - 1],
                    right: chars[position],
                    boundary: state.assignment().0.contains(&position),
                }])
            })
            .collect()
    }

    fn compute_factor(&self, scope: &FactorScope<Gap>) -> Vector {
        scope
            .variables()
            .iter()
            .map(|gap| {
                (
                    format!(
                        "boundary={}|left={}|right={}",
                        gap.boundary,
                        class(gap.left),
                        class(gap.right)
                    ),
                    1.0,
                )
            })
            .collect()
    }
}

/// One successor per gap, with that gap's boundary flipped.
pub struct ToggleBoundary;

impl Explorer<Boundaries> for ToggleBoundary {
    fn next_states(&self, state: &State<Boundaries>) -> Vec<State<Boundaries>> {
        let gaps = state.instance().chars().count();
        (1..gaps)
            .map(|position| {
                state.successor(|b| {
                    if !b.0.remove(&position) {
                        b.0.insert(position);
                    }
                })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "toggle-boundary"
    }
}

pub type BoundarySet = fn(&Boundaries) -> BTreeSet<usize>;
pub type SegmentationObjective = SetObjective<Boundaries, usize, BoundarySet>;

fn boundary_set(boundaries: &Boundaries) -> BTreeSet<usize> {
    boundaries.0.clone()
}

/// `sqrt(precision * recall)` of the predicted boundaries.
pub fn objective() -> SegmentationObjective {
    SetObjective::new(Measure::GeometricMean, boundary_set as BoundarySet)
}

pub fn unsegmented(text: &Arc<String>) -> State<Boundaries> {
    State::new(Arc::clone(text), Boundaries(BTreeSet::new()))
}

pub fn labeled(text: &str, gold: &[usize]) -> LabeledInstance<String, BTreeSet<usize>> {
    LabeledInstance::new(text.to_string(), gold.iter().copied().collect())
}

pub fn corpus() -> Vec<LabeledInstance<String, BTreeSet<usize>>> {
    vec![
        labeled("ab cd", &[2]),
        labeled("xy z", &[2]),
        labeled("foo bar", &[3]),
    ]
}

/// Sequential SGD setup small enough for the toy corpus.
pub fn config() -> Config {
    Config::from_json(
        r#"{
            "executor": { "parallel": false },
            "sampler": { "steps": 5 },
            "optimizer": { "kind": "sgd", "learning_rate": 0.1 },
            "trainer": { "epochs": 8, "shuffle": true, "seed": 7 }
        }"#,
    )
    .expect("test config parses")
}

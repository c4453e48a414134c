// src/search/sampler.rs

//! Markov chain generation.
//!
//! A chain starts from an initial state and repeats sampling steps until the
//! stopping criterion fires. Within a step every explorer runs once, in
//! registration order, and after each explorer the current state is
//! recorded, so a chain of `n` steps over `k` explorers holds `n * k`
//! states.

use log::{debug, trace};

use super::{Explorer, SamplingStrategy, SearchPolicy, StepLimit, StoppingCriterion};
use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use crate::learning::Learner;
use crate::model::Model;
use crate::objective::ObjectiveFunction;
use crate::pool::FactorPool;
use crate::state::{Assignment, State};

/// Result of one chain.
#[derive(Debug)]
pub struct Chain<A: Assignment> {
    /// Current state after every explorer call.
    pub states: Vec<State<A>>,
    /// Where the chain ended. Equal to the last recorded state unless the
    /// chain stopped before its first step.
    pub final_state: State<A>,
    pub steps: usize,
    pub accepted: usize,
    /// Learner updates; always zero outside training.
    pub updates: usize,
}

impl<A: Assignment> Clone for Chain<A> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            final_state: self.final_state.clone(),
            steps: self.steps,
            accepted: self.accepted,
            updates: self.updates,
        }
    }
}

pub struct Sampler<A: Assignment, O: ObjectiveFunction<A>> {
    objective: O,
    explorers: Vec<Box<dyn Explorer<A>>>,
    stopping: Box<dyn StoppingCriterion<A>>,
    training: SearchPolicy<A>,
    prediction: SearchPolicy<A>,
}

impl<A: Assignment, O: ObjectiveFunction<A>> Sampler<A, O> {
    /// A sampler without explorers, using [`SearchPolicy::training`] and
    /// [`SearchPolicy::prediction`].
    pub fn new(objective: O, stopping: impl StoppingCriterion<A> + 'static) -> Self {
        Self {
            objective,
            explorers: Vec::new(),
            stopping: Box::new(stopping),
            training: SearchPolicy::training(),
            prediction: SearchPolicy::prediction(),
        }
    }

    /// Stops after `config.steps` sampling steps.
    pub fn from_config(objective: O, config: &SamplerConfig) -> Self {
        Self::new(objective, StepLimit::new(config.steps))
    }

    pub fn add_explorer(&mut self, explorer: Box<dyn Explorer<A>>) {
        self.explorers.push(explorer);
    }

    pub fn with_explorer(mut self, explorer: impl Explorer<A> + 'static) -> Self {
        self.add_explorer(Box::new(explorer));
        self
    }

    pub fn with_training_policy(mut self, policy: SearchPolicy<A>) -> Self {
        self.training = policy;
        self
    }

    pub fn with_prediction_policy(mut self, policy: SearchPolicy<A>) -> Self {
        self.prediction = policy;
        self
    }

    pub fn set_stopping_criterion(&mut self, stopping: Box<dyn StoppingCriterion<A>>) {
        self.stopping = stopping;
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    pub fn explorer_count(&self) -> usize {
        self.explorers.len()
    }

    /// Runs a chain that trains `model` on the way. Both the current state
    /// and the sampled candidate are rescored whenever the learner changes
    /// the weights, before the accept decision.
    pub fn generate_training_chain(
        &mut self,
        model: &mut Model<A>,
        pool: &FactorPool<A::Key>,
        learner: &mut dyn Learner<A>,
        initial: State<A>,
        gold: &O::Gold,
    ) -> Result<Chain<A>> {
        let Self {
            objective,
            explorers,
            stopping,
            training,
            ..
        } = self;

        let mut current = initial;
        score(model, pool, &*objective, Some(gold), std::slice::from_mut(&mut current))?;

        let mut states = Vec::new();
        let (mut accepted, mut updates, mut step) = (0, 0, 0);
        while !stopping.check_condition(&states, step) {
            for explorer in explorers.iter() {
                let mut candidates = explorer.next_states(&current);
                score(model, pool, &*objective, Some(gold), &mut candidates)?;
                if let Some(mut candidate) = pick(training.sampling.as_mut(), candidates) {
                    if learner.update(model, pool, &current, &candidate)? {
                        updates += 1;
                        model.rescore(&mut current, pool)?;
                        model.rescore(&mut candidate, pool)?;
                    }
                    if training.accept.is_accepted(&candidate, &current) {
                        trace!("{}: {} -> {}", explorer.name(), current.id(), candidate.id());
                        current = candidate;
                        accepted += 1;
                    }
                }
                states.push(current.clone());
            }
            step += 1;
        }

        debug!(
            "Training chain: {step} steps, {accepted} accepted, {updates} updates, final {current}"
        );
        Ok(Chain {
            states,
            final_state: current,
            steps: step,
            accepted,
            updates,
        })
    }

    /// Runs a chain without learning. Objective scores are computed only
    /// when `gold` is given; a prediction policy that reads them fails with
    /// [`Error::GoldRequired`] otherwise.
    pub fn generate_chain(
        &mut self,
        model: &Model<A>,
        pool: &FactorPool<A::Key>,
        initial: State<A>,
        gold: Option<&O::Gold>,
    ) -> Result<Chain<A>> {
        let Self {
            objective,
            explorers,
            stopping,
            prediction,
            ..
        } = self;
        if gold.is_none() && prediction.uses_objective() {
            return Err(Error::GoldRequired);
        }

        let mut current = initial;
        score(model, pool, &*objective, gold, std::slice::from_mut(&mut current))?;

        let mut states = Vec::new();
        let (mut accepted, mut step) = (0, 0);
        while !stopping.check_condition(&states, step) {
            for explorer in explorers.iter() {
                let mut candidates = explorer.next_states(&current);
                score(model, pool, &*objective, gold, &mut candidates)?;
                if let Some(candidate) = pick(prediction.sampling.as_mut(), candidates) {
                    if prediction.accept.is_accepted(&candidate, &current) {
                        trace!("{}: {} -> {}", explorer.name(), current.id(), candidate.id());
                        current = candidate;
                        accepted += 1;
                    }
                }
                states.push(current.clone());
            }
            step += 1;
        }

        debug!("Chain: {step} steps, {accepted} accepted, final {current}");
        Ok(Chain {
            states,
            final_state: current,
            steps: step,
            accepted,
            updates: 0,
        })
    }
}

/// Model scores for all of `states`, objective scores too when `gold` is
/// present.
fn score<A, O>(
    model: &Model<A>,
    pool: &FactorPool<A::Key>,
    objective: &O,
    gold: Option<&O::Gold>,
    states: &mut [State<A>],
) -> Result<()>
where
    A: Assignment,
    O: ObjectiveFunction<A>,
{
    model.score(states, pool)?;
    if let Some(gold) = gold {
        model.executor().for_each_mut(states, |state| {
            objective.score(state, gold);
        });
    }
    Ok(())
}

fn pick<A: Assignment>(
    sampling: &mut dyn SamplingStrategy<A>,
    mut candidates: Vec<State<A>>,
) -> Option<State<A>> {
    let index = sampling.sample_candidate(&candidates)?;
    Some(candidates.swap_remove(index))
}

// src/trainer.rs

//! Epoch loop over labeled instances.
//!
//! Every instance gets its own [`FactorPool`], dropped when its chain ends,
//! so cached factors never leak between instances. A
//! [`MissingFactor`](crate::error::Error::MissingFactor)
//! aborts only the instance it happened on; it is logged and counted in the
//! epoch summary. Every other error ends training.

use std::sync::Arc;

use log::{error, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{Config, TrainerConfig, CONFIG};
use crate::error::Result;
use crate::learning::Learner;
use crate::model::Model;
use crate::objective::ObjectiveFunction;
use crate::pool::FactorPool;
use crate::search::{Initializer, Sampler};
use crate::state::{Assignment, LabeledInstance, State};

/// Outcome of one training chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceReport {
    pub epoch: usize,
    /// Position of the instance in the training slice.
    pub index: usize,
    pub objective_score: f64,
    pub model_score: f64,
    pub steps: usize,
    pub accepted: usize,
    pub updates: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpochSummary {
    /// 1-based.
    pub epoch: usize,
    /// Instances that finished their chain.
    pub instances: usize,
    /// Instances aborted by a missing factor.
    pub failed: usize,
    pub updates: usize,
    /// Mean final objective score over finished instances.
    pub mean_objective: f64,
}

/// Progress callbacks. All methods default to doing nothing.
pub trait TrainingObserver {
    fn epoch_started(&mut self, _epoch: usize) {}
    fn instance_finished(&mut self, _report: &InstanceReport) {}
    fn epoch_finished(&mut self, _summary: &EpochSummary) {}
}

#[derive(Debug)]
pub struct TrainingRun<A: Assignment> {
    pub epochs: Vec<EpochSummary>,
    /// Final state of every instance in the last epoch, by position in the
    /// training slice. `None` where that instance was aborted.
    pub final_states: Vec<Option<State<A>>>,
}

/// States predicted for labeled instances, scored against their gold.
#[derive(Debug)]
pub struct Evaluation<A: Assignment> {
    pub states: Vec<State<A>>,
    pub mean_objective: f64,
}

pub struct Trainer {
    config: TrainerConfig,
    rng: StdRng,
    observers: Vec<Box<dyn TrainingObserver>>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            observers: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.trainer.clone())
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn add_observer(&mut self, observer: Box<dyn TrainingObserver>) {
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: impl TrainingObserver + 'static) -> Self {
        self.add_observer(Box::new(observer));
        self
    }

    /// Runs `config.epochs` epochs of training chains over `instances`.
    pub fn train<A, O>(
        &mut self,
        sampler: &mut Sampler<A, O>,
        model: &mut Model<A>,
        learner: &mut dyn Learner<A>,
        initializer: &dyn Initializer<A>,
        instances: &[LabeledInstance<A::Instance, O::Gold>],
    ) -> Result<TrainingRun<A>>
    where
        A: Assignment,
        O: ObjectiveFunction<A>,
    {
        info!(
            "Training on {} instances for {} epochs",
            instances.len(),
            self.config.epochs
        );
        let mut order: Vec<usize> = (0..instances.len()).collect();
        let mut final_states: Vec<Option<State<A>>> = (0..instances.len()).map(|_| None).collect();
        let mut epochs = Vec::with_capacity(self.config.epochs);

        for epoch in 1..=self.config.epochs {
            for observer in &mut self.observers {
                observer.epoch_started(epoch);
            }
            if self.config.shuffle {
                order.shuffle(&mut self.rng);
            }

            let mut summary = EpochSummary {
                epoch,
                ..EpochSummary::default()
            };
            let mut objective_sum = 0.0;
            for &index in &order {
                let labeled = &instances[index];
                let pool = FactorPool::new();
                let initial = initializer.initial_state(labeled.instance());
                let chain = match sampler.generate_training_chain(
                    model,
                    &pool,
                    learner,
                    initial,
                    labeled.gold(),
                ) {
                    Ok(chain) => chain,
                    Err(e) if e.is_missing_factor() => {
                        error!("Epoch {epoch}, instance {index} aborted: {e}");
                        summary.failed += 1;
                        final_states[index] = None;
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                let report = InstanceReport {
                    epoch,
                    index,
                    objective_score: chain.final_state.objective_score(),
                    model_score: chain.final_state.model_score(),
                    steps: chain.steps,
                    accepted: chain.accepted,
                    updates: chain.updates,
                };
                for observer in &mut self.observers {
                    observer.instance_finished(&report);
                }
                objective_sum += report.objective_score;
                summary.instances += 1;
                summary.updates += chain.updates;
                final_states[index] = Some(chain.final_state);
            }

            if summary.instances > 0 {
                summary.mean_objective = objective_sum / summary.instances as f64;
            }
            info!(
                "Epoch {}/{}: mean objective {:.4}, {} updates, {} failed",
                epoch, self.config.epochs, summary.mean_objective, summary.updates, summary.failed
            );
            for observer in &mut self.observers {
                observer.epoch_finished(&summary);
            }
            epochs.push(summary);
        }

        Ok(TrainingRun {
            epochs,
            final_states,
        })
    }

    /// Final states of prediction chains, one per instance, in input order.
    pub fn predict<A, O>(
        &self,
        sampler: &mut Sampler<A, O>,
        model: &Model<A>,
        initializer: &dyn Initializer<A>,
        instances: &[Arc<A::Instance>],
    ) -> Result<Vec<State<A>>>
    where
        A: Assignment,
        O: ObjectiveFunction<A>,
    {
        let mut states = Vec::with_capacity(instances.len());
        for instance in instances {
            let pool = FactorPool::new();
            let chain =
                sampler.generate_chain(model, &pool, initializer.initial_state(instance), None)?;
            states.push(chain.final_state);
        }
        info!("Predicted {} instances", states.len());
        Ok(states)
    }

    /// Like [`Trainer::predict`], with objective scores against the gold.
    pub fn test<A, O>(
        &self,
        sampler: &mut Sampler<A, O>,
        model: &Model<A>,
        initializer: &dyn Initializer<A>,
        instances: &[LabeledInstance<A::Instance, O::Gold>],
    ) -> Result<Evaluation<A>>
    where
        A: Assignment,
        O: ObjectiveFunction<A>,
    {
        let mut states = Vec::with_capacity(instances.len());
        for labeled in instances {
            let pool = FactorPool::new();
            let initial = initializer.initial_state(labeled.instance());
            let chain = sampler.generate_chain(model, &pool, initial, Some(labeled.gold()))?;
            states.push(chain.final_state);
        }
        let mean_objective = if states.is_empty() {
            0.0
        } else {
            states.iter().map(State::objective_score).sum::<f64>() / states.len() as f64
        };
        info!(
            "Tested {} instances: mean objective {:.4}",
            states.len(),
            mean_objective
        );
        Ok(Evaluation {
            states,
            mean_objective,
        })
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(CONFIG.trainer.clone())
    }
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish()
    }
}

// src/model/mod.rs

//! The log-linear model: templates, their tied weights, and scoring.
//!
//! Scoring a batch of states runs, per template:
//!
//! ```text
//! generate scopes ─▶ union over states ─▶ minus cached ─▶ compute new ─▶ insert
//!   (per state)                              (pool)        (executor)     (pool)
//! ```
//!
//! and finally sets every state's model score to
//! `exp(Σ_templates Σ_factors features · weights)`. Each stage is a bulk
//! operation on the model's [`Executor`] and completes before the next one
//! starts, so every scope a state registered is resident in the pool by the
//! time its score is summed.

mod persistence;

pub use persistence::{parse_weights, weights_file_name, write_weights, WEIGHTS_FILE_SUFFIX};

use std::fmt;

use log::trace;

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::factor::Factor;
use crate::pool::FactorPool;
use crate::state::{Assignment, State};
use crate::template::Template;
use crate::vector::Vector;

struct TemplateEntry<A: Assignment> {
    template: Box<dyn Template<A>>,
    weights: Vector,
}

pub struct Model<A: Assignment> {
    templates: Vec<TemplateEntry<A>>,
    executor: Executor,
}

impl<A: Assignment> Model<A> {
    pub fn new(executor: Executor) -> Self {
        Self {
            templates: Vec::new(),
            executor,
        }
    }

    /// Registers a template with empty weights.
    pub fn add_template(&mut self, template: Box<dyn Template<A>>) -> Result<()> {
        let name = template.name();
        persistence::validate_template_name(name)?;
        if self.position(name).is_some() {
            return Err(Error::DuplicateTemplate(name.to_string()));
        }
        self.templates.push(TemplateEntry {
            template,
            weights: Vector::new(),
        });
        Ok(())
    }

    /// Builder form of [`Model::add_template`].
    pub fn with_template(mut self, template: impl Template<A> + 'static) -> Result<Self> {
        self.add_template(Box::new(template))?;
        Ok(self)
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn set_executor(&mut self, executor: Executor) {
        self.executor = executor;
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in registration order.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|e| e.template.name())
    }

    pub fn weights(&self, template: &str) -> Option<&Vector> {
        self.entry(template).map(|e| &e.weights)
    }

    pub fn set_weights(&mut self, template: &str, weights: Vector) -> Result<()> {
        let index = self
            .position(template)
            .ok_or_else(|| Error::UnknownTemplate(template.to_string()))?;
        self.templates[index].weights = weights;
        Ok(())
    }

    /// Scores every state in `states`, computing only factors the pool does
    /// not hold yet.
    pub fn score(&self, states: &mut [State<A>], pool: &FactorPool<A::Key>) -> Result<()> {
        if states.is_empty() {
            return Ok(());
        }
        for entry in &self.templates {
            let template = entry.template.as_ref();

            self.executor.for_each_mut(states, |state| {
                let scopes = template.generate_factor_scopes(state);
                state.factor_graph_mut().set_scopes(template.name(), scopes);
            });

            let missing = pool.missing(
                states
                    .iter()
                    .flat_map(|s| s.factor_graph().scopes_for(template.name())),
            );
            let computed = self.executor.map(&missing, |scope| {
                Factor::new(scope.clone(), template.compute_factor(scope))
            });
            let added = pool.insert_all(computed);
            trace!(
                "template {}: {} states, {} new factors, pool size {}",
                template.name(),
                states.len(),
                added,
                pool.len()
            );
        }

        self.executor.try_for_each_mut(states, |state| {
            let score = self.linear_score(state, pool)?;
            state.set_linear_score(score);
            Ok(())
        })
    }

    /// Scores a single state.
    pub fn score_state(&self, state: &mut State<A>, pool: &FactorPool<A::Key>) -> Result<f64> {
        self.score(std::slice::from_mut(state), pool)?;
        Ok(state.model_score())
    }

    /// Recomputes the model score from the scopes the state already
    /// registered. Used after a weight update, when factors are unchanged.
    pub fn rescore(&self, state: &mut State<A>, pool: &FactorPool<A::Key>) -> Result<f64> {
        let score = self.linear_score(state, pool)?;
        state.set_linear_score(score);
        Ok(state.model_score())
    }

    /// Sum of the feature vectors of `template`'s factors for `state`.
    pub fn features(
        &self,
        state: &State<A>,
        template: &str,
        pool: &FactorPool<A::Key>,
    ) -> Result<Vector> {
        if self.position(template).is_none() {
            return Err(Error::UnknownTemplate(template.to_string()));
        }
        let mut sum = Vector::new();
        for factor in state.factor_graph().factors(template, pool)? {
            sum += factor.features();
        }
        Ok(sum)
    }

    /// Summed factor scores of one state.
    fn linear_score(&self, state: &State<A>, pool: &FactorPool<A::Key>) -> Result<f64> {
        let mut score = 0.0;
        for entry in &self.templates {
            for factor in state.factor_graph().factors(entry.template.name(), pool)? {
                score += factor.score(&entry.weights);
            }
        }
        Ok(score)
    }

    fn position(&self, template: &str) -> Option<usize> {
        self.templates
            .iter()
            .position(|e| e.template.name() == template)
    }

    fn entry(&self, template: &str) -> Option<&TemplateEntry<A>> {
        self.position(template).map(|i| &self.templates[i])
    }
}

impl<A: Assignment> fmt::Debug for Model<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in &self.templates {
            map.entry(&entry.template.name(), &entry.weights.len());
        }
        map.finish()
    }
}

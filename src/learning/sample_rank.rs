// src/learning/sample_rank.rs

//! SampleRank: margin ranking updates between neighboring states.
//!
//! Given two states with different objective scores, let `pos` be the
//! preferred one and `neg` the other. With per-template feature differences
//! `Δ_t = f_t(neg) - f_t(pos)`, the pair is misranked when
//!
//! ```text
//! Σ_t Δ_t · w_t  -  Σ_t penalty(w_t)  +  margin  ≥  0
//! ```
//!
//! and every template's weights then take one optimizer step along
//! `regularize(Δ_t, w_t) * sample_weight`. Descending that gradient raises the
//! score of `pos` relative to `neg`. Pairs with equal objective scores carry
//! no ranking signal and are skipped.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::{debug, trace};

use super::optimizer::Optimizer;
use super::regularizer::Regularizer;
use super::Learner;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::pool::FactorPool;
use crate::state::{Assignment, State};
use crate::vector::Vector;

#[derive(Debug)]
pub struct SampleRankLearner {
    /// Prototype every per-template optimizer is cloned from.
    optimizer: Box<dyn Optimizer>,
    per_template: HashMap<String, Box<dyn Optimizer>>,
    regularizer: Option<Box<dyn Regularizer>>,
    margin: f64,
    sample_weight: f64,
    updates: usize,
}

impl SampleRankLearner {
    pub fn new(optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            optimizer,
            per_template: HashMap::new(),
            regularizer: None,
            margin: 1.0,
            sample_weight: 1.0,
            updates: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut learner = Self::new(config.optimizer.build())
            .with_margin(config.learner.margin)
            .with_sample_weight(config.learner.sample_weight);
        learner.regularizer = config.regularizer.as_ref().map(|r| r.build());
        learner
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_sample_weight(mut self, sample_weight: f64) -> Self {
        self.sample_weight = sample_weight;
        self
    }

    pub fn with_regularizer(mut self, regularizer: Box<dyn Regularizer>) -> Self {
        self.regularizer = Some(regularizer);
        self
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Number of pairs that changed the weights so far.
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl<A: Assignment> Learner<A> for SampleRankLearner {
    fn update(
        &mut self,
        model: &mut Model<A>,
        pool: &FactorPool<A::Key>,
        current: &State<A>,
        candidate: &State<A>,
    ) -> Result<bool> {
        let (pos, neg) = match current
            .objective_score()
            .partial_cmp(&candidate.objective_score())
        {
            Some(Ordering::Greater) => (current, candidate),
            Some(Ordering::Less) => (candidate, current),
            _ => return Ok(false),
        };

        let names: Vec<String> = model.template_names().map(str::to_string).collect();
        let mut differences = Vec::with_capacity(names.len());
        let mut linear_score = 0.0;
        for name in &names {
            let weights = model
                .weights(name)
                .ok_or_else(|| Error::UnknownTemplate(name.clone()))?;
            let difference = model
                .features(neg, name, pool)?
                .sub(&model.features(pos, name, pool)?);
            linear_score += difference.dot(weights);
            if let Some(regularizer) = &self.regularizer {
                linear_score -= regularizer.penalize(weights);
            }
            differences.push(difference);
        }

        if linear_score + self.margin < 0.0 {
            trace!(
                "{} ranked above {} by {:.4}, no update",
                pos.id(),
                neg.id(),
                -linear_score
            );
            return Ok(false);
        }

        let prototype = &self.optimizer;
        for (name, difference) in names.iter().zip(differences) {
            let weights = model
                .weights(name)
                .ok_or_else(|| Error::UnknownTemplate(name.clone()))?;
            let mut gradient = match &self.regularizer {
                Some(regularizer) => regularizer.regularize(&difference, weights),
                None => difference,
            };
            if self.sample_weight != 1.0 {
                gradient = gradient.scale(self.sample_weight);
            }
            if gradient.is_empty() {
                continue;
            }
            let optimizer = self
                .per_template
                .entry(name.clone())
                .or_insert_with(|| prototype.fresh());
            let updated: Vector = optimizer.get_updates(weights, &gradient);
            model.set_weights(name, updated)?;
        }

        self.updates += 1;
        debug!(
            "update {}: {} (objective {:.4}) over {} (objective {:.4}), linear {:.4}",
            self.updates,
            pos.id(),
            pos.objective_score(),
            neg.id(),
            neg.objective_score(),
            linear_score
        );
        Ok(true)
    }
}

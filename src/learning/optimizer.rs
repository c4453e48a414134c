// src/learning/optimizer.rs

//! Weight update rules.
//!
//! An [`Optimizer`] turns `(weights, gradient)` into new weights, descending
//! along the gradient. It owns whatever running state it needs (velocity,
//! moment estimates, step counters). The learner keeps one instance per
//! template, created with [`Optimizer::fresh`], so state is never shared
//! between the weight vectors of different templates.

use std::collections::BTreeSet;
use std::fmt;

use crate::vector::Vector;

pub trait Optimizer: Send + fmt::Debug {
    /// New weights after one step along `gradient`.
    fn get_updates(&mut self, weights: &Vector, gradient: &Vector) -> Vector;

    /// Same hyperparameters, no accumulated state.
    fn fresh(&self) -> Box<dyn Optimizer>;
}

/// Stochastic gradient descent with optional momentum, Nesterov momentum,
/// and time-based learning-rate decay `lr / (1 + decay * iterations)`.
#[derive(Debug, Clone)]
pub struct Sgd {
    learning_rate: f64,
    momentum: f64,
    decay: f64,
    nesterov: bool,
    iterations: u64,
    velocity: Vector,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Self::with_momentum(learning_rate, 0.0, 0.0, false)
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64, decay: f64, nesterov: bool) -> Self {
        Self {
            learning_rate,
            momentum,
            decay,
            nesterov,
            iterations: 0,
            velocity: Vector::new(),
        }
    }

    /// Learning rate the next step will use.
    pub fn current_learning_rate(&self) -> f64 {
        self.learning_rate / (1.0 + self.decay * self.iterations as f64)
    }
}

impl Optimizer for Sgd {
    fn get_updates(&mut self, weights: &Vector, gradient: &Vector) -> Vector {
        let lr = self.current_learning_rate();
        self.iterations += 1;
        let mut updated = weights.clone();

        if self.momentum == 0.0 {
            for (feature, g) in gradient {
                updated.add_to_value(feature, -lr * g);
            }
            return updated;
        }

        // Velocity decays on every feature that has one, not only on the
        // features present in this gradient.
        let features: BTreeSet<String> = self
            .velocity
            .feature_names()
            .chain(gradient.feature_names())
            .map(str::to_string)
            .collect();
        for feature in features {
            let g = gradient.get(&feature);
            let v = self.momentum * self.velocity.get(&feature) - lr * g;
            let step = if self.nesterov {
                self.momentum * v - lr * g
            } else {
                v
            };
            self.velocity.set(feature.as_str(), v);
            updated.add_to_value(feature, step);
        }
        updated
    }

    fn fresh(&self) -> Box<dyn Optimizer> {
        Box::new(Self::with_momentum(
            self.learning_rate,
            self.momentum,
            self.decay,
            self.nesterov,
        ))
    }
}

/// Adam with sparse ("lazy") moment updates: only features present in the
/// gradient move.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: Vector,
    v: Vector,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self::with_params(learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn with_params(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: Vector::new(),
            v: Vector::new(),
        }
    }
}

impl Optimizer for Adam {
    fn get_updates(&mut self, weights: &Vector, gradient: &Vector) -> Vector {
        self.t = self.t.saturating_add(1);
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(self.t)).sqrt()
            / (1.0 - self.beta1.powi(self.t));

        let mut updated = weights.clone();
        for (feature, g) in gradient {
            let m = self.beta1 * self.m.get(feature) + (1.0 - self.beta1) * g;
            let v = self.beta2 * self.v.get(feature) + (1.0 - self.beta2) * g * g;
            self.m.set(feature, m);
            self.v.set(feature, v);
            updated.add_to_value(feature, -lr_t * m / (v.sqrt() + self.epsilon));
        }
        updated
    }

    fn fresh(&self) -> Box<dyn Optimizer> {
        Box::new(Self::with_params(
            self.learning_rate,
            self.beta1,
            self.beta2,
            self.epsilon,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(&str, f64)]) -> Vector {
        entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test_log::test]
    fn plain_sgd_steps_against_gradient() {
        let mut sgd = Sgd::new(0.5);
        let weights = vector(&[("a", 1.0), ("b", 2.0)]);
        let updated = sgd.get_updates(&weights, &vector(&[("a", 2.0), ("c", -1.0)]));
        assert_eq!(updated, vector(&[("b", 2.0), ("c", 0.5)]));
    }

    #[test_log::test]
    fn sgd_decay_shrinks_learning_rate() {
        let mut sgd = Sgd::with_momentum(1.0, 0.0, 1.0, false);
        let g = vector(&[("a", 1.0)]);
        let w1 = sgd.get_updates(&Vector::new(), &g);
        let w2 = sgd.get_updates(&w1, &g);
        assert_eq!(w1.get("a"), -1.0);
        assert_eq!(w2.get("a"), -1.5);
        assert_eq!(sgd.current_learning_rate(), 1.0 / 3.0);
    }

    #[test_log::test]
    fn momentum_keeps_moving_without_gradient() {
        let mut sgd = Sgd::with_momentum(0.1, 0.5, 0.0, false);
        let w1 = sgd.get_updates(&Vector::new(), &vector(&[("a", 1.0)]));
        let w2 = sgd.get_updates(&w1, &Vector::new());
        assert!((w1.get("a") + 0.1).abs() < 1e-12);
        assert!((w2.get("a") + 0.15).abs() < 1e-12);
    }

    #[test_log::test]
    fn adam_first_step_has_learning_rate_magnitude() {
        let mut adam = Adam::new(0.01);
        let updated = adam.get_updates(
            &vector(&[("keep", 3.0)]),
            &vector(&[("up", -4.0), ("down", 0.002)]),
        );
        assert!((updated.get("up") - 0.01).abs() < 1e-6);
        assert!((updated.get("down") + 0.01).abs() < 1e-4);
        assert_eq!(updated.get("keep"), 3.0, "lazy updates leave other features alone");
    }

    #[test_log::test]
    fn fresh_copies_drop_state() {
        let mut adam = Adam::new(0.01);
        let g = vector(&[("a", 1.0)]);
        let first = adam.get_updates(&Vector::new(), &g);
        adam.get_updates(&first, &g);

        let mut fresh = adam.fresh();
        assert_eq!(fresh.get_updates(&Vector::new(), &g), first);
    }
}

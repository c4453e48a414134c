// src/learning/regularizer.rs

//! Weight penalties.
//!
//! `penalize` is the scalar cost of the current weights; `regularize` adds the
//! penalty's gradient to a loss gradient. Only features present in either the
//! gradient or the weights are touched, so updates stay sparse.

use std::fmt;

use crate::vector::Vector;

pub trait Regularizer: Send + Sync + fmt::Debug {
    fn penalize(&self, weights: &Vector) -> f64;
    fn regularize(&self, gradient: &Vector, weights: &Vector) -> Vector;
}

/// `λ Σ |w|`, gradient `λ · sign(w)`.
#[derive(Debug, Clone, Copy)]
pub struct L1 {
    lambda: f64,
}

impl L1 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Regularizer for L1 {
    fn penalize(&self, weights: &Vector) -> f64 {
        self.lambda * weights.iter().map(|(_, w)| w.abs()).sum::<f64>()
    }

    fn regularize(&self, gradient: &Vector, weights: &Vector) -> Vector {
        let mut regularized = gradient.clone();
        for (feature, w) in weights {
            if w != 0.0 {
                regularized.add_to_value(feature, self.lambda * w.signum());
            }
        }
        regularized
    }
}

/// `λ Σ w²`, gradient `2λ · w`.
#[derive(Debug, Clone, Copy)]
pub struct L2 {
    lambda: f64,
}

impl L2 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Regularizer for L2 {
    fn penalize(&self, weights: &Vector) -> f64 {
        self.lambda * weights.dot(weights)
    }

    fn regularize(&self, gradient: &Vector, weights: &Vector) -> Vector {
        gradient + &weights.scale(2.0 * self.lambda)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(&str, f64)]) -> Vector {
        entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test_log::test]
    fn l1_penalty_and_gradient() {
        let l1 = L1::new(0.5);
        let weights = vector(&[("a", 2.0), ("b", -4.0)]);
        assert_eq!(l1.penalize(&weights), 3.0);
        let gradient = l1.regularize(&vector(&[("a", 1.0), ("c", 1.0)]), &weights);
        assert_eq!(gradient, vector(&[("a", 1.5), ("b", -0.5), ("c", 1.0)]));
    }

    #[test_log::test]
    fn l2_penalty_and_gradient() {
        let l2 = L2::new(0.25);
        let weights = vector(&[("a", 2.0), ("b", -2.0)]);
        assert_eq!(l2.penalize(&weights), 2.0);
        let gradient = l2.regularize(&vector(&[("a", 1.0)]), &weights);
        assert_eq!(gradient, vector(&[("a", 2.0), ("b", -1.0)]));
    }
}

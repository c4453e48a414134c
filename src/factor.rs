// src/factor.rs

//! Factor scopes and computed factors.
//!
//! A [`FactorScope`] names a piece of feature computation: which template,
//! over which concrete variable values. It is the cache key of the
//! [`FactorPool`](crate::pool::FactorPool), so its equality and hash are
//! purely structural. Two states that agree on the variables a template
//! looks at produce equal scopes and share one [`Factor`].

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::vector::Vector;

/// Bound for the variable values a scope is built from.
pub trait ScopeKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> ScopeKey for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Structural identity of one factor: template name plus the ordered values
/// the template's features depend on.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FactorScope<K> {
    template: Arc<str>,
    variables: Vec<K>,
}

impl<K: ScopeKey> FactorScope<K> {
    pub fn new(template: impl Into<Arc<str>>, variables: Vec<K>) -> Self {
        Self {
            template: template.into(),
            variables,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn variables(&self) -> &[K] {
        &self.variables
    }
}

impl<K: fmt::Debug> fmt::Debug for FactorScope<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.template, self.variables)
    }
}

/// Feature vector computed for one scope. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor<K> {
    scope: FactorScope<K>,
    features: Vector,
}

impl<K: ScopeKey> Factor<K> {
    pub fn new(scope: FactorScope<K>, features: Vector) -> Self {
        Self { scope, features }
    }

    pub fn scope(&self) -> &FactorScope<K> {
        &self.scope
    }

    pub fn features(&self) -> &Vector {
        &self.features
    }

    /// Log-linear contribution of this factor under `weights`.
    #[inline]
    pub fn score(&self, weights: &Vector) -> f64 {
        self.features.dot(weights)
    }
}

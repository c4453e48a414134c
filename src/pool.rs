// src/pool.rs

//! The shared factor cache.
//!
//! One [`FactorPool`] is shared by every state of a chain, every template,
//! and every worker thread while one instance is processed. Writers only
//! insert; an existing entry is never replaced. That is safe under races
//! because factor computation is pure: two threads that compute the same
//! scope produce equal factors. Readers never wait for a producer. A lookup
//! miss means scopes were scored before they were computed and is reported
//! as [`Error::MissingFactor`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::trace;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::factor::{Factor, FactorScope, ScopeKey};

pub struct FactorPool<K> {
    factors: RwLock<HashMap<FactorScope<K>, Arc<Factor<K>>>>,
}

impl<K: ScopeKey> Default for FactorPool<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ScopeKey> FactorPool<K> {
    pub fn new() -> Self {
        Self {
            factors: RwLock::new(HashMap::new()),
        }
    }

    pub fn contains(&self, scope: &FactorScope<K>) -> bool {
        self.factors.read().contains_key(scope)
    }

    /// The cached factor for `scope`.
    pub fn get(&self, scope: &FactorScope<K>) -> Result<Arc<Factor<K>>> {
        self.factors
            .read()
            .get(scope)
            .cloned()
            .ok_or_else(|| Error::MissingFactor(format!("{scope:?}")))
    }

    /// Cached factors for every scope, in order. Fails on the first miss.
    pub fn get_all<'a, I>(&self, scopes: I) -> Result<Vec<Arc<Factor<K>>>>
    where
        I: IntoIterator<Item = &'a FactorScope<K>>,
    {
        let factors = self.factors.read();
        scopes
            .into_iter()
            .map(|scope| {
                factors
                    .get(scope)
                    .cloned()
                    .ok_or_else(|| Error::MissingFactor(format!("{scope:?}")))
            })
            .collect()
    }

    /// Distinct scopes from `scopes` that are not cached yet, in first-seen
    /// order.
    pub fn missing<'a, I>(&self, scopes: I) -> Vec<FactorScope<K>>
    where
        I: IntoIterator<Item = &'a FactorScope<K>>,
    {
        let factors = self.factors.read();
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for scope in scopes {
            if !factors.contains_key(scope) && seen.insert(scope) {
                missing.push(scope.clone());
            }
        }
        missing
    }

    /// Inserts `factor` unless its scope is already cached. Returns whether
    /// the factor was new.
    pub fn insert(&self, factor: Factor<K>) -> bool {
        let mut factors = self.factors.write();
        if factors.contains_key(factor.scope()) {
            return false;
        }
        factors.insert(factor.scope().clone(), Arc::new(factor));
        true
    }

    /// Inserts a batch of freshly computed factors under one write lock.
    /// Returns how many were new.
    pub fn insert_all(&self, batch: impl IntoIterator<Item = Factor<K>>) -> usize {
        let mut factors = self.factors.write();
        let mut added = 0;
        for factor in batch {
            if !factors.contains_key(factor.scope()) {
                factors.insert(factor.scope().clone(), Arc::new(factor));
                added += 1;
            }
        }
        trace!("factor pool: +{} (size {})", added, factors.len());
        added
    }

    pub fn len(&self) -> usize {
        self.factors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.read().is_empty()
    }

    /// Drops every cached factor. Must not be called while a chain that
    /// relies on the cached scopes is still scoring.
    pub fn clear(&self) {
        self.factors.write().clear();
    }
}

// src/graph.rs

//! Per-state factor graphs.
//!
//! A [`FactorGraph`] records which scopes each template registered for one
//! state. It owns no factors; [`FactorGraph::factors`] resolves the scopes
//! against a [`FactorPool`] on demand.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::factor::{Factor, FactorScope, ScopeKey};
use crate::pool::FactorPool;

#[derive(Debug, Clone)]
pub struct FactorGraph<K> {
    scopes: BTreeMap<String, Vec<FactorScope<K>>>,
}

impl<K> Default for FactorGraph<K> {
    fn default() -> Self {
        Self {
            scopes: BTreeMap::new(),
        }
    }
}

impl<K: ScopeKey> FactorGraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the scopes registered for `template`.
    pub fn set_scopes(&mut self, template: &str, scopes: Vec<FactorScope<K>>) {
        debug_assert!(
            scopes.iter().all(|s| s.template() == template),
            "template {template} registered a scope of another template"
        );
        self.scopes.insert(template.to_string(), scopes);
    }

    /// Scopes registered for `template`; empty when it registered none.
    pub fn scopes_for(&self, template: &str) -> &[FactorScope<K>] {
        self.scopes.get(template).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every registered scope, grouped by template name.
    pub fn scopes(&self) -> impl Iterator<Item = &FactorScope<K>> {
        self.scopes.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.scopes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    /// Factors of `template` resolved from `pool`.
    pub fn factors(&self, template: &str, pool: &FactorPool<K>) -> Result<Vec<Arc<Factor<K>>>> {
        pool.get_all(self.scopes_for(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector;

    #[test_log::test]
    fn resolves_registered_scopes_through_pool() {
        let mut graph = FactorGraph::new();
        let scopes = vec![FactorScope::new("a", vec![1u8]), FactorScope::new("a", vec![2u8])];
        graph.set_scopes("a", scopes.clone());
        graph.set_scopes("b", vec![FactorScope::new("b", vec![1u8])]);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.scopes_for("a"), scopes.as_slice());
        assert!(graph.scopes_for("unknown").is_empty());

        let pool = FactorPool::new();
        pool.insert(Factor::new(scopes[0].clone(), Vector::new()));
        assert!(graph.factors("a", &pool).unwrap_err().is_missing_factor());

        pool.insert(Factor::new(scopes[1].clone(), Vector::new()));
        assert_eq!(graph.factors("a", &pool).unwrap().len(), 2);

        graph.clear();
        assert!(graph.is_empty());
    }
}

// src/template.rs

//! Factor templates.
//!
//! A [`Template`] is the feature-generation half of a factor family. It
//! enumerates the scopes it wants for a state, and it computes the feature
//! vector of one scope. The weights live next to the template in the
//! [`Model`](crate::model::Model) and are shared by every factor the
//! template produces.
//!
//! Both methods must be deterministic. `compute_factor` in particular must
//! depend on nothing but the scope: its result is cached under the scope
//! and reused by every state, chain step and thread that asks for it.

use crate::factor::FactorScope;
use crate::state::{Assignment, State};
use crate::vector::Vector;

pub trait Template<A: Assignment>: Send + Sync {
    /// Unique name within a model. Used in scopes and as the weight file
    /// stem, so it must not contain path separators, tabs or newlines.
    fn name(&self) -> &str;

    /// Scopes this template contributes for the state's current variables.
    fn generate_factor_scopes(&self, state: &State<A>) -> Vec<FactorScope<A::Key>>;

    /// Features of the factor identified by `scope`.
    fn compute_factor(&self, scope: &FactorScope<A::Key>) -> Vector;

    /// Convenience for implementors: a scope tagged with this template.
    fn scope(&self, variables: Vec<A::Key>) -> FactorScope<A::Key> {
        FactorScope::new(self.name(), variables)
    }
}

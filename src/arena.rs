// src/arena.rs

//! Index-addressed storage for entity-style variables.
//!
//! Structured assignments often hold variables that refer to each other (a
//! relation pointing at two entity mentions). Storing them in a
//! [`VariableArena`] and referring by [`VarId`] keeps those references valid
//! across [`State::successor`](crate::state::State::successor): cloning the
//! arena copies every slot at the same index, so no id remapping is needed.
//! Ids are never reused after removal, so a stale reference resolves to
//! `None` instead of a different variable.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VariableArena<T> {
    slots: Vec<Option<T>>,
    live: usize,
}

impl<T> Default for VariableArena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }
}

impl<T> VariableArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> VarId {
        self.slots.push(Some(value));
        self.live += 1;
        VarId(self.slots.len() - 1)
    }

    pub fn remove(&mut self, id: VarId) -> Option<T> {
        let removed = self.slots.get_mut(id.0)?.take();
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn get(&self, id: VarId) -> Option<&T> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: VarId) -> Option<&mut T> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn contains(&self, id: VarId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live variables in id order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (VarId(i), v)))
    }

    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        self.iter().map(|(id, _)| id)
    }
}

impl<T: fmt::Debug> fmt::Debug for VariableArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Var {
        Mention(&'static str),
        Relation { head: VarId, tail: VarId },
    }

    #[test_log::test]
    fn references_survive_clone_and_edit() {
        let mut arena = VariableArena::new();
        let a = arena.insert(Var::Mention("aspirin"));
        let b = arena.insert(Var::Mention("headache"));
        let rel = arena.insert(Var::Relation { head: a, tail: b });

        let mut edited = arena.clone();
        *edited.get_mut(a).unwrap() = Var::Mention("ibuprofen");

        let Some(Var::Relation { head, tail }) = edited.get(rel).cloned() else {
            panic!("relation lost in clone");
        };
        assert_eq!(edited.get(head), Some(&Var::Mention("ibuprofen")));
        assert_eq!(edited.get(tail), Some(&Var::Mention("headache")));
        assert_eq!(arena.get(a), Some(&Var::Mention("aspirin")));
    }

    #[test_log::test]
    fn removed_ids_are_not_reused() {
        let mut arena = VariableArena::new();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        let b = arena.insert(2);
        assert_ne!(a, b);
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![b]);
    }
}

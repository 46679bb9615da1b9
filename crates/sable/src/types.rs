//! Collection aliases and the item worklist.
//!
//! Every map and set in the builder iterates in insertion order, so two
//! builds of the same grammar number their states and cells identically.

use std::{collections::VecDeque, hash::Hash};

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;

/// FIFO worklist of items to expand.
///
/// A value already waiting is not queued twice. Once popped it may be
/// pushed again; callers keep their own record of what was expanded.
#[derive(Debug)]
pub struct Queue<T> {
    waiting: VecDeque<T>,
    queued: Set<T>,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self {
            waiting: VecDeque::new(),
            queued: Set::default(),
        }
    }
}

impl<T: Clone + Eq + Hash> Queue<T> {
    pub fn push(&mut self, value: T) {
        if !self.queued.contains(&value) {
            self.queued.insert(value.clone());
            self.waiting.push_back(value);
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.waiting.pop_front().map(|value| {
            self.queued.swap_remove(&value);
            value
        })
    }
}

impl<T: Clone + Eq + Hash> FromIterator<T> for Queue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = Self::default();
        iter.into_iter().for_each(|value| queue.push(value));
        queue
    }
}

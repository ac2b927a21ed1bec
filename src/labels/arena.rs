//! Slot storage for videos, skeletons and tracks.
//!
//! Slots are never reused or compacted, so ids stay valid for the lifetime
//! of the container. A slot can be retired (video removal) and revived
//! later; retired slots are invisible to iteration and lookup.

use std::marker::PhantomData;

use crate::model::id::ArenaId;

#[derive(Debug, Clone)]
pub struct Arena<I, T> {
    entries: Vec<T>,
    live: Vec<bool>,
    _id: PhantomData<I>,
}

impl<I, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            live: Vec::new(),
            _id: PhantomData,
        }
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: T) -> I {
        self.entries.push(value);
        self.live.push(true);
        I::from_index(self.entries.len() - 1)
    }

    /// Live entry
    pub fn get(&self, id: I) -> Option<&T> {
        if self.is_live(id) {
            self.entries.get(id.index())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        if self.is_live(id) {
            self.entries.get_mut(id.index())
        } else {
            None
        }
    }

    /// Entry whether live or retired
    pub fn slot(&self, id: I) -> Option<&T> {
        self.entries.get(id.index())
    }

    pub fn has_slot(&self, id: I) -> bool {
        id.index() < self.entries.len()
    }

    pub fn is_live(&self, id: I) -> bool {
        self.live.get(id.index()).copied().unwrap_or(false)
    }

    pub fn retire(&mut self, id: I) -> bool {
        match self.live.get_mut(id.index()) {
            Some(live) if *live => {
                *live = false;
                true
            }
            _ => false,
        }
    }

    pub fn revive(&mut self, id: I) {
        if let Some(live) = self.live.get_mut(id.index()) {
            *live = true;
        }
    }

    /// First slot (live or retired) satisfying `pred`
    pub fn find_slot(&self, mut pred: impl FnMut(&T) -> bool) -> Option<I> {
        self.entries.iter().position(|e| pred(e)).map(I::from_index)
    }

    /// First live entry satisfying `pred`
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<I> {
        self.iter().find(|(_, e)| pred(e)).map(|(id, _)| id)
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, _)| self.live[*i])
            .map(|(i, e)| (I::from_index(i), e))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#![forbid(unsafe_code)]

//! Shared z-order allocation for concurrently open sheets.
//!
//! Each engine receives a [`StackingContext`] at construction; sheets that
//! should layer relative to each other share clones of the same context.
//! A newly opened sheet always lands above every sheet still holding an
//! index, and an index is never handed out twice while held.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Relative z-order slot held by an open sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackIndex(u32);

impl StackIndex {
    /// Raw index (1 for the first sheet in an empty context).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Clonable handle to a set of held stack indices.
#[derive(Debug, Clone, Default)]
pub struct StackingContext {
    held: Rc<RefCell<BTreeSet<u32>>>,
}

impl StackingContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot one above the highest held index.
    pub fn acquire(&self) -> StackIndex {
        let mut held = self.held.borrow_mut();
        let next = held.last().map_or(1, |top| top.saturating_add(1));
        held.insert(next);
        StackIndex(next)
    }

    /// Free a slot. Returns `false` if it was not held.
    pub fn release(&self, index: StackIndex) -> bool {
        self.held.borrow_mut().remove(&index.0)
    }

    /// Number of held slots.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.held.borrow().len()
    }

    /// Highest held slot.
    #[must_use]
    pub fn top(&self) -> Option<StackIndex> {
        self.held.borrow().last().copied().map(StackIndex)
    }

    /// Whether `index` is currently held.
    #[must_use]
    pub fn is_held(&self, index: StackIndex) -> bool {
        self.held.borrow().contains(&index.0)
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit read tracking for paint and layer-parameter work.
//!
//! State that drawing or layer configuration depends on lives in
//! [`StateCell`]s. Reads go through a [`ReadScope`] (the draw scope or the
//! layer scope), which records a dependency edge from the *subject* running
//! the scope to the cell. Writes never call back into the tree; they only
//! queue the cell on a shared change list. A later
//! [`LayoutTree::apply_state_changes`](crate::tree::LayoutTree::apply_state_changes)
//! drains that list through a [`DirtyTracker`] and re-runs the narrowest work
//! for every affected subject.
//!
//! # Channels
//!
//! - [`PAINT`]: edges recorded while a layer (or the root) paints. Changes
//!   invalidate that layer's content.
//! - [`PARAMS`]: edges recorded while a layer config runs. Changes recompute
//!   the layer parameters only.
//!
//! Cells are keyed with the high bit set so they never collide with subject
//! keys (wrapper slot indices and the root subject).

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use understory_dirty::{Channel, CycleHandling, DirtyTracker, EagerPolicy};

/// Reads made while painting.
pub const PAINT: Channel = Channel::new(0);

/// Reads made while computing layer parameters.
pub const PARAMS: Channel = Channel::new(1);

const CELL_BIT: u32 = 1 << 31;

/// Subject key for paint reads made outside any layer.
pub(crate) const ROOT_SUBJECT: u32 = CELL_BIT - 1;

/// Which kind of work a scope is observing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Painting layer content.
    Paint,
    /// Running a layer config.
    Params,
}

impl ScopeKind {
    const fn channel(self) -> Channel {
        match self {
            Self::Paint => PAINT,
            Self::Params => PARAMS,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Paint => 0,
            Self::Params => 1,
        }
    }
}

/// Identity of a [`StateCell`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u32);

impl CellId {
    const fn key(self) -> u32 {
        CELL_BIT | self.0
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.0)
    }
}

#[derive(Debug, Default)]
struct ChangeList {
    next_id: Cell<u32>,
    changed: RefCell<Vec<u32>>,
}

/// An observable value.
///
/// Cloning a `StateCell` shares the value. Writes only enqueue a change;
/// nothing re-runs until the tree applies pending changes.
pub struct StateCell<T> {
    inner: Rc<CellInner<T>>,
}

struct CellInner<T> {
    id: CellId,
    value: RefCell<T>,
    changes: Rc<ChangeList>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value.borrow())
            .finish()
    }
}

impl<T> StateCell<T> {
    /// Returns the identity used for dependency tracking.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    /// Returns a copy of the value without recording a read.
    #[must_use]
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Calls `f` with the value without recording a read.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replaces the value and queues a change.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.changed();
    }

    /// Mutates the value in place and queues a change.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.changed();
    }

    fn changed(&self) {
        self.inner.changes.changed.borrow_mut().push(self.inner.id.0);
    }
}

/// A context through which tracked reads are made.
pub trait ReadScope {
    /// Records a dependency on `cell` for the running subject.
    fn track(&mut self, cell: CellId);

    /// Returns a copy of the cell value and records the read.
    fn read<T: Clone>(&mut self, cell: &StateCell<T>) -> T
    where
        Self: Sized,
    {
        self.track(cell.id());
        cell.get_untracked()
    }

    /// Calls `f` with the cell value and records the read.
    fn read_with<T, R>(&mut self, cell: &StateCell<T>, f: impl FnOnce(&T) -> R) -> R
    where
        Self: Sized,
    {
        self.track(cell.id());
        cell.with_untracked(f)
    }
}

/// Subjects whose observed state changed, split by channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Invalidated {
    pub(crate) params: Vec<u32>,
    pub(crate) paint: Vec<u32>,
}

#[derive(Debug)]
struct Frame {
    subject: u32,
    kind: ScopeKind,
    reads: BTreeSet<u32>,
}

/// Dependency bookkeeping between subjects and state cells.
pub struct Observer {
    dirty: DirtyTracker<u32>,
    reads: [BTreeMap<u32, BTreeSet<u32>>; 2],
    frames: Vec<Frame>,
    changes: Rc<ChangeList>,
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("paint_subjects", &self.reads[0].len())
            .field("param_subjects", &self.reads[1].len())
            .field("depth", &self.frames.len())
            .field("pending", &self.changes.changed.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer {
    /// Creates an observer with no cells and no recorded reads.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            reads: [BTreeMap::new(), BTreeMap::new()],
            frames: Vec::new(),
            changes: Rc::new(ChangeList::default()),
        }
    }

    /// Creates a cell whose writes are reported to this observer.
    ///
    /// # Panics
    ///
    /// Panics if the cell id space is exhausted.
    pub fn state<T>(&self, value: T) -> StateCell<T> {
        let id = self.changes.next_id.get();
        assert!(id < ROOT_SUBJECT, "state cell ids exhausted");
        self.changes.next_id.set(id + 1);
        StateCell {
            inner: Rc::new(CellInner {
                id: CellId(id),
                value: RefCell::new(value),
                changes: Rc::clone(&self.changes),
            }),
        }
    }

    /// Returns `true` if any cell was written since the last drain.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.changes.changed.borrow().is_empty()
    }

    /// Returns `true` while a scope is open.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Returns how many cells `subject` read during its last scope of `kind`.
    #[cfg(test)]
    pub(crate) fn reads_of(&self, subject: u32, kind: ScopeKind) -> usize {
        self.reads[kind.slot()].get(&subject).map_or(0, BTreeSet::len)
    }

    /// Opens a scope. Reads recorded until the matching [`end`](Self::end)
    /// replace the subject's previous reads for `kind`.
    pub(crate) fn begin(&mut self, subject: u32, kind: ScopeKind) {
        self.frames.push(Frame {
            subject,
            kind,
            reads: BTreeSet::new(),
        });
    }

    /// Records a read against the innermost open scope. Reads with no open
    /// scope are untracked.
    pub(crate) fn record(&mut self, cell: CellId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.reads.insert(cell.key());
        }
    }

    /// Closes the innermost scope and rewrites its dependency edges.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open.
    pub(crate) fn end(&mut self) {
        let frame = self.frames.pop();
        assert!(frame.is_some(), "observation scope ended twice");
        let Some(Frame {
            subject,
            kind,
            reads,
        }) = frame
        else {
            return;
        };
        let ch = kind.channel();
        let table = &mut self.reads[kind.slot()];
        let old = table.remove(&subject).unwrap_or_default();
        for &cell in old.difference(&reads) {
            self.dirty.remove_dependency(subject, cell, ch);
        }
        for &cell in reads.difference(&old) {
            let _ = self.dirty.add_dependency(subject, cell, ch);
        }
        if !reads.is_empty() {
            table.insert(subject, reads);
        }
    }

    /// Drops every edge recorded for `subject`.
    pub(crate) fn forget(&mut self, subject: u32) {
        self.reads[0].remove(&subject);
        self.reads[1].remove(&subject);
        self.dirty.remove_key(subject);
    }

    /// Drains queued writes and returns the subjects that read the written
    /// cells, in deterministic order.
    pub(crate) fn take_invalidated(&mut self) -> Invalidated {
        let changed = core::mem::take(&mut *self.changes.changed.borrow_mut());
        for id in changed {
            let key = CellId(id).key();
            self.dirty.mark_with(key, PARAMS, &EagerPolicy);
            self.dirty.mark_with(key, PAINT, &EagerPolicy);
        }
        let params: Vec<u32> = self
            .dirty
            .drain(PARAMS)
            .affected()
            .deterministic()
            .run()
            .filter(|key| key & CELL_BIT == 0)
            .collect();
        let paint: Vec<u32> = self
            .dirty
            .drain(PAINT)
            .affected()
            .deterministic()
            .run()
            .filter(|key| key & CELL_BIT == 0)
            .collect();
        Invalidated { params, paint }
    }
}

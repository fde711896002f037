// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An owner that hands out [`RecordingLayer`]s.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Point;
use trellis_core::error::LayerError;
use trellis_core::layer::OwnedLayer;
use trellis_core::owner::Owner;
use trellis_core::tree::{ElementId, WrapperId};

use crate::display_list::RetainedLayer;
use crate::layer::{LayerStats, RecordingLayer};
use crate::resource::LayerKey;

/// One layer created by a [`RecordingOwner`].
#[derive(Clone, Debug)]
pub struct LayerEntry {
    /// The wrapper the layer was created for.
    pub wrapper: WrapperId,
    /// The key assigned to the layer.
    pub key: LayerKey,
    /// The layer counters.
    pub stats: Rc<RefCell<LayerStats>>,
    /// The layer's retained properties and content.
    pub retained: Rc<RefCell<RetainedLayer>>,
}

/// What a [`RecordingOwner`] has been told and asked for.
#[derive(Debug, Default)]
pub struct OwnerLog {
    /// Elements reported through [`Owner::on_layout_change`], in order.
    pub layout_changes: Vec<ElementId>,
    /// Calls to [`Owner::on_root_invalidated`].
    pub root_invalidations: usize,
    /// Every layer ever created, in creation order.
    pub layers: Vec<LayerEntry>,
}

impl OwnerLog {
    /// Returns the most recently created layer for `wrapper`.
    #[must_use]
    pub fn layer_of(&self, wrapper: WrapperId) -> Option<&LayerEntry> {
        self.layers.iter().rev().find(|e| e.wrapper == wrapper)
    }

    /// Returns the number of layers not yet destroyed.
    #[must_use]
    pub fn live_layers(&self) -> usize {
        self.layers
            .iter()
            .filter(|e| !e.stats.borrow().destroyed)
            .count()
    }
}

/// An in-memory [`Owner`].
///
/// The log is shared, so a caller can keep a handle after moving the owner
/// into a [`LayoutTree`](trellis_core::tree::LayoutTree).
#[derive(Debug)]
pub struct RecordingOwner {
    log: Rc<RefCell<OwnerLog>>,
    root_position: Point,
    layer_budget: Option<usize>,
    next_key: u64,
}

impl Default for RecordingOwner {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingOwner {
    /// Creates an owner whose root sits at the global origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(OwnerLog::default())),
            root_position: Point::ORIGIN,
            layer_budget: None,
            next_key: 0,
        }
    }

    /// Places the root at `position` in global coordinates.
    #[must_use]
    pub fn with_root_position(mut self, position: Point) -> Self {
        self.root_position = position;
        self
    }

    /// Limits the number of simultaneously live layers.
    ///
    /// Creation beyond the limit fails with [`LayerError::Exhausted`].
    #[must_use]
    pub fn with_layer_budget(mut self, budget: usize) -> Self {
        self.layer_budget = Some(budget);
        self
    }

    /// Returns a shared handle to the log.
    #[must_use]
    pub fn log(&self) -> Rc<RefCell<OwnerLog>> {
        Rc::clone(&self.log)
    }
}

impl Owner for RecordingOwner {
    fn create_layer(&mut self, wrapper: WrapperId) -> Result<Box<dyn OwnedLayer>, LayerError> {
        let mut log = self.log.borrow_mut();
        if let Some(budget) = self.layer_budget
            && log.live_layers() >= budget
        {
            log::warn!("layer budget of {budget} exhausted for {wrapper:?}");
            return Err(LayerError::Exhausted);
        }
        let key = LayerKey(self.next_key);
        self.next_key += 1;
        let layer = RecordingLayer::new(key);
        log.layers.push(LayerEntry {
            wrapper,
            key,
            stats: layer.stats(),
            retained: layer.retained(),
        });
        log::debug!("{key:?} created for {wrapper:?}");
        Ok(Box::new(layer))
    }

    fn root_position(&self) -> Point {
        self.root_position
    }

    fn on_layout_change(&mut self, element: ElementId) {
        self.log.borrow_mut().layout_changes.push(element);
    }

    fn on_root_invalidated(&mut self) {
        self.log.borrow_mut().root_invalidations += 1;
    }
}

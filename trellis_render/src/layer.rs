// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A layer that retains its content as a display list.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use kurbo::{Point, Size};
use trellis_core::canvas::Canvas;
use trellis_core::layer::{LayerParams, OwnedLayer};
use trellis_core::transform::Transform3d;

use crate::display_list::{DisplayList, RetainedLayer};
use crate::resource::LayerKey;

/// Counters describing what the tree asked of one [`RecordingLayer`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerStats {
    /// Calls to [`OwnedLayer::resize`].
    pub resizes: usize,
    /// Calls to [`OwnedLayer::move_to`].
    pub moves: usize,
    /// Calls to [`OwnedLayer::invalidate`].
    pub invalidations: usize,
    /// Times the content callback ran.
    pub paints: usize,
    /// Calls to [`OwnedLayer::update_parameters`].
    pub parameter_updates: usize,
    /// Whether [`OwnedLayer::destroy`] was called.
    pub destroyed: bool,
}

/// An [`OwnedLayer`] backed by a shared [`RetainedLayer`].
///
/// The content is re-recorded only when the layer is stale: on creation,
/// after a resize and after an explicit invalidation. Drawing into a
/// [`DisplayList`] adds a reference to the retained layer, so later moves
/// and parameter changes show up in that list without recording it again.
/// Drawing into any other canvas replays the layer.
#[derive(Debug)]
pub struct RecordingLayer {
    key: LayerKey,
    size: Size,
    params: LayerParams,
    dirty: bool,
    retained: Rc<RefCell<RetainedLayer>>,
    stats: Rc<RefCell<LayerStats>>,
}

impl RecordingLayer {
    /// Creates an empty, stale layer.
    #[must_use]
    pub fn new(key: LayerKey) -> Self {
        Self {
            key,
            size: Size::ZERO,
            params: LayerParams::default(),
            dirty: true,
            retained: Rc::new(RefCell::new(RetainedLayer::default())),
            stats: Rc::new(RefCell::new(LayerStats::default())),
        }
    }

    /// Returns the layer key.
    #[must_use]
    pub fn key(&self) -> LayerKey {
        self.key
    }

    /// Returns a handle to the retained layer.
    #[must_use]
    pub fn retained(&self) -> Rc<RefCell<RetainedLayer>> {
        Rc::clone(&self.retained)
    }

    /// Returns a handle to the counters, which outlive the layer.
    #[must_use]
    pub fn stats(&self) -> Rc<RefCell<LayerStats>> {
        Rc::clone(&self.stats)
    }

    /// Returns the last applied parameters.
    #[must_use]
    pub fn params(&self) -> &LayerParams {
        &self.params
    }

    /// Returns `true` if the next draw will re-record the content.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn sync_properties(&self) {
        let mut retained = self.retained.borrow_mut();
        retained.matrix = self.params.matrix(self.size);
        retained.alpha = self.params.alpha;
        retained.clip = self
            .params
            .clip
            .then(|| self.params.shape.outline(self.size).rect());
    }
}

impl OwnedLayer for RecordingLayer {
    fn resize(&mut self, size: Size) {
        self.size = size;
        self.sync_properties();
        self.dirty = true;
        self.stats.borrow_mut().resizes += 1;
    }

    fn move_to(&mut self, position: Point) {
        self.retained.borrow_mut().position = position;
        self.stats.borrow_mut().moves += 1;
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        self.stats.borrow_mut().invalidations += 1;
    }

    fn destroy(self: Box<Self>) {
        log::trace!("{:?} destroyed", self.key);
        self.retained.borrow_mut().content.clear();
        self.stats.borrow_mut().destroyed = true;
    }

    fn update_display_list(&mut self, content: &mut dyn FnMut(&mut dyn Canvas)) -> bool {
        if !self.dirty {
            return false;
        }
        {
            let mut retained = self.retained.borrow_mut();
            retained.content.clear();
            content(&mut retained.content);
        }
        self.dirty = false;
        self.stats.borrow_mut().paints += 1;
        true
    }

    fn draw_layer(&mut self, canvas: &mut dyn Canvas, content: &mut dyn FnMut(&mut dyn Canvas)) {
        self.update_display_list(content);
        if let Some(list) = canvas
            .as_any_mut()
            .and_then(|any| any.downcast_mut::<DisplayList>())
        {
            list.push_layer(Rc::clone(&self.retained));
            return;
        }
        self.retained.borrow().draw_into(canvas);
    }

    fn matrix(&self) -> Transform3d {
        self.params.matrix(self.size)
    }

    fn update_parameters(&mut self, params: &LayerParams) -> bool {
        let repaint_parent = self.params.shadow_elevation != params.shadow_elevation;
        self.params = *params;
        self.sync_properties();
        self.stats.borrow_mut().parameter_updates += 1;
        repaint_parent
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owner contract.
//!
//! One owner serves a whole [`LayoutTree`](crate::tree::LayoutTree). It
//! creates backend layers, knows where the root sits on screen, and hears
//! about layout changes and invalidations that reach the root.

use alloc::boxed::Box;

use kurbo::Point;

use crate::error::LayerError;
use crate::layer::OwnedLayer;
use crate::tree::{ElementId, WrapperId};

/// Host services for a layout tree.
pub trait Owner {
    /// Creates a fresh layer for `wrapper`.
    ///
    /// Called at most once per layer lifetime; a wrapper whose layer was
    /// destroyed gets a new instance the next time it needs one. Failure is
    /// surfaced to the caller of the tree operation and never retried.
    fn create_layer(&mut self, wrapper: WrapperId) -> Result<Box<dyn OwnedLayer>, LayerError>;

    /// Returns the position of the root element in global (window)
    /// coordinates.
    fn root_position(&self) -> Point;

    /// Called when a wrapper of `element` changes size or position.
    fn on_layout_change(&mut self, element: ElementId);

    /// Called when an invalidation bubbles past the outermost wrapper of the
    /// root without meeting a layer.
    fn on_root_invalidated(&mut self) {}
}

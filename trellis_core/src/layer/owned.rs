// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend layer contract.

use alloc::boxed::Box;

use kurbo::{Point, Size};

use super::params::LayerParams;
use crate::canvas::Canvas;
use crate::transform::Transform3d;

/// A compositing surface created by an [`Owner`](crate::owner::Owner) for
/// exactly one wrapper.
///
/// The layer retains its painted content. It calls the `content` callback
/// passed to [`draw_layer`](Self::draw_layer) or
/// [`update_display_list`](Self::update_display_list) only when it has been
/// invalidated (or has never painted), so an unchanged layer can be moved,
/// resized or re-parameterized without running any paint hooks.
pub trait OwnedLayer {
    /// Sets the layer size. Resizing invalidates the layer.
    fn resize(&mut self, size: Size);

    /// Sets the layer position within the owning wrapper's parent space.
    fn move_to(&mut self, position: Point);

    /// Marks the retained content stale.
    fn invalidate(&mut self);

    /// Releases backend resources. The layer is never used again.
    fn destroy(self: Box<Self>);

    /// Re-records the content if the layer is stale. Returns `true` if
    /// `content` ran.
    fn update_display_list(&mut self, content: &mut dyn FnMut(&mut dyn Canvas)) -> bool;

    /// Draws the layer into `canvas`, updating the retained content first if
    /// it is stale.
    fn draw_layer(&mut self, canvas: &mut dyn Canvas, content: &mut dyn FnMut(&mut dyn Canvas));

    /// Returns the matrix derived from the last applied parameters, mapping
    /// layer-local points into the space the layer position is expressed in
    /// (without the position itself).
    fn matrix(&self) -> Transform3d;

    /// Applies new parameters.
    ///
    /// Returns `true` if the parent must repaint to pick up the change (for
    /// instance a shadow the parent draws).
    fn update_parameters(&mut self, params: &LayerParams) -> bool;
}

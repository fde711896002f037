// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing surface contract.
//!
//! The tree never rasterizes anything itself. Wrappers and draw modifiers
//! issue commands against a [`Canvas`], and layers decide whether to replay
//! cached content or run the paint callback again.
//!
//! Direct (layer-less) drawing relies on [`Canvas::translate`] being exactly
//! undone by the opposite translation, so that siblings sharing one canvas
//! see a consistent origin without a save/restore pair.

use core::any::Any;
use core::fmt;

use kurbo::{Rect, Vec2};

use crate::transform::Transform3d;

/// A packed `0xAARRGGBB` color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque red.
    pub const RED: Self = Self(0xFFFF_0000);
    /// Opaque magenta, the default layout-bounds color.
    pub const MAGENTA: Self = Self(0xFFFF_00FF);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self(0);

    /// Returns the alpha channel.
    #[inline]
    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:08x})", self.0)
    }
}

/// A 2-D drawing target.
pub trait Canvas {
    /// Moves the origin by `offset`.
    fn translate(&mut self, offset: Vec2);

    /// Pushes the current transform, clip and alpha.
    fn save(&mut self);

    /// Pops the state pushed by the matching [`save`](Self::save).
    fn restore(&mut self);

    /// Pre-multiplies the current transform by `transform`.
    fn concat(&mut self, transform: &Transform3d);

    /// Intersects the clip with `rect` in the current coordinate space.
    fn clip_rect(&mut self, rect: Rect);

    /// Multiplies the alpha applied to subsequent commands.
    fn set_alpha(&mut self, alpha: f64);

    /// Fills `rect` with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Strokes the outline of `rect`.
    fn stroke_rect(&mut self, rect: Rect, width: f64, color: Color);

    /// Exposes the concrete canvas so a backend layer can recognize its own
    /// recording surface and reference retained content instead of
    /// replaying it.
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

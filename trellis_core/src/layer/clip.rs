// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip shapes for layer outlines.

use kurbo::{Rect, RoundedRect, Size};

/// The outline a layer clips to (when clipping is enabled) and casts its
/// shadow from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ClipShape {
    /// The layer bounds.
    #[default]
    Rectangle,
    /// The layer bounds with uniformly rounded corners.
    RoundedRect {
        /// Corner radius in layer units.
        radius: f64,
    },
}

impl ClipShape {
    /// Returns the outline for a layer of `size`.
    #[must_use]
    pub fn outline(self, size: Size) -> RoundedRect {
        let rect = Rect::from_origin_size((0.0, 0.0), size);
        match self {
            Self::Rectangle => RoundedRect::from_rect(rect, 0.0),
            Self::RoundedRect { radius } => RoundedRect::from_rect(rect, radius),
        }
    }
}

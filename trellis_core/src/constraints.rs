// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measurement constraints.

use kurbo::Size;

/// Bounds passed inward during measurement.
///
/// A measured size may be anything in `[min, max]`. Wrappers that need to
/// enforce the bounds call [`Constraints::constrain`] on their result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraints {
    /// Smallest acceptable size.
    pub min: Size,
    /// Largest acceptable size; components may be infinite.
    pub max: Size,
}

impl Constraints {
    /// Exactly `size`.
    #[inline]
    #[must_use]
    pub const fn tight(size: Size) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    /// Anything from zero up to `max`.
    #[inline]
    #[must_use]
    pub const fn loose(max: Size) -> Self {
        Self {
            min: Size::ZERO,
            max,
        }
    }

    /// Any non-negative size.
    #[inline]
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            min: Size::ZERO,
            max: Size::new(f64::INFINITY, f64::INFINITY),
        }
    }

    /// Clamps `size` into `[min, max]`.
    #[inline]
    #[must_use]
    pub fn constrain(self, size: Size) -> Size {
        Size::new(
            size.width.max(self.min.width).min(self.max.width),
            size.height.max(self.min.height).min(self.max.height),
        )
    }

    /// Shrinks both bounds by `dw`/`dh`, clamping at zero.
    #[must_use]
    pub fn deflate(self, dw: f64, dh: f64) -> Self {
        Self {
            min: Size::new(
                (self.min.width - dw).max(0.0),
                (self.min.height - dh).max(0.0),
            ),
            max: Size::new(
                (self.max.width - dw).max(0.0),
                (self.max.height - dh).max(0.0),
            ),
        }
    }

    /// Returns `true` if `min == max`.
    #[inline]
    #[must_use]
    pub fn is_tight(self) -> bool {
        self.min == self.max
    }
}

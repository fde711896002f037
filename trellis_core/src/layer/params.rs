// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer transform parameters.

use core::f64::consts::PI;

use kurbo::Size;

use super::clip::ClipShape;
use crate::transform::Transform3d;

/// Camera distance used when none is set, in layer units.
pub const DEFAULT_CAMERA_DISTANCE: f64 = 8.0 * 72.0;

/// Pivot for scale and rotation, as fractions of the layer size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformOrigin {
    /// Horizontal fraction, `0.0` is the left edge.
    pub pivot_x: f64,
    /// Vertical fraction, `0.0` is the top edge.
    pub pivot_y: f64,
}

impl TransformOrigin {
    /// The center of the layer.
    pub const CENTER: Self = Self {
        pivot_x: 0.5,
        pivot_y: 0.5,
    };

    /// The top-left corner.
    pub const TOP_LEFT: Self = Self {
        pivot_x: 0.0,
        pivot_y: 0.0,
    };
}

impl Default for TransformOrigin {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Everything a [`LayerConfig`](super::LayerConfig) can set on a layer.
///
/// Rotations are in degrees. Translation is applied after position, in the
/// parent's coordinate space, and does not affect layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerParams {
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    /// Horizontal translation.
    pub translation_x: f64,
    /// Vertical translation.
    pub translation_y: f64,
    /// Shadow elevation.
    pub shadow_elevation: f64,
    /// Rotation around the X axis, in degrees.
    pub rotation_x: f64,
    /// Rotation around the Y axis, in degrees.
    pub rotation_y: f64,
    /// Rotation around the Z axis, in degrees.
    pub rotation_z: f64,
    /// Distance from the camera to the layer plane.
    pub camera_distance: f64,
    /// Pivot for scale and rotation.
    pub transform_origin: TransformOrigin,
    /// Outline used for clipping and shadows.
    pub shape: ClipShape,
    /// Whether content is clipped to [`shape`](Self::shape).
    pub clip: bool,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            alpha: 1.0,
            translation_x: 0.0,
            translation_y: 0.0,
            shadow_elevation: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            camera_distance: DEFAULT_CAMERA_DISTANCE,
            transform_origin: TransformOrigin::CENTER,
            shape: ClipShape::Rectangle,
            clip: false,
        }
    }
}

impl LayerParams {
    /// Returns the layer matrix for a layer of `size`, mapping layer-local
    /// points into the owning wrapper's space (before its position is added).
    ///
    /// The matrix is
    /// `T(translation) · T(pivot) · P(camera) · Rx · Ry · Rz · S · T(-pivot)`;
    /// the perspective term only appears when there is an X or Y rotation.
    /// The result is flattened onto the `z = 0` plane so it can be inverted
    /// for screen-to-local mapping.
    #[must_use]
    pub fn matrix(&self, size: Size) -> Transform3d {
        let px = self.transform_origin.pivot_x * size.width;
        let py = self.transform_origin.pivot_y * size.height;
        let deg = PI / 180.0;

        let mut m =
            Transform3d::from_translation(self.translation_x + px, self.translation_y + py, 0.0);
        if self.rotation_x != 0.0 || self.rotation_y != 0.0 {
            m = m
                * Transform3d::from_perspective(self.camera_distance)
                * Transform3d::from_rotation_x(self.rotation_x * deg)
                * Transform3d::from_rotation_y(self.rotation_y * deg);
        }
        if self.rotation_z != 0.0 {
            m = m * Transform3d::from_rotation_z(self.rotation_z * deg);
        }
        (m * Transform3d::from_scale(self.scale_x, self.scale_y, 1.0)
            * Transform3d::from_translation(-px, -py, 0.0))
        .flatten_z()
    }
}

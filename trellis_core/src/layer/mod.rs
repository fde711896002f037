// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing layers owned by wrappers.
//!
//! A wrapper owns a layer only while it is attached and has a
//! [`LayerConfig`]. The config callback fills in [`LayerParams`] (scale,
//! rotation, translation, alpha, elevation, clip) which the backend layer
//! applies without a repaint. The backend side is the [`OwnedLayer`] trait.

mod clip;
mod config;
mod owned;
mod params;

pub use clip::ClipShape;
pub use config::{LayerConfig, LayerScope};
pub use owned::OwnedLayer;
pub use params::{DEFAULT_CAMERA_DISTANCE, LayerParams, TransformOrigin};

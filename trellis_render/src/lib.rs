// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained display lists and a recording layer backend for trellis.
//!
//! This crate implements the backend half of [`trellis_core`]'s layer
//! contract entirely in memory. It provides:
//!
//! - [`DisplayList`]: a [`Canvas`](trellis_core::canvas::Canvas) that records
//!   commands and can reference the retained content of nested layers
//! - [`RecordingLayer`]: an [`OwnedLayer`](trellis_core::layer::OwnedLayer)
//!   that repaints into its own display list only when invalidated
//! - [`RecordingOwner`]: an [`Owner`](trellis_core::owner::Owner) that hands
//!   out recording layers and keeps a log of what the tree asked for
//! - [`LayerKey`]: the opaque identity of a recorded layer
//!
//! A [`DisplayList`] that contains layers only references them: flattening
//! it always sees each layer's latest position, parameters and content, so
//! moving or repainting one layer never requires recording its ancestors
//! again.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod display_list;
mod layer;
mod owner;
mod resource;

pub use display_list::{DisplayList, DrawCommand, FlatFill, RetainedLayer};
pub use layer::{LayerStats, RecordingLayer};
pub use owner::{LayerEntry, OwnerLog, RecordingOwner};
pub use resource::LayerKey;

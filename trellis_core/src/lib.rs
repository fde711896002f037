// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wrapper-chain layout tree with lazily created compositing layers.
//!
//! `trellis_core` provides a retained layout/render tree. Every element owns a
//! linear chain of *wrappers*, one per modifier, and each wrapper takes part
//! in measurement, placement, drawing, hit testing and coordinate
//! conversion. Elements form a tree; wrapper chains never branch. It is
//! `no_std` compatible (with `alloc`) and stores elements and wrappers in
//! struct-of-arrays arenas addressed by generational handles.
//!
//! # Architecture
//!
//! ```text
//!   outer wrapper ──► ... ──► inner wrapper ──► MeasurePolicy
//!        ▲  constraints flow inward, sizes flow back out   │
//!        │                                                 ▼
//!   place(position, z, layer config) ──────────► child elements
//!        │
//!        ▼
//!   OwnedLayer (created lazily via Owner) ──► Canvas
//! ```
//!
//! **[`tree`]**: The [`LayoutTree`](tree::LayoutTree) arena with elements,
//! wrappers and the measure/place/draw/hit-test/coordinate protocol.
//!
//! **[`layer`]**: Layer parameters, configuration callbacks and the
//! [`OwnedLayer`](layer::OwnedLayer) contract that backends implement.
//!
//! **[`owner`]**: The [`Owner`](owner::Owner) contract: layer factory, root
//! position and change notification.
//!
//! **[`observe`]**: Explicit read tracking. [`StateCell`](observe::StateCell)
//! writes queue changes that re-run only the paint or only the layer
//! parameter work of the wrappers that read them.
//!
//! **[`canvas`]**: The drawing surface contract.
//!
//! **[`constraints`]** and **[`transform`]**: Geometry primitives.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) hooks for layout events.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` dispatch (one branch per
//!   call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod canvas;
pub mod constraints;
pub mod error;
pub mod layer;
pub mod observe;
pub mod owner;
pub mod trace;
pub mod transform;
pub mod tree;

pub use error::{Error, LayerError, Result};

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for layout and layer events.
//!
//! [`TraceSink`] has one method per event, each defaulting to a no-op, so a
//! sink implements only what it cares about.
//!
//! [`Tracer`] holds the optional sink installed on a
//! [`LayoutTree`](crate::tree::LayoutTree). When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installing a sink
//! drops it. When **on**, each method performs a single `Option` branch
//! before dispatching.

use alloc::boxed::Box;

use kurbo::{Point, Size};

use crate::constraints::Constraints;
use crate::tree::{ElementId, WrapperId};

/// What happened to a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerEventKind {
    /// The owner created a layer for the wrapper.
    Created,
    /// The wrapper destroyed its layer.
    Destroyed,
    /// The layer content was marked stale.
    Invalidated,
    /// The layer config ran and new parameters were applied.
    ParametersUpdated,
}

/// Emitted after a wrapper stores a measurement result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureEvent {
    /// The measured wrapper.
    pub wrapper: WrapperId,
    /// Constraints it was measured with.
    pub constraints: Constraints,
    /// The resulting size.
    pub size: Size,
    /// Whether the size differs from the previous measurement.
    pub changed: bool,
}

/// Emitted when a wrapper is placed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaceEvent {
    /// The placed wrapper.
    pub wrapper: WrapperId,
    /// Its new position.
    pub position: Point,
    /// Its z-index.
    pub z_index: f64,
    /// Whether the position differs from the previous one.
    pub moved: bool,
}

/// Emitted on layer lifecycle and invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerEvent {
    /// The wrapper owning the layer.
    pub wrapper: WrapperId,
    /// What happened.
    pub kind: LayerEventKind,
}

/// Emitted when a layer paint is skipped because its element is not placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawSkippedEvent {
    /// The wrapper owning the layer.
    pub wrapper: WrapperId,
    /// The element that was not placed.
    pub element: ElementId,
}

/// Receiver for layout tree events.
///
/// All methods default to no-ops.
pub trait TraceSink {
    /// Called after a wrapper is measured.
    fn on_measure(&mut self, e: &MeasureEvent) {
        _ = e;
    }

    /// Called after a wrapper is placed.
    fn on_place(&mut self, e: &PlaceEvent) {
        _ = e;
    }

    /// Called on layer creation, destruction, invalidation and parameter
    /// updates.
    fn on_layer(&mut self, e: &LayerEvent) {
        _ = e;
    }

    /// Called when a layer skips painting an unplaced element.
    fn on_draw_skipped(&mut self, e: &DrawSkippedEvent) {
        _ = e;
    }
}

/// A sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Optional [`TraceSink`] owned by a tree.
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::none()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {}
        }
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`MeasureEvent`].
    #[inline]
    pub fn measure(&mut self, e: &MeasureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_measure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PlaceEvent`].
    #[inline]
    pub fn place(&mut self, e: &PlaceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_place(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayerEvent`].
    #[inline]
    pub fn layer(&mut self, wrapper: WrapperId, kind: LayerEventKind) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer(&LayerEvent { wrapper, kind });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (wrapper, kind);
        }
    }

    /// Emits a [`DrawSkippedEvent`].
    #[inline]
    pub fn draw_skipped(&mut self, e: &DrawSkippedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_draw_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

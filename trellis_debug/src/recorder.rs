// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event to a
//! shared log. Clones share the log, so one clone can be installed on a
//! [`LayoutTree`](trellis_core::tree::LayoutTree) while another is kept to
//! read the events back.

use std::cell::RefCell;
use std::rc::Rc;

use trellis_core::trace::{
    DrawSkippedEvent, LayerEvent, LayerEventKind, MeasureEvent, PlaceEvent, TraceSink,
};
use trellis_core::tree::WrapperId;

/// A recorded event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`MeasureEvent`].
    Measure(MeasureEvent),
    /// A [`PlaceEvent`].
    Place(PlaceEvent),
    /// A [`LayerEvent`].
    Layer(LayerEvent),
    /// A [`DrawSkippedEvent`].
    DrawSkipped(DrawSkippedEvent),
}

impl RecordedEvent {
    /// Returns the wrapper the event is about.
    #[must_use]
    pub fn wrapper(&self) -> WrapperId {
        match self {
            Self::Measure(e) => e.wrapper,
            Self::Place(e) => e.wrapper,
            Self::Layer(e) => e.wrapper,
            Self::DrawSkipped(e) => e.wrapper,
        }
    }
}

/// A [`TraceSink`] that appends events to a shared log.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Removes and returns the events recorded so far.
    pub fn take(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Returns the wrappers of every layer event of `kind`, in order.
    #[must_use]
    pub fn layer_events(&self, kind: LayerEventKind) -> Vec<WrapperId> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Layer(e) if e.kind == kind => Some(e.wrapper),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl TraceSink for RecorderSink {
    fn on_measure(&mut self, e: &MeasureEvent) {
        self.push(RecordedEvent::Measure(*e));
    }

    fn on_place(&mut self, e: &PlaceEvent) {
        self.push(RecordedEvent::Place(*e));
    }

    fn on_layer(&mut self, e: &LayerEvent) {
        self.push(RecordedEvent::Layer(*e));
    }

    fn on_draw_skipped(&mut self, e: &DrawSkippedEvent) {
        self.push(RecordedEvent::DrawSkipped(*e));
    }
}

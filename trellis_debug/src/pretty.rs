// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use kurbo::{Point, Size};
use trellis_core::constraints::Constraints;
use trellis_core::trace::{
    DrawSkippedEvent, LayerEvent, LayerEventKind, MeasureEvent, PlaceEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn size(s: Size) -> String {
    format!("{}x{}", s.width, s.height)
}

fn point(p: Point) -> String {
    format!("({}, {})", p.x, p.y)
}

fn constraints(c: Constraints) -> String {
    format!("[{}..{}]", size(c.min), size(c.max))
}

fn layer_kind_name(kind: LayerEventKind) -> &'static str {
    match kind {
        LayerEventKind::Created => "created",
        LayerEventKind::Destroyed => "destroyed",
        LayerEventKind::Invalidated => "invalidated",
        LayerEventKind::ParametersUpdated => "params",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_measure(&mut self, e: &MeasureEvent) {
        let changed = if e.changed { " changed" } else { "" };
        let _ = writeln!(
            self.writer,
            "[measure] {:?} constraints={} size={}{changed}",
            e.wrapper,
            constraints(e.constraints),
            size(e.size),
        );
    }

    fn on_place(&mut self, e: &PlaceEvent) {
        let moved = if e.moved { " moved" } else { "" };
        let _ = writeln!(
            self.writer,
            "[place] {:?} at {} z={}{moved}",
            e.wrapper,
            point(e.position),
            e.z_index,
        );
    }

    fn on_layer(&mut self, e: &LayerEvent) {
        let _ = writeln!(
            self.writer,
            "[layer:{}] {:?}",
            layer_kind_name(e.kind),
            e.wrapper,
        );
    }

    fn on_draw_skipped(&mut self, e: &DrawSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] {:?} element={:?} not placed",
            e.wrapper, e.element,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::tree::{Fixed, LayoutTree};
    use trellis_render::RecordingOwner;

    #[test]
    fn measure_and_place_lines() {
        let mut tree = LayoutTree::new(Box::new(RecordingOwner::new()));
        let e = tree.create_element(Fixed(Size::new(30.0, 40.0)));
        tree.set_root(e).unwrap();
        let w = tree.outer_wrapper(e);

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_measure(&MeasureEvent {
            wrapper: w,
            constraints: Constraints::tight(Size::new(30.0, 40.0)),
            size: Size::new(30.0, 40.0),
            changed: true,
        });
        sink.on_place(&PlaceEvent {
            wrapper: w,
            position: Point::new(1.0, 2.0),
            z_index: 0.0,
            moved: false,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].starts_with("[measure]"), "got: {output}");
        assert!(lines[0].contains("size=30x40 changed"), "got: {output}");
        assert!(lines[1].contains("at (1, 2) z=0"), "got: {output}");
        assert!(!lines[1].contains("moved"), "got: {output}");
    }

    #[test]
    fn layer_lines_name_the_event() {
        let mut tree = LayoutTree::new(Box::new(RecordingOwner::new()));
        let e = tree.create_element(Fixed(Size::new(1.0, 1.0)));
        let w = tree.outer_wrapper(e);

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_layer(&LayerEvent {
            wrapper: w,
            kind: LayerEventKind::ParametersUpdated,
        });
        sink.on_draw_skipped(&DrawSkippedEvent {
            wrapper: w,
            element: e,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[layer:params]"), "got: {output}");
        assert!(output.contains("[skip]"), "got: {output}");
    }
}

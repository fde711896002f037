// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON views of a layout tree and of recorded events.
//!
//! [`snapshot`] describes the attached tree: every element with its wrapper
//! chain (outermost first) and children. [`events`] converts events from a
//! [`RecorderSink`](crate::recorder::RecorderSink) into JSON objects in
//! recording order, and [`export`] writes them to a writer.

use std::io::{self, Write};

use kurbo::{Point, Size};
use serde_json::{Value, json};
use trellis_core::tree::{ElementId, LayoutTree};

use crate::recorder::RecordedEvent;

/// Describes the tree under its root, or `null` when no root is set.
#[must_use]
pub fn snapshot(tree: &LayoutTree) -> Value {
    match tree.root() {
        Some(root) => element(tree, root),
        None => Value::Null,
    }
}

fn element(tree: &LayoutTree, id: ElementId) -> Value {
    let wrappers: Vec<Value> = tree
        .wrappers(id)
        .map(|w| {
            json!({
                "id": format!("{w:?}"),
                "kind": tree.kind(w).name(),
                "size": tree.try_size(w).map(size),
                "position": tree.try_position(w).map(point),
                "z_index": tree.z_index(w),
                "layer": tree.has_layer(w),
                "clipping": tree.is_clipping(w),
            })
        })
        .collect();
    let children: Vec<Value> = tree.children(id).map(|c| element(tree, c)).collect();
    json!({
        "id": format!("{id:?}"),
        "state": format!("{:?}", tree.layout_state(id)),
        "attached": tree.is_attached(id),
        "placed": tree.is_placed(id),
        "wrappers": wrappers,
        "children": children,
    })
}

fn size(s: Size) -> Value {
    json!([s.width, s.height])
}

fn point(p: Point) -> Value {
    json!([p.x, p.y])
}

/// Converts recorded events to JSON objects, numbered in recording order.
#[must_use]
pub fn events(recorded: &[RecordedEvent]) -> Vec<Value> {
    recorded
        .iter()
        .enumerate()
        .map(|(seq, recorded)| match recorded {
            RecordedEvent::Measure(e) => json!({
                "seq": seq,
                "name": "Measure",
                "wrapper": format!("{:?}", e.wrapper),
                "args": {
                    "min": size(e.constraints.min),
                    "max": size(e.constraints.max),
                    "size": size(e.size),
                    "changed": e.changed,
                }
            }),
            RecordedEvent::Place(e) => json!({
                "seq": seq,
                "name": "Place",
                "wrapper": format!("{:?}", e.wrapper),
                "args": {
                    "position": point(e.position),
                    "z_index": e.z_index,
                    "moved": e.moved,
                }
            }),
            RecordedEvent::Layer(e) => json!({
                "seq": seq,
                "name": "Layer",
                "wrapper": format!("{:?}", e.wrapper),
                "args": {
                    "kind": format!("{:?}", e.kind),
                }
            }),
            RecordedEvent::DrawSkipped(e) => json!({
                "seq": seq,
                "name": "DrawSkipped",
                "wrapper": format!("{:?}", e.wrapper),
                "args": {
                    "element": format!("{:?}", e.element),
                }
            }),
        })
        .collect()
}

/// Writes the tree snapshot and the recorded events as one JSON document.
///
/// The output has the shape `{"tree": ..., "events": [...]}`.
pub fn export(
    tree: &LayoutTree,
    recorded: &[RecordedEvent],
    writer: &mut dyn Write,
) -> io::Result<()> {
    let document = json!({
        "tree": snapshot(tree),
        "events": events(recorded),
    });
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

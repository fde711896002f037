// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording owner, layer and canvas for the tree tests.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::{Point, Rect, Size, Vec2};

use super::{ElementId, LayoutTree, Modifier, WrapperId};
use crate::canvas::{Canvas, Color};
use crate::error::LayerError;
use crate::layer::{LayerParams, OwnedLayer};
use crate::owner::Owner;
use crate::transform::Transform3d;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Op {
    Translate(Vec2),
    Save,
    Restore,
    Concat(Transform3d),
    ClipRect(Rect),
    SetAlpha(f64),
    Fill(Rect, Color),
    Stroke(Rect, f64, Color),
}

#[derive(Debug, Default)]
pub(crate) struct TestCanvas {
    pub(crate) ops: Vec<Op>,
}

impl TestCanvas {
    /// Fills in canvas space, following translations only.
    pub(crate) fn fills(&self) -> Vec<(Rect, Color)> {
        let mut offset = Vec2::ZERO;
        let mut stack = Vec::new();
        let mut out = Vec::new();
        for op in &self.ops {
            match *op {
                Op::Translate(v) => offset += v,
                Op::Save => stack.push(offset),
                Op::Restore => offset = stack.pop().unwrap(),
                Op::Fill(rect, color) => out.push((rect + offset, color)),
                _ => {}
            }
        }
        out
    }

    pub(crate) fn replay(&self, canvas: &mut dyn Canvas) {
        for op in &self.ops {
            match *op {
                Op::Translate(v) => canvas.translate(v),
                Op::Save => canvas.save(),
                Op::Restore => canvas.restore(),
                Op::Concat(t) => canvas.concat(&t),
                Op::ClipRect(r) => canvas.clip_rect(r),
                Op::SetAlpha(a) => canvas.set_alpha(a),
                Op::Fill(r, c) => canvas.fill_rect(r, c),
                Op::Stroke(r, w, c) => canvas.stroke_rect(r, w, c),
            }
        }
    }
}

impl Canvas for TestCanvas {
    fn translate(&mut self, offset: Vec2) {
        self.ops.push(Op::Translate(offset));
    }
    fn save(&mut self) {
        self.ops.push(Op::Save);
    }
    fn restore(&mut self) {
        self.ops.push(Op::Restore);
    }
    fn concat(&mut self, transform: &Transform3d) {
        self.ops.push(Op::Concat(*transform));
    }
    fn clip_rect(&mut self, rect: Rect) {
        self.ops.push(Op::ClipRect(rect));
    }
    fn set_alpha(&mut self, alpha: f64) {
        self.ops.push(Op::SetAlpha(alpha));
    }
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(Op::Fill(rect, color));
    }
    fn stroke_rect(&mut self, rect: Rect, width: f64, color: Color) {
        self.ops.push(Op::Stroke(rect, width, color));
    }
}

#[derive(Debug)]
pub(crate) struct LayerRecord {
    pub(crate) wrapper: WrapperId,
    pub(crate) size: Size,
    pub(crate) position: Point,
    pub(crate) params: LayerParams,
    pub(crate) resizes: usize,
    pub(crate) moves: usize,
    pub(crate) invalidations: usize,
    pub(crate) parameter_updates: usize,
    pub(crate) paints: usize,
    pub(crate) destroyed: bool,
    pub(crate) dirty: bool,
    pub(crate) content: TestCanvas,
}

struct TestLayer {
    record: Rc<RefCell<LayerRecord>>,
}

impl OwnedLayer for TestLayer {
    fn resize(&mut self, size: Size) {
        let mut r = self.record.borrow_mut();
        r.size = size;
        r.resizes += 1;
        r.dirty = true;
    }

    fn move_to(&mut self, position: Point) {
        let mut r = self.record.borrow_mut();
        r.position = position;
        r.moves += 1;
    }

    fn invalidate(&mut self) {
        let mut r = self.record.borrow_mut();
        r.invalidations += 1;
        r.dirty = true;
    }

    fn destroy(self: Box<Self>) {
        self.record.borrow_mut().destroyed = true;
    }

    fn update_display_list(&mut self, content: &mut dyn FnMut(&mut dyn Canvas)) -> bool {
        if !self.record.borrow().dirty {
            return false;
        }
        let mut canvas = TestCanvas::default();
        content(&mut canvas);
        let mut r = self.record.borrow_mut();
        r.content = canvas;
        r.dirty = false;
        r.paints += 1;
        true
    }

    fn draw_layer(&mut self, canvas: &mut dyn Canvas, content: &mut dyn FnMut(&mut dyn Canvas)) {
        self.update_display_list(content);
        let r = self.record.borrow();
        canvas.save();
        canvas.translate(r.position.to_vec2());
        let matrix = r.params.matrix(r.size);
        if !matrix.is_identity() {
            canvas.concat(&matrix);
        }
        r.content.replay(canvas);
        canvas.restore();
    }

    fn matrix(&self) -> Transform3d {
        let r = self.record.borrow();
        r.params.matrix(r.size)
    }

    fn update_parameters(&mut self, params: &LayerParams) -> bool {
        let mut r = self.record.borrow_mut();
        r.parameter_updates += 1;
        let repaint_parent = r.params.shadow_elevation != params.shadow_elevation;
        r.params = *params;
        repaint_parent
    }
}

#[derive(Debug, Default)]
pub(crate) struct OwnerLog {
    pub(crate) layout_changes: Vec<ElementId>,
    pub(crate) root_invalidations: usize,
    pub(crate) layers: Vec<Rc<RefCell<LayerRecord>>>,
}

impl OwnerLog {
    /// The most recently created layer for `w`.
    pub(crate) fn layer_of(&self, w: WrapperId) -> Rc<RefCell<LayerRecord>> {
        let found = self
            .layers
            .iter()
            .rev()
            .find(|r| r.borrow().wrapper == w)
            .unwrap();
        Rc::clone(found)
    }
}

pub(crate) struct TestOwner {
    log: Rc<RefCell<OwnerLog>>,
    root_position: Point,
    budget: Option<usize>,
}

impl Owner for TestOwner {
    fn create_layer(&mut self, wrapper: WrapperId) -> Result<Box<dyn OwnedLayer>, LayerError> {
        let mut log = self.log.borrow_mut();
        if self.budget.is_some_and(|b| log.layers.len() >= b) {
            return Err(LayerError::Exhausted);
        }
        let record = Rc::new(RefCell::new(LayerRecord {
            wrapper,
            size: Size::ZERO,
            position: Point::ORIGIN,
            params: LayerParams::default(),
            resizes: 0,
            moves: 0,
            invalidations: 0,
            parameter_updates: 0,
            paints: 0,
            destroyed: false,
            dirty: true,
            content: TestCanvas::default(),
        }));
        log.layers.push(Rc::clone(&record));
        Ok(Box::new(TestLayer { record }))
    }

    fn root_position(&self) -> Point {
        self.root_position
    }

    fn on_layout_change(&mut self, element: ElementId) {
        self.log.borrow_mut().layout_changes.push(element);
    }

    fn on_root_invalidated(&mut self) {
        self.log.borrow_mut().root_invalidations += 1;
    }
}

pub(crate) fn tree() -> (LayoutTree, Rc<RefCell<OwnerLog>>) {
    tree_with(Point::ORIGIN, None)
}

pub(crate) fn tree_with(
    root_position: Point,
    budget: Option<usize>,
) -> (LayoutTree, Rc<RefCell<OwnerLog>>) {
    let log = Rc::new(RefCell::new(OwnerLog::default()));
    let owner = TestOwner {
        log: Rc::clone(&log),
        root_position,
        budget,
    };
    (LayoutTree::new(Box::new(owner)), log)
}

/// A draw modifier that fills its bounds with `color`, draws its content and
/// counts invocations.
pub(crate) fn counting_fill(color: Color) -> (Modifier, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let modifier = Modifier::draw(move |scope: &mut super::DrawScope<'_>| {
        c.set(c.get() + 1);
        let bounds = scope.bounds();
        scope.canvas().fill_rect(bounds, color);
        scope.draw_content();
    });
    (modifier, count)
}

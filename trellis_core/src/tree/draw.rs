// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing wrapper chains into a [`Canvas`].

use core::fmt;

use kurbo::{Point, Rect, Size};

use super::element::LayoutState;
use super::id::{INVALID, WrapperId};
use super::{LayoutTree, WrapperKind};
use crate::canvas::Canvas;
use crate::observe::{CellId, ROOT_SUBJECT, ReadScope, ScopeKind};
use crate::trace::DrawSkippedEvent;

/// Scope handed to a [`DrawModifier`](super::DrawModifier).
///
/// State read through [`ReadScope::read`] is tracked against the layer the
/// modifier paints into; changing it later invalidates that layer.
pub struct DrawScope<'a> {
    tree: &'a mut LayoutTree,
    canvas: &'a mut dyn Canvas,
    wrapper: u32,
    size: Size,
}

impl fmt::Debug for DrawScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawScope")
            .field("wrapper", &self.wrapper())
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl DrawScope<'_> {
    /// Returns the canvas, in the wrapper's local space.
    pub fn canvas(&mut self) -> &mut dyn Canvas {
        &mut *self.canvas
    }

    /// Returns the wrapper's measured size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns the wrapper's local bounds.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.size.to_rect()
    }

    /// Returns the wrapper being drawn.
    #[must_use]
    pub fn wrapper(&self) -> WrapperId {
        self.tree.wrapper_id(self.wrapper)
    }

    /// Draws the wrapped content at its position.
    pub fn draw_content(&mut self) {
        let wrapped = self.tree.wrappers.wrapped[self.wrapper as usize];
        if wrapped != INVALID {
            self.tree.draw_at(wrapped, &mut *self.canvas);
        }
    }
}

impl ReadScope for DrawScope<'_> {
    fn track(&mut self, cell: CellId) {
        self.tree.observer.record(cell);
    }
}

impl LayoutTree {
    /// Draws `w` and everything it wraps into `canvas`, in the coordinate
    /// space of `w`'s parent.
    ///
    /// A wrapper with a layer hands drawing to the layer, which repaints its
    /// content only when invalidated. Otherwise the canvas is translated by
    /// the wrapper position around the wrapper's own drawing.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or a layer repaints content of an
    /// element that is not laid out.
    pub fn draw(&mut self, w: WrapperId, canvas: &mut dyn Canvas) {
        self.validate_wrapper(w);
        self.draw_at(w.idx, canvas);
    }

    pub(crate) fn draw_at(&mut self, idx: u32, canvas: &mut dyn Canvas) {
        let i = idx as usize;
        if let Some(mut layer) = self.wrappers.layer[i].take() {
            layer.draw_layer(canvas, &mut |c| self.paint_layer_content(idx, c));
            self.wrappers.layer[i] = Some(layer);
        } else {
            let offset = self.wrappers.position[i].unwrap_or(Point::ORIGIN).to_vec2();
            canvas.translate(offset);
            self.perform_draw(idx, canvas);
            canvas.translate(-offset);
        }
    }

    /// Paints a layer's content, or skips it when the element is not placed.
    fn paint_layer_content(&mut self, idx: u32, canvas: &mut dyn Canvas) {
        let i = idx as usize;
        let e = self.wrappers.element[i];
        if !self.elements.placed[e as usize] {
            self.wrappers.drawing_skipped[i] = true;
            let wrapper = self.wrapper_id(idx);
            let element = self.element_id(e);
            log::trace!("skipped drawing {wrapper:?}: {element:?} is not placed");
            self.tracer
                .draw_skipped(&DrawSkippedEvent { wrapper, element });
            return;
        }
        self.wrappers.drawing_skipped[i] = false;
        let state = self.elements.layout_state[e as usize];
        assert!(
            state == LayoutState::Ready,
            "layer of {:?} redrawn for element {:?} in state {state:?}",
            self.wrapper_id(idx),
            self.element_id(e)
        );
        self.observer.begin(idx, ScopeKind::Paint);
        self.perform_draw(idx, canvas);
        self.observer.end();
    }

    /// Draws the wrapper's own content in its local space.
    fn perform_draw(&mut self, idx: u32, canvas: &mut dyn Canvas) {
        let i = idx as usize;
        let wrapped = self.wrappers.wrapped[i];
        match self.wrappers.kind[i].clone() {
            WrapperKind::Inner => {
                let e = self.wrappers.element[i];
                for child in self.paint_order(e) {
                    let outer = self.elements.outer[child as usize];
                    self.draw_at(outer, canvas);
                }
                self.draw_layout_bounds(idx, canvas);
            }
            WrapperKind::Draw(modifier) => {
                let size = self.wrappers.size[i].unwrap_or(Size::ZERO);
                let mut scope = DrawScope {
                    tree: self,
                    canvas,
                    wrapper: idx,
                    size,
                };
                modifier.draw(&mut scope);
            }
            WrapperKind::Layout(_) => {
                self.draw_at(wrapped, canvas);
                self.draw_layout_bounds(idx, canvas);
            }
            WrapperKind::PointerInput(_) | WrapperKind::Layer(_) => {
                self.draw_at(wrapped, canvas);
            }
        }
    }

    fn draw_layout_bounds(&self, idx: u32, canvas: &mut dyn Canvas) {
        if !self.config.show_layout_bounds {
            return;
        }
        let size = self.wrappers.size[idx as usize].unwrap_or(Size::ZERO);
        let rect = size.to_rect().inset(-0.5);
        canvas.stroke_rect(rect, 1.0, self.config.bounds_color);
    }

    /// Re-records the content of every stale layer in the attached tree,
    /// outer layers before the layers they contain.
    pub fn update_layers(&mut self) {
        for e in self.attached_preorder() {
            let mut cur = self.elements.outer[e as usize];
            while cur != INVALID {
                let i = cur as usize;
                if let Some(mut layer) = self.wrappers.layer[i].take() {
                    let idx = cur;
                    layer.update_display_list(&mut |c| self.paint_layer_content(idx, c));
                    self.wrappers.layer[i] = Some(layer);
                }
                cur = self.wrappers.wrapped[i];
            }
        }
    }

    /// Draws the whole attached tree into `canvas`.
    ///
    /// Stale layers are updated first. Reads made while drawing content that
    /// is not on any layer are tracked against the root.
    ///
    /// # Panics
    ///
    /// Panics if there is no root.
    pub fn draw_root(&mut self, canvas: &mut dyn Canvas) {
        assert!(self.root != INVALID, "draw without a root");
        self.update_layers();
        let outer = self.elements.outer[self.root as usize];
        self.observer.begin(ROOT_SUBJECT, ScopeKind::Paint);
        self.draw_at(outer, canvas);
        self.observer.end();
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use kurbo::{Point, Rect, Size, Vec2};

    use super::super::testing::{Op, TestCanvas, counting_fill, tree};
    use super::super::{
        DrawScope, ElementId, Fixed, LayoutTree, MeasureResult, MeasureScope, Modifier, Placement,
        TreeConfig,
    };
    use crate::canvas::Color;
    use crate::constraints::Constraints;
    use crate::observe::ReadScope;

    const VIEW: Constraints = Constraints::tight(Size::new(50.0, 50.0));

    /// A root placing its children at `(10, 5)` with z-index `-i`, skipping
    /// all of them while `hide` is set.
    fn parent(tree: &mut LayoutTree, hide: Rc<Cell<bool>>) -> ElementId {
        tree.create_element(
            move |scope: &mut MeasureScope<'_>, children: &[ElementId], c: Constraints| {
                let mut placements = Vec::new();
                for (i, &child) in children.iter().enumerate() {
                    scope.measure(child, Constraints::loose(c.max));
                    if !hide.get() {
                        placements.push(
                            Placement::new(child, Point::new(10.0, 5.0)).with_z_index(-(i as f64)),
                        );
                    }
                }
                MeasureResult::new(c.max, placements)
            },
        )
    }

    fn net_translation(canvas: &TestCanvas) -> Vec2 {
        canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Translate(v) => Some(*v),
                _ => None,
            })
            .fold(Vec2::ZERO, |a, b| a + b)
    }

    #[test]
    fn direct_drawing_translates_and_untranslates() {
        let (mut tree, _log) = tree();
        let root = parent(&mut tree, Rc::new(Cell::new(false)));
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        let (fill, count) = counting_fill(Color::RED);
        tree.set_modifiers(child, vec![fill]).unwrap();
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();

        let mut canvas = TestCanvas::default();
        tree.draw_root(&mut canvas);
        assert_eq!(count.get(), 1);
        assert_eq!(
            canvas.fills(),
            [(Rect::new(10.0, 5.0, 20.0, 15.0), Color::RED)]
        );
        assert_eq!(net_translation(&canvas), Vec2::ZERO);
    }

    #[test]
    fn siblings_draw_in_z_order() {
        let (mut tree, _log) = tree();
        let root = parent(&mut tree, Rc::new(Cell::new(false)));
        let (red, _) = counting_fill(Color::RED);
        let (black, _) = counting_fill(Color::BLACK);
        let first = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        let second = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.set_modifiers(first, vec![red]).unwrap();
        tree.set_modifiers(second, vec![black]).unwrap();
        tree.insert_child(root, first).unwrap();
        tree.insert_child(root, second).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();

        let mut canvas = TestCanvas::default();
        tree.draw_root(&mut canvas);
        let colors: Vec<_> = canvas.fills().into_iter().map(|(_, c)| c).collect();
        assert_eq!(colors, [Color::BLACK, Color::RED]);
    }

    #[test]
    fn layer_repaints_only_when_invalidated() {
        let (mut tree, log) = tree();
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        let (fill, count) = counting_fill(Color::RED);
        tree.set_modifiers(e, vec![Modifier::layer(|_| {}), fill])
            .unwrap();
        tree.set_root(e).unwrap();
        tree.layout_root(VIEW).unwrap();

        let mut canvas = TestCanvas::default();
        tree.draw_root(&mut canvas);
        tree.draw_root(&mut canvas);
        assert_eq!(count.get(), 1);

        let draw = tree.wrapped(tree.outer_wrapper(e)).unwrap();
        tree.invalidate_layer(draw);
        tree.draw_root(&mut TestCanvas::default());
        assert_eq!(count.get(), 2);
        assert_eq!(log.borrow().layer_of(draw).borrow().paints, 2);
    }

    #[test]
    fn unplaced_layer_skips_paint_until_placed() {
        let (mut tree, _log) = tree();
        let hide = Rc::new(Cell::new(false));
        let root = parent(&mut tree, Rc::clone(&hide));
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        let (fill, count) = counting_fill(Color::RED);
        tree.set_modifiers(child, vec![Modifier::layer(|_| {}), fill])
            .unwrap();
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();
        tree.draw_root(&mut TestCanvas::default());
        assert_eq!(count.get(), 1);

        hide.set(true);
        tree.layout_root(VIEW).unwrap();
        assert!(!tree.is_placed(child));
        let draw = tree.wrapped(tree.outer_wrapper(child)).unwrap();
        tree.invalidate_layer(draw);
        tree.draw_root(&mut TestCanvas::default());
        assert_eq!(count.get(), 1);
        assert!(tree.last_layer_drawing_was_skipped(draw));

        tree.invalidate_layer(draw);
        tree.update_layers();
        assert_eq!(count.get(), 1);
        assert!(tree.last_layer_drawing_was_skipped(draw));

        hide.set(false);
        tree.layout_root(VIEW).unwrap();
        assert!(!tree.last_layer_drawing_was_skipped(draw));
        tree.draw_root(&mut TestCanvas::default());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn paint_reads_repaint_only() {
        let (mut tree, log) = tree();
        let color = tree.state(Color::RED);
        let read = color.clone();
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.set_modifiers(
            e,
            vec![
                Modifier::layer(|_| {}),
                Modifier::draw(move |s: &mut DrawScope<'_>| {
                    let c = s.read(&read);
                    let bounds = s.bounds();
                    s.canvas().fill_rect(bounds, c);
                }),
            ],
        )
        .unwrap();
        tree.set_root(e).unwrap();
        tree.layout_root(VIEW).unwrap();
        tree.draw_root(&mut TestCanvas::default());

        let draw = tree.wrapped(tree.outer_wrapper(e)).unwrap();
        let layer = log.borrow().layer_of(draw);
        let updates = layer.borrow().parameter_updates;

        color.set(Color::BLACK);
        let applied = tree.apply_state_changes();
        assert_eq!(applied.repaints, vec![draw]);
        assert!(applied.parameters.is_empty());
        assert_eq!(layer.borrow().parameter_updates, updates);
        assert!(layer.borrow().dirty);

        let mut canvas = TestCanvas::default();
        tree.draw_root(&mut canvas);
        assert_eq!(canvas.fills()[0].1, Color::BLACK);
    }

    #[test]
    fn paint_reads_outside_layers_invalidate_root() {
        let (mut tree, log) = tree();
        let color = tree.state(Color::RED);
        let read = color.clone();
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.set_modifiers(
            e,
            vec![Modifier::draw(move |s: &mut DrawScope<'_>| {
                let c = s.read(&read);
                let bounds = s.bounds();
                s.canvas().fill_rect(bounds, c);
            })],
        )
        .unwrap();
        tree.set_root(e).unwrap();
        tree.layout_root(VIEW).unwrap();
        tree.draw_root(&mut TestCanvas::default());

        let repaints = log.borrow().root_invalidations;
        color.set(Color::BLACK);
        let applied = tree.apply_state_changes();
        assert!(applied.root);
        assert_eq!(log.borrow().root_invalidations, repaints + 1);
    }

    #[test]
    fn layout_bounds_are_stroked_when_enabled() {
        let (mut tree, _log) = tree();
        tree.set_config(TreeConfig {
            show_layout_bounds: true,
            ..TreeConfig::default()
        });
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.set_root(e).unwrap();
        tree.layout_root(Constraints::loose(Size::new(50.0, 50.0)))
            .unwrap();

        let mut canvas = TestCanvas::default();
        tree.draw_root(&mut canvas);
        assert!(canvas.ops.contains(&Op::Stroke(
            Rect::new(0.5, 0.5, 9.5, 9.5),
            1.0,
            Color::MAGENTA
        )));
    }

    #[test]
    #[should_panic(expected = "redrawn for element")]
    fn repainting_mid_layout_panics() {
        let (mut tree, _log) = tree();
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        let (fill, _) = counting_fill(Color::RED);
        tree.set_modifiers(e, vec![Modifier::layer(|_| {}), fill])
            .unwrap();
        tree.set_root(e).unwrap();
        tree.layout_root(VIEW).unwrap();

        tree.set_measure_policy(e, Fixed(Size::new(20.0, 20.0)));
        let draw = tree.wrapped(tree.outer_wrapper(e)).unwrap();
        tree.invalidate_layer(draw);
        tree.update_layers();
    }
}

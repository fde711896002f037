// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded drawing commands.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;

use kurbo::{Point, Rect, Vec2};
use trellis_core::canvas::{Canvas, Color};
use trellis_core::transform::Transform3d;

/// A single recorded canvas call.
#[derive(Clone, Debug)]
pub enum DrawCommand {
    /// [`Canvas::translate`].
    Translate(Vec2),
    /// [`Canvas::save`].
    Save,
    /// [`Canvas::restore`].
    Restore,
    /// [`Canvas::concat`].
    Concat(Transform3d),
    /// [`Canvas::clip_rect`].
    ClipRect(Rect),
    /// [`Canvas::set_alpha`].
    SetAlpha(f64),
    /// [`Canvas::fill_rect`].
    Fill(Rect, Color),
    /// [`Canvas::stroke_rect`].
    Stroke {
        /// The outlined rectangle.
        rect: Rect,
        /// Stroke width.
        width: f64,
        /// Stroke color.
        color: Color,
    },
    /// A nested layer, drawn with its current properties and content.
    Layer(Rc<RefCell<RetainedLayer>>),
}

/// A layer's compositing properties and retained content.
///
/// Shared between the owning [`RecordingLayer`](crate::RecordingLayer) and
/// every display list that references it, so moving or re-parameterizing the
/// layer takes effect without recording those lists again.
#[derive(Clone, Debug)]
pub struct RetainedLayer {
    /// Offset in the parent's coordinate space.
    pub position: Point,
    /// Layer matrix applied after the offset.
    pub matrix: Transform3d,
    /// Opacity multiplier.
    pub alpha: f64,
    /// Clip in layer-local coordinates.
    pub clip: Option<Rect>,
    /// The recorded content.
    pub content: DisplayList,
}

impl Default for RetainedLayer {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            matrix: Transform3d::IDENTITY,
            alpha: 1.0,
            clip: None,
            content: DisplayList::new(),
        }
    }
}

impl RetainedLayer {
    /// Issues the layer against `canvas` inside a save/restore pair.
    pub fn draw_into(&self, canvas: &mut dyn Canvas) {
        canvas.save();
        canvas.translate(self.position.to_vec2());
        if !self.matrix.is_identity() {
            canvas.concat(&self.matrix);
        }
        if self.alpha < 1.0 {
            canvas.set_alpha(self.alpha);
        }
        if let Some(clip) = self.clip {
            canvas.clip_rect(clip);
        }
        self.content.replay(canvas);
        canvas.restore();
    }
}

/// A fill resolved to device space by [`DisplayList::flatten`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatFill {
    /// Bounding box of the filled area after transform and clip.
    pub rect: Rect,
    /// Fill color.
    pub color: Color,
    /// Accumulated alpha.
    pub alpha: f64,
}

/// An ordered list of canvas commands.
///
/// Recording into a display list never rasterizes. When a
/// [`RecordingLayer`](crate::RecordingLayer) draws into one, it adds a
/// [`DrawCommand::Layer`] reference to its own content rather than a copy.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

#[derive(Clone, Copy)]
struct State {
    transform: Transform3d,
    clip: Option<Rect>,
    alpha: f64,
}

impl DisplayList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded commands.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Clears the list for reuse.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Appends a reference to a retained layer.
    pub fn push_layer(&mut self, layer: Rc<RefCell<RetainedLayer>>) {
        self.commands.push(DrawCommand::Layer(layer));
    }

    /// Issues every command against `canvas`, expanding nested layers.
    pub fn replay(&self, canvas: &mut dyn Canvas) {
        for command in &self.commands {
            match command {
                DrawCommand::Translate(v) => canvas.translate(*v),
                DrawCommand::Save => canvas.save(),
                DrawCommand::Restore => canvas.restore(),
                DrawCommand::Concat(t) => canvas.concat(t),
                DrawCommand::ClipRect(r) => canvas.clip_rect(*r),
                DrawCommand::SetAlpha(a) => canvas.set_alpha(*a),
                DrawCommand::Fill(r, c) => canvas.fill_rect(*r, *c),
                DrawCommand::Stroke { rect, width, color } => {
                    canvas.stroke_rect(*rect, *width, *color);
                }
                DrawCommand::Layer(layer) => layer.borrow().draw_into(canvas),
            }
        }
    }

    /// Resolves every fill to device space, back to front.
    ///
    /// Clips are tracked as device-space bounding boxes, so a clip under a
    /// rotation is approximated by its bounds. Fills clipped away entirely
    /// are dropped.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatFill> {
        let mut out = Vec::new();
        let mut state = State {
            transform: Transform3d::IDENTITY,
            clip: None,
            alpha: 1.0,
        };
        let mut stack = Vec::new();
        self.flatten_into(&mut state, &mut stack, &mut out);
        out
    }

    fn flatten_into(&self, state: &mut State, stack: &mut Vec<State>, out: &mut Vec<FlatFill>) {
        for command in &self.commands {
            match command {
                DrawCommand::Translate(v) => {
                    state.transform =
                        state.transform * Transform3d::from_translation(v.x, v.y, 0.0);
                }
                DrawCommand::Save => stack.push(*state),
                DrawCommand::Restore => match stack.pop() {
                    Some(saved) => *state = saved,
                    None => log::warn!("unbalanced restore in display list"),
                },
                DrawCommand::Concat(t) => state.transform = state.transform * *t,
                DrawCommand::ClipRect(r) => {
                    let device = state.transform.transform_rect_bbox(*r);
                    state.clip = Some(state.clip.map_or(device, |c| c.intersect(device)));
                }
                DrawCommand::SetAlpha(a) => state.alpha *= a,
                DrawCommand::Fill(r, color) => {
                    let mut rect = state.transform.transform_rect_bbox(*r);
                    if let Some(clip) = state.clip {
                        rect = rect.intersect(clip);
                    }
                    if rect.area() > 0.0 {
                        out.push(FlatFill {
                            rect,
                            color: *color,
                            alpha: state.alpha,
                        });
                    }
                }
                DrawCommand::Stroke { .. } => {}
                DrawCommand::Layer(layer) => {
                    let layer = layer.borrow();
                    let saved = *state;
                    let p = layer.position;
                    state.transform = state.transform
                        * Transform3d::from_translation(p.x, p.y, 0.0)
                        * layer.matrix;
                    state.alpha *= layer.alpha;
                    if let Some(clip) = layer.clip {
                        let device = state.transform.transform_rect_bbox(clip);
                        state.clip = Some(state.clip.map_or(device, |c| c.intersect(device)));
                    }
                    layer.content.flatten_into(state, stack, out);
                    *state = saved;
                }
            }
        }
    }
}

impl Canvas for DisplayList {
    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn concat(&mut self, transform: &Transform3d) {
        self.commands.push(DrawCommand::Concat(*transform));
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::ClipRect(rect));
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.commands.push(DrawCommand::SetAlpha(alpha));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Fill(rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, width: f64, color: Color) {
        self.commands
            .push(DrawCommand::Stroke { rect, width, color });
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}

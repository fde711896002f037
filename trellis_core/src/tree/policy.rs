// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind hooks: element measure policies and modifiers.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Size, Vec2};

use super::draw::DrawScope;
use super::id::ElementId;
use super::LayoutTree;
use crate::constraints::Constraints;
use crate::layer::LayerConfig;

/// Where a measure policy puts one child.
#[derive(Clone, Debug)]
pub struct Placement {
    /// The child element. Must be a child of the measuring element.
    pub element: ElementId,
    /// Position of the child's outer wrapper in the parent's inner space.
    pub position: Point,
    /// Paint order among siblings; higher draws later and is hit first.
    pub z_index: f64,
    /// Layer config for the child's outer wrapper.
    pub layer: Option<LayerConfig>,
}

impl Placement {
    /// Places `element` at `position` with z-index 0 and no layer.
    #[must_use]
    pub fn new(element: ElementId, position: Point) -> Self {
        Self {
            element,
            position,
            z_index: 0.0,
            layer: None,
        }
    }

    /// Sets the z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: f64) -> Self {
        self.z_index = z_index;
        self
    }

    /// Places the child on its own layer.
    #[must_use]
    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layer = Some(layer);
        self
    }
}

/// What a [`MeasurePolicy`] reports.
#[derive(Clone, Debug, Default)]
pub struct MeasureResult {
    /// The element's inner size.
    pub size: Size,
    /// Children to place, applied when the element is placed.
    pub placements: Vec<Placement>,
}

impl MeasureResult {
    /// A result without children.
    #[must_use]
    pub fn leaf(size: Size) -> Self {
        Self {
            size,
            placements: Vec::new(),
        }
    }

    /// A result placing `placements`.
    #[must_use]
    pub fn new(size: Size, placements: Vec<Placement>) -> Self {
        Self { size, placements }
    }
}

/// Gives a [`MeasurePolicy`] access to its children.
pub struct MeasureScope<'a> {
    pub(crate) tree: &'a mut LayoutTree,
    pub(crate) element: u32,
}

impl fmt::Debug for MeasureScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasureScope")
            .field("element", &self.tree.element_id(self.element))
            .finish_non_exhaustive()
    }
}

impl MeasureScope<'_> {
    /// Returns the element being measured.
    #[must_use]
    pub fn element(&self) -> ElementId {
        self.tree.element_id(self.element)
    }

    /// Measures `child` through its whole wrapper chain.
    ///
    /// # Panics
    ///
    /// Panics if `child` is stale or not a child of the measuring element.
    pub fn measure(&mut self, child: ElementId, constraints: Constraints) -> Size {
        self.tree.validate_element(child);
        assert!(
            self.tree.elements.parent[child.idx as usize] == self.element,
            "{child:?} is not a child of {:?}",
            self.tree.element_id(self.element)
        );
        let outer = self.tree.elements.outer[child.idx as usize];
        self.tree.measure_at(outer, constraints)
    }
}

/// Measurement logic of an element (its innermost wrapper).
pub trait MeasurePolicy {
    /// Measures `children` under `constraints` and decides their placement.
    fn measure(
        &self,
        scope: &mut MeasureScope<'_>,
        children: &[ElementId],
        constraints: Constraints,
    ) -> MeasureResult;
}

impl<F> MeasurePolicy for F
where
    F: Fn(&mut MeasureScope<'_>, &[ElementId], Constraints) -> MeasureResult,
{
    fn measure(
        &self,
        scope: &mut MeasureScope<'_>,
        children: &[ElementId],
        constraints: Constraints,
    ) -> MeasureResult {
        self(scope, children, constraints)
    }
}

/// Result of a [`LayoutModifier`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifierLayout {
    /// Size of the modifier wrapper.
    pub size: Size,
    /// Where the wrapped wrapper sits inside it.
    pub wrapped_position: Point,
}

/// A modifier that changes constraints, size and the wrapped position.
pub trait LayoutModifier {
    /// Constraints to measure the wrapped wrapper with.
    fn wrapped_constraints(&self, constraints: Constraints) -> Constraints {
        constraints
    }

    /// Derives this wrapper's size and the wrapped position from the
    /// wrapped size.
    fn layout(&self, constraints: Constraints, wrapped: Size) -> ModifierLayout;
}

/// A modifier that paints around (or instead of) the wrapped content.
pub trait DrawModifier {
    /// Paints. Call [`DrawScope::draw_content`] to paint the wrapped content.
    fn draw(&self, scope: &mut DrawScope<'_>);
}

impl<F> DrawModifier for F
where
    F: Fn(&mut DrawScope<'_>),
{
    fn draw(&self, scope: &mut DrawScope<'_>) {
        self(scope);
    }
}

/// Opaque token identifying a pointer input handler.
///
/// Hit testing only collects filters; dispatch belongs to the host.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerInputFilter(pub u64);

impl fmt::Debug for PointerInputFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointerInputFilter({})", self.0)
    }
}

/// One segment of an element's modifier chain.
///
/// Each modifier becomes one wrapper; the first modifier is the outermost.
#[derive(Clone)]
pub enum Modifier {
    /// Changes measurement and the wrapped position.
    Layout(Rc<dyn LayoutModifier>),
    /// Paints around the wrapped content.
    Draw(Rc<dyn DrawModifier>),
    /// Collects a filter during hit testing when the pointer is in bounds.
    PointerInput(PointerInputFilter),
    /// Puts everything it wraps on a layer configured by the callback.
    Layer(LayerConfig),
}

impl Modifier {
    /// A [`LayoutModifier`] segment.
    pub fn layout(modifier: impl LayoutModifier + 'static) -> Self {
        Self::Layout(Rc::new(modifier))
    }

    /// A [`DrawModifier`] segment.
    pub fn draw(modifier: impl DrawModifier + 'static) -> Self {
        Self::Draw(Rc::new(modifier))
    }

    /// A layer segment.
    pub fn layer(config: impl Fn(&mut crate::layer::LayerScope<'_>) + 'static) -> Self {
        Self::Layer(LayerConfig::new(config))
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(_) => f.write_str("Layout"),
            Self::Draw(_) => f.write_str("Draw"),
            Self::PointerInput(filter) => f.debug_tuple("PointerInput").field(filter).finish(),
            Self::Layer(config) => f.debug_tuple("Layer").field(config).finish(),
        }
    }
}

// -- Built-in modifiers and policies --

/// Insets the wrapped content.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Padding {
    /// Left inset.
    pub left: f64,
    /// Top inset.
    pub top: f64,
    /// Right inset.
    pub right: f64,
    /// Bottom inset.
    pub bottom: f64,
}

impl Padding {
    /// The same inset on every side.
    #[must_use]
    pub const fn all(v: f64) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }
}

impl LayoutModifier for Padding {
    fn wrapped_constraints(&self, constraints: Constraints) -> Constraints {
        constraints.deflate(self.left + self.right, self.top + self.bottom)
    }

    fn layout(&self, constraints: Constraints, wrapped: Size) -> ModifierLayout {
        let size = Size::new(
            wrapped.width + self.left + self.right,
            wrapped.height + self.top + self.bottom,
        );
        ModifierLayout {
            size: constraints.constrain(size),
            wrapped_position: Point::new(self.left, self.top),
        }
    }
}

/// Shifts the wrapped content without changing the size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset(pub Vec2);

impl LayoutModifier for Offset {
    fn layout(&self, _constraints: Constraints, wrapped: Size) -> ModifierLayout {
        ModifierLayout {
            size: wrapped,
            wrapped_position: self.0.to_point(),
        }
    }
}

/// A leaf policy with a preferred size, clamped to the constraints.
///
/// Children, if any, are measured loosely against the resulting size and
/// stacked at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fixed(pub Size);

impl MeasurePolicy for Fixed {
    fn measure(
        &self,
        scope: &mut MeasureScope<'_>,
        children: &[ElementId],
        constraints: Constraints,
    ) -> MeasureResult {
        let size = constraints.constrain(self.0);
        let placements = children
            .iter()
            .map(|&child| {
                scope.measure(child, Constraints::loose(size));
                Placement::new(child, Point::ORIGIN)
            })
            .collect();
        MeasureResult::new(size, placements)
    }
}

/// Stacks children at the origin, sized to the largest child.
///
/// Later children get higher z-indices.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stack;

impl MeasurePolicy for Stack {
    fn measure(
        &self,
        scope: &mut MeasureScope<'_>,
        children: &[ElementId],
        constraints: Constraints,
    ) -> MeasureResult {
        let loose = Constraints::loose(constraints.max);
        let mut size = Size::ZERO;
        let mut placements = Vec::with_capacity(children.len());
        for (i, &child) in children.iter().enumerate() {
            let s = scope.measure(child, loose);
            size = Size::new(size.width.max(s.width), size.height.max(s.height));
            placements.push(Placement::new(child, Point::ORIGIN).with_z_index(i as f64));
        }
        MeasureResult::new(constraints.constrain(size), placements)
    }
}

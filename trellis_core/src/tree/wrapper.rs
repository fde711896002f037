// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measure and place: the core wrapper-chain protocol.
//!
//! Constraints flow inward: each wrapper records them and measures its
//! wrapped wrapper (layout modifiers may change them on the way), until the
//! inner wrapper runs the element's [`MeasurePolicy`](super::MeasurePolicy).
//! Sizes flow back outward through [`LayoutTree::measure`].
//!
//! Placement flows the same way: placing a wrapper first settles its layer
//! config, then moves it, then places its wrapped wrapper (or, for the inner
//! wrapper, the child elements the policy chose).

use alloc::vec::Vec;

use kurbo::{Point, Size};

use super::element::LayoutState;
use super::id::{INVALID, WrapperId};
use super::policy::{MeasureScope, ModifierLayout};
use super::{LayoutTree, WrapperKind};
use crate::constraints::Constraints;
use crate::error::Result;
use crate::layer::LayerConfig;
use crate::trace::{MeasureEvent, PlaceEvent};

impl LayoutTree {
    // -- Measure --

    /// Measures `w` (and everything it wraps) under `constraints`.
    ///
    /// Re-measuring is always allowed. A size change resizes the wrapper's
    /// layer, or invalidates the layer around it, and notifies the owner.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the wrapper is detached, or a policy
    /// reports a negative size.
    pub fn measure(&mut self, w: WrapperId, constraints: Constraints) -> Size {
        self.validate_wrapper(w);
        self.measure_at(w.idx, constraints)
    }

    pub(crate) fn measure_at(&mut self, idx: u32, constraints: Constraints) -> Size {
        let i = idx as usize;
        assert!(
            self.wrappers.attached[i],
            "measure on detached wrapper {:?}",
            self.wrapper_id(idx)
        );
        self.wrappers.constraints[i] = Some(constraints);
        let e = self.wrappers.element[i];
        let is_outer = self.elements.outer[e as usize] == idx;
        if is_outer {
            self.elements.layout_state[e as usize] = LayoutState::Measuring;
        }

        let wrapped = self.wrappers.wrapped[i];
        let size = match self.wrappers.kind[i].clone() {
            WrapperKind::Inner => self.measure_inner(e, constraints),
            WrapperKind::Layout(modifier) => {
                let inner_size =
                    self.measure_at(wrapped, modifier.wrapped_constraints(constraints));
                let ModifierLayout {
                    size,
                    wrapped_position,
                } = modifier.layout(constraints, inner_size);
                self.wrappers.wrapped_position[i] = wrapped_position;
                size
            }
            WrapperKind::Draw(_) | WrapperKind::PointerInput(_) | WrapperKind::Layer(_) => {
                self.wrappers.wrapped_position[i] = Point::ORIGIN;
                self.measure_at(wrapped, constraints)
            }
        };
        self.set_measured_size(idx, size, constraints);

        if is_outer {
            self.elements.layout_state[e as usize] = LayoutState::NeedsRelayout;
        }
        size
    }

    fn measure_inner(&mut self, e: u32, constraints: Constraints) -> Size {
        let policy = self.elements.policy[e as usize].clone();
        let children: Vec<_> = self
            .child_slots(e)
            .into_iter()
            .map(|c| self.element_id(c))
            .collect();
        let result = {
            let mut scope = MeasureScope {
                tree: self,
                element: e,
            };
            policy.measure(&mut scope, &children, constraints)
        };
        self.elements.placements[e as usize] = result.placements;
        result.size
    }

    /// Stores a measurement result.
    fn set_measured_size(&mut self, idx: u32, size: Size, constraints: Constraints) {
        let i = idx as usize;
        assert!(
            size.width >= 0.0 && size.height >= 0.0,
            "negative size {size:?} measured for {:?}",
            self.wrapper_id(idx)
        );
        let old = self.wrappers.size[i].unwrap_or(Size::ZERO);
        self.wrappers.size[i] = Some(size);
        let changed = old != size;
        if changed {
            if let Some(layer) = self.wrappers.layer[i].as_mut() {
                layer.resize(size);
            } else {
                self.invalidate_outer(idx);
            }
            let e = self.element_id(self.wrappers.element[i]);
            self.owner.on_layout_change(e);
        }
        let wrapper = self.wrapper_id(idx);
        self.tracer.measure(&MeasureEvent {
            wrapper,
            constraints,
            size,
            changed,
        });
    }

    // -- Place --

    /// Places `w` at `position` in its parent space.
    ///
    /// The layer config is applied first (creating, updating or destroying
    /// the layer). If the position changed, the layer moves (or the layer
    /// around the wrapper is invalidated) and the owner is notified; placing
    /// at the current position does neither. Then the wrapped content is
    /// placed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayerCreation`](crate::Error::LayerCreation) when a
    /// layer is needed and the owner cannot create one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the wrapper is detached or has not been
    /// measured, or a policy places an element that is not its child.
    pub fn place(
        &mut self,
        w: WrapperId,
        position: Point,
        z_index: f64,
        layer: Option<LayerConfig>,
    ) -> Result<()> {
        self.validate_wrapper(w);
        self.place_at(w.idx, position, z_index, layer)
    }

    pub(crate) fn place_at(
        &mut self,
        idx: u32,
        position: Point,
        z_index: f64,
        layer: Option<LayerConfig>,
    ) -> Result<()> {
        let i = idx as usize;
        assert!(
            self.wrappers.attached[i],
            "place on detached wrapper {:?}",
            self.wrapper_id(idx)
        );
        assert!(
            self.wrappers.size[i].is_some(),
            "place before measure on {:?}",
            self.wrapper_id(idx)
        );

        self.update_layer_config(idx, layer)?;

        let old = self.wrappers.position[i].unwrap_or(Point::ORIGIN);
        self.wrappers.position[i] = Some(position);
        let moved = old != position;
        if moved {
            if let Some(layer) = self.wrappers.layer[i].as_mut() {
                layer.move_to(position);
            } else {
                self.invalidate_outer(idx);
            }
            let e = self.element_id(self.wrappers.element[i]);
            self.owner.on_layout_change(e);
        }

        let e = self.wrappers.element[i];
        let z_changed = self.wrappers.z_index[i] != z_index;
        self.wrappers.z_index[i] = z_index;
        // Paint order among siblings changed. A move only repaints the parent
        // when there is no layer to move instead.
        if z_changed
            && self.elements.outer[e as usize] == idx
            && (!moved || self.wrappers.layer[i].is_some())
        {
            self.invalidate_outer(idx);
        }

        let wrapper = self.wrapper_id(idx);
        self.tracer.place(&PlaceEvent {
            wrapper,
            position,
            z_index,
            moved,
        });
        self.place_content(idx)
    }

    fn place_content(&mut self, idx: u32) -> Result<()> {
        let i = idx as usize;
        let wrapped = self.wrappers.wrapped[i];
        match self.wrappers.kind[i].clone() {
            WrapperKind::Inner => self.place_children(self.wrappers.element[i]),
            WrapperKind::Layer(config) => {
                self.place_at(wrapped, self.wrappers.wrapped_position[i], 0.0, Some(config))
            }
            WrapperKind::Layout(_) | WrapperKind::Draw(_) | WrapperKind::PointerInput(_) => {
                self.place_at(wrapped, self.wrappers.wrapped_position[i], 0.0, None)
            }
        }
    }

    fn place_children(&mut self, e: u32) -> Result<()> {
        self.elements.layout_state[e as usize] = LayoutState::LayingOut;
        let previously_placed: Vec<u32> = self
            .child_slots(e)
            .into_iter()
            .filter(|&c| self.elements.placed[c as usize])
            .collect();
        for &c in &previously_placed {
            self.elements.placed[c as usize] = false;
        }

        let placements = self.elements.placements[e as usize].clone();
        for placement in placements {
            self.validate_element(placement.element);
            let c = placement.element.idx;
            assert!(
                self.elements.parent[c as usize] == e,
                "placed {:?} is not a child of {:?}",
                placement.element,
                self.element_id(e)
            );
            self.elements.placed[c as usize] = true;
            let outer = self.elements.outer[c as usize];
            if let Err(err) = self.place_at(
                outer,
                placement.position,
                placement.z_index,
                placement.layer,
            ) {
                self.elements.placed[c as usize] = false;
                self.elements.layout_state[e as usize] = LayoutState::NeedsRemeasure;
                return Err(err);
            }
            self.repaint_skipped(c);
        }

        if previously_placed
            .iter()
            .any(|&c| !self.elements.placed[c as usize])
        {
            let inner = self.elements.inner[e as usize];
            self.invalidate_layer_at(inner);
        }
        self.elements.layout_state[e as usize] = LayoutState::Ready;
        Ok(())
    }

    /// Invalidates layers of `e` that skipped their last paint because the
    /// element was not placed.
    fn repaint_skipped(&mut self, e: u32) {
        let mut cur = self.elements.outer[e as usize];
        while cur != INVALID {
            let i = cur as usize;
            if self.wrappers.drawing_skipped[i] {
                self.wrappers.drawing_skipped[i] = false;
                if self.wrappers.layer[i].is_some() {
                    log::trace!("repainting skipped layer of {:?}", self.wrapper_id(cur));
                    self.invalidate_layer_at(cur);
                }
            }
            cur = self.wrappers.wrapped[i];
        }
    }

    /// Measures the root under `constraints` and places it at the origin.
    ///
    /// # Errors
    ///
    /// Propagates layer creation failures from placement.
    ///
    /// # Panics
    ///
    /// Panics if there is no root.
    pub fn layout_root(&mut self, constraints: Constraints) -> Result<Size> {
        assert!(self.root != INVALID, "layout without a root");
        let root = self.root;
        let outer = self.elements.outer[root as usize];
        let size = self.measure_at(outer, constraints);
        self.elements.placed[root as usize] = true;
        let position = self.wrappers.position[outer as usize].unwrap_or(Point::ORIGIN);
        self.place_at(outer, position, 0.0, None)?;
        self.repaint_skipped(root);
        Ok(size)
    }

    // -- Accessors --

    /// Returns the measured size.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper was never measured.
    #[must_use]
    pub fn size(&self, w: WrapperId) -> Size {
        self.validate_wrapper(w);
        match self.wrappers.size[w.idx as usize] {
            Some(size) => size,
            None => panic!("unmeasured wrapper {w:?}"),
        }
    }

    /// Returns the position assigned by the last placement.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper was never placed.
    #[must_use]
    pub fn position(&self, w: WrapperId) -> Point {
        self.validate_wrapper(w);
        match self.wrappers.position[w.idx as usize] {
            Some(position) => position,
            None => panic!("unplaced wrapper {w:?}"),
        }
    }

    /// Returns the measured size, or `None` before the first measurement.
    #[must_use]
    pub fn try_size(&self, w: WrapperId) -> Option<Size> {
        self.validate_wrapper(w);
        self.wrappers.size[w.idx as usize]
    }

    /// Returns the placed position, or `None` before the first placement.
    #[must_use]
    pub fn try_position(&self, w: WrapperId) -> Option<Point> {
        self.validate_wrapper(w);
        self.wrappers.position[w.idx as usize]
    }

    /// Returns the z-index from the last placement.
    #[must_use]
    pub fn z_index(&self, w: WrapperId) -> f64 {
        self.validate_wrapper(w);
        self.wrappers.z_index[w.idx as usize]
    }

    /// Returns the constraints of the last measurement.
    #[must_use]
    pub fn constraints(&self, w: WrapperId) -> Option<Constraints> {
        self.validate_wrapper(w);
        self.wrappers.constraints[w.idx as usize]
    }

    /// Returns the next wrapper inward, if any.
    #[must_use]
    pub fn wrapped(&self, w: WrapperId) -> Option<WrapperId> {
        self.validate_wrapper(w);
        let next = self.wrappers.wrapped[w.idx as usize];
        (next != INVALID).then(|| self.wrapper_id(next))
    }

    /// Returns the next wrapper outward, crossing into the parent element's
    /// inner wrapper at the outer end of a chain.
    #[must_use]
    pub fn wrapped_by(&self, w: WrapperId) -> Option<WrapperId> {
        self.validate_wrapper(w);
        let next = self.wrappers.wrapped_by[w.idx as usize];
        (next != INVALID).then(|| self.wrapper_id(next))
    }

    /// Returns whether the wrapper is attached.
    #[must_use]
    pub fn is_wrapper_attached(&self, w: WrapperId) -> bool {
        self.validate_wrapper(w);
        self.wrappers.attached[w.idx as usize]
    }
}

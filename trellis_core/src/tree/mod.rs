// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays storage for elements and their wrapper chains.
//!
//! Every element owns a strictly linear chain of wrappers, outermost first:
//!
//! ```text
//!   parent inner ◄─wrapped_by─ outer ─wrapped─► ... ─wrapped─► inner
//!                                                                │
//!                                                        child elements
//! ```
//!
//! `wrapped` links own the next wrapper inward; `wrapped_by` links are plain
//! indices pointing outward, and for an element's outermost wrapper they
//! point at the parent element's innermost wrapper. Elements are linked to
//! each other through parent and sibling indices like any tree.
//!
//! Both arenas recycle slots through free lists, and generation counters
//! make stale [`ElementId`]/[`WrapperId`] handles panic on use.

mod coords;
mod draw;
mod element;
mod hit;
mod id;
mod layers;
mod policy;
#[cfg(test)]
mod testing;
mod traverse;
mod wrapper;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Size};

use crate::canvas::Color;
use crate::constraints::Constraints;
use crate::layer::{LayerConfig, OwnedLayer};
use crate::observe::{Observer, ROOT_SUBJECT, StateCell};
use crate::owner::Owner;
use crate::trace::{TraceSink, Tracer};

pub use draw::DrawScope;
pub use element::LayoutState;
pub use id::{ElementId, INVALID, WrapperId};
pub use policy::{
    DrawModifier, Fixed, LayoutModifier, MeasurePolicy, MeasureResult, MeasureScope, Modifier,
    ModifierLayout, Offset, Padding, Placement, PointerInputFilter, Stack,
};
pub use traverse::{Chain, Children};

/// Runtime options for a [`LayoutTree`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeConfig {
    /// Stroke the bounds of every element and layout modifier while drawing.
    pub show_layout_bounds: bool,
    /// Color of the layout-bounds stroke.
    pub bounds_color: Color,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            show_layout_bounds: false,
            bounds_color: Color::MAGENTA,
        }
    }
}

/// What a wrapper does, with its kind-specific data.
#[derive(Clone)]
pub enum WrapperKind {
    /// The innermost wrapper: runs the element's [`MeasurePolicy`] and hosts
    /// the child elements.
    Inner,
    /// A [`LayoutModifier`].
    Layout(Rc<dyn LayoutModifier>),
    /// A [`DrawModifier`].
    Draw(Rc<dyn DrawModifier>),
    /// A pointer input filter.
    PointerInput(PointerInputFilter),
    /// Hands its layer config to the wrapped wrapper on placement.
    Layer(LayerConfig),
}

impl WrapperKind {
    /// Short name of the kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Layout(_) => "layout",
            Self::Draw(_) => "draw",
            Self::PointerInput(_) => "pointer-input",
            Self::Layer(_) => "layer",
        }
    }
}

impl fmt::Debug for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointerInput(filter) => f.debug_tuple("PointerInput").field(filter).finish(),
            Self::Layer(config) => f.debug_tuple("Layer").field(config).finish(),
            other => f.write_str(other.name()),
        }
    }
}

impl From<Modifier> for WrapperKind {
    fn from(modifier: Modifier) -> Self {
        match modifier {
            Modifier::Layout(m) => Self::Layout(m),
            Modifier::Draw(m) => Self::Draw(m),
            Modifier::PointerInput(filter) => Self::PointerInput(filter),
            Modifier::Layer(config) => Self::Layer(config),
        }
    }
}

/// Which wrappers [`LayoutTree::apply_state_changes`] touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    /// Wrappers whose layer parameters were recomputed.
    pub parameters: Vec<WrapperId>,
    /// Wrappers whose layer content was invalidated.
    pub repaints: Vec<WrapperId>,
    /// Whether paint outside any layer was invalidated.
    pub root: bool,
}

pub(crate) struct ElementStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Chain --
    pub(crate) outer: Vec<u32>,
    pub(crate) inner: Vec<u32>,

    // -- Layout --
    pub(crate) policy: Vec<Rc<dyn MeasurePolicy>>,
    pub(crate) placements: Vec<Vec<Placement>>,
    pub(crate) placed: Vec<bool>,
    pub(crate) layout_state: Vec<LayoutState>,
    pub(crate) attached: Vec<bool>,

    // -- Inner layer cache --
    pub(crate) inner_layer_dirty: Vec<bool>,
    pub(crate) inner_layer: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

pub(crate) struct WrapperStore {
    // -- Chain --
    pub(crate) kind: Vec<WrapperKind>,
    pub(crate) element: Vec<u32>,
    pub(crate) wrapped: Vec<u32>,
    pub(crate) wrapped_by: Vec<u32>,

    // -- Geometry --
    pub(crate) size: Vec<Option<Size>>,
    pub(crate) position: Vec<Option<Point>>,
    pub(crate) z_index: Vec<f64>,
    pub(crate) constraints: Vec<Option<Constraints>>,
    pub(crate) wrapped_position: Vec<Point>,
    pub(crate) attached: Vec<bool>,

    // -- Layer --
    pub(crate) layer: Vec<Option<Box<dyn OwnedLayer>>>,
    pub(crate) layer_config: Vec<Option<LayerConfig>>,
    pub(crate) is_clipping: Vec<bool>,
    pub(crate) drawing_skipped: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

/// The element and wrapper arena plus its collaborators.
///
/// All operations run on one thread. State writes made while drawing or
/// configuring layers are queued and applied by
/// [`apply_state_changes`](Self::apply_state_changes).
pub struct LayoutTree {
    pub(crate) elements: ElementStore,
    pub(crate) wrappers: WrapperStore,
    pub(crate) owner: Box<dyn Owner>,
    pub(crate) observer: Observer,
    pub(crate) tracer: Tracer,
    pub(crate) config: TreeConfig,
    pub(crate) root: u32,
}

impl fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let live_elements = self.elements.len as usize - self.elements.free_list.len();
        let live_wrappers = self.wrappers.len as usize - self.wrappers.free_list.len();
        f.debug_struct("LayoutTree")
            .field("elements", &live_elements)
            .field("wrappers", &live_wrappers)
            .field("root", &self.root())
            .field("config", &self.config)
            .field("observer", &self.observer)
            .finish_non_exhaustive()
    }
}

impl LayoutTree {
    /// Creates an empty tree served by `owner`.
    #[must_use]
    pub fn new(owner: Box<dyn Owner>) -> Self {
        Self::with_config(owner, TreeConfig::default())
    }

    /// Creates an empty tree with explicit options.
    #[must_use]
    pub fn with_config(owner: Box<dyn Owner>, config: TreeConfig) -> Self {
        Self {
            elements: ElementStore {
                parent: Vec::new(),
                first_child: Vec::new(),
                next_sibling: Vec::new(),
                prev_sibling: Vec::new(),
                outer: Vec::new(),
                inner: Vec::new(),
                policy: Vec::new(),
                placements: Vec::new(),
                placed: Vec::new(),
                layout_state: Vec::new(),
                attached: Vec::new(),
                inner_layer_dirty: Vec::new(),
                inner_layer: Vec::new(),
                generation: Vec::new(),
                free_list: Vec::new(),
                len: 0,
            },
            wrappers: WrapperStore {
                kind: Vec::new(),
                element: Vec::new(),
                wrapped: Vec::new(),
                wrapped_by: Vec::new(),
                size: Vec::new(),
                position: Vec::new(),
                z_index: Vec::new(),
                constraints: Vec::new(),
                wrapped_position: Vec::new(),
                attached: Vec::new(),
                layer: Vec::new(),
                layer_config: Vec::new(),
                is_clipping: Vec::new(),
                drawing_skipped: Vec::new(),
                generation: Vec::new(),
                free_list: Vec::new(),
                len: 0,
            },
            owner,
            observer: Observer::new(),
            tracer: Tracer::none(),
            config,
            root: INVALID,
        }
    }

    // -- Collaborators --

    /// Returns the owner.
    #[must_use]
    pub fn owner(&self) -> &dyn Owner {
        &*self.owner
    }

    /// Returns the owner mutably.
    pub fn owner_mut(&mut self) -> &mut dyn Owner {
        &mut *self.owner
    }

    /// Returns the read tracker.
    #[must_use]
    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Creates a [`StateCell`] tracked by this tree.
    pub fn state<T>(&self, value: T) -> StateCell<T> {
        self.observer.state(value)
    }

    /// Installs a trace sink. Without the `trace` feature the sink is dropped.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    /// Returns the runtime options.
    #[must_use]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Replaces the runtime options, invalidating everything drawn if they
    /// changed.
    pub fn set_config(&mut self, config: TreeConfig) {
        if self.config == config {
            return;
        }
        self.config = config;
        for idx in 0..self.wrappers.len {
            if self.wrappers.attached[idx as usize]
                && let Some(layer) = self.wrappers.layer[idx as usize].as_mut()
            {
                layer.invalidate();
            }
        }
        self.owner.on_root_invalidated();
    }

    // -- Observation --

    /// Re-runs the work that depends on state written since the last call.
    ///
    /// Layers whose config read a changed cell get new parameters (no
    /// repaint); layers whose paint read one are invalidated (no parameter
    /// update). Paint outside any layer notifies
    /// [`Owner::on_root_invalidated`].
    pub fn apply_state_changes(&mut self) -> AppliedChanges {
        let invalidated = self.observer.take_invalidated();
        let mut applied = AppliedChanges::default();
        for idx in invalidated.params {
            if self.is_attached_slot(idx) && self.wrappers.layer[idx as usize].is_some() {
                self.update_layer_parameters(idx);
                applied.parameters.push(self.wrapper_id(idx));
            }
        }
        for idx in invalidated.paint {
            if idx == ROOT_SUBJECT {
                log::trace!("root paint invalidated by state change");
                self.owner.on_root_invalidated();
                applied.root = true;
            } else if self.is_attached_slot(idx) {
                self.invalidate_layer_at(idx);
                applied.repaints.push(self.wrapper_id(idx));
            }
        }
        applied
    }

    // -- Handles --

    /// Returns whether `id` refers to a live element.
    #[must_use]
    pub fn is_element_alive(&self, id: ElementId) -> bool {
        id.idx < self.elements.len
            && self.elements.generation[id.idx as usize] == id.generation
    }

    /// Returns whether `id` refers to a live wrapper.
    #[must_use]
    pub fn is_wrapper_alive(&self, id: WrapperId) -> bool {
        id.idx < self.wrappers.len
            && self.wrappers.generation[id.idx as usize] == id.generation
    }

    pub(crate) fn element_id(&self, idx: u32) -> ElementId {
        ElementId {
            idx,
            generation: self.elements.generation[idx as usize],
        }
    }

    pub(crate) fn wrapper_id(&self, idx: u32) -> WrapperId {
        WrapperId {
            idx,
            generation: self.wrappers.generation[idx as usize],
        }
    }

    pub(crate) fn validate_element(&self, id: ElementId) {
        assert!(
            id.idx < self.elements.len
                && self.elements.generation[id.idx as usize] == id.generation,
            "stale ElementId: {id:?} (current gen: {})",
            if id.idx < self.elements.len {
                self.elements.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    pub(crate) fn validate_wrapper(&self, id: WrapperId) {
        assert!(
            id.idx < self.wrappers.len
                && self.wrappers.generation[id.idx as usize] == id.generation,
            "stale WrapperId: {id:?} (current gen: {})",
            if id.idx < self.wrappers.len {
                self.wrappers.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn is_attached_slot(&self, idx: u32) -> bool {
        idx < self.wrappers.len && self.wrappers.attached[idx as usize]
    }

    // -- Allocation --

    pub(crate) fn alloc_element(&mut self, policy: Rc<dyn MeasurePolicy>) -> u32 {
        let e = &mut self.elements;
        let idx = if let Some(idx) = e.free_list.pop() {
            let i = idx as usize;
            e.parent[i] = INVALID;
            e.first_child[i] = INVALID;
            e.next_sibling[i] = INVALID;
            e.prev_sibling[i] = INVALID;
            e.outer[i] = INVALID;
            e.inner[i] = INVALID;
            e.policy[i] = policy;
            e.placements[i].clear();
            e.placed[i] = false;
            e.layout_state[i] = LayoutState::NeedsRemeasure;
            e.attached[i] = false;
            e.inner_layer_dirty[i] = true;
            e.inner_layer[i] = INVALID;
            idx
        } else {
            let idx = e.len;
            e.len += 1;
            e.parent.push(INVALID);
            e.first_child.push(INVALID);
            e.next_sibling.push(INVALID);
            e.prev_sibling.push(INVALID);
            e.outer.push(INVALID);
            e.inner.push(INVALID);
            e.policy.push(policy);
            e.placements.push(Vec::new());
            e.placed.push(false);
            e.layout_state.push(LayoutState::NeedsRemeasure);
            e.attached.push(false);
            e.inner_layer_dirty.push(true);
            e.inner_layer.push(INVALID);
            e.generation.push(0);
            idx
        };

        let inner = self.alloc_wrapper(WrapperKind::Inner, idx);
        self.elements.outer[idx as usize] = inner;
        self.elements.inner[idx as usize] = inner;
        idx
    }

    pub(crate) fn alloc_wrapper(&mut self, kind: WrapperKind, element: u32) -> u32 {
        let w = &mut self.wrappers;
        if let Some(idx) = w.free_list.pop() {
            let i = idx as usize;
            w.kind[i] = kind;
            w.element[i] = element;
            w.wrapped[i] = INVALID;
            w.wrapped_by[i] = INVALID;
            w.size[i] = None;
            w.position[i] = None;
            w.z_index[i] = 0.0;
            w.constraints[i] = None;
            w.wrapped_position[i] = Point::ORIGIN;
            w.attached[i] = false;
            w.layer[i] = None;
            w.layer_config[i] = None;
            w.is_clipping[i] = false;
            w.drawing_skipped[i] = false;
            idx
        } else {
            let idx = w.len;
            w.len += 1;
            w.kind.push(kind);
            w.element.push(element);
            w.wrapped.push(INVALID);
            w.wrapped_by.push(INVALID);
            w.size.push(None);
            w.position.push(None);
            w.z_index.push(0.0);
            w.constraints.push(None);
            w.wrapped_position.push(Point::ORIGIN);
            w.attached.push(false);
            w.layer.push(None);
            w.layer_config.push(None);
            w.is_clipping.push(false);
            w.drawing_skipped.push(false);
            w.generation.push(0);
            idx
        }
    }

    /// Frees a detached wrapper slot.
    pub(crate) fn free_wrapper(&mut self, idx: u32) {
        let i = idx as usize;
        assert!(
            !self.wrappers.attached[i] && self.wrappers.layer[i].is_none(),
            "freeing attached wrapper {:?}",
            self.wrapper_id(idx)
        );
        self.observer.forget(idx);
        let w = &mut self.wrappers;
        w.kind[i] = WrapperKind::Inner;
        w.layer_config[i] = None;
        w.wrapped[i] = INVALID;
        w.wrapped_by[i] = INVALID;
        w.generation[i] += 1;
        w.free_list.push(idx);
    }

    /// Frees a detached, parentless element slot and its wrappers.
    pub(crate) fn free_element(&mut self, idx: u32) {
        let mut cur = self.elements.outer[idx as usize];
        while cur != INVALID {
            let next = self.wrappers.wrapped[cur as usize];
            self.free_wrapper(cur);
            cur = next;
        }
        let e = &mut self.elements;
        let i = idx as usize;
        e.placements[i].clear();
        e.outer[i] = INVALID;
        e.inner[i] = INVALID;
        e.generation[i] += 1;
        e.free_list.push(idx);
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element lifecycle, topology and modifier chains.

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::id::{ElementId, INVALID, WrapperId};
use super::policy::{MeasurePolicy, Modifier};
use super::traverse::{Chain, Children};
use super::{LayoutTree, WrapperKind};
use crate::error::Result;

/// Where an element is in its measure/place cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutState {
    /// Something changed; the element must be measured again.
    #[default]
    NeedsRemeasure,
    /// Its outer wrapper is being measured.
    Measuring,
    /// Measured, waiting to be placed.
    NeedsRelayout,
    /// Its children are being placed.
    LayingOut,
    /// Measured and placed; safe to draw.
    Ready,
}

impl LayoutTree {
    // -- Allocation API --

    /// Creates a detached element with no modifiers.
    ///
    /// The element has a single inner wrapper running `policy`.
    pub fn create_element(&mut self, policy: impl MeasurePolicy + 'static) -> ElementId {
        let idx = self.alloc_element(Rc::new(policy));
        self.element_id(idx)
    }

    /// Destroys a detached element and every element below it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or the element still has a parent or
    /// is the root.
    pub fn destroy_element(&mut self, id: ElementId) {
        self.validate_element(id);
        assert!(
            self.elements.parent[id.idx as usize] == INVALID && self.root != id.idx,
            "cannot destroy {id:?} while it is in the tree"
        );
        self.destroy_subtree(id.idx);
    }

    fn destroy_subtree(&mut self, idx: u32) {
        let mut child = self.elements.first_child[idx as usize];
        while child != INVALID {
            let next = self.elements.next_sibling[child as usize];
            self.destroy_subtree(child);
            child = next;
        }
        self.elements.first_child[idx as usize] = INVALID;
        self.free_element(idx);
    }

    // -- Topology API --

    /// Makes `id` the root and attaches its subtree, detaching any previous
    /// root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayerCreation`](crate::Error::LayerCreation) if a
    /// retained layer config cannot get a layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the element has a parent.
    pub fn set_root(&mut self, id: ElementId) -> Result<()> {
        self.validate_element(id);
        assert!(
            self.elements.parent[id.idx as usize] == INVALID,
            "root {id:?} must not have a parent"
        );
        if self.root == id.idx {
            return Ok(());
        }
        if self.root != INVALID {
            let old = self.root;
            self.detach_subtree(old);
            self.elements.placed[old as usize] = false;
        }
        self.root = id.idx;
        self.attach_subtree(id.idx)?;
        self.owner.on_root_invalidated();
        Ok(())
    }

    /// Returns the root element, if any.
    #[must_use]
    pub fn root(&self) -> Option<ElementId> {
        (self.root != INVALID).then(|| self.element_id(self.root))
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayerCreation`](crate::Error::LayerCreation) if
    /// attaching the child subtree fails to create a layer.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or `child` already has a parent or is
    /// the root.
    pub fn insert_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.validate_element(parent);
        self.validate_element(child);
        let (p, c) = (parent.idx, child.idx);
        self.check_insertable(c);

        let e = &mut self.elements;
        e.parent[c as usize] = p;
        e.prev_sibling[c as usize] = INVALID;
        e.next_sibling[c as usize] = INVALID;
        if e.first_child[p as usize] == INVALID {
            e.first_child[p as usize] = c;
        } else {
            let mut last = e.first_child[p as usize];
            while e.next_sibling[last as usize] != INVALID {
                last = e.next_sibling[last as usize];
            }
            e.next_sibling[last as usize] = c;
            e.prev_sibling[c as usize] = last;
        }
        self.link_into_parent(p, c)
    }

    /// Inserts `child` before `sibling` in `sibling`'s parent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayerCreation`](crate::Error::LayerCreation) if
    /// attaching the child subtree fails to create a layer.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or
    /// `sibling` has none.
    pub fn insert_before(&mut self, child: ElementId, sibling: ElementId) -> Result<()> {
        self.validate_element(child);
        self.validate_element(sibling);
        let (c, s) = (child.idx, sibling.idx);
        self.check_insertable(c);
        let e = &mut self.elements;
        let p = e.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        e.parent[c as usize] = p;
        e.next_sibling[c as usize] = s;
        e.prev_sibling[c as usize] = e.prev_sibling[s as usize];
        if e.prev_sibling[s as usize] != INVALID {
            e.next_sibling[e.prev_sibling[s as usize] as usize] = c;
        } else {
            e.first_child[p as usize] = c;
        }
        e.prev_sibling[s as usize] = c;
        self.link_into_parent(p, c)
    }

    /// Removes `child` from its parent, detaching its subtree.
    ///
    /// The element stays alive and can be inserted again; destroy it with
    /// [`destroy_element`](Self::destroy_element) otherwise.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the element has no parent.
    pub fn remove_child(&mut self, child: ElementId) {
        self.validate_element(child);
        let c = child.idx;
        let p = self.elements.parent[c as usize];
        assert!(p != INVALID, "{child:?} has no parent");

        if self.elements.attached[c as usize] {
            self.detach_subtree(c);
        }
        self.unlink_from_parent(c);
        let outer = self.elements.outer[c as usize];
        self.wrappers.wrapped_by[outer as usize] = INVALID;
        self.elements.placed[c as usize] = false;
        self.request_remeasure(p);
    }

    /// Returns the parent of an element, if any.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.validate_element(id);
        let p = self.elements.parent[id.idx as usize];
        (p != INVALID).then(|| self.element_id(p))
    }

    /// Returns an iterator over the direct children of an element.
    #[must_use]
    pub fn children(&self, id: ElementId) -> Children<'_> {
        self.validate_element(id);
        Children::new(self, self.elements.first_child[id.idx as usize])
    }

    // -- Chain API --

    /// Replaces the element's modifiers.
    ///
    /// The first modifier becomes the outermost wrapper. The inner wrapper is
    /// kept; every other old wrapper is detached and freed. The layer config
    /// the parent gave the old outer wrapper moves to the new one, and every
    /// layer left in the chain is invalidated. The element must be measured
    /// and placed again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayerCreation`](crate::Error::LayerCreation) if the new
    /// outer wrapper cannot get a layer for the carried config.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_modifiers(&mut self, id: ElementId, modifiers: Vec<Modifier>) -> Result<()> {
        self.validate_element(id);
        let e = id.idx;
        let attached = self.elements.attached[e as usize];
        let inner = self.elements.inner[e as usize];
        let old_outer = self.elements.outer[e as usize];
        let outside = self.wrappers.wrapped_by[old_outer as usize];

        // Take what the parent placed on the old outer wrapper.
        let carried_config = self.wrappers.layer_config[old_outer as usize].take();
        let carried_position = self.wrappers.position[old_outer as usize];
        let carried_z = self.wrappers.z_index[old_outer as usize];

        let mut cur = old_outer;
        while cur != inner {
            let next = self.wrappers.wrapped[cur as usize];
            if attached {
                self.detach_wrapper(cur);
            }
            self.free_wrapper(cur);
            cur = next;
        }

        let mut wrapped = inner;
        for modifier in modifiers.into_iter().rev() {
            let w = self.alloc_wrapper(WrapperKind::from(modifier), e);
            self.wrappers.wrapped[w as usize] = wrapped;
            self.wrappers.wrapped_by[wrapped as usize] = w;
            self.wrappers.attached[w as usize] = attached;
            wrapped = w;
        }
        let outer = wrapped;
        if outer != inner {
            // The inner wrapper is now placed by the new chain.
            self.wrappers.position[inner as usize] = None;
            self.wrappers.z_index[inner as usize] = 0.0;
            if old_outer == inner && attached {
                self.destroy_layer(inner);
            }
        }
        self.wrappers.wrapped_by[outer as usize] = outside;
        self.wrappers.position[outer as usize] = carried_position;
        self.wrappers.z_index[outer as usize] = carried_z;
        self.elements.outer[e as usize] = outer;
        self.elements.inner_layer_dirty[e as usize] = true;

        if attached {
            self.update_layer_config(outer, carried_config)?;
            let mut cur = outer;
            while cur != INVALID {
                if let Some(layer) = self.wrappers.layer[cur as usize].as_mut() {
                    layer.invalidate();
                }
                cur = self.wrappers.wrapped[cur as usize];
            }
            self.invalidate_outer(outer);
        } else {
            self.wrappers.layer_config[outer as usize] = carried_config;
        }
        self.request_remeasure(e);
        Ok(())
    }

    /// Replaces the element's measure policy and requests a remeasure.
    pub fn set_measure_policy(&mut self, id: ElementId, policy: impl MeasurePolicy + 'static) {
        self.validate_element(id);
        self.elements.policy[id.idx as usize] = Rc::new(policy);
        self.request_remeasure(id.idx);
    }

    /// Returns the element's outermost wrapper.
    #[must_use]
    pub fn outer_wrapper(&self, id: ElementId) -> WrapperId {
        self.validate_element(id);
        self.wrapper_id(self.elements.outer[id.idx as usize])
    }

    /// Returns the element's innermost wrapper.
    #[must_use]
    pub fn inner_wrapper(&self, id: ElementId) -> WrapperId {
        self.validate_element(id);
        self.wrapper_id(self.elements.inner[id.idx as usize])
    }

    /// Iterates the element's wrappers, outermost first.
    #[must_use]
    pub fn wrappers(&self, id: ElementId) -> Chain<'_> {
        self.validate_element(id);
        Chain::new(self, self.elements.outer[id.idx as usize])
    }

    /// Returns the element owning a wrapper.
    #[must_use]
    pub fn element_of(&self, w: WrapperId) -> ElementId {
        self.validate_wrapper(w);
        self.element_id(self.wrappers.element[w.idx as usize])
    }

    /// Returns the wrapper's kind.
    #[must_use]
    pub fn kind(&self, w: WrapperId) -> &WrapperKind {
        self.validate_wrapper(w);
        &self.wrappers.kind[w.idx as usize]
    }

    /// Returns whether the parent placed the element in its latest pass.
    #[must_use]
    pub fn is_placed(&self, id: ElementId) -> bool {
        self.validate_element(id);
        self.elements.placed[id.idx as usize]
    }

    /// Returns whether the element is part of the root's tree.
    #[must_use]
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.validate_element(id);
        self.elements.attached[id.idx as usize]
    }

    /// Returns the element's layout state.
    #[must_use]
    pub fn layout_state(&self, id: ElementId) -> LayoutState {
        self.validate_element(id);
        self.elements.layout_state[id.idx as usize]
    }

    // -- Attach/detach --

    pub(crate) fn attach_subtree(&mut self, e: u32) -> Result<()> {
        self.elements.attached[e as usize] = true;
        let mut cur = self.elements.outer[e as usize];
        while cur != INVALID {
            self.wrappers.attached[cur as usize] = true;
            let config = self.wrappers.layer_config[cur as usize].clone();
            self.update_layer_config(cur, config)?;
            cur = self.wrappers.wrapped[cur as usize];
        }
        let mut child = self.elements.first_child[e as usize];
        while child != INVALID {
            self.attach_subtree(child)?;
            child = self.elements.next_sibling[child as usize];
        }
        Ok(())
    }

    pub(crate) fn detach_subtree(&mut self, e: u32) {
        let mut child = self.elements.first_child[e as usize];
        while child != INVALID {
            self.detach_subtree(child);
            child = self.elements.next_sibling[child as usize];
        }
        let mut cur = self.elements.outer[e as usize];
        while cur != INVALID {
            self.detach_wrapper(cur);
            cur = self.wrappers.wrapped[cur as usize];
        }
        self.elements.attached[e as usize] = false;
        let parent = self.elements.parent[e as usize];
        if parent != INVALID && self.elements.attached[parent as usize] {
            self.invalidate_element_layer_at(parent);
        }
    }

    /// Detaches one wrapper, destroying its layer but keeping its config so a
    /// later attach recreates the layer.
    pub(crate) fn detach_wrapper(&mut self, w: u32) {
        self.wrappers.attached[w as usize] = false;
        self.destroy_layer(w);
        self.observer.forget(w);
    }

    // -- Internals --

    fn check_insertable(&self, c: u32) {
        assert!(
            self.elements.parent[c as usize] == INVALID,
            "{:?} already has a parent",
            self.element_id(c)
        );
        assert!(
            self.root != c,
            "the root {:?} cannot become a child",
            self.element_id(c)
        );
    }

    fn link_into_parent(&mut self, p: u32, c: u32) -> Result<()> {
        let outer = self.elements.outer[c as usize];
        self.wrappers.wrapped_by[outer as usize] = self.elements.inner[p as usize];
        self.request_remeasure(p);
        if self.elements.attached[p as usize] {
            self.attach_subtree(c)?;
        }
        Ok(())
    }

    fn unlink_from_parent(&mut self, c: u32) {
        let e = &mut self.elements;
        let p = e.parent[c as usize];
        let prev = e.prev_sibling[c as usize];
        let next = e.next_sibling[c as usize];
        if prev != INVALID {
            e.next_sibling[prev as usize] = next;
        } else {
            e.first_child[p as usize] = next;
        }
        if next != INVALID {
            e.prev_sibling[next as usize] = prev;
        }
        e.parent[c as usize] = INVALID;
        e.prev_sibling[c as usize] = INVALID;
        e.next_sibling[c as usize] = INVALID;
    }

    pub(crate) fn request_remeasure(&mut self, e: u32) {
        self.elements.layout_state[e as usize] = LayoutState::NeedsRemeasure;
        let id = self.element_id(e);
        self.owner.on_layout_change(id);
    }
}

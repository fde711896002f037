// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec;
use alloc::vec::Vec;

use super::LayoutTree;
use super::id::{ElementId, INVALID, WrapperId};

/// An iterator over the direct children of an element.
///
/// Created by [`LayoutTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a LayoutTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a LayoutTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.elements.next_sibling[idx as usize];
        Some(self.tree.element_id(idx))
    }
}

/// An iterator over an element's wrappers, outermost first.
///
/// Created by [`LayoutTree::wrappers`].
#[derive(Debug)]
pub struct Chain<'a> {
    tree: &'a LayoutTree,
    current: u32,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(tree: &'a LayoutTree, outer: u32) -> Self {
        Self {
            tree,
            current: outer,
        }
    }
}

impl Iterator for Chain<'_> {
    type Item = WrapperId;

    fn next(&mut self) -> Option<WrapperId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.wrappers.wrapped[idx as usize];
        Some(self.tree.wrapper_id(idx))
    }
}

impl LayoutTree {
    /// Raw child slots of element `e`.
    pub(crate) fn child_slots(&self, e: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut child = self.elements.first_child[e as usize];
        while child != INVALID {
            out.push(child);
            child = self.elements.next_sibling[child as usize];
        }
        out
    }

    /// Placed children of `e` in paint order (ascending z-index, stable).
    pub(crate) fn paint_order(&self, e: u32) -> Vec<u32> {
        let mut placed: Vec<u32> = self
            .child_slots(e)
            .into_iter()
            .filter(|&c| self.elements.placed[c as usize])
            .collect();
        placed.sort_by(|&a, &b| {
            let za = self.wrappers.z_index[self.elements.outer[a as usize] as usize];
            let zb = self.wrappers.z_index[self.elements.outer[b as usize] as usize];
            za.total_cmp(&zb)
        });
        placed
    }

    /// Attached elements in pre-order starting at the root.
    pub(crate) fn attached_preorder(&self) -> Vec<u32> {
        let mut out = Vec::new();
        if self.root == INVALID {
            return out;
        }
        let mut stack = vec![self.root];
        while let Some(e) = stack.pop() {
            out.push(e);
            let mut children = self.child_slots(e);
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer hit testing.

use alloc::vec::Vec;

use kurbo::Point;

use super::id::{INVALID, WrapperId};
use super::policy::PointerInputFilter;
use super::{LayoutTree, WrapperKind};

impl LayoutTree {
    /// Collects the pointer input filters under a global point, starting at
    /// the root.
    ///
    /// Filters are appended outermost first. Among siblings, the topmost in
    /// paint order that yields any filter wins; the others are not tested.
    /// Clipping layers exclude everything outside their bounds.
    pub fn hit_test(&self, global: Point, out: &mut Vec<PointerInputFilter>) {
        if self.root == INVALID {
            return;
        }
        let outer = self.elements.outer[self.root as usize];
        self.hit_test_at(outer, global, out);
    }

    /// Collects the pointer input filters under a global point, starting at
    /// `w`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    pub fn hit_test_wrapper(&self, w: WrapperId, global: Point, out: &mut Vec<PointerInputFilter>) {
        self.validate_wrapper(w);
        assert!(
            self.wrappers.attached[w.idx as usize],
            "hit test on detached wrapper {w:?}"
        );
        self.hit_test_at(w.idx, global, out);
    }

    fn hit_test_at(&self, idx: u32, global: Point, out: &mut Vec<PointerInputFilter>) {
        if !self.within_layer_bounds(idx, global) {
            return;
        }
        let i = idx as usize;
        let wrapped = self.wrappers.wrapped[i];
        match &self.wrappers.kind[i] {
            WrapperKind::Inner => {
                let e = self.wrappers.element[i];
                for child in self.paint_order(e).into_iter().rev() {
                    let before = out.len();
                    self.hit_test_at(self.elements.outer[child as usize], global, out);
                    if out.len() > before {
                        break;
                    }
                }
            }
            WrapperKind::PointerInput(filter) => {
                if self.is_global_pointer_in_bounds(self.wrapper_id(idx), global) {
                    out.push(*filter);
                }
                self.hit_test_at(wrapped, global, out);
            }
            WrapperKind::Layout(_) | WrapperKind::Draw(_) | WrapperKind::Layer(_) => {
                self.hit_test_at(wrapped, global, out);
            }
        }
    }

    /// Returns `false` when `idx` has a clipping layer and the point maps
    /// outside its bounds.
    fn within_layer_bounds(&self, idx: u32, global: Point) -> bool {
        let i = idx as usize;
        if self.wrappers.layer[i].is_none() || !self.wrappers.is_clipping[i] {
            return true;
        }
        match self.global_to_local(self.wrapper_id(idx), global) {
            Ok(local) => self.local_contains(idx, local),
            Err(err) => {
                log::warn!("hit test skipped: {err}");
                false
            }
        }
    }
}

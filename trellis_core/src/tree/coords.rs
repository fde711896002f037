// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate conversion between wrapper spaces.
//!
//! Each hop outward maps a local point through the wrapper's layer matrix
//! (if any) and then offsets it by the wrapper position. Hops inward undo
//! both in reverse order and fail when a layer matrix is singular.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};

use super::LayoutTree;
use super::id::{INVALID, WrapperId};
use crate::error::{Error, Result};

impl LayoutTree {
    fn assert_attached(&self, w: WrapperId) {
        self.validate_wrapper(w);
        assert!(
            self.wrappers.attached[w.idx as usize],
            "coordinate query on detached wrapper {w:?}"
        );
    }

    fn offset_of(&self, idx: u32) -> Vec2 {
        self.wrappers.position[idx as usize]
            .unwrap_or(Point::ORIGIN)
            .to_vec2()
    }

    fn size_of(&self, idx: u32) -> Size {
        self.wrappers.size[idx as usize].unwrap_or(Size::ZERO)
    }

    // -- Single hops --

    fn to_parent_at(&self, idx: u32, p: Point) -> Point {
        let mapped = match self.wrappers.layer[idx as usize].as_ref() {
            Some(layer) => layer.matrix().transform_point(p),
            None => p,
        };
        mapped + self.offset_of(idx)
    }

    fn from_parent_at(&self, idx: u32, p: Point) -> Result<Point> {
        let local = p - self.offset_of(idx);
        match self.wrappers.layer[idx as usize].as_ref() {
            Some(layer) => layer
                .matrix()
                .inverse()
                .map(|inv| inv.transform_point(local))
                .ok_or(Error::NonInvertible {
                    wrapper: self.wrapper_id(idx),
                }),
            None => Ok(local),
        }
    }

    /// Maps a point from `w`'s local space into the space of the wrapper
    /// that wraps it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    #[must_use]
    pub fn to_parent_position(&self, w: WrapperId, local: Point) -> Point {
        self.assert_attached(w);
        self.to_parent_at(w.idx, local)
    }

    /// Maps a point from the wrapping wrapper's space into `w`'s local space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonInvertible`] if `w`'s layer matrix is singular.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    pub fn from_parent_position(&self, w: WrapperId, parent: Point) -> Result<Point> {
        self.assert_attached(w);
        self.from_parent_at(w.idx, parent)
    }

    // -- Whole paths --

    /// Maps a local point into the root's space.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    #[must_use]
    pub fn local_to_root(&self, w: WrapperId, local: Point) -> Point {
        self.assert_attached(w);
        let mut p = local;
        let mut cur = w.idx;
        while cur != INVALID {
            p = self.to_parent_at(cur, p);
            cur = self.wrappers.wrapped_by[cur as usize];
        }
        p
    }

    /// Maps a local point into global space (root space offset by the
    /// owner's root position).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    #[must_use]
    pub fn local_to_global(&self, w: WrapperId, local: Point) -> Point {
        self.local_to_root(w, local) + self.owner.root_position().to_vec2()
    }

    /// Maps a global point into `w`'s local space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonInvertible`] if any layer on the path is singular.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    pub fn global_to_local(&self, w: WrapperId, global: Point) -> Result<Point> {
        self.assert_attached(w);
        let mut path = Vec::new();
        let mut cur = w.idx;
        while cur != INVALID {
            path.push(cur);
            cur = self.wrappers.wrapped_by[cur as usize];
        }
        let mut p = global - self.owner.root_position().to_vec2();
        for &idx in path.iter().rev() {
            p = self.from_parent_at(idx, p)?;
        }
        Ok(p)
    }

    /// Maps a point in `child`'s local space into `w`'s local space.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale, a wrapper is detached, or `child` is not
    /// wrapped (directly or transitively) by `w`.
    #[must_use]
    pub fn child_to_local(&self, w: WrapperId, child: WrapperId, p: Point) -> Point {
        self.assert_attached(w);
        self.assert_attached(child);
        let mut p = p;
        let mut cur = child.idx;
        while cur != w.idx {
            assert!(cur != INVALID, "{child:?} is not a descendant of {w:?}");
            p = self.to_parent_at(cur, p);
            cur = self.wrappers.wrapped_by[cur as usize];
        }
        p
    }

    /// Returns `child`'s bounds in `w`'s local space.
    ///
    /// Each hop maps the current rectangle's bounding box and intersects it
    /// with the bounds of clipping layers on the way. An empty result is
    /// [`Rect::ZERO`].
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale, a wrapper is detached, or `child` is not
    /// wrapped by `w`.
    #[must_use]
    pub fn child_bounding_box(&self, w: WrapperId, child: WrapperId) -> Rect {
        self.assert_attached(w);
        self.assert_attached(child);
        let mut rect = self.size_of(child.idx).to_rect();
        let mut cur = child.idx;
        while cur != w.idx {
            assert!(cur != INVALID, "{child:?} is not a descendant of {w:?}");
            rect = self.rect_in_parent(cur, rect);
            if rect.area() <= 0.0 {
                return Rect::ZERO;
            }
            cur = self.wrappers.wrapped_by[cur as usize];
        }
        rect
    }

    fn rect_in_parent(&self, idx: u32, rect: Rect) -> Rect {
        let mut rect = rect;
        if let Some(layer) = self.wrappers.layer[idx as usize].as_ref() {
            if self.wrappers.is_clipping[idx as usize] {
                rect = rect.intersect(self.size_of(idx).to_rect());
                if rect.area() <= 0.0 {
                    return Rect::ZERO;
                }
            }
            rect = layer.matrix().transform_rect_bbox(rect);
        }
        rect + self.offset_of(idx)
    }

    /// Returns `w`'s bounds in root space, clipped by layers on the way.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    #[must_use]
    pub fn bounds_in_root(&self, w: WrapperId) -> Rect {
        self.assert_attached(w);
        let mut rect = self.size_of(w.idx).to_rect();
        let mut cur = w.idx;
        while cur != INVALID {
            rect = self.rect_in_parent(cur, rect);
            if rect.area() <= 0.0 {
                return Rect::ZERO;
            }
            cur = self.wrappers.wrapped_by[cur as usize];
        }
        rect
    }

    /// Returns whether a global point falls inside `w`'s local bounds.
    ///
    /// Points that cannot be mapped (singular layers) are outside.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the wrapper is detached.
    #[must_use]
    pub fn is_global_pointer_in_bounds(&self, w: WrapperId, global: Point) -> bool {
        match self.global_to_local(w, global) {
            Ok(local) => self.local_contains(w.idx, local),
            Err(_) => false,
        }
    }

    pub(crate) fn local_contains(&self, idx: u32, p: Point) -> bool {
        let size = self.size_of(idx);
        p.x >= 0.0 && p.x < size.width && p.y >= 0.0 && p.y < size.height
    }

    /// Returns the wrapper that wraps `w` (its parent coordinate space).
    #[must_use]
    pub fn parent_coordinates(&self, w: WrapperId) -> Option<WrapperId> {
        self.wrapped_by(w)
    }

    /// Returns the inner wrapper of the parent element of `w`'s element.
    #[must_use]
    pub fn parent_layout_coordinates(&self, w: WrapperId) -> Option<WrapperId> {
        self.validate_wrapper(w);
        let e = self.wrappers.element[w.idx as usize];
        let p = self.elements.parent[e as usize];
        (p != INVALID).then(|| self.wrapper_id(self.elements.inner[p as usize]))
    }
}

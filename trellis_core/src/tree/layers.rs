// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy layer lifecycle and invalidation.
//!
//! A wrapper holds a layer exactly when it is attached and has a layer
//! config. Configs arrive through placement (or are retained across
//! detach/attach); the layer is created on demand, re-parameterized when
//! the config changes identity, and destroyed when the config goes away or
//! the wrapper detaches.
//!
//! Invalidation bubbles outward along `wrapped_by` links to the nearest
//! layer. With no layer on the way, the root's owner is told to repaint.

use kurbo::{Point, Size};

use super::LayoutTree;
use super::id::{ElementId, INVALID, WrapperId};
use crate::error::{Error, Result};
use crate::layer::{LayerConfig, LayerScope};
use crate::observe::ScopeKind;
use crate::trace::LayerEventKind;

impl LayoutTree {
    /// Records a new layer config for `idx` and brings its layer in line.
    pub(crate) fn update_layer_config(
        &mut self,
        idx: u32,
        config: Option<LayerConfig>,
    ) -> Result<()> {
        let i = idx as usize;
        let changed = match (&self.wrappers.layer_config[i], &config) {
            (Some(old), Some(new)) => !old.ptr_eq(new),
            (None, None) => false,
            _ => true,
        };
        self.wrappers.layer_config[i] = config;
        self.on_layer_config_updated(idx, changed)
    }

    fn on_layer_config_updated(&mut self, idx: u32, changed: bool) -> Result<()> {
        let i = idx as usize;
        let attached = self.wrappers.attached[i];
        let has_config = self.wrappers.layer_config[i].is_some();
        let has_layer = self.wrappers.layer[i].is_some();

        if attached && has_config && !has_layer {
            let id = self.wrapper_id(idx);
            let mut layer = self
                .owner
                .create_layer(id)
                .map_err(|source| Error::LayerCreation {
                    wrapper: id,
                    source,
                })?;
            layer.resize(self.wrappers.size[i].unwrap_or(Size::ZERO));
            layer.move_to(self.wrappers.position[i].unwrap_or(Point::ORIGIN));
            self.wrappers.layer[i] = Some(layer);
            log::debug!("created layer for {id:?}");
            self.tracer.layer(id, LayerEventKind::Created);
            self.update_layer_parameters(idx);
            let e = self.wrappers.element[i];
            self.elements.inner_layer_dirty[e as usize] = true;
            self.invalidate_outer(idx);
        } else if attached && has_layer && has_config {
            if changed {
                self.update_layer_parameters(idx);
            }
        } else {
            self.destroy_layer(idx);
            assert!(
                has_config || self.wrappers.layer[i].is_none(),
                "layer survived a null config on {:?}",
                self.wrapper_id(idx)
            );
        }
        Ok(())
    }

    /// Destroys the wrapper's layer, if any. Its config is kept.
    pub(crate) fn destroy_layer(&mut self, idx: u32) {
        let i = idx as usize;
        let Some(layer) = self.wrappers.layer[i].take() else {
            return;
        };
        layer.destroy();
        self.observer.forget(idx);
        self.wrappers.is_clipping[i] = false;
        self.wrappers.drawing_skipped[i] = false;
        let id = self.wrapper_id(idx);
        log::debug!("destroyed layer of {id:?}");
        self.tracer.layer(id, LayerEventKind::Destroyed);
        let e = self.wrappers.element[i];
        self.elements.inner_layer_dirty[e as usize] = true;
        if self.wrappers.attached[i] {
            self.invalidate_outer(idx);
        } else {
            // The content painted into the surrounding layer is gone too.
            let outside = self.wrappers.wrapped_by[i];
            if outside != INVALID && self.wrappers.attached[outside as usize] {
                self.invalidate_layer_at(outside);
            }
        }
    }

    /// Re-runs the layer config callback and pushes the result to the layer.
    ///
    /// Reads made by the callback are tracked in the parameters channel.
    pub(crate) fn update_layer_parameters(&mut self, idx: u32) {
        let i = idx as usize;
        let Some(config) = self.wrappers.layer_config[i].clone() else {
            return;
        };
        self.observer.begin(idx, ScopeKind::Params);
        let params = {
            let mut scope = LayerScope::new(&mut self.observer);
            config.apply(&mut scope);
            scope.into_params()
        };
        self.observer.end();

        self.wrappers.is_clipping[i] = params.clip;
        let repaint_parent = match self.wrappers.layer[i].as_mut() {
            Some(layer) => layer.update_parameters(&params),
            None => false,
        };
        if repaint_parent {
            self.invalidate_outer(idx);
        }
        let id = self.wrapper_id(idx);
        self.tracer.layer(id, LayerEventKind::ParametersUpdated);
    }

    // -- Invalidation --

    /// Invalidates the layer that `w`'s content is painted into: its own
    /// layer, or the nearest one outward.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn invalidate_layer(&mut self, w: WrapperId) {
        self.validate_wrapper(w);
        self.invalidate_layer_at(w.idx);
    }

    pub(crate) fn invalidate_layer_at(&mut self, idx: u32) {
        let mut cur = idx;
        let mut last = idx;
        while cur != INVALID {
            let i = cur as usize;
            if let Some(layer) = self.wrappers.layer[i].as_mut() {
                layer.invalidate();
                let id = self.wrapper_id(cur);
                self.tracer.layer(id, LayerEventKind::Invalidated);
                return;
            }
            last = cur;
            cur = self.wrappers.wrapped_by[i];
        }
        self.notify_root_if_owned(last);
    }

    /// Invalidates the layer around `idx`, excluding `idx`'s own layer.
    pub(crate) fn invalidate_outer(&mut self, idx: u32) {
        let outside = self.wrappers.wrapped_by[idx as usize];
        if outside != INVALID {
            self.invalidate_layer_at(outside);
        } else {
            self.notify_root_if_owned(idx);
        }
    }

    /// Tells the owner to repaint when `idx` is the outer end of the attached
    /// root chain.
    fn notify_root_if_owned(&mut self, idx: u32) {
        let i = idx as usize;
        let e = self.wrappers.element[i];
        if self.wrappers.attached[i] && e == self.root {
            log::trace!("invalidation reached the root");
            self.owner.on_root_invalidated();
        }
    }

    /// Returns the innermost wrapper of `id` that owns a layer.
    ///
    /// The answer is cached per element and recomputed after layers are
    /// created or destroyed.
    pub fn inner_layer_wrapper(&mut self, id: ElementId) -> Option<WrapperId> {
        self.validate_element(id);
        let found = self.inner_layer_slot(id.idx);
        (found != INVALID).then(|| self.wrapper_id(found))
    }

    fn inner_layer_slot(&mut self, e: u32) -> u32 {
        let ei = e as usize;
        if self.elements.inner_layer_dirty[ei] {
            let mut cur = self.elements.inner[ei];
            let mut found = INVALID;
            while cur != INVALID && self.wrappers.element[cur as usize] == e {
                if self.wrappers.layer[cur as usize].is_some() {
                    found = cur;
                    break;
                }
                cur = self.wrappers.wrapped_by[cur as usize];
            }
            self.elements.inner_layer[ei] = found;
            self.elements.inner_layer_dirty[ei] = false;
        }
        self.elements.inner_layer[ei]
    }

    /// Invalidates the layer the element's children paint into.
    ///
    /// That is the element's innermost layer or, without one, the layer of
    /// the closest ancestor element that has one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn invalidate_element_layer(&mut self, id: ElementId) {
        self.validate_element(id);
        self.invalidate_element_layer_at(id.idx);
    }

    pub(crate) fn invalidate_element_layer_at(&mut self, e: u32) {
        let mut cur = e;
        while cur != INVALID {
            let w = self.inner_layer_slot(cur);
            if w != INVALID {
                if let Some(layer) = self.wrappers.layer[w as usize].as_mut() {
                    layer.invalidate();
                }
                let id = self.wrapper_id(w);
                self.tracer.layer(id, LayerEventKind::Invalidated);
                return;
            }
            cur = self.elements.parent[cur as usize];
        }
        if self.elements.attached[e as usize] {
            log::trace!("element invalidation reached the root");
            self.owner.on_root_invalidated();
        }
    }

    // -- Layer accessors --

    /// Returns whether the wrapper currently owns a layer.
    #[must_use]
    pub fn has_layer(&self, w: WrapperId) -> bool {
        self.validate_wrapper(w);
        self.wrappers.layer[w.idx as usize].is_some()
    }

    /// Returns the wrapper's current layer config.
    #[must_use]
    pub fn layer_config(&self, w: WrapperId) -> Option<&LayerConfig> {
        self.validate_wrapper(w);
        self.wrappers.layer_config[w.idx as usize].as_ref()
    }

    /// Returns whether the wrapper's layer clips its content.
    #[must_use]
    pub fn is_clipping(&self, w: WrapperId) -> bool {
        self.validate_wrapper(w);
        self.wrappers.is_clipping[w.idx as usize]
    }

    /// Returns whether the last paint request for the wrapper's layer was
    /// skipped because the element was not placed.
    #[must_use]
    pub fn last_layer_drawing_was_skipped(&self, w: WrapperId) -> bool {
        self.validate_wrapper(w);
        self.wrappers.drawing_skipped[w.idx as usize]
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::Cell;

    use kurbo::{Point, Size};

    use super::super::testing::{tree, tree_with};
    use super::super::{
        DrawScope, ElementId, Fixed, LayoutTree, MeasureResult, MeasureScope, Modifier, Placement,
    };
    use crate::constraints::Constraints;
    use crate::error::{Error, LayerError};
    use crate::layer::LayerConfig;
    use crate::observe::ReadScope;

    /// A root that places its children at the origin, on `config`'s layer
    /// while `enabled` is set.
    fn layered_parent(
        tree: &mut LayoutTree,
        config: LayerConfig,
        enabled: Rc<Cell<bool>>,
    ) -> ElementId {
        tree.create_element(
            move |scope: &mut MeasureScope<'_>, children: &[ElementId], c: Constraints| {
                let placements = children
                    .iter()
                    .map(|&child| {
                        scope.measure(child, Constraints::loose(c.max));
                        let p = Placement::new(child, Point::ORIGIN);
                        if enabled.get() {
                            p.with_layer(config.clone())
                        } else {
                            p
                        }
                    })
                    .collect();
                MeasureResult::new(c.max, placements)
            },
        )
    }

    const VIEW: Constraints = Constraints::tight(Size::new(50.0, 50.0));

    #[test]
    fn toggling_config_creates_a_fresh_layer() {
        let (mut tree, log) = tree();
        let enabled = Rc::new(Cell::new(true));
        let root = layered_parent(&mut tree, LayerConfig::new(|_| {}), Rc::clone(&enabled));
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();
        let outer = tree.outer_wrapper(child);
        assert!(tree.has_layer(outer));
        let first = log.borrow().layer_of(outer);

        enabled.set(false);
        let repaints = log.borrow().root_invalidations;
        tree.layout_root(VIEW).unwrap();
        assert!(!tree.has_layer(outer));
        assert!(first.borrow().destroyed);
        assert_eq!(log.borrow().root_invalidations, repaints + 1);

        enabled.set(true);
        let repaints = log.borrow().root_invalidations;
        tree.layout_root(VIEW).unwrap();
        assert!(tree.has_layer(outer));
        assert_eq!(log.borrow().root_invalidations, repaints + 1);

        let second = log.borrow().layer_of(outer);
        assert!(!Rc::ptr_eq(&first, &second));
        assert!(!second.borrow().destroyed);
        assert_eq!(log.borrow().layers.len(), 2);
    }

    #[test]
    fn new_layer_matches_current_geometry() {
        let (mut tree, log) = tree();
        let enabled = Rc::new(Cell::new(false));
        let root = layered_parent(&mut tree, LayerConfig::new(|_| {}), Rc::clone(&enabled));
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();
        let outer = tree.outer_wrapper(child);
        tree.place(outer, Point::new(4.0, 6.0), 0.0, None).unwrap();

        tree.place(outer, Point::new(4.0, 6.0), 0.0, Some(LayerConfig::new(|_| {})))
            .unwrap();
        let layer = log.borrow().layer_of(outer);
        assert_eq!(layer.borrow().size, Size::new(10.0, 10.0));
        assert_eq!(layer.borrow().position, Point::new(4.0, 6.0));
        assert_eq!(layer.borrow().parameter_updates, 1);
    }

    #[test]
    fn config_identity_decides_parameter_updates() {
        let (mut tree, log) = tree();
        let config = LayerConfig::new(|_| {});
        let root = layered_parent(&mut tree, config.clone(), Rc::new(Cell::new(true)));
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();
        let outer = tree.outer_wrapper(child);
        let layer = log.borrow().layer_of(outer);
        assert_eq!(layer.borrow().parameter_updates, 1);

        tree.place(outer, Point::ORIGIN, 0.0, Some(config)).unwrap();
        assert_eq!(layer.borrow().parameter_updates, 1);

        tree.place(outer, Point::ORIGIN, 0.0, Some(LayerConfig::new(|_| {})))
            .unwrap();
        assert_eq!(layer.borrow().parameter_updates, 2);
        assert_eq!(layer.borrow().resizes, 1);
        assert_eq!(log.borrow().layers.len(), 1);
    }

    #[test]
    fn detach_destroys_and_reattach_recreates() {
        let (mut tree, log) = tree();
        let root = layered_parent(&mut tree, LayerConfig::new(|_| {}), Rc::new(Cell::new(true)));
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();
        let outer = tree.outer_wrapper(child);
        let first = log.borrow().layer_of(outer);

        tree.remove_child(child);
        assert!(first.borrow().destroyed);
        assert!(!tree.has_layer(outer));
        assert!(!tree.is_wrapper_attached(outer));
        assert!(tree.layer_config(outer).is_some());

        tree.insert_child(root, child).unwrap();
        assert!(tree.has_layer(outer));
        assert_eq!(log.borrow().layers.len(), 2);
        tree.layout_root(VIEW).unwrap();
        assert!(!log.borrow().layer_of(outer).borrow().destroyed);
    }

    #[test]
    fn creation_failure_is_reported() {
        let (mut tree, _log) = tree_with(Point::ORIGIN, Some(0));
        let root = layered_parent(&mut tree, LayerConfig::new(|_| {}), Rc::new(Cell::new(true)));
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();

        let err = tree.layout_root(VIEW).unwrap_err();
        assert_eq!(
            err,
            Error::LayerCreation {
                wrapper: tree.outer_wrapper(child),
                source: LayerError::Exhausted,
            }
        );
        assert!(!tree.has_layer(tree.outer_wrapper(child)));
    }

    #[test]
    fn invalidation_bubbles_to_nearest_layer() {
        let (mut tree, log) = tree();
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.set_modifiers(
            e,
            vec![
                Modifier::layer(|_| {}),
                Modifier::draw(|s: &mut DrawScope<'_>| s.draw_content()),
            ],
        )
        .unwrap();
        tree.set_root(e).unwrap();
        tree.layout_root(VIEW).unwrap();

        let draw = tree.wrapped(tree.outer_wrapper(e)).unwrap();
        assert!(tree.has_layer(draw));
        assert_eq!(tree.inner_layer_wrapper(e), Some(draw));
        let layer = log.borrow().layer_of(draw);
        let invalidations = layer.borrow().invalidations;
        let repaints = log.borrow().root_invalidations;

        tree.invalidate_layer(tree.inner_wrapper(e));
        assert_eq!(layer.borrow().invalidations, invalidations + 1);
        assert_eq!(log.borrow().root_invalidations, repaints);

        tree.invalidate_layer(tree.outer_wrapper(e));
        assert_eq!(log.borrow().root_invalidations, repaints + 1);
    }

    #[test]
    fn element_invalidation_uses_ancestor_layer() {
        let (mut tree, log) = tree();
        let root = tree.create_element(Fixed(Size::new(40.0, 40.0)));
        tree.set_modifiers(root, vec![Modifier::layer(|_| {})])
            .unwrap();
        let child = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.insert_child(root, child).unwrap();
        tree.set_root(root).unwrap();
        tree.layout_root(VIEW).unwrap();

        assert_eq!(tree.inner_layer_wrapper(child), None);
        let host = tree.inner_wrapper(root);
        assert_eq!(tree.inner_layer_wrapper(root), Some(host));
        let layer = log.borrow().layer_of(host);
        let invalidations = layer.borrow().invalidations;
        tree.invalidate_element_layer(child);
        assert_eq!(layer.borrow().invalidations, invalidations + 1);
    }

    #[test]
    fn config_reads_update_parameters_only() {
        let (mut tree, log) = tree();
        let scale = tree.state(1.0);
        let read = scale.clone();
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.set_modifiers(
            e,
            vec![Modifier::layer(move |scope| {
                let v = scope.read(&read);
                scope.scale_x = v;
            })],
        )
        .unwrap();
        tree.set_root(e).unwrap();
        tree.layout_root(VIEW).unwrap();

        let inner = tree.inner_wrapper(e);
        let layer = log.borrow().layer_of(inner);
        let invalidations = layer.borrow().invalidations;

        scale.set(2.0);
        let applied = tree.apply_state_changes();
        assert_eq!(applied.parameters, vec![inner]);
        assert!(applied.repaints.is_empty());
        assert!(!applied.root);
        assert_eq!(layer.borrow().params.scale_x, 2.0);
        assert_eq!(layer.borrow().invalidations, invalidations);
    }

    #[test]
    fn elevation_change_repaints_parent() {
        let (mut tree, log) = tree();
        let elevation = tree.state(0.0);
        let read = elevation.clone();
        let e = tree.create_element(Fixed(Size::new(10.0, 10.0)));
        tree.set_modifiers(
            e,
            vec![Modifier::layer(move |scope| {
                let v = scope.read(&read);
                scope.shadow_elevation = v;
            })],
        )
        .unwrap();
        tree.set_root(e).unwrap();
        tree.layout_root(VIEW).unwrap();

        let repaints = log.borrow().root_invalidations;
        elevation.set(4.0);
        tree.apply_state_changes();
        assert_eq!(log.borrow().root_invalidations, repaints + 1);
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative layer configuration.

use alloc::rc::Rc;
use core::fmt;
use core::ops::{Deref, DerefMut};

use super::params::LayerParams;
use crate::observe::{CellId, Observer, ReadScope};

/// A shared callback that fills in [`LayerParams`].
///
/// Identity matters: placing a wrapper again with the *same* config (by
/// pointer) is a no-op for its layer, while a different config recomputes the
/// parameters. Clone a config to keep its identity.
///
/// State read through [`LayerScope::read`] is tracked; changing it later
/// re-runs only this callback, never the wrapper's paint.
#[derive(Clone)]
pub struct LayerConfig(Rc<dyn Fn(&mut LayerScope<'_>)>);

impl LayerConfig {
    /// Wraps `f` as a layer config.
    pub fn new(f: impl Fn(&mut LayerScope<'_>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Returns `true` if both configs are the same callback instance.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub(crate) fn apply(&self, scope: &mut LayerScope<'_>) {
        (self.0)(scope);
    }
}

impl fmt::Debug for LayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerConfig({:p})", Rc::as_ptr(&self.0))
    }
}

/// Scope handed to a [`LayerConfig`] callback.
///
/// Dereferences to the [`LayerParams`] being built, which start from the
/// defaults on every invocation.
pub struct LayerScope<'a> {
    params: LayerParams,
    observer: &'a mut Observer,
}

impl<'a> LayerScope<'a> {
    pub(crate) fn new(observer: &'a mut Observer) -> Self {
        Self {
            params: LayerParams::default(),
            observer,
        }
    }

    pub(crate) fn into_params(self) -> LayerParams {
        self.params
    }
}

impl fmt::Debug for LayerScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerScope")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Deref for LayerScope<'_> {
    type Target = LayerParams;

    fn deref(&self) -> &LayerParams {
        &self.params
    }
}

impl DerefMut for LayerScope<'_> {
    fn deref_mut(&mut self) -> &mut LayerParams {
        &mut self.params
    }
}

impl ReadScope for LayerScope<'_> {
    fn track(&mut self, cell: CellId) {
        self.observer.record(cell);
    }
}

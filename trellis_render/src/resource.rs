// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque keys for recorded layers.

use core::fmt;

/// Identifies a layer handed out by a [`RecordingOwner`](crate::RecordingOwner).
///
/// Keys are assigned in creation order and never reused, so a layer that is
/// destroyed and created again gets a new key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerKey(pub u64);

impl fmt::Debug for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerKey({})", self.0)
    }
}

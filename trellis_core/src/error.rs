// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable failures.
//!
//! Contract violations (stale handles, unmeasured wrappers, detached
//! geometry queries) are panics, not errors. The types here cover what a
//! caller can actually react to: a backend that cannot produce a layer, and
//! a layer matrix that cannot be inverted.

use alloc::string::String;

use thiserror::Error;

use crate::tree::WrapperId;

/// Failure reported by an [`Owner`](crate::owner::Owner) layer factory.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayerError {
    /// The backend has no capacity for another layer.
    #[error("layer resources exhausted")]
    Exhausted,
    /// Backend-specific failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced by tree operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The owner failed to create a layer for `wrapper`.
    #[error("failed to create layer for {wrapper:?}")]
    LayerCreation {
        /// The wrapper that asked for a layer.
        wrapper: WrapperId,
        /// What the owner reported.
        #[source]
        source: LayerError,
    },
    /// A layer matrix on the path could not be inverted.
    #[error("layer matrix of {wrapper:?} is not invertible")]
    NonInvertible {
        /// The wrapper owning the singular layer.
        wrapper: WrapperId,
    },
}

/// Result alias defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, recording, and JSON snapshots for trellis diagnostics.
//!
//! This crate provides [`TraceSink`](trellis_core::trace::TraceSink)
//! implementations and tree dumps for development:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: an in-memory event log that can be shared
//!   with the tree it listens to.
//! - [`snapshot`]: JSON views of a [`LayoutTree`](trellis_core::tree::LayoutTree)
//!   and of recorded events.

pub mod pretty;
pub mod recorder;
pub mod snapshot;

//! Mutation applier.
//!
//! Turns declarative [`Node`](crate::types::Node) trees into native mutations:
//! - [`materialize`] / [`materialize_into`] - Build a fresh native subtree
//! - [`diff_and_apply`] - Patch a live native subtree from an old tree to a new one
//! - [`patch_mount`] - Mount-level patch tolerant of missing arguments
//!
//! The applier is stateless. Retaining the previous tree between passes is the
//! job of the [`pipeline`](crate::pipeline).

mod diff;
mod materialize;

pub use diff::{diff_and_apply, patch_mount, Patched};
pub use materialize::{materialize, materialize_into};

//! Error types.
//!
//! Configuration problems (no mount point, no root) are not errors: they are
//! logged and reported as a skipped pass. These types cover what a caller must
//! act on.

use crate::types::InstanceKey;

/// Errors returned by render requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// A scoped pass was requested for a key with no live instance.
    #[error("no registered instance for scoped render of '{0}'")]
    UnregisteredOwner(InstanceKey),

    /// Navigation was requested but no router is installed.
    #[error("no router configured for navigation")]
    NoRouter,

    /// The router refused or could not resolve a navigation.
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    /// The renderer behind a handle has been dropped.
    #[error("renderer has been dropped")]
    RendererDropped,
}

/// Errors reported by a [`NavigationManager`](crate::pipeline::NavigationManager).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// No route matches the path.
    #[error("no route matches '{0}'")]
    NotFound(String),

    /// The router declined the navigation.
    #[error("navigation to '{path}' rejected: {reason}")]
    Rejected {
        /// Requested path
        path: String,
        /// Router-supplied reason
        reason: String,
    },
}

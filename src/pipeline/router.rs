//! Router integration.
//!
//! Path matching lives outside the engine. A router implements
//! [`NavigationManager`] and reports the component chain for the current
//! location through the callback it was started with. The renderer reacts by
//! swapping its active root and requesting a pass.

use std::fmt;
use std::sync::Arc;

use crate::engine::Component;
use crate::error::NavigationError;

/// The component a location resolved to.
pub struct RouteChange {
    /// Fresh root candidate for the new location.
    pub component: Box<dyn Component>,
    /// Scope identity of the route. A different key replaces the whole tree.
    pub key: String,
}

impl RouteChange {
    pub fn new(key: impl Into<String>, component: impl Component) -> Self {
        Self {
            component: Box::new(component),
            key: key.into(),
        }
    }
}

impl fmt::Debug for RouteChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteChange")
            .field("key", &self.key)
            .field("component", &(*self.component).type_name())
            .finish()
    }
}

/// Callback a router invokes when the active route changes.
pub type RouteChangeHandler = Arc<dyn Fn(RouteChange) + Send + Sync>;

/// Contract of an external router.
pub trait NavigationManager: Send + Sync {
    /// Begin routing. `on_change` is invoked for the initial location and after
    /// every successful navigation.
    fn start(&self, on_change: RouteChangeHandler) -> Result<(), NavigationError>;

    /// Navigate to `path`.
    fn navigate(&self, path: &str) -> Result<(), NavigationError>;

    /// Resolve `path` without navigating.
    fn resolve(&self, path: &str) -> Result<RouteChange, NavigationError>;
}

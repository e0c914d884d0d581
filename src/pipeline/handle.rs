//! Renderer handle - Weak, cloneable access to a renderer.

use std::fmt;
use std::sync::{Arc, Weak};

use super::scheduler::PassOutcome;
use crate::error::RenderError;
use crate::types::InstanceKey;

/// Request side of a renderer, independent of its platform type.
pub(crate) trait Scheduler: Send + Sync {
    fn request_rerender(&self) -> Result<PassOutcome, RenderError>;

    fn request_scoped_rerender(&self, owner: &InstanceKey) -> Result<PassOutcome, RenderError>;

    fn navigate(&self, path: &str) -> Result<(), RenderError>;
}

/// Detached scheduler used to build handles that point nowhere.
struct Nowhere;

impl Scheduler for Nowhere {
    fn request_rerender(&self) -> Result<PassOutcome, RenderError> {
        Err(RenderError::RendererDropped)
    }

    fn request_scoped_rerender(&self, _owner: &InstanceKey) -> Result<PassOutcome, RenderError> {
        Err(RenderError::RendererDropped)
    }

    fn navigate(&self, _path: &str) -> Result<(), RenderError> {
        Err(RenderError::RendererDropped)
    }
}

/// Cloneable handle for requesting renders, safe to move to other threads.
///
/// Holds only a weak reference: once the renderer is dropped every call
/// returns [`RenderError::RendererDropped`].
#[derive(Clone)]
pub struct RendererHandle {
    inner: Weak<dyn Scheduler>,
}

impl RendererHandle {
    pub(crate) fn new(inner: Weak<dyn Scheduler>) -> Self {
        Self { inner }
    }

    /// A handle not connected to any renderer.
    pub fn detached() -> Self {
        let inner: Weak<dyn Scheduler> = Weak::<Nowhere>::new();
        Self { inner }
    }

    fn upgrade(&self) -> Result<Arc<dyn Scheduler>, RenderError> {
        self.inner.upgrade().ok_or(RenderError::RendererDropped)
    }

    /// True while the renderer is alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Request a root pass.
    pub fn request_rerender(&self) -> Result<PassOutcome, RenderError> {
        self.upgrade()?.request_rerender()
    }

    /// Request a scoped pass for `owner`.
    pub fn request_scoped_rerender(&self, owner: &InstanceKey) -> Result<PassOutcome, RenderError> {
        self.upgrade()?.request_scoped_rerender(owner)
    }

    /// Navigate through the renderer's router.
    pub fn navigate(&self, path: &str) -> Result<(), RenderError> {
        self.upgrade()?.navigate(path)
    }
}

impl fmt::Debug for RendererHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_handle_reports_dropped() {
        let handle = RendererHandle::detached();
        assert!(!handle.is_alive());
        assert_eq!(handle.request_rerender(), Err(RenderError::RendererDropped));
        assert_eq!(
            handle.request_scoped_rerender(&InstanceKey::root()),
            Err(RenderError::RendererDropped)
        );
        assert_eq!(handle.navigate("/"), Err(RenderError::RendererDropped));
    }
}

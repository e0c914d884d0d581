//! Lifecycle protocol - Components and their optional capabilities.
//!
//! A component is any `Send` type implementing [`Component`]. Everything else
//! is opt-in through tagged accessors: a component that wants a mount hook
//! implements [`Mountable`] and returns `Some(self)` from `as_mountable`.
//!
//! | Capability        | Fires                                      |
//! |-------------------|--------------------------------------------|
//! | [`Mountable`]     | once, before the first render              |
//! | [`ParameterSync`] | before every render, the first included    |
//! | [`Unmountable`]   | once, in the cleanup after the key goes away |
//! | [`PropSync`]      | on every reuse, never on creation          |
//!
//! # Failure policy
//!
//! Chosen at compile time. With the `fast-fail` feature a panicking hook
//! aborts the pass. Without it the panic is caught at the hook boundary,
//! logged, and the pass carries on as if the hook had done nothing.
//!
//! # Example
//!
//! ```ignore
//! struct Counter { base: ComponentBase, count: Arc<Mutex<u32>> }
//!
//! impl Component for Counter {
//!     fn attach(&mut self, context: ComponentContext) {
//!         self.base.attach(context);
//!     }
//!
//!     fn render(&mut self, _ctx: &mut RenderContext<'_>) -> Option<Node> {
//!         Some(paragraph(format!("{}", self.count.lock())))
//!     }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::context::RenderContext;
use crate::error::RenderError;
use crate::pipeline::{PassOutcome, RendererHandle};
use crate::types::{InstanceKey, Node};

// =============================================================================
// Component
// =============================================================================

/// Downcasting support, implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A stateful piece of UI, kept alive across passes by its instance key.
pub trait Component: AsAny + Send {
    /// Produce this pass's tree. `None` renders an empty placeholder.
    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Option<Node>;

    /// Receive the renderer handle and own key. Called once, before any hook.
    fn attach(&mut self, _context: ComponentContext) {}

    fn as_mountable(&mut self) -> Option<&mut dyn Mountable> {
        None
    }

    fn as_parameter_sync(&mut self) -> Option<&mut dyn ParameterSync> {
        None
    }

    fn as_unmountable(&mut self) -> Option<&mut dyn Unmountable> {
        None
    }

    fn as_prop_sync(&mut self) -> Option<&mut dyn PropSync> {
        None
    }
}

/// Runs once before the first render of an instance.
pub trait Mountable {
    fn on_mount(&mut self);
}

/// Runs before every render of an instance.
pub trait ParameterSync {
    fn on_parameters_set(&mut self);
}

/// Runs once when an instance's key stops being rendered.
pub trait Unmountable {
    fn on_unmount(&mut self);
}

/// Copies externally supplied configuration from a fresh candidate onto a
/// retained instance. `candidate` is the concrete candidate value; downcast it
/// with `downcast_mut::<Self>()`.
pub trait PropSync {
    fn apply_props(&mut self, candidate: &mut dyn Any);
}

/// True if both components are the same concrete type.
pub(crate) fn same_type(a: &dyn Component, b: &dyn Component) -> bool {
    a.as_any().type_id() == b.as_any().type_id()
}

// =============================================================================
// Component Context
// =============================================================================

/// What an instance knows about its place in the renderer.
///
/// Cheap to clone; background tasks keep a clone to request renders later.
#[derive(Clone)]
pub struct ComponentContext {
    key: InstanceKey,
    handle: RendererHandle,
    disposed: Arc<AtomicBool>,
}

impl ComponentContext {
    pub(crate) fn new(key: InstanceKey, handle: RendererHandle) -> Self {
        Self {
            key,
            handle,
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Composite key of the instance.
    pub fn key(&self) -> &InstanceKey {
        &self.key
    }

    pub fn handle(&self) -> &RendererHandle {
        &self.handle
    }

    /// True once the instance has been retired.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    /// Request a root pass. Skipped once the instance is disposed.
    pub fn state_has_changed(&self) -> Result<PassOutcome, RenderError> {
        if self.is_disposed() {
            tracing::debug!(key = %self.key, "disposed, render request skipped");
            return Ok(PassOutcome::Skipped(crate::pipeline::SkipReason::Disposed));
        }
        self.handle.request_rerender()
    }

    /// Request a scoped pass for this instance. Skipped once disposed.
    pub fn state_has_changed_scoped(&self) -> Result<PassOutcome, RenderError> {
        if self.is_disposed() {
            tracing::debug!(key = %self.key, "disposed, scoped render request skipped");
            return Ok(PassOutcome::Skipped(crate::pipeline::SkipReason::Disposed));
        }
        self.handle.request_scoped_rerender(&self.key)
    }

    /// Ask the router to navigate.
    pub fn navigate(&self, path: &str) -> Result<(), RenderError> {
        self.handle.navigate(path)
    }
}

impl std::fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentContext")
            .field("key", &self.key)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Embeddable helper holding the [`ComponentContext`].
///
/// Forward [`Component::attach`] to [`ComponentBase::attach`] and use the
/// request methods from handlers and hooks. Before attachment the request
/// methods do nothing.
#[derive(Debug, Clone, Default)]
pub struct ComponentBase {
    context: Option<ComponentContext>,
}

impl ComponentBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, context: ComponentContext) {
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&ComponentContext> {
        self.context.as_ref()
    }

    pub fn key(&self) -> Option<&InstanceKey> {
        self.context.as_ref().map(ComponentContext::key)
    }

    /// True once the instance has been retired. Background tasks check this
    /// before requesting a render.
    pub fn disposed(&self) -> bool {
        self.context.as_ref().is_some_and(ComponentContext::is_disposed)
    }

    pub fn state_has_changed(&self) -> Result<PassOutcome, RenderError> {
        match &self.context {
            Some(context) => context.state_has_changed(),
            None => Ok(PassOutcome::Skipped(crate::pipeline::SkipReason::Detached)),
        }
    }

    pub fn state_has_changed_scoped(&self) -> Result<PassOutcome, RenderError> {
        match &self.context {
            Some(context) => context.state_has_changed_scoped(),
            None => Ok(PassOutcome::Skipped(crate::pipeline::SkipReason::Detached)),
        }
    }

    pub fn navigate(&self, path: &str) -> Result<(), RenderError> {
        match &self.context {
            Some(context) => context.navigate(path),
            None => Err(RenderError::RendererDropped),
        }
    }
}

// =============================================================================
// Hook Boundary
// =============================================================================

/// Run one hook (or render) under the compile-time failure policy.
///
/// Returns `None` when the hook panicked and the panic was absorbed.
#[cfg(not(feature = "fast-fail"))]
pub(crate) fn run_hook<R>(key: &InstanceKey, hook: &'static str, f: impl FnOnce() -> R) -> Option<R> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            tracing::error!(
                key = %key,
                hook,
                message = panic_message(payload.as_ref()),
                "lifecycle hook panicked, continuing pass"
            );
            None
        }
    }
}

/// Run one hook (or render) under the compile-time failure policy.
///
/// Panics propagate and abort the pass.
#[cfg(feature = "fast-fail")]
pub(crate) fn run_hook<R>(key: &InstanceKey, hook: &'static str, f: impl FnOnce() -> R) -> Option<R> {
    tracing::trace!(key = %key, hook, "running hook");
    Some(f())
}

#[cfg(not(feature = "fast-fail"))]
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Component for Plain {
        fn render(&mut self, _ctx: &mut RenderContext<'_>) -> Option<Node> {
            None
        }
    }

    struct Hooked {
        mounted: u32,
    }

    impl Mountable for Hooked {
        fn on_mount(&mut self) {
            self.mounted += 1;
        }
    }

    impl Component for Hooked {
        fn render(&mut self, _ctx: &mut RenderContext<'_>) -> Option<Node> {
            None
        }

        fn as_mountable(&mut self) -> Option<&mut dyn Mountable> {
            Some(self)
        }
    }

    #[test]
    fn test_capabilities_are_opt_in() {
        let mut plain: Box<dyn Component> = Box::new(Plain);
        let mut hooked: Box<dyn Component> = Box::new(Hooked { mounted: 0 });

        assert!(plain.as_mountable().is_none());
        assert!(plain.as_unmountable().is_none());

        hooked.as_mountable().unwrap().on_mount();
        let hooked = (*hooked).as_any().downcast_ref::<Hooked>().unwrap();
        assert_eq!(hooked.mounted, 1);
    }

    #[test]
    fn test_same_type_sees_through_box() {
        let a: Box<dyn Component> = Box::new(Plain);
        let b: Box<dyn Component> = Box::new(Plain);
        let c: Box<dyn Component> = Box::new(Hooked { mounted: 0 });
        assert!(same_type(&*a, &*b));
        assert!(!same_type(&*a, &*c));
        assert!((*c).type_name().ends_with("Hooked"));
    }

    #[test]
    fn test_detached_base_is_inert() {
        let base = ComponentBase::new();
        assert!(!base.disposed());
        assert!(base.key().is_none());
        assert!(matches!(
            base.state_has_changed(),
            Ok(PassOutcome::Skipped(crate::pipeline::SkipReason::Detached))
        ));
        assert_eq!(base.navigate("/"), Err(RenderError::RendererDropped));
    }

    #[cfg(not(feature = "fast-fail"))]
    #[test]
    fn test_panicking_hook_is_absorbed() {
        let key = InstanceKey::root();
        let result: Option<()> = run_hook(&key, "on_mount", || panic!("boom"));
        assert!(result.is_none());
        assert_eq!(run_hook(&key, "on_mount", || 7), Some(7));
    }

    #[cfg(feature = "fast-fail")]
    #[test]
    #[should_panic(expected = "boom")]
    fn test_panicking_hook_propagates() {
        let key = InstanceKey::root();
        run_hook(&key, "on_mount", || panic!("boom"));
    }
}

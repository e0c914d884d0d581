//! Render scheduler - Root and scoped passes.
//!
//! The [`Renderer`] owns everything that survives between passes: the native
//! platform, the instance registry, the retained tree and the scope cache.
//! All of it sits behind one lock, so passes from different threads
//! serialize and never interleave on the mount point.
//!
//! # Pass flow
//!
//! ```text
//! request ─► lock ─► install staged root ─► render root (resolve_child ...)
//!         ─► materialize | replace | diff_and_apply ─► retain tree
//!         ─► rebuild scope cache ─► retire inactive (unmount hooks)
//!         ─► follow-up pass if a request arrived mid-pass
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::{dom::MemoryDocument, pipeline::Renderer, RendererConfig};
//!
//! let renderer = Renderer::new(MemoryDocument::with_mount("app"), RendererConfig::default());
//! renderer.mount(App::default(), "/")?;
//!
//! // Later, from anywhere:
//! let handle = renderer.handle();
//! std::thread::spawn(move || handle.request_rerender());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};

use super::handle::{RendererHandle, Scheduler};
use super::router::{NavigationManager, RouteChange, RouteChangeHandler};
use super::scope::{ScopeCache, ScopeEntry};
use crate::config::RendererConfig;
use crate::dom::Platform;
use crate::engine::{Component, InstanceRegistry, KeyIndex, RenderContext};
use crate::error::RenderError;
use crate::primitives::events::Event;
use crate::renderer::{diff_and_apply, materialize_into};
use crate::types::{InstanceKey, Node, PatchFlags};

// =============================================================================
// Outcomes
// =============================================================================

/// What a render request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The mount was empty (first pass) and the tree was built fresh.
    Materialized,
    /// The root scope changed; the mount was cleared and rebuilt.
    Replaced,
    /// The retained tree was patched in place.
    Patched(PatchFlags),
    /// Requested from inside a running pass; served by a follow-up pass.
    Deferred,
    /// Nothing was rendered.
    Skipped(SkipReason),
}

impl PassOutcome {
    /// Fold the outcome of a follow-up pass into this one.
    ///
    /// A first materialization or replacement is kept over later patches,
    /// and the flags of consecutive patches are combined.
    pub fn followed_by(self, next: PassOutcome) -> PassOutcome {
        use PassOutcome::*;
        match (self, next) {
            (Patched(first), Patched(then)) => Patched(first | then),
            (Materialized | Replaced | Patched(_), Patched(_) | Deferred | Skipped(_)) => self,
            _ => next,
        }
    }
}

/// Why a pass did not render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The configured mount selector matched nothing.
    MissingMount,
    /// No root component has been set.
    NoRoot,
    /// The requesting instance was already retired.
    Disposed,
    /// The requesting component was never attached to a renderer.
    Detached,
}

// =============================================================================
// State
// =============================================================================

struct StagedRoot {
    component: Box<dyn Component>,
    key: String,
}

struct RenderState<P: Platform> {
    platform: P,
    config: RendererConfig,
    registry: InstanceRegistry,
    /// Scope identity of the active root.
    root_scope: Option<String>,
    /// Tree retained from the last pass.
    previous: Option<Node>,
    scopes: ScopeCache<P::Handle>,
    passes: u64,
}

/// Clears the pass-thread marker when a pass ends, unwinding included.
struct PassGuard<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> PassGuard<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *slot.lock() = Some(thread::current().id());
        Self { slot }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

#[derive(Clone, Copy)]
enum Request<'a> {
    Root,
    Scoped(&'a InstanceKey),
}

// =============================================================================
// Renderer
// =============================================================================

/// Reconciling renderer bound to one platform and mount point.
///
/// Always lives in an `Arc`; components reach it through a weak
/// [`RendererHandle`].
pub struct Renderer<P: Platform> {
    state: Mutex<RenderState<P>>,
    router: RwLock<Option<Arc<dyn NavigationManager>>>,
    staged_root: Mutex<Option<StagedRoot>>,
    pass_thread: Mutex<Option<ThreadId>>,
    deferred: AtomicBool,
    /// Registered keys, checked for requests made during a pass.
    registered: KeyIndex,
    this: Weak<Self>,
}

impl<P> Renderer<P>
where
    P: Platform + Send + 'static,
    P::Handle: Send,
{
    /// Create a renderer with no root and no router.
    pub fn new(platform: P, config: RendererConfig) -> Arc<Self> {
        let registry = InstanceRegistry::new();
        let registered = registry.key_index();
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(RenderState {
                platform,
                config,
                registry,
                root_scope: None,
                previous: None,
                scopes: ScopeCache::default(),
                passes: 0,
            }),
            router: RwLock::new(None),
            staged_root: Mutex::new(None),
            pass_thread: Mutex::new(None),
            deferred: AtomicBool::new(false),
            registered,
            this: this.clone(),
        })
    }

    /// Create a renderer navigating through `router`.
    pub fn with_router(platform: P, config: RendererConfig, router: Arc<dyn NavigationManager>) -> Arc<Self> {
        let renderer = Self::new(platform, config);
        renderer.set_router(router);
        renderer
    }

    /// Weak handle for components and background tasks.
    pub fn handle(&self) -> RendererHandle {
        let inner: Weak<dyn Scheduler> = self.this.clone();
        RendererHandle::new(inner)
    }

    // -------------------------------------------------------------------------
    // Root management
    // -------------------------------------------------------------------------

    /// Stage `component` as the active root under scope identity `key`.
    ///
    /// Takes effect at the start of the next pass. A different `key` than the
    /// current root's replaces the whole tree; the same key patches it.
    ///
    /// Staging takes its own small lock, not the renderer lock, so lifecycle
    /// hooks and route handlers may call this while a pass is running. The
    /// root staged last before a pass starts is the one installed.
    pub fn set_active_root(&self, component: impl Component, key: impl Into<String>) {
        self.set_active_root_boxed(Box::new(component), key.into());
    }

    /// Boxed form of [`set_active_root`](Self::set_active_root), with the
    /// same staging rules.
    pub fn set_active_root_boxed(&self, component: Box<dyn Component>, key: String) {
        tracing::debug!(scope = %key, component = (*component).type_name(), "root staged");
        *self.staged_root.lock() = Some(StagedRoot { component, key });
    }

    /// Set the root and run a pass.
    pub fn mount(&self, component: impl Component, key: impl Into<String>) -> Result<PassOutcome, RenderError> {
        self.set_active_root(component, key);
        self.render_root()
    }

    /// Clear the mount point and retire every instance (unmount hooks run).
    ///
    /// Returns the number of retired instances.
    pub fn unmount(&self) -> usize {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let pass = PassGuard::enter(&self.pass_thread);
        if let Some(mount) = state.platform.query_selector(&state.config.mount_selector) {
            state.platform.clear_children(&mount);
        }
        state.previous = None;
        state.root_scope = None;
        state.scopes.clear();
        self.staged_root.lock().take();
        let retired = state.registry.clear();
        drop(pass);
        // Nothing left to render for requests made by unmount hooks
        self.deferred.store(false, Ordering::Release);
        tracing::info!(retired, "renderer unmounted");
        retired
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// Run a root pass.
    pub fn render_root(&self) -> Result<PassOutcome, RenderError> {
        self.run(Request::Root)
    }

    /// Request a root pass.
    pub fn request_rerender(&self) -> Result<PassOutcome, RenderError> {
        self.run(Request::Root)
    }

    /// Request a pass limited to `owner`'s subtree.
    pub fn request_scoped_rerender(&self, owner: &InstanceKey) -> Result<PassOutcome, RenderError> {
        self.run(Request::Scoped(owner))
    }

    fn on_pass_thread(&self) -> bool {
        *self.pass_thread.lock() == Some(thread::current().id())
    }

    fn run(&self, request: Request<'_>) -> Result<PassOutcome, RenderError> {
        if self.on_pass_thread() {
            if let Request::Scoped(owner) = request {
                if !self.registered.read().contains(owner) {
                    return Err(RenderError::UnregisteredOwner(owner.clone()));
                }
            }
            tracing::debug!("render requested during a pass, deferring");
            self.deferred.store(true, Ordering::Release);
            return Ok(PassOutcome::Deferred);
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let _pass = PassGuard::enter(&self.pass_thread);

        let mut outcome = match request {
            Request::Root => self.root_pass(state),
            Request::Scoped(owner) => self.scoped_pass(state, owner)?,
        };

        let mut follow_ups = 0;
        while self.deferred.swap(false, Ordering::AcqRel) {
            if follow_ups == state.config.max_follow_up_passes {
                tracing::warn!(follow_ups, "follow-up pass limit reached, dropping request");
                break;
            }
            follow_ups += 1;
            outcome = outcome.followed_by(self.root_pass(state));
        }
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Passes
    // -------------------------------------------------------------------------

    fn root_pass(&self, state: &mut RenderState<P>) -> PassOutcome {
        state.passes += 1;
        let _span = tracing::debug_span!("root_pass", pass = state.passes).entered();

        let Some(mount) = state.platform.query_selector(&state.config.mount_selector) else {
            tracing::warn!(selector = %state.config.mount_selector, "mount point not found, skipping pass");
            return PassOutcome::Skipped(SkipReason::MissingMount);
        };

        let handle = self.handle();
        let root_key = InstanceKey::root();
        state.registry.begin_pass();

        let staged = self.staged_root.lock().take();
        if let Some(StagedRoot { component, key }) = staged {
            tracing::info!(scope = %key, component = (*component).type_name(), "installing root");
            state.registry.insert(root_key.clone(), component, &handle);
            state.root_scope = Some(key);
        }

        let Some(instance) = state.registry.take(&root_key) else {
            tracing::warn!("no active root, skipping pass");
            return PassOutcome::Skipped(SkipReason::NoRoot);
        };

        let scope = state.root_scope.clone();
        let scope_changed = state
            .previous
            .as_ref()
            .is_some_and(|previous| previous.scope != scope);
        if scope_changed {
            // Children of the outgoing root must not be adopted by the new one
            let retired = state.registry.retire_descendants(&root_key);
            tracing::info!(scope = ?scope, retired, "root scope changed");
        }

        let mut tree = RenderContext::new(&mut state.registry, &handle).render_instance(root_key, instance);
        tree.scope = scope;

        let platform = &mut state.platform;
        let outcome = match state.previous.take() {
            None => {
                platform.clear_children(&mount);
                materialize_into(platform, &mount, &tree);
                PassOutcome::Materialized
            }
            Some(_) if scope_changed => {
                platform.clear_children(&mount);
                materialize_into(platform, &mount, &tree);
                PassOutcome::Replaced
            }
            Some(previous) => match platform.child_at(&mount, 0) {
                Some(native) => PassOutcome::Patched(diff_and_apply(platform, &native, &previous, &tree).flags),
                None => {
                    tracing::warn!("mount point emptied outside the renderer, rebuilding");
                    materialize_into(platform, &mount, &tree);
                    PassOutcome::Materialized
                }
            },
        };

        state.scopes.rebuild(&state.platform, &mount, &tree);
        state.previous = Some(tree);
        let retired = state.registry.retire_inactive();
        tracing::debug!(?outcome, retired, "root pass complete");
        outcome
    }

    fn scoped_pass(&self, state: &mut RenderState<P>, owner: &InstanceKey) -> Result<PassOutcome, RenderError> {
        if !state.registry.contains(owner) {
            return Err(RenderError::UnregisteredOwner(owner.clone()));
        }
        if self.staged_root.lock().is_some() {
            tracing::debug!(owner = %owner, "root change pending, running root pass");
            return Ok(self.root_pass(state));
        }
        let Some(ScopeEntry { path, native }) = state.scopes.get(owner).cloned() else {
            tracing::debug!(owner = %owner, "no retained tree for owner, running root pass");
            return Ok(self.root_pass(state));
        };
        let has_node = state.previous.as_ref().and_then(|t| t.at_path(&path)).is_some();
        if !has_node {
            tracing::debug!(owner = %owner, "retained tree out of sync, running root pass");
            return Ok(self.root_pass(state));
        }
        let Some(mount) = state.platform.query_selector(&state.config.mount_selector) else {
            tracing::warn!(selector = %state.config.mount_selector, "mount point not found, skipping pass");
            return Ok(PassOutcome::Skipped(SkipReason::MissingMount));
        };

        state.passes += 1;
        let _span = tracing::debug_span!("scoped_pass", pass = state.passes, owner = %owner).entered();

        let handle = self.handle();
        state.registry.begin_pass();
        let Some(instance) = state.registry.take(owner) else {
            tracing::warn!(owner = %owner, "owner is checked out, running root pass");
            return Ok(self.root_pass(state));
        };
        let mut subtree = RenderContext::new(&mut state.registry, &handle).render_instance(owner.clone(), instance);

        let Some(old) = state.previous.as_mut().and_then(|tree| tree.at_path_mut(&path)) else {
            tracing::warn!(owner = %owner, "retained tree lost its owner node");
            return Ok(PassOutcome::Skipped(SkipReason::NoRoot));
        };

        // Keep the owners of enclosing components that rendered this same node
        let outer: Vec<InstanceKey> = old
            .owners
            .iter()
            .skip_while(|key| *key != owner)
            .skip(1)
            .cloned()
            .collect();
        subtree.owners.extend(outer);
        if path.is_empty() {
            subtree.scope = old.scope.clone();
        }

        let patched = diff_and_apply(&mut state.platform, &native, old, &subtree);
        *old = subtree;

        if let Some(tree) = &state.previous {
            state.scopes.rebuild(&state.platform, &mount, tree);
        }
        let retired = state.registry.retire_inactive_under(owner);
        tracing::debug!(flags = ?patched.flags, retired, "scoped pass complete");
        Ok(PassOutcome::Patched(patched.flags))
    }

    // -------------------------------------------------------------------------
    // Router
    // -------------------------------------------------------------------------

    /// Install the router used by [`navigate`](Self::navigate).
    pub fn set_router(&self, router: Arc<dyn NavigationManager>) {
        *self.router.write() = Some(router);
    }

    pub fn has_router(&self) -> bool {
        self.router.read().is_some()
    }

    /// Callback that swaps the active root and requests a pass.
    pub fn route_handler(&self) -> RouteChangeHandler {
        let this = self.this.clone();
        Arc::new(move |change: RouteChange| {
            let Some(renderer) = this.upgrade() else {
                tracing::debug!(scope = %change.key, "route change after renderer dropped");
                return;
            };
            renderer.set_active_root_boxed(change.component, change.key);
            if let Err(err) = renderer.request_rerender() {
                tracing::warn!(%err, "render after route change failed");
            }
        })
    }

    /// Start the installed router with [`route_handler`](Self::route_handler).
    pub fn start_router(&self) -> Result<(), RenderError> {
        let router = self.router.read().clone().ok_or(RenderError::NoRouter)?;
        router.start(self.route_handler())?;
        Ok(())
    }

    /// Navigate through the installed router.
    pub fn navigate(&self, path: &str) -> Result<(), RenderError> {
        let router = self.router.read().clone().ok_or(RenderError::NoRouter)?;
        tracing::debug!(path, "navigating");
        router.navigate(path)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Deliver `event` to the handler bound on `node`.
    ///
    /// The handler runs without the renderer lock held, so it may request
    /// renders. Returns false when no handler is bound for the event.
    pub fn dispatch_event(&self, node: &P::Handle, event: &mut Event) -> bool {
        if self.on_pass_thread() {
            tracing::warn!(event = event.name(), "event dispatched during a pass, dropped");
            return false;
        }
        let handler = self.state.lock().platform.event_handler(node, event.name());
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => {
                tracing::trace!(event = event.name(), "no handler bound");
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Run `f` against the platform. Must not be called from inside a pass.
    pub fn with_platform<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut self.state.lock().platform)
    }

    /// Run `f` against the instance registered under `key` as type `T`.
    pub fn with_instance<T: Component, R>(&self, key: &InstanceKey, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.state.lock().registry.downcast_mut::<T>(key).map(f)
    }

    /// Native mount point, if present.
    pub fn mount_point(&self) -> Option<P::Handle> {
        let state = self.state.lock();
        state.platform.query_selector(&state.config.mount_selector)
    }

    /// Native node for the root of the retained tree.
    pub fn root_node(&self) -> Option<P::Handle> {
        let state = self.state.lock();
        let mount = state.platform.query_selector(&state.config.mount_selector)?;
        state.platform.child_at(&mount, 0)
    }

    /// Native node currently representing `key`'s subtree.
    pub fn node_of(&self, key: &InstanceKey) -> Option<P::Handle> {
        self.state.lock().scopes.get(key).map(|entry| entry.native.clone())
    }

    /// Clone of the tree retained from the last pass.
    pub fn retained_tree(&self) -> Option<Node> {
        self.state.lock().previous.clone()
    }

    /// Keys of all registered instances, sorted.
    pub fn instance_keys(&self) -> Vec<InstanceKey> {
        self.state.lock().registry.keys()
    }

    /// Scope identity of the active root.
    pub fn root_scope(&self) -> Option<String> {
        self.state.lock().root_scope.clone()
    }

    /// Number of passes run so far.
    pub fn pass_count(&self) -> u64 {
        self.state.lock().passes
    }
}

impl<P> Scheduler for Renderer<P>
where
    P: Platform + Send + 'static,
    P::Handle: Send,
{
    fn request_rerender(&self) -> Result<PassOutcome, RenderError> {
        Renderer::request_rerender(self)
    }

    fn request_scoped_rerender(&self, owner: &InstanceKey) -> Result<PassOutcome, RenderError> {
        Renderer::request_scoped_rerender(self, owner)
    }

    fn navigate(&self, path: &str) -> Result<(), RenderError> {
        Renderer::navigate(self, path)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, NodeId};
    use crate::primitives::paragraph;

    struct Static(&'static str);

    impl Component for Static {
        fn render(&mut self, _ctx: &mut RenderContext<'_>) -> Option<Node> {
            Some(paragraph(self.0))
        }
    }

    struct Empty;

    impl Component for Empty {
        fn render(&mut self, _ctx: &mut RenderContext<'_>) -> Option<Node> {
            None
        }
    }

    fn renderer() -> Arc<Renderer<MemoryDocument>> {
        Renderer::new(MemoryDocument::with_mount("app"), RendererConfig::default())
    }

    fn html(renderer: &Renderer<MemoryDocument>) -> String {
        let mount: NodeId = renderer.mount_point().unwrap();
        renderer.with_platform(|doc| doc.inner_html(mount))
    }

    #[test]
    fn test_first_pass_materializes() {
        let renderer = renderer();
        assert_eq!(renderer.mount(Static("hi"), "/"), Ok(PassOutcome::Materialized));
        assert_eq!(html(&renderer), "<p>hi</p>");
        assert_eq!(renderer.root_scope().as_deref(), Some("/"));
    }

    #[test]
    fn test_second_pass_patches_quietly() {
        let renderer = renderer();
        renderer.mount(Static("hi"), "/").unwrap();
        match renderer.request_rerender() {
            Ok(PassOutcome::Patched(flags)) => assert!(flags.is_empty()),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_missing_mount_skips() {
        let renderer = Renderer::new(MemoryDocument::new(), RendererConfig::default());
        assert_eq!(
            renderer.mount(Static("hi"), "/"),
            Ok(PassOutcome::Skipped(SkipReason::MissingMount))
        );
    }

    #[test]
    fn test_no_root_skips() {
        let renderer = renderer();
        assert_eq!(renderer.render_root(), Ok(PassOutcome::Skipped(SkipReason::NoRoot)));
    }

    #[test]
    fn test_empty_render_uses_placeholder() {
        let renderer = renderer();
        renderer.mount(Empty, "/").unwrap();
        assert_eq!(html(&renderer), "<template></template>");
    }

    #[test]
    fn test_existing_mount_content_cleared() {
        let mut doc = MemoryDocument::with_mount("app");
        let mount = doc.query_selector("#app").unwrap();
        let loading = doc.create_text("Loading...");
        doc.append_child(&mount, &loading);

        let renderer = Renderer::new(doc, RendererConfig::default());
        renderer.mount(Static("ready"), "/").unwrap();
        assert_eq!(html(&renderer), "<p>ready</p>");
    }

    #[test]
    fn test_unregistered_owner_is_error() {
        let renderer = renderer();
        renderer.mount(Static("hi"), "/").unwrap();
        let ghost = InstanceKey::root().child("ghost");
        assert_eq!(
            renderer.request_scoped_rerender(&ghost),
            Err(RenderError::UnregisteredOwner(ghost))
        );
    }

    #[test]
    fn test_follow_up_outcomes_merge() {
        let first = PassOutcome::Patched(PatchFlags::CONTENT);
        assert_eq!(
            first.followed_by(PassOutcome::Patched(PatchFlags::ATTRIBUTES)),
            PassOutcome::Patched(PatchFlags::CONTENT | PatchFlags::ATTRIBUTES)
        );
        assert_eq!(
            PassOutcome::Materialized.followed_by(PassOutcome::Patched(PatchFlags::CONTENT)),
            PassOutcome::Materialized
        );
        assert_eq!(
            PassOutcome::Replaced.followed_by(PassOutcome::Skipped(SkipReason::MissingMount)),
            PassOutcome::Replaced
        );
        assert_eq!(
            PassOutcome::Materialized.followed_by(PassOutcome::Replaced),
            PassOutcome::Replaced
        );
        assert_eq!(
            PassOutcome::Skipped(SkipReason::NoRoot).followed_by(PassOutcome::Materialized),
            PassOutcome::Materialized
        );
    }

    #[test]
    fn test_navigate_without_router() {
        let renderer = renderer();
        assert_eq!(renderer.navigate("/about"), Err(RenderError::NoRouter));
        assert_eq!(renderer.start_router(), Err(RenderError::NoRouter));
    }

    #[test]
    fn test_unmount_clears() {
        let renderer = renderer();
        renderer.mount(Static("x"), "/").unwrap();
        assert_eq!(renderer.unmount(), 1);
        assert_eq!(html(&renderer), "");
        assert!(renderer.instance_keys().is_empty());
    }

    #[test]
    fn test_handle_outlives_renderer() {
        let renderer = renderer();
        let handle = renderer.handle();
        assert!(handle.is_alive());
        drop(renderer);
        assert_eq!(handle.request_rerender(), Err(RenderError::RendererDropped));
    }
}

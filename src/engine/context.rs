//! Render context - What a render function gets to resolve nested components.

use std::panic::{self, AssertUnwindSafe};

use super::lifecycle::{run_hook, same_type, Component};
use super::registry::InstanceRegistry;
use crate::pipeline::RendererHandle;
use crate::types::{InstanceKey, Node};

/// Context segment for a candidate rendered under an already claimed key.
const DUPLICATE_SCOPE: &str = "#dup";

/// Passed to [`Component::render`].
///
/// Nested components are resolved with [`resolve_child`](Self::resolve_child),
/// which either reuses the instance already living under the composite key or
/// adopts the freshly constructed candidate.
pub struct RenderContext<'a> {
    registry: &'a mut InstanceRegistry,
    handle: &'a RendererHandle,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(registry: &'a mut InstanceRegistry, handle: &'a RendererHandle) -> Self {
        Self { registry, handle }
    }

    /// Key of the instance currently rendering.
    pub fn current_key(&self) -> InstanceKey {
        self.registry.current_key()
    }

    /// Handle to the renderer running this pass.
    pub fn handle(&self) -> &RendererHandle {
        self.handle
    }

    /// Resolve and render the child component at `local_key`.
    ///
    /// The composite key is `current_key + ":" + local_key`. A new key adopts
    /// `candidate`; a known key keeps its instance and offers `candidate` to
    /// [`PropSync`](super::PropSync). A known key holding a different concrete
    /// type is retired and `candidate` takes its place.
    ///
    /// A key already resolved in this pass is not resolved again: `candidate`
    /// renders once, unregistered, and its own children are keyed under
    /// `key:#dup`.
    pub fn resolve_child<C: Component>(&mut self, local_key: &str, candidate: C) -> Node {
        self.resolve_child_boxed(local_key, Box::new(candidate))
    }

    /// [`resolve_child`](Self::resolve_child) for an already boxed candidate.
    pub fn resolve_child_boxed(&mut self, local_key: &str, mut candidate: Box<dyn Component>) -> Node {
        let key = self.registry.current_key().child(local_key);
        if self.registry.is_active(&key) {
            return self.render_duplicate(key, candidate);
        }

        let instance = match self.registry.take(&key) {
            Some(mut existing) if same_type(&*existing, &*candidate) => {
                if let Some(sync) = existing.as_prop_sync() {
                    let props = (*candidate).as_any_mut();
                    let applied = panic::catch_unwind(AssertUnwindSafe(|| {
                        run_hook(&key, "apply_props", || sync.apply_props(props))
                    }));
                    if let Err(payload) = applied {
                        self.registry.restore(&key, existing);
                        panic::resume_unwind(payload);
                    }
                }
                existing
            }
            Some(existing) => {
                tracing::debug!(
                    key = %key,
                    from = (*existing).type_name(),
                    to = (*candidate).type_name(),
                    "component type changed, retiring instance"
                );
                self.registry.retire_checked_out(&key, existing);
                self.adopt(&key, candidate)
            }
            None if self.registry.contains(&key) => return self.render_duplicate(key, candidate),
            None => self.adopt(&key, candidate),
        };

        self.render_instance(key, instance)
    }

    fn adopt(&mut self, key: &InstanceKey, candidate: Box<dyn Component>) -> Box<dyn Component> {
        tracing::trace!(key = %key, "new instance");
        self.registry.adopt(key.clone(), candidate, self.handle)
    }

    /// Key already resolved in this pass: the first resolution keeps the
    /// instance, this candidate renders once without a registry entry.
    fn render_duplicate(&mut self, key: InstanceKey, candidate: Box<dyn Component>) -> Node {
        tracing::warn!(key = %key, "duplicate key in one render, rendering candidate unregistered");
        self.render_unregistered(key.child(DUPLICATE_SCOPE), candidate)
    }

    /// Render a candidate that has no registry entry, under its own context.
    fn render_unregistered(&mut self, scope: InstanceKey, mut candidate: Box<dyn Component>) -> Node {
        let depth = self.registry.depth();
        self.registry.push_context(scope.clone());
        let rendered = run_hook(&scope, "render", || candidate.render(self)).flatten();
        self.registry.truncate_context(depth);
        rendered.unwrap_or_else(Node::placeholder)
    }

    /// Run hooks and render a checked-out instance, then check it back in.
    ///
    /// Order: mount (first time only), parameters, render. The instance is
    /// checked back in even when a hook unwinds.
    pub(crate) fn render_instance(&mut self, key: InstanceKey, mut instance: Box<dyn Component>) -> Node {
        self.registry.mark_active(&key);

        let depth = self.registry.depth();
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| self.run_hooks(&key, &mut *instance)));
        self.registry.truncate_context(depth);
        self.registry.restore(&key, instance);
        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(payload) => panic::resume_unwind(payload),
        };

        let mut node = rendered.unwrap_or_else(|| {
            tracing::trace!(key = %key, "empty render, substituting placeholder");
            Node::placeholder()
        });
        node.owners.push(key);
        node
    }

    fn run_hooks(&mut self, key: &InstanceKey, instance: &mut dyn Component) -> Option<Node> {
        if !self.registry.is_mounted(key) {
            if let Some(mountable) = instance.as_mountable() {
                run_hook(key, "on_mount", || mountable.on_mount());
            }
            self.registry.set_mounted(key);
        }
        if let Some(sync) = instance.as_parameter_sync() {
            run_hook(key, "on_parameters_set", || sync.on_parameters_set());
        }

        self.registry.push_context(key.clone());
        run_hook(key, "render", || instance.render(self)).flatten()
    }
}

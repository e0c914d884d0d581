//! Instance Registry - Keyed component instances across passes.
//!
//! Manages the lifecycle of component instances:
//! - Composite key → instance mapping (exactly one live instance per key)
//! - Mount bookkeeping so the mount hook fires once per instance
//! - Active set, rebuilt every pass; keys left out are retired
//! - Rendering-context stack for composite key derivation
//! - Retirement queue, flushed (unmount hooks) in the cleanup phase
//!
//! The registry is owned by a renderer and only touched under its lock.
//! Instances are checked out with [`InstanceRegistry::take`] while they render,
//! so a render function can resolve children without aliasing its own entry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use super::lifecycle::{run_hook, Component, ComponentContext};
use crate::pipeline::RendererHandle;
use crate::types::InstanceKey;

// =============================================================================
// Registry State
// =============================================================================

struct Entry {
    /// `None` while the instance is checked out for rendering.
    instance: Option<Box<dyn Component>>,
    context: ComponentContext,
    mounted: bool,
}

/// Registered keys, readable without access to the registry itself.
pub(crate) type KeyIndex = Arc<RwLock<HashSet<InstanceKey>>>;

/// Key → instance map with mount and activity bookkeeping.
#[derive(Default)]
pub struct InstanceRegistry {
    entries: HashMap<InstanceKey, Entry>,
    active: HashSet<InstanceKey>,
    stack: Vec<InstanceKey>,
    retired: Vec<(InstanceKey, Entry)>,
    index: KeyIndex,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if an instance is registered under `key`.
    pub fn contains(&self, key: &InstanceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Shared view of the registered keys, kept in step with adoption and
    /// retirement. Lets a renderer validate requests made while it is busy.
    pub(crate) fn key_index(&self) -> KeyIndex {
        Arc::clone(&self.index)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<InstanceKey> {
        let mut keys: Vec<_> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn is_mounted(&self, key: &InstanceKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.mounted)
    }

    pub fn is_active(&self, key: &InstanceKey) -> bool {
        self.active.contains(key)
    }

    /// Borrow a registered instance as its concrete type.
    pub fn downcast_mut<T: Component>(&mut self, key: &InstanceKey) -> Option<&mut T> {
        let instance = self.entries.get_mut(key)?.instance.as_mut()?;
        (**instance).as_any_mut().downcast_mut::<T>()
    }

    // -------------------------------------------------------------------------
    // Pass bookkeeping
    // -------------------------------------------------------------------------

    /// Reset the active set and the rendering-context stack.
    pub fn begin_pass(&mut self) {
        self.active.clear();
        self.stack.clear();
    }

    pub fn mark_active(&mut self, key: &InstanceKey) {
        self.active.insert(key.clone());
    }

    pub fn set_mounted(&mut self, key: &InstanceKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.mounted = true;
        }
    }

    // -------------------------------------------------------------------------
    // Rendering-context stack
    // -------------------------------------------------------------------------

    /// Key of the instance currently rendering (root when none is).
    pub fn current_key(&self) -> InstanceKey {
        self.stack.last().cloned().unwrap_or_else(InstanceKey::root)
    }

    pub fn push_context(&mut self, key: InstanceKey) {
        self.stack.push(key);
    }

    pub fn pop_context(&mut self) {
        self.stack.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drop contexts left behind by an absorbed panic.
    pub(crate) fn truncate_context(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    // -------------------------------------------------------------------------
    // Check-out / check-in
    // -------------------------------------------------------------------------

    /// Register a fresh instance under `key` and attach its context.
    ///
    /// An instance already registered under `key` is queued for retirement.
    pub fn insert(&mut self, key: InstanceKey, instance: Box<dyn Component>, handle: &RendererHandle) {
        let instance = self.adopt(key.clone(), instance, handle);
        self.restore(&key, instance);
    }

    /// Like [`insert`](Self::insert), but hand the instance back checked out.
    pub(crate) fn adopt(
        &mut self,
        key: InstanceKey,
        mut instance: Box<dyn Component>,
        handle: &RendererHandle,
    ) -> Box<dyn Component> {
        let context = ComponentContext::new(key.clone(), handle.clone());
        instance.attach(context.clone());
        let entry = Entry {
            instance: None,
            context,
            mounted: false,
        };
        self.index.write().insert(key.clone());
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            self.retired.push((key, previous));
        }
        instance
    }

    /// Check an instance out for rendering.
    pub fn take(&mut self, key: &InstanceKey) -> Option<Box<dyn Component>> {
        self.entries.get_mut(key)?.instance.take()
    }

    /// Check an instance back in after rendering.
    pub fn restore(&mut self, key: &InstanceKey, instance: Box<dyn Component>) {
        match self.entries.get_mut(key) {
            Some(entry) => entry.instance = Some(instance),
            None => tracing::warn!(key = %key, "restoring instance with no entry, dropping"),
        }
    }

    // -------------------------------------------------------------------------
    // Retirement
    // -------------------------------------------------------------------------

    /// Queue the checked-out instance under `key` for retirement.
    ///
    /// The key is free for a new instance immediately; the unmount hook runs
    /// at the next [`flush_retired`](Self::flush_retired).
    pub fn retire_checked_out(&mut self, key: &InstanceKey, instance: Box<dyn Component>) {
        if let Some(mut entry) = self.entries.remove(key) {
            self.index.write().remove(key);
            entry.instance = Some(instance);
            self.retired.push((key.clone(), entry));
        }
    }

    /// Queue every instance matching `pred` for retirement.
    fn retire_where(&mut self, pred: impl Fn(&InstanceKey) -> bool) -> usize {
        let keys: Vec<InstanceKey> = self.entries.keys().filter(|&k| pred(k)).cloned().collect();
        let count = keys.len();
        let mut index = self.index.write();
        for key in &keys {
            index.remove(key);
        }
        drop(index);
        for key in keys {
            if let Some(entry) = self.entries.remove(&key) {
                self.retired.push((key, entry));
            }
        }
        count
    }

    /// Queue every instance below `ancestor` for retirement.
    pub fn retire_descendants(&mut self, ancestor: &InstanceKey) -> usize {
        self.retire_where(|key| key.is_descendant_of(ancestor))
    }

    /// Retire every key not marked active this pass, then flush.
    ///
    /// Returns the number of unmounted instances.
    pub fn retire_inactive(&mut self) -> usize {
        let active = std::mem::take(&mut self.active);
        self.retire_where(|key| !active.contains(key));
        self.active = active;
        self.flush_retired()
    }

    /// Retire inactive keys below `owner` only, then flush.
    pub fn retire_inactive_under(&mut self, owner: &InstanceKey) -> usize {
        let active = std::mem::take(&mut self.active);
        self.retire_where(|key| key.is_descendant_of(owner) && !active.contains(key));
        self.active = active;
        self.flush_retired()
    }

    /// Run unmount hooks for queued instances and drop them.
    pub fn flush_retired(&mut self) -> usize {
        let retired = std::mem::take(&mut self.retired);
        let count = retired.len();
        for (key, entry) in retired {
            entry.context.dispose();
            let Some(mut instance) = entry.instance else {
                tracing::warn!(key = %key, "retired instance still checked out");
                continue;
            };
            if let Some(unmountable) = instance.as_unmountable() {
                run_hook(&key, "on_unmount", || unmountable.on_unmount());
            }
            tracing::debug!(key = %key, "instance retired");
        }
        count
    }

    /// Queue all instances for retirement and flush.
    pub fn clear(&mut self) -> usize {
        self.retire_where(|_| true);
        self.active.clear();
        self.stack.clear();
        self.flush_retired()
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Scope cache - Where each instance's subtree lives.
//!
//! Rebuilt after every pass by walking the retained tree and the native tree
//! in parallel. An entry records the tree path of the node an instance
//! rendered and the native handle currently representing it, which is all a
//! scoped pass needs to diff one instance in isolation.

use std::collections::HashMap;

use crate::dom::Platform;
use crate::types::{InstanceKey, Node};

/// Location of one instance's subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeEntry<H> {
    /// Child indices from the root tree to the instance's node.
    pub path: Vec<usize>,
    /// Native node currently representing it.
    pub native: H,
}

/// Instance key → subtree location.
#[derive(Debug, Clone)]
pub struct ScopeCache<H> {
    entries: HashMap<InstanceKey, ScopeEntry<H>>,
}

impl<H> Default for ScopeCache<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H: Clone> ScopeCache<H> {
    pub fn get(&self, key: &InstanceKey) -> Option<&ScopeEntry<H>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Re-index `tree`, whose native root is the first child of `mount`.
    pub fn rebuild<P>(&mut self, platform: &P, mount: &H, tree: &Node)
    where
        P: Platform<Handle = H>,
    {
        self.entries.clear();
        let Some(native) = platform.child_at(mount, 0) else {
            return;
        };
        let mut path = Vec::new();
        self.index(platform, tree, native, &mut path);
        tracing::trace!(scopes = self.entries.len(), "scope cache rebuilt");
    }

    fn index<P>(&mut self, platform: &P, node: &Node, native: H, path: &mut Vec<usize>)
    where
        P: Platform<Handle = H>,
    {
        for owner in node.owners() {
            self.entries.insert(
                owner.clone(),
                ScopeEntry {
                    path: path.clone(),
                    native: native.clone(),
                },
            );
        }
        for (index, child) in node.children.iter().enumerate() {
            let Some(native_child) = platform.child_at(&native, index) else {
                break;
            };
            path.push(index);
            self.index(platform, child, native_child, path);
            path.pop();
        }
    }
}

//! # spark-vdom
//!
//! Retained-tree reconciliation engine for Rust UI runtimes.
//!
//! Application code describes its UI as a fresh [`Node`] tree on every state
//! change. The engine diffs that tree against the one it retained from the
//! previous pass and applies the smallest set of mutations to a persistent,
//! stateful render target, keeping native node identity (and with it focus,
//! caret and typed input) wherever it can.
//!
//! ## Architecture
//!
//! Stateful components are keyed by their position in the component graph
//! and live across passes in a registry owned by the renderer:
//! ```text
//! request → Renderer::render_root → Component::render → RenderContext::resolve_child
//!         → renderer::diff_and_apply → dom::Platform mutations → tree retained
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (Node, AttrValue, InstanceKey, PatchFlags)
//! - [`primitives`] - Element builders and typed event adapters
//! - [`dom`] - Native platform contract and the in-memory document
//! - [`renderer`] - Materialization and the positional diff
//! - [`engine`] - Component lifecycle, instance registry, render context
//! - [`pipeline`] - Renderer: root and scoped passes, handle, router contract
//! - [`config`] / [`error`] / [`logging`] - Ambient configuration, errors, tracing setup
//!
//! ## Example
//!
//! ```ignore
//! use spark_vdom::prelude::*;
//!
//! struct Hello;
//!
//! impl Component for Hello {
//!     fn render(&mut self, _ctx: &mut RenderContext<'_>) -> Option<Node> {
//!         Some(paragraph("hello"))
//!     }
//! }
//!
//! let renderer = Renderer::new(MemoryDocument::with_mount("app"), RendererConfig::default());
//! renderer.mount(Hello, "/")?;
//! ```

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::RendererConfig;
pub use error::{NavigationError, RenderError};

pub use dom::{MemoryDocument, Mutation, NodeId, Platform};

pub use engine::{
    AsAny, Component, ComponentBase, ComponentContext, InstanceRegistry, Mountable,
    ParameterSync, PropSync, RenderContext, Unmountable,
};

pub use pipeline::{
    NavigationManager, PassOutcome, Renderer, RendererHandle, RouteChange, RouteChangeHandler,
    SkipReason,
};

pub use renderer::{diff_and_apply, materialize, materialize_into, patch_mount, Patched};

pub use primitives::{ActivationHandler, Event, EventArgs, EventHandler};

/// Everything a component module usually needs.
pub mod prelude {
    pub use crate::config::RendererConfig;
    pub use crate::dom::MemoryDocument;
    pub use crate::engine::{
        Component, ComponentBase, ComponentContext, Mountable, ParameterSync, PropSync,
        RenderContext, Unmountable,
    };
    pub use crate::error::RenderError;
    pub use crate::pipeline::{PassOutcome, Renderer, RendererHandle};
    pub use crate::primitives::events;
    pub use crate::primitives::*;
    pub use crate::types::{InstanceKey, Node};
}

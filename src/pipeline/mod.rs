//! Render Pipeline
//!
//! This module connects component instances to native output.
//!
//! # Pipeline Architecture
//!
//! ```text
//! request → Renderer (lock) → root render → renderer::diff_and_apply → retained tree
//! ```
//!
//! ## Components
//!
//! 1. **scheduler** - [`Renderer`]: root and scoped passes, reentrancy, events
//! 2. **scope** - [`ScopeCache`]: instance key → retained subtree and native node
//! 3. **handle** - [`RendererHandle`]: weak request-side access for components
//! 4. **router** - [`NavigationManager`]: contract of an external router
//!
//! ## Key Design Principles
//!
//! - **One lock**: every entry point serializes on the renderer's mutex
//! - **Requests inside a pass are deferred**: served by a follow-up root pass
//!   instead of re-entering the lock
//! - **Unmount after apply**: retired instances are unmounted only in cleanup

mod handle;
mod router;
mod scheduler;
mod scope;

pub use handle::RendererHandle;
pub use router::{NavigationManager, RouteChange, RouteChangeHandler};
pub use scheduler::{PassOutcome, Renderer, SkipReason};
pub use scope::{ScopeCache, ScopeEntry};

//! Engine - Component instances and their lifecycle.
//!
//! The engine manages everything that outlives a single tree:
//! - Registry: Composite key → instance, mount flags, active set, retirement
//! - Context: [`RenderContext`] and `resolve_child` for nested components
//! - Lifecycle: [`Component`] and the optional capability hooks
//!
//! # Architecture
//!
//! Components are NOT nodes. A component is a stateful object that *produces*
//! nodes; its identity is the composite key of the position it renders at:
//!
//! ```text
//! __root__                 App       (renders Header and Page)
//! __root__:header          Header
//! __root__:page            HomePage  (renders two Cards)
//! __root__:page:card-0     Card
//! __root__:page:card-1     Card
//! ```
//!
//! Two `Card`s under different parents get different keys, so their state
//! never collides.

mod context;
mod lifecycle;
mod registry;

pub use context::RenderContext;
pub use lifecycle::{
    AsAny, Component, ComponentBase, ComponentContext, Mountable, ParameterSync, PropSync,
    Unmountable,
};
pub use registry::InstanceRegistry;
pub(crate) use registry::KeyIndex;

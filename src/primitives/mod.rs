//! Primitives - Tree building blocks.
//!
//! This module provides what render functions use to describe output:
//! - [`elements`] - Builders for common elements (`div`, `input_text`, `select`, ...)
//! - [`events`] - Typed event arguments and handler adapters
//!
//! # Handlers
//!
//! Handlers are bound as `on*` attributes. They cannot be compared for change,
//! so the renderer rebinds them on every patch; binding a new handler for the
//! same event simply supersedes the previous one on the native node.
//!
//! ```ignore
//! use spark_vdom::primitives::{button, events};
//!
//! let count = counter.clone();
//! button("+1").on("click", events::click(move |_| count.increment()));
//! ```

mod elements;
pub mod events;

pub use elements::*;
pub use events::{ActivationHandler, Event, EventArgs, EventHandler};

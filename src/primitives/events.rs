//! Events - Typed event arguments and handler adapters.
//!
//! Native platforms deliver an [`Event`] to the handler bound under an
//! `on*` attribute. Handlers are shared (`Arc`) so a background thread can
//! hold the same callback the tree holds.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::primitives::{button, events};
//!
//! let node = button("Save").on("click", events::click(|args| {
//!     println!("clicked at {},{}", args.client_x, args.client_y);
//! }));
//! ```

use std::sync::Arc;

// =============================================================================
// Callback Types
// =============================================================================

/// Event handler bound under an `on*` attribute.
pub type EventHandler = Arc<dyn Fn(&mut Event) + Send + Sync>;

/// Legacy activation callback (no event arguments).
pub type ActivationHandler = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// Event Arguments
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Create empty modifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Create modifiers with ctrl
    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    /// Create modifiers with shift
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Pointer activation (`click`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClickEventArgs {
    pub client_x: i32,
    pub client_y: i32,
    /// 0 = left, 1 = middle, 2 = right
    pub button: i16,
    pub modifiers: Modifiers,
}

/// Value change of a form element (`input`, `change`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeEventArgs {
    /// Current value of the element. Checkboxes report `"true"` / `"false"`.
    pub value: String,
}

/// Key press (`keydown`, `keyup`, `keypress`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyboardEventArgs {
    /// Key value (e.g., "a", "Enter", "Escape")
    pub key: String,
    /// Physical key code (e.g., "KeyA")
    pub code: String,
    pub modifiers: Modifiers,
}

/// Raw pointer movement or button change (`mousedown`, `mouseup`, `mousemove`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MouseEventArgs {
    pub client_x: i32,
    pub client_y: i32,
    pub button: i16,
    pub modifiers: Modifiers,
}

/// Payload of an [`Event`].
#[derive(Clone, Debug, PartialEq)]
pub enum EventArgs {
    Click(ClickEventArgs),
    Change(ChangeEventArgs),
    Keyboard(KeyboardEventArgs),
    Mouse(MouseEventArgs),
    Focus,
    Form,
    None,
}

// =============================================================================
// Event
// =============================================================================

/// An event delivered to a handler.
#[derive(Clone, Debug)]
pub struct Event {
    name: String,
    args: EventArgs,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// Create an event with the given native name and payload.
    pub fn new(name: impl Into<String>, args: EventArgs) -> Self {
        Self {
            name: name.into(),
            args,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// A `click` event.
    pub fn click(args: ClickEventArgs) -> Self {
        Self::new("click", EventArgs::Click(args))
    }

    /// An `input` event carrying the element's new value.
    pub fn input(value: impl Into<String>) -> Self {
        Self::new(
            "input",
            EventArgs::Change(ChangeEventArgs { value: value.into() }),
        )
    }

    /// A `change` event carrying the element's committed value.
    pub fn change(value: impl Into<String>) -> Self {
        Self::new(
            "change",
            EventArgs::Change(ChangeEventArgs { value: value.into() }),
        )
    }

    /// A `keydown` event.
    pub fn key_down(key: impl Into<String>) -> Self {
        Self::new(
            "keydown",
            EventArgs::Keyboard(KeyboardEventArgs {
                key: key.into(),
                ..KeyboardEventArgs::default()
            }),
        )
    }

    /// A `submit` event.
    pub fn submit() -> Self {
        Self::new("submit", EventArgs::Form)
    }

    /// Native event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event payload.
    pub fn args(&self) -> &EventArgs {
        &self.args
    }

    /// Prevent the platform's default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stop the event from bubbling further.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

// =============================================================================
// Adapters
// =============================================================================

/// Adapt a handler that only needs the event to fire.
pub fn handler(f: impl Fn(&mut Event) + Send + Sync + 'static) -> EventHandler {
    Arc::new(f)
}

/// Adapt a click handler. Events without click arguments are ignored.
pub fn click(f: impl Fn(&ClickEventArgs) + Send + Sync + 'static) -> EventHandler {
    Arc::new(move |event: &mut Event| match event.args() {
        EventArgs::Click(args) => f(args),
        other => tracing::trace!(event = event.name(), ?other, "click adapter skipped event"),
    })
}

/// Adapt a value-change handler (`input`, `change`).
pub fn change(f: impl Fn(&ChangeEventArgs) + Send + Sync + 'static) -> EventHandler {
    Arc::new(move |event: &mut Event| match event.args() {
        EventArgs::Change(args) => f(args),
        other => tracing::trace!(event = event.name(), ?other, "change adapter skipped event"),
    })
}

/// Adapt a keyboard handler.
pub fn keyboard(f: impl Fn(&KeyboardEventArgs) + Send + Sync + 'static) -> EventHandler {
    Arc::new(move |event: &mut Event| match event.args() {
        EventArgs::Keyboard(args) => f(args),
        other => tracing::trace!(event = event.name(), ?other, "keyboard adapter skipped event"),
    })
}

/// Adapt a mouse handler.
pub fn mouse(f: impl Fn(&MouseEventArgs) + Send + Sync + 'static) -> EventHandler {
    Arc::new(move |event: &mut Event| match event.args() {
        EventArgs::Mouse(args) => f(args),
        other => tracing::trace!(event = event.name(), ?other, "mouse adapter skipped event"),
    })
}

/// Adapt a form submission handler. The default action is always prevented.
pub fn submit(f: impl Fn() + Send + Sync + 'static) -> EventHandler {
    Arc::new(move |event: &mut Event| {
        event.prevent_default();
        f();
    })
}

// =============================================================================
// Tests
// =============================================================================

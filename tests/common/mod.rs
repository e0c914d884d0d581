//! Shared components for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use spark_vdom::prelude::*;

/// Ordered record of lifecycle calls, e.g. `"mount:header"`.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Renderer over a fresh in-memory document with an `#app` mount.
pub fn memory_renderer() -> Arc<Renderer<MemoryDocument>> {
    Renderer::new(MemoryDocument::with_mount("app"), RendererConfig::default())
}

/// HTML currently under the mount point.
pub fn html(renderer: &Renderer<MemoryDocument>) -> String {
    match renderer.mount_point() {
        Some(mount) => renderer.with_platform(|doc| doc.inner_html(mount)),
        None => String::new(),
    }
}

// =============================================================================
// Tracked - records every hook
// =============================================================================

static NEXT_SERIAL: AtomicUsize = AtomicUsize::new(0);

/// Leaf component that journals its hooks and renders `<p>{label}</p>`.
pub struct Tracked {
    pub name: String,
    pub label: String,
    pub journal: Journal,
    /// Unique per constructed value; survives only on the retained instance.
    pub serial: usize,
    pub renders: usize,
    pub context: Arc<Mutex<Option<ComponentContext>>>,
}

impl Tracked {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            journal: journal.clone(),
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            renders: 0,
            context: Arc::new(Mutex::new(None)),
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }
}

impl Mountable for Tracked {
    fn on_mount(&mut self) {
        self.journal.record(format!("mount:{}", self.name));
    }
}

impl ParameterSync for Tracked {
    fn on_parameters_set(&mut self) {
        self.journal.record(format!("params:{}", self.name));
    }
}

impl Unmountable for Tracked {
    fn on_unmount(&mut self) {
        self.journal.record(format!("unmount:{}", self.name));
    }
}

impl PropSync for Tracked {
    fn apply_props(&mut self, candidate: &mut dyn std::any::Any) {
        if let Some(next) = candidate.downcast_mut::<Tracked>() {
            self.label = std::mem::take(&mut next.label);
            self.journal.record(format!("props:{}", self.name));
        }
    }
}

impl Component for Tracked {
    fn attach(&mut self, context: ComponentContext) {
        *self.context.lock() = Some(context);
    }

    fn render(&mut self, _ctx: &mut RenderContext<'_>) -> Option<Node> {
        self.renders += 1;
        self.journal.record(format!("render:{}", self.name));
        Some(paragraph(self.label.clone()))
    }

    fn as_mountable(&mut self) -> Option<&mut dyn Mountable> {
        Some(self)
    }

    fn as_parameter_sync(&mut self) -> Option<&mut dyn ParameterSync> {
        Some(self)
    }

    fn as_unmountable(&mut self) -> Option<&mut dyn Unmountable> {
        Some(self)
    }

    fn as_prop_sync(&mut self) -> Option<&mut dyn PropSync> {
        Some(self)
    }
}

// =============================================================================
// Shell - root with externally controlled children
// =============================================================================

/// What the [`Shell`] renders, shared with the test.
#[derive(Clone, Default)]
pub struct ShellState {
    pub title: String,
    /// Local keys of `Tracked` children to render, in order.
    pub children: Vec<String>,
    /// Label pushed to every child through prop sync.
    pub child_label: Option<String>,
}

/// Root component rendering `<div><h1/>children...</div>`.
pub struct Shell {
    pub state: Arc<Mutex<ShellState>>,
    pub journal: Journal,
    pub base: ComponentBase,
}

impl Shell {
    pub fn new(state: &Arc<Mutex<ShellState>>, journal: &Journal) -> Self {
        Self {
            state: state.clone(),
            journal: journal.clone(),
            base: ComponentBase::new(),
        }
    }
}

impl Unmountable for Shell {
    fn on_unmount(&mut self) {
        self.journal.record("unmount:shell");
    }
}

impl Component for Shell {
    fn attach(&mut self, context: ComponentContext) {
        self.base.attach(context);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Option<Node> {
        self.journal.record("render:shell");
        let state = self.state.lock().clone();
        let mut children = vec![heading(1, state.title.clone())];
        for key in &state.children {
            let mut candidate = Tracked::new(key, &self.journal);
            if let Some(label) = &state.child_label {
                candidate = candidate.label(label);
            }
            children.push(ctx.resolve_child(key, candidate));
        }
        Some(div(children))
    }

    fn as_unmountable(&mut self) -> Option<&mut dyn Unmountable> {
        Some(self)
    }
}

/// Shell state with a title and the given child keys.
pub fn shell_state(title: &str, children: &[&str]) -> Arc<Mutex<ShellState>> {
    Arc::new(Mutex::new(ShellState {
        title: title.to_string(),
        children: children.iter().map(|c| c.to_string()).collect(),
        child_label: None,
    }))
}

//! Renderer configuration.
//!
//! ```ignore
//! let config = RendererConfig {
//!     mount_selector: "#root".into(),
//!     ..RendererConfig::default()
//! };
//! ```

/// Selector used when none is configured.
pub const DEFAULT_MOUNT_SELECTOR: &str = "#app";

/// Settings for a [`Renderer`](crate::pipeline::Renderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Selector of the native mount point (`#id` or a tag name).
    pub mount_selector: String,
    /// Upper bound on follow-up passes run for requests made during a pass.
    pub max_follow_up_passes: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mount_selector: DEFAULT_MOUNT_SELECTOR.to_string(),
            max_follow_up_passes: 8,
        }
    }
}

impl RendererConfig {
    /// Config mounting at `selector`.
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            mount_selector: selector.into(),
            ..Self::default()
        }
    }

    /// Mount at the element with this id.
    pub fn mount_id(mut self, id: &str) -> Self {
        self.mount_selector = format!("#{id}");
        self
    }

    pub fn max_follow_up_passes(mut self, max: usize) -> Self {
        self.max_follow_up_passes = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = RendererConfig::default().mount_id("root").max_follow_up_passes(2);
        assert_eq!(config.mount_selector, "#root");
        assert_eq!(config.max_follow_up_passes, 2);
        assert_eq!(RendererConfig::new("main").mount_selector, "main");
    }
}

//! Abstraction over a scrollable, possibly virtualized list in a live page

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Geometry of the scroll container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Content fits in the viewport; scrolling cannot reveal anything
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.scroll_height > self.client_height + 1.0
    }

    #[must_use]
    pub fn at_bottom(&self) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - 2.0
    }

    /// Neither position nor content height moved
    #[must_use]
    pub fn same_position(&self, other: &Self) -> bool {
        (self.scroll_top - other.scroll_top).abs() < 1.0
            && (self.scroll_height - other.scroll_height).abs() < 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollAction {
    /// Scroll the container by `dy` pixels
    ScrollBy { dy: f64, smooth: bool },
    /// Synthetic wheel event over the container
    Wheel { delta: f64 },
    /// `scrollIntoView` on the last rendered item
    LastIntoView,
    /// Keyboard PageDown dispatched to the container
    PageDown,
    /// Hard jump to `scrollHeight`
    JumpToBottom,
}

/// A "load more" style affordance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadMore {
    pub selectors: Vec<String>,
    /// Case-insensitive regex the button text must match, if set
    pub text_pattern: Option<String>,
}

impl LoadMore {
    #[must_use]
    pub fn new(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| (*s).to_string()).collect(),
            text_pattern: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, pattern: &str) -> Self {
        self.text_pattern = Some(pattern.to_string());
        self
    }
}

/// Where the list lives and what its rows look like
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSelectors {
    /// Scroll container fallbacks; empty means the document scroller
    pub container: Vec<String>,
    /// Item selectors, all applied; duplicates removed by the surface
    pub items: Vec<String>,
    pub load_more: Vec<LoadMore>,
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("List container not found (tried: {0})")]
    ContainerMissing(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Browser connection lost: {0}")]
    Disconnected(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

/// Live list the scroll driver operates on
#[async_trait]
pub trait ScrollSurface: Send + Sync {
    async fn metrics(&self, list: &ListSelectors) -> Result<ScrollMetrics, SurfaceError>;

    /// Outer HTML of every currently rendered item, in DOM order
    async fn rendered_items(&self, list: &ListSelectors) -> Result<Vec<String>, SurfaceError>;

    async fn apply(&self, list: &ListSelectors, action: ScrollAction) -> Result<(), SurfaceError>;

    /// Click the first visible load-more affordance; `true` if one was clicked
    async fn click_load_more(&self, list: &ListSelectors) -> Result<bool, SurfaceError>;

    /// Click the first element matching any selector; `true` if clicked
    async fn click_first(&self, selectors: &[String]) -> Result<bool, SurfaceError>;

    /// Trimmed text of the first non-empty match
    async fn text_of(&self, selectors: &[String]) -> Result<Option<String>, SurfaceError>;

    /// Current page URL
    async fn location(&self) -> Result<String, SurfaceError>;
}

//! Contract for the reused, off-screen profile frame

use async_trait::async_trait;

use super::errors::EnrichError;

/// A single hidden document that profile pages are loaded into
///
/// Implementations are not reentrant: a second `load` replaces the first
/// page. [`super::ProfileEnricher`] serializes every call behind one lock.
#[async_trait]
pub trait ProfileFrame: Send + Sync {
    /// Navigate the frame to `url` and wait for the document to load
    async fn load(&self, url: &str) -> Result<(), EnrichError>;

    /// First non-empty value among `selectors`; text content, or `attr` when given
    async fn read(
        &self,
        selectors: &[String],
        attr: Option<&str>,
    ) -> Result<Option<String>, EnrichError>;

    /// Click the first element matching any selector; `false` if none matched
    async fn click(&self, selectors: &[String]) -> Result<bool, EnrichError>;
}

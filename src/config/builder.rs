//! Fluent builder for `HarvestConfig`
//!
//! Starts from defaults; `build()` runs the same validation as file loading.

use std::path::PathBuf;

use super::types::{
    BackendConfig, BrowserSettings, ConfigError, EnrichConfig, HarvestConfig, PacingConfig,
    ScrollConfig,
};

#[derive(Debug, Clone, Default)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already loaded config, e.g. a file, to layer CLI flags on top
    #[must_use]
    pub fn from_config(config: HarvestConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn scroll(mut self, scroll: ScrollConfig) -> Self {
        self.config.scroll = scroll;
        self
    }

    #[must_use]
    pub fn pacing(mut self, pacing: PacingConfig) -> Self {
        self.config.pacing = pacing;
        self
    }

    #[must_use]
    pub fn enrich(mut self, enrich: EnrichConfig) -> Self {
        self.config.enrich = enrich;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.config.backend = backend;
        self
    }

    #[must_use]
    pub fn browser(mut self, browser: BrowserSettings) -> Self {
        self.config.browser = browser;
        self
    }

    #[must_use]
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend.base_url = url.into();
        self
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.backend.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.config.max_items = Some(max_items);
        self
    }

    #[must_use]
    pub fn stagnation_limit(mut self, limit: u32) -> Self {
        self.config.scroll.stagnation_limit = limit;
        self
    }

    #[must_use]
    pub fn human_scroll(mut self, human: bool) -> Self {
        self.config.scroll.human = human;
        self
    }

    #[must_use]
    pub fn enrichment(mut self, enabled: bool) -> Self {
        self.config.enrich.enabled = enabled;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.browser.headless = headless;
        self
    }

    #[must_use]
    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.browser.user_data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn debugger_url(mut self, url: impl Into<String>) -> Self {
        self.config.browser.debugger_url = Some(url.into());
        self
    }

    /// Zero every delay, settle and cooldown.
    ///
    /// For dry runs against local fixtures; never point this at a live site.
    #[must_use]
    pub fn without_pacing(mut self) -> Self {
        let scroll = &mut self.config.scroll;
        scroll.settle_min_ms = 0;
        scroll.settle_max_ms = 0;

        let pacing = &mut self.config.pacing;
        pacing.item_delay_min_ms = 0;
        pacing.item_delay_max_ms = 0;
        pacing.cooldown_min_ms = 0;
        pacing.cooldown_max_ms = 0;
        pacing.pause_poll_ms = 5;
        pacing.navigation_rate = 1_000.0;

        let enrich = &mut self.config.enrich;
        enrich.field_timeout_ms = 50;
        enrich.poll_ms = 5;
        enrich.contact_settle_ms = 0;

        let backend = &mut self.config.backend;
        backend.backoff_base_ms = 1;
        backend.backoff_cap_ms = 5;
        backend.jitter_max_ms = 0;
        self
    }

    pub fn build(self) -> Result<HarvestConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = HarvestConfig::builder()
            .backend_url("https://api.example.com")
            .max_items(10)
            .stagnation_limit(3)
            .without_pacing()
            .build()
            .expect("valid config");
        assert_eq!(config.max_items(), Some(10));
        assert_eq!(config.scroll().stagnation_limit, 3);
        assert_eq!(config.pacing().item_delay_max_ms, 0);
        assert_eq!(config.backend().base_url, "https://api.example.com");
    }

    #[test]
    fn builder_validates() {
        let err = HarvestConfig::builder().backend_url("not a url").build();
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }
}

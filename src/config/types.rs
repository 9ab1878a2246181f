//! Core configuration types for a harvest session
//!
//! `HarvestConfig` groups one section per concern. Every section carries
//! `#[serde(default)]` so a JSON file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_AGGRESSIVE_PASSES, DEFAULT_BACKEND_URL, DEFAULT_BATCH_SIZE, DEFAULT_COOLDOWN_EVERY,
    DEFAULT_ESCALATE_AFTER, DEFAULT_MAX_ITERATIONS, DEFAULT_NAVIGATION_RATE,
    DEFAULT_STAGNATION_LIMIT,
};

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Scroll-driver tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrollConfig {
    /// Consecutive no-growth iterations that end a pass
    pub stagnation_limit: u32,
    /// Stalled iterations before escalation tactics kick in
    pub escalate_after: u32,
    pub max_iterations: u32,
    pub aggressive_passes: u32,
    /// Randomized smooth scrolling instead of fixed fast jumps
    pub human: bool,
    pub human_fraction_min: f64,
    pub human_fraction_max: f64,
    pub fast_fraction: f64,
    /// Wait after each scroll for the list to render, randomized in range
    pub settle_min_ms: u64,
    pub settle_max_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            stagnation_limit: DEFAULT_STAGNATION_LIMIT,
            escalate_after: DEFAULT_ESCALATE_AFTER,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            aggressive_passes: DEFAULT_AGGRESSIVE_PASSES,
            human: true,
            human_fraction_min: 0.60,
            human_fraction_max: 0.95,
            fast_fraction: 0.90,
            settle_min_ms: 400,
            settle_max_ms: 900,
        }
    }
}

/// Human pacing between records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PacingConfig {
    pub item_delay_min_ms: u64,
    pub item_delay_max_ms: u64,
    /// Records between cooldowns; 0 disables cooldowns
    pub cooldown_every: u64,
    pub cooldown_min_ms: u64,
    pub cooldown_max_ms: u64,
    /// Poll interval while paused; each poll emits a heartbeat
    pub pause_poll_ms: u64,
    /// Hidden-frame profile loads per second
    pub navigation_rate: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            item_delay_min_ms: 1_000,
            item_delay_max_ms: 4_000,
            cooldown_every: DEFAULT_COOLDOWN_EVERY,
            cooldown_min_ms: 30_000,
            cooldown_max_ms: 60_000,
            pause_poll_ms: 250,
            navigation_rate: DEFAULT_NAVIGATION_RATE,
        }
    }
}

/// Hidden-frame enrichment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichConfig {
    pub enabled: bool,
    /// Bounded wait per field group
    pub field_timeout_ms: u64,
    pub poll_ms: u64,
    /// Open the contact-info dialog for email, phone and website
    pub contact_info: bool,
    pub contact_settle_ms: u64,
    /// Consecutive load failures before enrichment is suspended
    pub failure_threshold: u32,
    pub breaker_cooldown_secs: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            field_timeout_ms: 3_000,
            poll_ms: 100,
            contact_info: true,
            contact_settle_ms: 2_000,
            failure_threshold: 5,
            breaker_cooldown_secs: 60,
        }
    }
}

/// Backend ingestion endpoint and retry policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub jitter_max_ms: u64,
    pub request_timeout_secs: u64,
    pub batch_size: usize,
    /// Upload diagnostics after each session (best effort)
    pub send_diagnostics: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            token: None,
            max_retries: 3,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 10_000,
            jitter_max_ms: 200,
            request_timeout_secs: 30,
            batch_size: DEFAULT_BATCH_SIZE,
            send_diagnostics: true,
        }
    }
}

/// Browser launch or attach settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Persistent profile holding the logged-in session
    pub user_data_dir: Option<PathBuf>,
    /// Attach to an already running browser instead of launching one
    pub debugger_url: Option<String>,
    pub page_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            user_data_dir: None,
            debugger_url: None,
            page_timeout_secs: 30,
        }
    }
}

/// Main configuration struct for a harvest session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarvestConfig {
    pub(crate) scroll: ScrollConfig,
    pub(crate) pacing: PacingConfig,
    pub(crate) enrich: EnrichConfig,
    pub(crate) backend: BackendConfig,
    pub(crate) browser: BrowserSettings,
    /// Cap on records per session, combined with the server quota
    pub(crate) max_items: Option<usize>,
}

impl HarvestConfig {
    #[must_use]
    pub fn builder() -> super::builder::HarvestConfigBuilder {
        super::builder::HarvestConfigBuilder::new()
    }

    /// Load a JSON config file and validate it
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scroll;
        if s.stagnation_limit == 0 {
            return Err(ConfigError::Invalid("scroll.stagnation_limit must be > 0".into()));
        }
        if s.max_iterations == 0 {
            return Err(ConfigError::Invalid("scroll.max_iterations must be > 0".into()));
        }
        for (name, f) in [
            ("scroll.human_fraction_min", s.human_fraction_min),
            ("scroll.human_fraction_max", s.human_fraction_max),
            ("scroll.fast_fraction", s.fast_fraction),
        ] {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ConfigError::Invalid(format!("{name} must be in (0, 1], got {f}")));
            }
        }
        check_range("scroll.human_fraction", s.human_fraction_min, s.human_fraction_max)?;
        check_range("scroll.settle_ms", s.settle_min_ms, s.settle_max_ms)?;

        let p = &self.pacing;
        check_range("pacing.item_delay_ms", p.item_delay_min_ms, p.item_delay_max_ms)?;
        check_range("pacing.cooldown_ms", p.cooldown_min_ms, p.cooldown_max_ms)?;
        if p.pause_poll_ms == 0 {
            return Err(ConfigError::Invalid("pacing.pause_poll_ms must be > 0".into()));
        }
        if !(p.navigation_rate > 0.0) {
            return Err(ConfigError::Invalid("pacing.navigation_rate must be > 0".into()));
        }

        if self.enrich.poll_ms == 0 {
            return Err(ConfigError::Invalid("enrich.poll_ms must be > 0".into()));
        }

        let b = &self.backend;
        url::Url::parse(&b.base_url).map_err(|e| {
            ConfigError::Invalid(format!("backend.base_url '{}' is not a URL: {e}", b.base_url))
        })?;
        check_range("backend.backoff_ms", b.backoff_base_ms, b.backoff_cap_ms)?;
        if b.batch_size == 0 {
            return Err(ConfigError::Invalid("backend.batch_size must be > 0".into()));
        }
        if self.max_items == Some(0) {
            return Err(ConfigError::Invalid("max_items must be > 0 when set".into()));
        }
        Ok(())
    }

    /// Use `token` when present, keeping any token from the file otherwise
    pub fn apply_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.backend.token = Some(token);
        }
    }

    #[must_use]
    pub fn scroll(&self) -> &ScrollConfig {
        &self.scroll
    }

    #[must_use]
    pub fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }

    #[must_use]
    pub fn enrich(&self) -> &EnrichConfig {
        &self.enrich
    }

    #[must_use]
    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    #[must_use]
    pub fn browser(&self) -> &BrowserSettings {
        &self.browser
    }

    #[must_use]
    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    name: &str,
    min: T,
    max: T,
) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::Invalid(format!(
            "{name}: min {min} is greater than max {max}"
        )));
    }
    Ok(())
}

//! Configuration module for harvest sessions
//!
//! Provides `HarvestConfig`, its per-concern sections and a fluent builder,
//! with serde defaults for JSON config files and validation.

// Sub-modules
pub mod builder;
pub mod types;

// Re-exports for public API
pub use builder::HarvestConfigBuilder;
pub use types::{
    BackendConfig, BrowserSettings, ConfigError, EnrichConfig, HarvestConfig, PacingConfig,
    ScrollConfig,
};

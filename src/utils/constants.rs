//! Shared configuration constants for leadscrape
//!
//! Default values used across the pipeline so config defaults, the CLI and
//! the browser glue agree on the same numbers.

/// Consecutive no-growth iterations before a scroll pass is considered exhausted
pub const DEFAULT_STAGNATION_LIMIT: u32 = 8;

/// Stalled iterations before the driver starts escalating scroll tactics
pub const DEFAULT_ESCALATE_AFTER: u32 = 2;

/// Base iteration budget for one scroll pass
///
/// Extended to `ceil(expected_total / 2)` when the page advertises a larger
/// member count.
pub const DEFAULT_MAX_ITERATIONS: u32 = 600;

/// Upper bound on the aggressive final pass run when short of the expected total
pub const DEFAULT_AGGRESSIVE_PASSES: u32 = 40;

/// Process this many records between mandatory cooldowns
pub const DEFAULT_COOLDOWN_EVERY: u64 = 25;

/// Daily limit value the backend uses for "no limit"
pub const UNLIMITED_DAILY_LIMIT: i64 = -1;

/// Records per ingestion request
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Maximum number of extracted/skipped samples kept in diagnostics
pub const MAX_DIAGNOSTIC_SAMPLES: usize = 50;

/// Profile loads per second through the hidden frame
///
/// Two seconds between loads keeps enrichment at human speed.
pub const DEFAULT_NAVIGATION_RATE: f64 = 0.5;

/// Default backend base URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api";

/// Environment variable holding the backend bearer token
pub const TOKEN_ENV_VAR: &str = "LEADSCRAPE_TOKEN";

/// Base URL relative LinkedIn links are resolved against
pub const LINKEDIN_BASE_URL: &str = "https://www.linkedin.com";

/// Base URL relative WhatsApp links are resolved against
pub const WHATSAPP_BASE_URL: &str = "https://web.whatsapp.com";

/// Chrome user agent string for stealth mode
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

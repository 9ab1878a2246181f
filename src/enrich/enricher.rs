//! Out-of-band profile enrichment through one reused hidden frame

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::circuit_breaker::CircuitBreaker;
use super::errors::EnrichError;
use super::fields::{FieldGroup, contact_groups, contact_opener, profile_groups};
use super::frame::ProfileFrame;
use crate::config::EnrichConfig;
use crate::leads::LeadRecord;
use crate::pacing::NavigationRateLimiter;
use crate::utils::host_of;
use crate::wait::wait_for;

/// What enrichment did for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// Disabled, no profile link, or the host's circuit is open
    Skipped,
    /// Profile loaded; `filled` previously empty fields were set
    Enriched { filled: usize },
}

/// Fills missing candidate fields from the candidate's profile page
///
/// The frame sits behind an async mutex, so concurrent callers queue instead
/// of racing navigations into the same document.
pub struct ProfileEnricher {
    frame: Mutex<Box<dyn ProfileFrame>>,
    config: EnrichConfig,
    limiter: NavigationRateLimiter,
    breaker: CircuitBreaker,
    groups: Vec<FieldGroup>,
    contact: Vec<FieldGroup>,
}

impl ProfileEnricher {
    #[must_use]
    pub fn new(frame: Box<dyn ProfileFrame>, config: EnrichConfig, navigation_rate: f64) -> Self {
        let breaker = CircuitBreaker::new(
            config.failure_threshold,
            Duration::from_secs(config.breaker_cooldown_secs),
        );
        Self {
            frame: Mutex::new(frame),
            limiter: NavigationRateLimiter::new(navigation_rate),
            breaker,
            groups: profile_groups(),
            contact: contact_groups(),
            config,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Load `record`'s profile and fill its empty fields
    ///
    /// Fields already set by the extractor are never overwritten. Each field
    /// group waits at most `field_timeout_ms`; a group that never appears is
    /// left empty. `cancelled` aborts outstanding waits (used for stop).
    pub async fn enrich<C>(&self, record: &mut LeadRecord, cancelled: C) -> Result<EnrichOutcome, EnrichError>
    where
        C: Fn() -> bool,
    {
        if !self.config.enabled {
            return Ok(EnrichOutcome::Skipped);
        }
        let Some(url) = record.profile_link.clone() else {
            return Ok(EnrichOutcome::Skipped);
        };
        let host = host_of(&url).unwrap_or_default();
        if !self.breaker.should_attempt(&host) {
            debug!(host = %host, "Profile circuit open, skipping enrichment");
            return Ok(EnrichOutcome::Skipped);
        }

        self.limiter.acquire(&host).await;
        let guard = self.frame.lock().await;
        let frame: &dyn ProfileFrame = &**guard;

        if let Err(e) = frame.load(&url).await {
            self.breaker.record_failure(&host, &e.to_string());
            return Err(e);
        }

        let timeout = Duration::from_millis(self.config.field_timeout_ms);
        let poll = Duration::from_millis(self.config.poll_ms.max(1));

        let mut wanted = 0;
        let mut filled = 0;
        for group in &self.groups {
            if group.field.is_filled(record) {
                continue;
            }
            wanted += 1;
            if let Some(raw) = read_group(frame, group, timeout, poll, &cancelled).await
                && group.field.fill(record, &raw)
            {
                filled += 1;
            }
        }

        if self.config.contact_info && self.contact.iter().any(|g| !g.field.is_filled(record)) && !cancelled() {
            filled += self.read_contact_info(frame, record, timeout, poll, &cancelled).await;
        }

        if wanted > 0 && filled == 0 {
            self.breaker.record_failure(&host, "no profile fields resolved");
        } else {
            self.breaker.record_success(&host);
        }
        info!(profile = %url, filled, "Profile enriched");
        Ok(EnrichOutcome::Enriched { filled })
    }

    async fn read_contact_info<C>(
        &self,
        frame: &dyn ProfileFrame,
        record: &mut LeadRecord,
        timeout: Duration,
        poll: Duration,
        cancelled: &C,
    ) -> usize
    where
        C: Fn() -> bool,
    {
        match frame.click(&contact_opener()).await {
            Ok(true) => {}
            Ok(false) => return 0,
            Err(e) => {
                warn!("Contact info dialog unavailable: {e}");
                return 0;
            }
        }
        let settle = Duration::from_millis(self.config.contact_settle_ms);
        let _: Option<()> = wait_for(settle, poll, cancelled, || async { None }).await;
        if cancelled() {
            return 0;
        }

        let mut filled = 0;
        for group in &self.contact {
            if group.field.is_filled(record) {
                continue;
            }
            if let Some(raw) = read_group(frame, group, timeout, poll, cancelled).await
                && group.field.fill(record, &raw)
            {
                filled += 1;
            }
        }
        filled
    }
}

async fn read_group<C>(
    frame: &dyn ProfileFrame,
    group: &FieldGroup,
    timeout: Duration,
    poll: Duration,
    cancelled: &C,
) -> Option<String>
where
    C: Fn() -> bool,
{
    let selectors = group.selectors.as_slice();
    let attr = group.attr;
    wait_for(timeout, poll, cancelled, move || async move {
        match frame.read(selectors, attr).await {
            Ok(value) => value,
            Err(e) => {
                debug!("Profile field read failed: {e}");
                None
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::{LeadKind, Platform};
    use crate::testing::StaticProfileFrame;

    fn fast_config() -> EnrichConfig {
        EnrichConfig {
            field_timeout_ms: 20,
            poll_ms: 5,
            contact_settle_ms: 0,
            ..EnrichConfig::default()
        }
    }

    fn candidate() -> LeadRecord {
        LeadRecord::new("Jane Doe", Platform::LinkedIn, LeadKind::Comment, "https://www.linkedin.com/feed/update/x")
            .with_profile_link("https://www.linkedin.com/in/jane/")
    }

    #[tokio::test]
    async fn fills_missing_fields_only() {
        let frame = StaticProfileFrame::new()
            .with_value(".mt2.relative h1", "Someone Else")
            .with_value(".text-body-small.inline.t-black--light.break-words", "Lyon, France")
            .with_value(r#"[role="dialog"] a[href^="mailto:"]"#, "mailto:jane@acme.io")
            .with_clickable(r#"a[href*="contact-info"]"#);
        let enricher = ProfileEnricher::new(Box::new(frame.clone()), fast_config(), 1000.0);

        let mut record = candidate();
        let outcome = enricher.enrich(&mut record, || false).await.expect("enrich");

        assert_eq!(outcome, EnrichOutcome::Enriched { filled: 2 });
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.location.as_deref(), Some("Lyon, France"));
        assert_eq!(record.email.as_deref(), Some("jane@acme.io"));
        assert_eq!(frame.loads(), vec!["https://www.linkedin.com/in/jane/".to_string()]);
    }

    #[tokio::test]
    async fn skips_records_without_profile() {
        let frame = StaticProfileFrame::new();
        let enricher = ProfileEnricher::new(Box::new(frame.clone()), fast_config(), 1000.0);
        let mut record = LeadRecord::new("Ana", Platform::WhatsApp, LeadKind::GroupMembership, "s");
        assert_eq!(
            enricher.enrich(&mut record, || false).await.expect("enrich"),
            EnrichOutcome::Skipped
        );
        assert!(frame.loads().is_empty());
    }

    #[tokio::test]
    async fn repeated_empty_profiles_open_the_circuit() {
        let frame = StaticProfileFrame::new();
        let config = EnrichConfig {
            failure_threshold: 2,
            contact_info: false,
            ..fast_config()
        };
        let enricher = ProfileEnricher::new(Box::new(frame.clone()), config, 1000.0);

        for _ in 0..2 {
            let mut record = candidate();
            let _ = enricher.enrich(&mut record, || false).await.expect("enrich");
        }
        let mut record = candidate();
        assert_eq!(
            enricher.enrich(&mut record, || false).await.expect("enrich"),
            EnrichOutcome::Skipped
        );
        assert_eq!(frame.loads().len(), 2);
    }

    #[tokio::test]
    async fn stop_cuts_contact_dialog_settle_short() {
        let frame = StaticProfileFrame::new()
            .with_value(r#"[role="dialog"] a[href^="mailto:"]"#, "mailto:jane@acme.io")
            .with_clickable(r#"a[href*="contact-info"]"#);
        let config = EnrichConfig {
            contact_settle_ms: 10_000,
            ..fast_config()
        };
        let enricher = ProfileEnricher::new(Box::new(frame.clone()), config, 1000.0);

        // Stop lands as soon as the dialog is opened
        let clicked = frame.clone();
        let started = std::time::Instant::now();
        let mut record = candidate();
        let outcome = enricher
            .enrich(&mut record, move || !clicked.clicks().is_empty())
            .await
            .expect("enrich");

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(frame.clicks().len(), 1);
        assert!(record.email.is_none());
        assert_eq!(outcome, EnrichOutcome::Enriched { filled: 0 });
    }
}

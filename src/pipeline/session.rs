//! One extraction session from quota check to ingestion
//!
//! Order of a run:
//! 1. controller start (loading), seen-set cleared
//! 2. quota gate; an exhausted quota ends the session with `limit_reached`
//! 3. preparatory clicks, expected total, group label
//! 4. scroll driver, feeding every new identity through enrichment,
//!    `SCRAPE_PROGRESS` and human pacing
//! 5. exactly one `SCRAPE_DONE`
//! 6. batched ingestion, usage report, diagnostics upload

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::errors::HarvestError;
use super::report::SessionReport;
use crate::config::HarvestConfig;
use crate::enrich::ProfileEnricher;
use crate::extractors::{ExtractContext, Extractor, Harvester};
use crate::ingest::{DiagnosticsReport, LeadSink, Quota, QuotaSource, build_requests};
use crate::leads::{DedupStore, LeadRecord};
use crate::messaging::{Envelope, Messenger};
use crate::pacing::{Pacer, random_between};
use crate::scroll::{ItemSink, ScrollSurface, SinkFlow, VirtualizedScrollDriver, parse_expected_total};
use crate::session::{DoneReason, ScrapeController, ScrapeSession};
use crate::utils::clean_display_name;

/// Wiring for sessions against one list on one page
pub struct HarvestSession {
    config: HarvestConfig,
    controller: Arc<ScrapeController>,
    store: Arc<DedupStore>,
    messenger: Messenger,
    surface: Arc<dyn ScrollSurface>,
    extractor: Arc<dyn Extractor>,
    pacer: Pacer,
    enricher: Option<Arc<ProfileEnricher>>,
    quota: Option<Arc<dyn QuotaSource>>,
    sink: Option<Arc<dyn LeadSink>>,
}

impl HarvestSession {
    #[must_use]
    pub fn new(
        config: HarvestConfig,
        surface: Arc<dyn ScrollSurface>,
        extractor: Arc<dyn Extractor>,
        messenger: Messenger,
    ) -> Self {
        let controller = ScrapeController::new(extractor.platform(), extractor.kind())
            .with_messenger(messenger.clone())
            .with_poll_interval(Duration::from_millis(config.pacing().pause_poll_ms));
        Self {
            pacer: Pacer::new(config.pacing().clone()),
            controller: Arc::new(controller),
            store: Arc::new(DedupStore::new()),
            messenger,
            surface,
            extractor,
            enricher: None,
            quota: None,
            sink: None,
            config,
        }
    }

    #[must_use]
    pub fn with_enricher(mut self, enricher: Arc<ProfileEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Without a quota source the session is unlimited
    #[must_use]
    pub fn with_quota(mut self, quota: Arc<dyn QuotaSource>) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Without a sink records are only emitted on the bridge
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn controller(&self) -> &Arc<ScrapeController> {
        &self.controller
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DedupStore> {
        &self.store
    }

    #[must_use]
    pub fn messenger(&self) -> &Messenger {
        &self.messenger
    }

    /// Run one complete session
    pub async fn run(&self) -> Result<SessionReport, HarvestError> {
        let session = self.controller.start()?;
        Ok(self.run_started(session).await)
    }

    /// Drive a session the controller has already moved to loading
    ///
    /// Lets the command loop claim the controller synchronously, so a stop
    /// arriving right after a start always finds an active session.
    pub async fn run_started(&self, session: ScrapeSession) -> SessionReport {
        self.store.clear();
        let kind = self.extractor.kind();

        let quota = self.check_quota().await;
        if self.controller.is_stopped() {
            return self.stopped_while_loading(&session);
        }
        if quota.is_exhausted() {
            info!(session = %session.id, "Daily scraping limit reached, nothing to do");
            self.controller.complete();
            self.messenger
                .emit(Envelope::done(kind, DoneReason::LimitReached, Vec::new()));
            return SessionReport::empty(session.id, DoneReason::LimitReached);
        }
        let ceiling = match (quota.ceiling(), self.config.max_items()) {
            (Some(q), Some(m)) => Some(q.min(m as u64)),
            (q, m) => q.or(m.map(|m| m as u64)),
        };

        let (start_location, expected_total, group_name) = self.prepare().await;
        self.controller.set_expected_total(expected_total);
        if let Err(e) = self.controller.begin_running() {
            debug!(session = %session.id, "Session left loading early: {e}");
            return self.stopped_while_loading(&session);
        }

        let mut ctx = ExtractContext::new(self.extractor.platform(), kind, start_location.clone());
        ctx.group_name = group_name;
        let mut sink = SessionSink {
            owner: self,
            harvester: Harvester::new(self.extractor.as_ref(), ctx, &self.store),
            records: Vec::new(),
            ceiling,
            expected_total,
            start_location,
            limit_hit: false,
            navigated: false,
        };

        let driver = VirtualizedScrollDriver::new(
            self.surface.as_ref(),
            self.extractor.profile().list.clone(),
            self.config.scroll().clone(),
        )
        .with_expected_total(expected_total);
        let outcome = driver.run(&self.controller, &mut sink).await;

        let SessionSink {
            harvester,
            records,
            limit_hit,
            navigated,
            ..
        } = sink;
        let diagnostics = harvester.into_diagnostics();

        let (scroll, surface_error) = match outcome {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => {
                warn!(session = %session.id, "Scroll pass aborted: {e}");
                (None, Some(e.to_string()))
            }
        };

        let reason = if navigated || surface_error.is_some() || self.controller.is_stopped() {
            self.controller.stop();
            DoneReason::Stopped
        } else if limit_hit {
            self.controller.complete();
            DoneReason::LimitReached
        } else {
            self.controller.complete();
            DoneReason::Completed
        };
        info!(
            session = %session.id,
            ?reason,
            records = records.len(),
            scanned = diagnostics.scanned,
            skipped = diagnostics.total_skipped(),
            "Scrape session finished"
        );
        self.messenger
            .emit(Envelope::done(kind, reason, records.clone()));

        if navigated {
            info!("Page location changed, resetting session");
            self.controller.reset();
            self.store.clear();
        }

        let mut report = SessionReport::empty(session.id, reason);
        report.records = records;
        report.diagnostics = diagnostics;
        report.scroll = scroll;
        report.surface_error = surface_error;
        self.ship(&mut report).await;
        report
    }

    /// Terminal path for a stop that lands during the quota check or prepare
    fn stopped_while_loading(&self, session: &ScrapeSession) -> SessionReport {
        info!(session = %session.id, "Session stopped before scrolling started");
        self.controller.stop();
        self.messenger
            .emit(Envelope::done(self.extractor.kind(), DoneReason::Stopped, Vec::new()));
        SessionReport::empty(session.id, DoneReason::Stopped)
    }

    /// Remaining quota; a failed query fails closed
    async fn check_quota(&self) -> Quota {
        let Some(source) = &self.quota else {
            return Quota::Unlimited;
        };
        match source.scraping_limit().await {
            Ok(quota) => {
                debug!(?quota, "Scraping quota");
                quota
            }
            Err(e) => {
                warn!("Could not read scraping limit, treating as exhausted: {e}");
                Quota::Exhausted
            }
        }
    }

    /// Open the list and read page chrome: (location, expected total, group name)
    async fn prepare(&self) -> (String, Option<u64>, Option<String>) {
        let profile = self.extractor.profile();
        let location = match self.surface.location().await {
            Ok(location) => location,
            Err(e) => {
                warn!("Could not read page location: {e}");
                String::new()
            }
        };

        for step in &profile.prepare {
            match self.surface.click_first(step).await {
                Ok(true) => {
                    debug!(selectors = ?step, "Preparatory click");
                    let settle = random_between(
                        self.config.scroll().settle_min_ms,
                        self.config.scroll().settle_max_ms,
                    );
                    let _ = self.controller.sleep_unless_stopped(settle).await;
                }
                Ok(false) => debug!(selectors = ?step, "Preparatory target absent"),
                Err(e) => warn!("Preparatory click failed: {e}"),
            }
        }

        let expected = self
            .read_text(&profile.expected_total)
            .await
            .and_then(|text| parse_expected_total(&text));
        let group = self
            .read_text(&profile.context_label)
            .await
            .map(|text| clean_display_name(&text))
            .filter(|name| !name.is_empty());
        info!(expected = ?expected, group = ?group, "List prepared");
        (location, expected, group)
    }

    async fn read_text(&self, selectors: &[String]) -> Option<String> {
        if selectors.is_empty() {
            return None;
        }
        match self.surface.text_of(selectors).await {
            Ok(text) => text,
            Err(e) => {
                debug!("Page text unavailable: {e}");
                None
            }
        }
    }

    /// Ship records in batches, then report usage and diagnostics
    async fn ship(&self, report: &mut SessionReport) {
        let kind = self.extractor.kind();
        let platform = self.extractor.platform();

        if let Some(sink) = &self.sink
            && !report.records.is_empty()
        {
            let prefix = report.session_id.to_string();
            let requests = build_requests(
                platform,
                kind,
                &report.records,
                self.config.backend().batch_size,
                Some(&prefix),
            );
            for request in requests {
                match sink.ingest(&request).await {
                    Ok(receipt) => {
                        report.receipts.push(receipt);
                        if let Some(quota) = &self.quota {
                            quota.report_usage(request.leads.len() as u64).await;
                        }
                    }
                    Err(e) => {
                        warn!(session = %report.session_id, "Batch not delivered, keeping records locally: {e}");
                        report.ingest_error = Some(e);
                        break;
                    }
                }
            }
        }

        if self.config.backend().send_diagnostics
            && let Some(quota) = &self.quota
        {
            let upload = DiagnosticsReport {
                session_id: report.session_id.to_string(),
                source: platform,
                kind,
                diagnostics: &report.diagnostics,
            };
            quota.send_diagnostics(&upload).await;
        }
    }
}

/// Driver-facing side of a run: dedup, enrich, emit, pace
struct SessionSink<'s> {
    owner: &'s HarvestSession,
    harvester: Harvester<'s>,
    records: Vec<LeadRecord>,
    ceiling: Option<u64>,
    expected_total: Option<u64>,
    start_location: String,
    limit_hit: bool,
    navigated: bool,
}

impl SessionSink<'_> {
    async fn location_changed(&self) -> bool {
        if self.start_location.is_empty() {
            return false;
        }
        match self.owner.surface.location().await {
            Ok(now) => now != self.start_location,
            Err(_) => false,
        }
    }

    fn at_ceiling(&self) -> bool {
        self.ceiling
            .is_some_and(|c| self.records.len() as u64 >= c)
    }
}

#[async_trait]
impl ItemSink for SessionSink<'_> {
    async fn accept(&mut self, items: Vec<String>) -> SinkFlow {
        let halt = SinkFlow { added: 0, halt: true };
        if self.location_changed().await {
            self.navigated = true;
            return halt;
        }
        if self.at_ceiling() {
            self.limit_hit = true;
            return halt;
        }

        let owner = self.owner;
        let controller = owner.controller.as_ref();
        let kind = owner.extractor.kind();
        let fresh = self.harvester.harvest(&items);
        let mut added = 0;

        for mut record in fresh {
            if controller.wait_if_paused().await.is_stop() {
                return SinkFlow { added, halt: true };
            }
            if owner.extractor.profile().enrich
                && let Some(enricher) = &owner.enricher
                && let Err(e) = enricher.enrich(&mut record, || controller.is_stopped()).await
            {
                warn!(profile = ?record.profile_link, "Enrichment failed, keeping extracted fields: {e}");
            }
            if controller.is_stopped() {
                return SinkFlow { added, halt: true };
            }

            self.records.push(record.clone());
            added += 1;
            let processed = controller.record_processed();
            owner
                .messenger
                .emit(Envelope::progress(kind, processed, self.expected_total, record));

            if self.at_ceiling() {
                info!(processed, "Session record ceiling reached");
                self.limit_hit = true;
                return SinkFlow { added, halt: true };
            }
            if owner.pacer.after_record(controller, kind, processed).await.is_stop() {
                return SinkFlow { added, halt: true };
            }
        }
        SinkFlow { added, halt: false }
    }
}

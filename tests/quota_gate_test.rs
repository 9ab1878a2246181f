//! Quota gating, usage accounting and delivery through in-memory backends

use kodegen_tools_leadscrape::config::{BackendConfig, HarvestConfigBuilder};
use async_trait::async_trait;
use kodegen_tools_leadscrape::ingest::{DiagnosticsReport, IngestError, Quota, QuotaSource};
use kodegen_tools_leadscrape::messaging::MessageType;
use kodegen_tools_leadscrape::testing::{FixedQuota, MemorySink, member_rows};
use kodegen_tools_leadscrape::{DoneReason, SessionStatus};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{drain, fast_config, member_list, member_session, of_type};

#[tokio::test]
async fn exhausted_quota_skips_the_pass() {
    let list = Arc::new(member_list(member_rows(20)));
    let quota = Arc::new(FixedQuota::new(Quota::Exhausted));
    let sink = Arc::new(MemorySink::new());
    let session = member_session(fast_config(), list.clone())
        .with_quota(quota.clone())
        .with_sink(sink.clone());
    let mut rx = session.messenger().subscribe();

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::LimitReached);
    assert!(report.records.is_empty());
    assert!(report.scroll.is_none());
    assert_eq!(sink.calls(), 0);
    assert!(list.actions().is_empty());

    let envelopes = drain(&mut rx);
    assert!(of_type(&envelopes, MessageType::ScrapeProgress).is_empty());
    let done = of_type(&envelopes, MessageType::ScrapeDone);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].payload.reason, Some(DoneReason::LimitReached));
    assert_eq!(done[0].payload.total, Some(0));
}

#[tokio::test]
async fn unreachable_quota_fails_closed() {
    let list = Arc::new(member_list(member_rows(20)));
    let session = member_session(fast_config(), list).with_quota(Arc::new(FixedQuota::unreachable()));

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::LimitReached);
    assert!(report.records.is_empty());
}

/// Quota backend that answers only after `delay`
struct SlowQuota {
    delay: Duration,
}

#[async_trait]
impl QuotaSource for SlowQuota {
    async fn scraping_limit(&self) -> Result<Quota, IngestError> {
        tokio::time::sleep(self.delay).await;
        Ok(Quota::Unlimited)
    }

    async fn report_usage(&self, _amount: u64) -> bool {
        true
    }

    async fn send_diagnostics(&self, _report: &DiagnosticsReport<'_>) -> bool {
        true
    }
}

#[tokio::test]
async fn stop_during_quota_check_still_reports_done() {
    let list = Arc::new(member_list(member_rows(20)));
    let sink = Arc::new(MemorySink::new());
    let session = Arc::new(
        member_session(fast_config(), list.clone())
            .with_quota(Arc::new(SlowQuota {
                delay: Duration::from_millis(100),
            }))
            .with_sink(sink.clone()),
    );
    let mut rx = session.messenger().subscribe();

    let runner = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.run().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.controller().status(), SessionStatus::Loading);
    assert!(session.controller().stop());

    let report = runner.await.expect("join").expect("session");

    assert_eq!(report.reason, DoneReason::Stopped);
    assert!(report.records.is_empty());
    assert!(list.actions().is_empty());
    assert_eq!(sink.calls(), 0);
    assert_eq!(session.controller().status(), SessionStatus::Stopped);

    let done = of_type(&drain(&mut rx), MessageType::ScrapeDone);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].payload.reason, Some(DoneReason::Stopped));
    assert_eq!(done[0].payload.total, Some(0));
}

#[tokio::test]
async fn remaining_quota_caps_the_session() {
    let list = Arc::new(member_list(member_rows(20)));
    let quota = Arc::new(FixedQuota::new(Quota::Remaining(7)));
    let sink = Arc::new(MemorySink::new());
    let session = member_session(fast_config(), list)
        .with_quota(quota.clone())
        .with_sink(sink.clone());

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::LimitReached);
    assert_eq!(report.records.len(), 7);
    assert_eq!(sink.stored_leads(), 7);
    assert_eq!(quota.usage_reports(), vec![7]);
    assert_eq!(quota.diagnostics_sent(), 1);
}

#[tokio::test]
async fn local_cap_applies_without_server_quota() {
    let config = HarvestConfigBuilder::from_config(fast_config())
        .max_items(5)
        .build()
        .expect("config");
    let session = member_session(config, Arc::new(member_list(member_rows(20))));

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::LimitReached);
    assert_eq!(report.records.len(), 5);
}

#[tokio::test]
async fn batches_carry_session_scoped_keys() {
    let config = HarvestConfigBuilder::from_config(fast_config())
        .backend(BackendConfig {
            batch_size: 5,
            ..BackendConfig::default()
        })
        .build()
        .expect("config");
    let quota = Arc::new(FixedQuota::new(Quota::Unlimited));
    let sink = Arc::new(MemorySink::new());
    let session = member_session(config, Arc::new(member_list(member_rows(12))))
        .with_quota(quota.clone())
        .with_sink(sink.clone());

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::Completed);
    assert_eq!(report.receipts.len(), 3);
    let keys: Vec<_> = sink
        .requests()
        .into_iter()
        .filter_map(|r| r.idempotency_key)
        .collect();
    let id = report.session_id;
    assert_eq!(keys, vec![format!("{id}-0"), format!("{id}-1"), format!("{id}-2")]);
    assert_eq!(quota.usage_reports(), vec![5, 5, 2]);
    assert!(sink.requests().iter().all(|r| r.kind == "GROUP_MEMBERSHIP"));
}

#[tokio::test]
async fn failed_delivery_keeps_records() {
    let quota = Arc::new(FixedQuota::new(Quota::Unlimited));
    let sink = Arc::new(MemorySink::failing(1));
    let session = member_session(fast_config(), Arc::new(member_list(member_rows(12))))
        .with_quota(quota.clone())
        .with_sink(sink.clone());

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::Completed);
    assert_eq!(report.records.len(), 12);
    assert!(report.receipts.is_empty());
    assert!(report.ingest_error.as_ref().is_some_and(|e| e.is_retryable()));
    assert!(quota.usage_reports().is_empty());
    assert_eq!(report.summary().records, 12);
}

#[tokio::test]
async fn memory_sink_is_idempotent_per_key() {
    use kodegen_tools_leadscrape::ingest::{IngestionRequest, LeadSink};
    use kodegen_tools_leadscrape::{LeadKind, LeadRecord, Platform};

    let sink = MemorySink::new();
    let lead = LeadRecord::new("Ana", Platform::WhatsApp, LeadKind::GroupMembership, "https://web.whatsapp.com/");
    let request = IngestionRequest::new(Platform::WhatsApp, LeadKind::GroupMembership, vec![lead])
        .with_idempotency_key("s-0");

    let first = sink.ingest(&request).await.expect("first");
    let again = sink.ingest(&request).await.expect("again");
    assert_eq!(first, again);
    assert_eq!(sink.calls(), 2);
    assert_eq!(sink.stored_leads(), 1);
}

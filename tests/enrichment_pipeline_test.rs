//! LinkedIn reactions harvested and enriched through the hidden profile frame

use kodegen_tools_leadscrape::config::{EnrichConfig, HarvestConfig, HarvestConfigBuilder};
use kodegen_tools_leadscrape::extractors::ReactionsExtractor;
use kodegen_tools_leadscrape::testing::{StaticProfileFrame, VirtualList};
use kodegen_tools_leadscrape::{DoneReason, HarvestSession, Messenger, ProfileEnricher};
use std::sync::Arc;

mod common;
use common::fast_config;

const LOCATION: &str = ".text-body-small.inline.t-black--light.break-words";

fn reaction_row(i: usize) -> String {
    format!(
        r#"<li class="social-details-reactors-tab-body-list-item">
             <a href="https://www.linkedin.com/in/person-{i}?miniProfile=x">
               <div class="artdeco-entity-lockup__title">Person {i}</div>
               <div class="artdeco-entity-lockup__caption">Engineer</div>
               <img class="reactions-icon" data-test-reactions-icon-type="like" src="r.svg">
             </a>
           </li>"#
    )
}

fn config() -> HarvestConfig {
    HarvestConfigBuilder::from_config(fast_config())
        .enrich(EnrichConfig {
            field_timeout_ms: 5,
            poll_ms: 1,
            contact_info: false,
            ..EnrichConfig::default()
        })
        .build()
        .expect("config")
}

fn session(frame: StaticProfileFrame, rows: usize) -> HarvestSession {
    let config = config();
    let list = VirtualList::new((1..=rows).map(reaction_row).collect(), 60.0, 600.0)
        .with_location("https://www.linkedin.com/feed/update/urn:li:activity:7/");
    let enricher = ProfileEnricher::new(Box::new(frame), config.enrich().clone(), 1_000.0);
    HarvestSession::new(
        config,
        Arc::new(list),
        Arc::new(ReactionsExtractor::new()),
        Messenger::default(),
    )
    .with_enricher(Arc::new(enricher))
}

#[tokio::test]
async fn reactions_are_enriched_from_profiles() {
    let frame = StaticProfileFrame::new().with_value(LOCATION, "Paris, Île-de-France");
    let report = session(frame.clone(), 6).run().await.expect("session");

    assert_eq!(report.reason, DoneReason::Completed);
    assert_eq!(report.records.len(), 6);
    for record in &report.records {
        assert_eq!(record.location.as_deref(), Some("Paris, Île-de-France"));
        assert_eq!(record.reaction_type.as_deref(), Some("LIKE"));
        assert_eq!(record.caption.as_deref(), Some("Engineer"));
    }
    assert_eq!(
        report.records[0].profile_link.as_deref(),
        Some("https://www.linkedin.com/in/person-1")
    );
    assert_eq!(frame.loads().len(), 6);
}

#[tokio::test]
async fn failing_frame_keeps_extracted_records() {
    let frame = StaticProfileFrame::new().failing();
    let report = session(frame.clone(), 8).run().await.expect("session");

    assert_eq!(report.records.len(), 8);
    assert!(report.records.iter().all(|r| r.location.is_none()));
    // The breaker opens after the configured number of failures
    assert!(frame.loads().len() < 8);
}

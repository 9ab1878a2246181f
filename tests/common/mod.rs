//! Shared fixtures for the leadscrape integration tests

use kodegen_tools_leadscrape::config::{HarvestConfig, ScrollConfig};
use kodegen_tools_leadscrape::extractors::GroupMembersExtractor;
use kodegen_tools_leadscrape::messaging::{Envelope, MessageType};
use kodegen_tools_leadscrape::testing::VirtualList;
use kodegen_tools_leadscrape::{HarvestSession, Messenger};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Header selector the WhatsApp member modal advertises its size in
#[allow(dead_code)]
pub const MEMBER_HEADER: &str = r#"div[data-animate-modal-popup="true"] header"#;

/// Deterministic, delay-free config: one full viewport per scroll step
#[allow(dead_code)]
pub fn fast_config() -> HarvestConfig {
    HarvestConfig::builder()
        .scroll(ScrollConfig {
            human: false,
            fast_fraction: 1.0,
            ..ScrollConfig::default()
        })
        .without_pacing()
        .build()
        .expect("valid config")
}

/// 60px rows in a 600px viewport: ten rows rendered at a time
#[allow(dead_code)]
pub fn member_list(rows: Vec<String>) -> VirtualList {
    VirtualList::new(rows, 60.0, 600.0)
}

#[allow(dead_code)]
pub fn member_session(config: HarvestConfig, list: Arc<VirtualList>) -> HarvestSession {
    HarvestSession::new(
        config,
        list,
        Arc::new(GroupMembersExtractor::new()),
        Messenger::default(),
    )
}

/// Everything buffered on `rx` so far
#[allow(dead_code)]
pub fn drain(rx: &mut broadcast::Receiver<Envelope>) -> Vec<Envelope> {
    let mut out = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        out.push(envelope);
    }
    out
}

#[allow(dead_code)]
pub fn of_type(envelopes: &[Envelope], kind: MessageType) -> Vec<Envelope> {
    envelopes.iter().filter(|e| e.kind == kind).cloned().collect()
}

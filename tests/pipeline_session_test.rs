//! End-to-end harvest passes over an in-memory virtualized list

use kodegen_tools_leadscrape::messaging::MessageType;
use kodegen_tools_leadscrape::scroll::{ScrollAction, Termination};
use kodegen_tools_leadscrape::testing::{VirtualList, member_row, member_rows};
use kodegen_tools_leadscrape::{DoneReason, SessionStatus};
use std::sync::Arc;

mod common;
use common::{MEMBER_HEADER, drain, fast_config, member_list, member_session, of_type};

#[tokio::test]
async fn harvests_advertised_member_count() {
    let list = Arc::new(
        member_list(member_rows(40))
            .with_text(MEMBER_HEADER, "Founders · 40 members")
            .with_text("._alcd", "Founders 🚀"),
    );
    let session = member_session(fast_config(), list.clone());
    let mut rx = session.messenger().subscribe();

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::Completed);
    assert_eq!(report.records.len(), 40);
    let scroll = report.scroll.expect("scroll outcome");
    assert_eq!(scroll.termination, Termination::ReachedExpected);
    assert_eq!(scroll.iterations, 4);
    assert_eq!(scroll.expected_total, Some(40));
    assert!(report.records.iter().all(|r| r.group_name.as_deref() == Some("Founders")));
    assert_eq!(report.records[0].name, "Member 001");
    assert_eq!(report.records[39].name, "Member 040");

    let envelopes = drain(&mut rx);
    let progress = of_type(&envelopes, MessageType::ScrapeProgress);
    assert_eq!(progress.len(), 40);
    assert_eq!(progress[0].payload.index, Some(1));
    assert_eq!(progress[0].payload.total, Some(40));
    assert_eq!(progress[39].payload.index, Some(40));

    let done = of_type(&envelopes, MessageType::ScrapeDone);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].payload.reason, Some(DoneReason::Completed));
    assert_eq!(done[0].payload.total, Some(40));
    assert_eq!(done[0].payload.records().len(), 40);
    assert_eq!(session.controller().status(), SessionStatus::Completed);

    // The "View all" affordance was clicked before scrolling
    assert!(!list.clicks().is_empty());
}

#[tokio::test]
async fn stagnation_ends_a_pass_without_expected_total() {
    let list = Arc::new(member_list(member_rows(25)));
    let session = member_session(fast_config(), list.clone());

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::Completed);
    assert_eq!(report.records.len(), 25);
    let scroll = report.scroll.expect("scroll outcome");
    assert_eq!(scroll.termination, Termination::Exhausted);
    assert!(scroll.iterations <= 6, "took {} iterations", scroll.iterations);
    assert!(
        list.actions().contains(&ScrollAction::JumpToBottom),
        "a pinned list escalates before giving up"
    );
}

#[tokio::test]
async fn frozen_list_gives_up_quickly() {
    let list = Arc::new(member_list(member_rows(30)).frozen());
    let session = member_session(fast_config(), list.clone());

    let report = session.run().await.expect("session");

    assert_eq!(report.records.len(), 10);
    let scroll = report.scroll.expect("scroll outcome");
    assert_eq!(scroll.termination, Termination::Exhausted);
    assert_eq!(scroll.iterations, 3);
}

#[tokio::test]
async fn load_more_pages_are_followed() {
    let list = Arc::new(member_list(member_rows(30)).paginated(10));
    let session = member_session(fast_config(), list);

    let report = session.run().await.expect("session");

    assert_eq!(report.records.len(), 30);
    assert_eq!(report.reason, DoneReason::Completed);
}

#[tokio::test]
async fn duplicates_are_emitted_once() {
    let mut rows = member_rows(20);
    rows[15] = r#"<div role="listitem" data-row="again"><div role="button"><span>Member  003</span></div></div>"#.to_string();
    rows.push(member_row("J"));
    let list = Arc::new(member_list(rows));
    let session = member_session(fast_config(), list);
    let mut rx = session.messenger().subscribe();

    let report = session.run().await.expect("session");

    assert_eq!(report.records.len(), 19);
    assert_eq!(report.diagnostics.duplicates, 1);
    assert_eq!(report.diagnostics.total_skipped(), 1);
    let names: std::collections::HashSet<_> = report.records.iter().map(|r| r.name.clone()).collect();
    assert_eq!(names.len(), 19);
    assert_eq!(of_type(&drain(&mut rx), MessageType::ScrapeProgress).len(), 19);
}

#[tokio::test]
async fn navigating_away_stops_and_resets() {
    let list = Arc::new(
        member_list(member_rows(40))
            .with_location("https://web.whatsapp.com/")
            .navigate_after(1, "https://web.whatsapp.com/other-chat"),
    );
    let session = member_session(fast_config(), list);
    let mut rx = session.messenger().subscribe();

    let report = session.run().await.expect("session");

    assert_eq!(report.reason, DoneReason::Stopped);
    assert_eq!(report.records.len(), 10);
    assert_eq!(session.controller().status(), SessionStatus::Idle);
    assert!(session.store().is_empty());

    let done = of_type(&drain(&mut rx), MessageType::ScrapeDone);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].payload.reason, Some(DoneReason::Stopped));
}

#[tokio::test]
async fn a_second_run_starts_from_a_clean_store() {
    let list = Arc::new(member_list(member_rows(12)));
    let session = member_session(fast_config(), list.clone());

    let first = session.run().await.expect("first run");
    let second = session.run().await.expect("second run");

    assert_eq!(first.records.len(), 12);
    assert_eq!(second.records.len(), 12);
    assert_ne!(first.session_id, second.session_id);
}

#[tokio::test]
async fn virtual_list_renders_only_the_viewport() {
    use kodegen_tools_leadscrape::scroll::{ListSelectors, ScrollSurface};

    let list = VirtualList::new(member_rows(100), 50.0, 500.0);
    let selectors = ListSelectors::default();
    assert_eq!(list.rendered_items(&selectors).await.expect("items").len(), 10);
    list.apply(&selectors, ScrollAction::JumpToBottom).await.expect("scroll");
    let items = list.rendered_items(&selectors).await.expect("items");
    assert!(items.last().expect("row").contains("Member 100"));
}

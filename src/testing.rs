//! In-memory stand-ins for the browser and the backend
//!
//! Used by the unit tests and by `tests/`; none of these touch the network
//! or a real browser.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::enrich::{EnrichError, ProfileFrame};
use crate::ingest::{
    DiagnosticsReport, IngestError, IngestReceipt, IngestionRequest, LeadSink, Quota, QuotaSource,
    RecordId,
};
use crate::scroll::{ListSelectors, ScrollAction, ScrollMetrics, ScrollSurface, SurfaceError};

/// WhatsApp-style member row with a saved-contact name
#[must_use]
pub fn member_row(name: &str) -> String {
    let name = html_escape::encode_text(name);
    format!(
        r#"<div role="listitem"><div role="button"><span title="{name}">{name}</span></div></div>"#
    )
}

/// `count` distinct member rows named `Member 001`, `Member 002`, ...
#[must_use]
pub fn member_rows(count: usize) -> Vec<String> {
    (1..=count).map(|i| member_row(&format!("Member {i:03}"))).collect()
}

struct ListState {
    rows: Vec<String>,
    /// Rows present in the DOM; grows through load-more clicks
    loaded: usize,
    page_size: Option<usize>,
    scroll_top: f64,
    frozen: bool,
    location: String,
    navigate_after: Option<(usize, String)>,
    reads: usize,
    texts: Vec<(String, String)>,
    actions: Vec<ScrollAction>,
    clicks: Vec<Vec<String>>,
}

/// Virtualized list: only the rows inside the viewport are rendered
pub struct VirtualList {
    state: Mutex<ListState>,
    item_height: f64,
    client_height: f64,
}

impl VirtualList {
    #[must_use]
    pub fn new(rows: Vec<String>, item_height: f64, client_height: f64) -> Self {
        let loaded = rows.len();
        Self {
            state: Mutex::new(ListState {
                rows,
                loaded,
                page_size: None,
                scroll_top: 0.0,
                frozen: false,
                location: "https://web.whatsapp.com/".to_string(),
                navigate_after: None,
                reads: 0,
                texts: Vec::new(),
                actions: Vec::new(),
                clicks: Vec::new(),
            }),
            item_height,
            client_height,
        }
    }

    /// Only `page_size` rows exist until a load-more click at the bottom
    #[must_use]
    pub fn paginated(self, page_size: usize) -> Self {
        {
            let mut state = self.state.lock();
            state.page_size = Some(page_size.max(1));
            state.loaded = state.rows.len().min(page_size.max(1));
        }
        self
    }

    /// Scroll actions are accepted but the list never moves
    #[must_use]
    pub fn frozen(self) -> Self {
        self.state.lock().frozen = true;
        self
    }

    #[must_use]
    pub fn with_location(self, url: &str) -> Self {
        self.state.lock().location = url.to_string();
        self
    }

    /// Text returned by `text_of` for `selector`
    #[must_use]
    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.state
            .lock()
            .texts
            .push((selector.to_string(), text.to_string()));
        self
    }

    /// Switch the page URL after `reads` calls to `rendered_items`
    #[must_use]
    pub fn navigate_after(self, reads: usize, url: &str) -> Self {
        self.state.lock().navigate_after = Some((reads, url.to_string()));
        self
    }

    pub fn actions(&self) -> Vec<ScrollAction> {
        self.state.lock().actions.clone()
    }

    pub fn clicks(&self) -> Vec<Vec<String>> {
        self.state.lock().clicks.clone()
    }

    fn max_scroll(&self, state: &ListState) -> f64 {
        (state.loaded as f64 * self.item_height - self.client_height).max(0.0)
    }

    fn scroll_to(&self, state: &mut ListState, top: f64) {
        if !state.frozen {
            state.scroll_top = top.clamp(0.0, self.max_scroll(state));
        }
    }
}

#[async_trait]
impl ScrollSurface for VirtualList {
    async fn metrics(&self, _list: &ListSelectors) -> Result<ScrollMetrics, SurfaceError> {
        let state = self.state.lock();
        Ok(ScrollMetrics {
            scroll_top: state.scroll_top,
            scroll_height: (state.loaded as f64 * self.item_height).max(self.client_height),
            client_height: self.client_height,
        })
    }

    async fn rendered_items(&self, _list: &ListSelectors) -> Result<Vec<String>, SurfaceError> {
        let mut state = self.state.lock();
        state.reads += 1;
        if let Some((after, url)) = state.navigate_after.clone()
            && state.reads > after
        {
            state.location = url;
        }
        let first = (state.scroll_top / self.item_height).floor() as usize;
        let visible = (self.client_height / self.item_height).ceil() as usize;
        let end = (first + visible).min(state.loaded);
        Ok(state.rows[first.min(end)..end].to_vec())
    }

    async fn apply(&self, _list: &ListSelectors, action: ScrollAction) -> Result<(), SurfaceError> {
        let mut state = self.state.lock();
        let top = state.scroll_top;
        let target = match &action {
            ScrollAction::ScrollBy { dy, .. } => top + dy,
            ScrollAction::Wheel { delta } => top + delta,
            ScrollAction::PageDown => top + self.client_height,
            ScrollAction::LastIntoView | ScrollAction::JumpToBottom => self.max_scroll(&state),
        };
        self.scroll_to(&mut state, target);
        state.actions.push(action);
        Ok(())
    }

    async fn click_load_more(&self, list: &ListSelectors) -> Result<bool, SurfaceError> {
        if list.load_more.is_empty() {
            return Ok(false);
        }
        let mut state = self.state.lock();
        let Some(page) = state.page_size else {
            return Ok(false);
        };
        let at_bottom = state.scroll_top >= self.max_scroll(&state) - 1.0;
        if !at_bottom || state.loaded >= state.rows.len() {
            return Ok(false);
        }
        state.loaded = (state.loaded + page).min(state.rows.len());
        Ok(true)
    }

    async fn click_first(&self, selectors: &[String]) -> Result<bool, SurfaceError> {
        self.state.lock().clicks.push(selectors.to_vec());
        Ok(true)
    }

    async fn text_of(&self, selectors: &[String]) -> Result<Option<String>, SurfaceError> {
        let state = self.state.lock();
        Ok(selectors.iter().find_map(|sel| {
            state
                .texts
                .iter()
                .find(|(s, _)| s == sel)
                .map(|(_, text)| text.clone())
        }))
    }

    async fn location(&self) -> Result<String, SurfaceError> {
        Ok(self.state.lock().location.clone())
    }
}

#[derive(Default)]
struct FrameState {
    values: HashMap<String, String>,
    clickable: HashSet<String>,
    loads: Vec<String>,
    clicks: Vec<String>,
    fail_loads: bool,
}

/// Profile frame answering from a fixed selector → value table
#[derive(Clone, Default)]
pub struct StaticProfileFrame {
    inner: Arc<Mutex<FrameState>>,
}

impl StaticProfileFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(self, selector: &str, value: &str) -> Self {
        self.inner
            .lock()
            .values
            .insert(selector.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_clickable(self, selector: &str) -> Self {
        self.inner.lock().clickable.insert(selector.to_string());
        self
    }

    /// Every `load` fails with a navigation error
    #[must_use]
    pub fn failing(self) -> Self {
        self.inner.lock().fail_loads = true;
        self
    }

    /// URLs loaded so far, in order
    pub fn loads(&self) -> Vec<String> {
        self.inner.lock().loads.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.inner.lock().clicks.clone()
    }
}

#[async_trait]
impl ProfileFrame for StaticProfileFrame {
    async fn load(&self, url: &str) -> Result<(), EnrichError> {
        let mut state = self.inner.lock();
        state.loads.push(url.to_string());
        if state.fail_loads {
            return Err(EnrichError::Navigation {
                url: url.to_string(),
                reason: "frame refused to load".to_string(),
            });
        }
        Ok(())
    }

    async fn read(&self, selectors: &[String], _attr: Option<&str>) -> Result<Option<String>, EnrichError> {
        let state = self.inner.lock();
        Ok(selectors.iter().find_map(|sel| state.values.get(sel).cloned()))
    }

    async fn click(&self, selectors: &[String]) -> Result<bool, EnrichError> {
        let mut state = self.inner.lock();
        match selectors.iter().find(|sel| state.clickable.contains(*sel)).cloned() {
            Some(sel) => {
                state.clicks.push(sel);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
struct SinkState {
    receipts: HashMap<String, RecordId>,
    requests: Vec<IngestionRequest>,
    calls: usize,
    failures_left: usize,
    next_id: i64,
}

/// Idempotent in-memory ingestion endpoint
///
/// A repeated idempotency key returns the receipt of the first request.
#[derive(Default)]
pub struct MemorySink {
    state: Mutex<SinkState>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First `n` calls fail with a retryable 503
    #[must_use]
    pub fn failing(n: usize) -> Self {
        let sink = Self::default();
        sink.state.lock().failures_left = n;
        sink
    }

    /// Calls made, including failed ones
    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    /// Requests that were accepted
    pub fn requests(&self) -> Vec<IngestionRequest> {
        self.state.lock().requests.clone()
    }

    /// Leads stored under distinct idempotency keys
    pub fn stored_leads(&self) -> usize {
        self.state.lock().requests.iter().map(|r| r.leads.len()).sum()
    }
}

#[async_trait]
impl LeadSink for MemorySink {
    async fn ingest(&self, request: &IngestionRequest) -> Result<IngestReceipt, IngestError> {
        let mut state = self.state.lock();
        state.calls += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(IngestError::Status {
                endpoint: "/scraping/ingest".to_string(),
                code: 503,
                body: "unavailable".to_string(),
            });
        }
        if let Some(key) = &request.idempotency_key
            && let Some(id) = state.receipts.get(key)
        {
            return Ok(IngestReceipt { id: id.clone() });
        }
        state.next_id += 1;
        let id = RecordId::Number(state.next_id);
        if let Some(key) = &request.idempotency_key {
            state.receipts.insert(key.clone(), id.clone());
        }
        state.requests.push(request.clone());
        Ok(IngestReceipt { id })
    }
}

/// Quota source with a fixed answer that records what was reported
pub struct FixedQuota {
    answer: Result<Quota, IngestError>,
    usage: Mutex<Vec<u64>>,
    diagnostics: Mutex<usize>,
}

impl FixedQuota {
    #[must_use]
    pub fn new(quota: Quota) -> Self {
        Self {
            answer: Ok(quota),
            usage: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(0),
        }
    }

    /// The limit query fails with a transport error
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            answer: Err(IngestError::Transport("connection refused".to_string())),
            usage: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(0),
        }
    }

    pub fn usage_reports(&self) -> Vec<u64> {
        self.usage.lock().clone()
    }

    pub fn diagnostics_sent(&self) -> usize {
        *self.diagnostics.lock()
    }
}

#[async_trait]
impl QuotaSource for FixedQuota {
    async fn scraping_limit(&self) -> Result<Quota, IngestError> {
        self.answer.clone()
    }

    async fn report_usage(&self, amount: u64) -> bool {
        self.usage.lock().push(amount);
        true
    }

    async fn send_diagnostics(&self, _report: &DiagnosticsReport<'_>) -> bool {
        *self.diagnostics.lock() += 1;
        true
    }
}

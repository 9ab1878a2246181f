//! [`ScrollSurface`] backed by a live chromiumoxide page

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::trace;

use super::js_scripts::{
    ACTION_SCRIPT, CLICK_FIRST_SCRIPT, ITEMS_SCRIPT, LOAD_MORE_SCRIPT, LOCATION_SCRIPT,
    METRICS_SCRIPT, Prelude, TEXT_OF_SCRIPT, build_script,
};
use crate::scroll::{ListSelectors, ScrollAction, ScrollMetrics, ScrollSurface, SurfaceError};

#[derive(Deserialize)]
struct Wrapped<T> {
    value: Option<T>,
}

/// Map CDP failures onto the surface error taxonomy
pub(crate) fn classify_cdp(e: CdpError) -> SurfaceError {
    match e {
        CdpError::Timeout => SurfaceError::Timeout("CDP request".to_string()),
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            SurfaceError::Disconnected(e.to_string())
        }
        other => SurfaceError::Script(other.to_string()),
    }
}

fn list_args(list: &ListSelectors) -> Value {
    json!({ "container": list.container, "items": list.items })
}

fn action_args(action: &ScrollAction) -> Value {
    match action {
        ScrollAction::ScrollBy { dy, smooth } => json!({ "kind": "scrollBy", "dy": dy, "smooth": smooth }),
        ScrollAction::Wheel { delta } => json!({ "kind": "wheel", "delta": delta }),
        ScrollAction::LastIntoView => json!({ "kind": "lastIntoView" }),
        ScrollAction::PageDown => json!({ "kind": "pageDown" }),
        ScrollAction::JumpToBottom => json!({ "kind": "jumpToBottom" }),
    }
}

/// The list on one browser tab
#[derive(Clone)]
pub struct ChromiumListSurface {
    page: Page,
    script_timeout: Duration,
}

impl ChromiumListSurface {
    pub fn new(page: Page, script_timeout: Duration) -> Self {
        Self {
            page,
            script_timeout,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn eval<T: DeserializeOwned>(
        &self,
        body: &str,
        args: &Value,
        what: &str,
    ) -> Result<Option<T>, SurfaceError> {
        let script = build_script(Prelude::List, body, args)
            .map_err(|e| SurfaceError::Script(format!("{what}: {e}")))?;
        let result = tokio::time::timeout(self.script_timeout, self.page.evaluate(script.as_str()))
            .await
            .map_err(|_| SurfaceError::Timeout(format!("{what} after {:?}", self.script_timeout)))?
            .map_err(classify_cdp)?;
        let wrapped: Wrapped<T> = result
            .into_value()
            .map_err(|e| SurfaceError::Script(format!("{what}: {e}")))?;
        Ok(wrapped.value)
    }
}

#[async_trait]
impl ScrollSurface for ChromiumListSurface {
    async fn metrics(&self, list: &ListSelectors) -> Result<ScrollMetrics, SurfaceError> {
        let args = json!({ "list": list_args(list) });
        self.eval::<ScrollMetrics>(METRICS_SCRIPT, &args, "metrics")
            .await?
            .ok_or_else(|| SurfaceError::ContainerMissing(list.container.join(", ")))
    }

    async fn rendered_items(&self, list: &ListSelectors) -> Result<Vec<String>, SurfaceError> {
        let args = json!({ "list": list_args(list) });
        let items: Option<Vec<String>> = self.eval(ITEMS_SCRIPT, &args, "rendered items").await?;
        let items = items.unwrap_or_default();
        trace!(count = items.len(), "Rendered items read");
        Ok(items)
    }

    async fn apply(&self, list: &ListSelectors, action: ScrollAction) -> Result<(), SurfaceError> {
        let args = json!({ "list": list_args(list), "action": action_args(&action) });
        match self.eval::<bool>(ACTION_SCRIPT, &args, "scroll action").await? {
            Some(true) => Ok(()),
            _ => Err(SurfaceError::ContainerMissing(list.container.join(", "))),
        }
    }

    async fn click_load_more(&self, list: &ListSelectors) -> Result<bool, SurfaceError> {
        if list.load_more.is_empty() {
            return Ok(false);
        }
        let load_more: Vec<Value> = list
            .load_more
            .iter()
            .map(|lm| json!({ "selectors": lm.selectors, "textPattern": lm.text_pattern }))
            .collect();
        let args = json!({ "loadMore": load_more });
        Ok(self
            .eval::<bool>(LOAD_MORE_SCRIPT, &args, "load more")
            .await?
            .unwrap_or(false))
    }

    async fn click_first(&self, selectors: &[String]) -> Result<bool, SurfaceError> {
        let args = json!({ "selectors": selectors });
        Ok(self
            .eval::<bool>(CLICK_FIRST_SCRIPT, &args, "click")
            .await?
            .unwrap_or(false))
    }

    async fn text_of(&self, selectors: &[String]) -> Result<Option<String>, SurfaceError> {
        let args = json!({ "selectors": selectors });
        self.eval(TEXT_OF_SCRIPT, &args, "text").await
    }

    async fn location(&self) -> Result<String, SurfaceError> {
        self.eval::<String>(LOCATION_SCRIPT, &json!({}), "location")
            .await?
            .ok_or_else(|| SurfaceError::Script("location unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_arguments_match_page_script_kinds() {
        assert_eq!(
            action_args(&ScrollAction::ScrollBy { dy: 540.0, smooth: true }),
            json!({ "kind": "scrollBy", "dy": 540.0, "smooth": true })
        );
        assert_eq!(action_args(&ScrollAction::JumpToBottom)["kind"], "jumpToBottom");
        for kind in ["scrollBy", "wheel", "lastIntoView", "pageDown", "jumpToBottom"] {
            assert!(ACTION_SCRIPT.contains(&format!("case \"{kind}\"")));
        }
    }
}

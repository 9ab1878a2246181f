//! [`ProfileFrame`] implemented as a hidden iframe inside the list tab
//!
//! Profile pages share the list page's origin and session, so loading them
//! into an off-screen iframe keeps the user's tab and scroll position intact.

use async_trait::async_trait;
use chromiumoxide::page::Page;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::js_scripts::{
    FRAME_CLICK_SCRIPT, FRAME_LOAD_SCRIPT, FRAME_READ_SCRIPT, FRAME_STATE_SCRIPT, Prelude,
    build_script,
};
use crate::enrich::{EnrichError, ProfileFrame};
use crate::wait::wait_until;

#[derive(Deserialize)]
struct Wrapped<T> {
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameState {
    loaded: String,
    ready_state: String,
}

pub struct ChromiumProfileFrame {
    page: Page,
    load_timeout: Duration,
    poll: Duration,
}

impl ChromiumProfileFrame {
    pub fn new(page: Page, load_timeout: Duration) -> Self {
        Self {
            page,
            load_timeout,
            poll: Duration::from_millis(250),
        }
    }

    async fn eval<T: DeserializeOwned>(&self, body: &str, args: &Value) -> Result<Option<T>, EnrichError> {
        let script =
            build_script(Prelude::Frame, body, args).map_err(|e| EnrichError::Frame(e.to_string()))?;
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| EnrichError::Frame(e.to_string()))?;
        let wrapped: Wrapped<T> = result
            .into_value()
            .map_err(|e| EnrichError::Frame(e.to_string()))?;
        Ok(wrapped.value)
    }
}

#[async_trait]
impl ProfileFrame for ChromiumProfileFrame {
    async fn load(&self, url: &str) -> Result<(), EnrichError> {
        let token = uuid::Uuid::new_v4().to_string();
        self.eval::<bool>(FRAME_LOAD_SCRIPT, &json!({ "url": url, "token": token }))
            .await
            .map_err(|e| EnrichError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let loaded = wait_until(self.load_timeout, self.poll, || {
            let token = token.as_str();
            async move {
                match self.eval::<FrameState>(FRAME_STATE_SCRIPT, &json!({})).await {
                    Ok(Some(state)) if state.loaded == token && state.ready_state == "complete" => {
                        Some(())
                    }
                    Ok(_) => None,
                    Err(e) => {
                        debug!("Frame state probe failed: {}", e);
                        None
                    }
                }
            }
        })
        .await;

        loaded.ok_or_else(|| EnrichError::Navigation {
            url: url.to_string(),
            reason: format!("not loaded within {:?}", self.load_timeout),
        })
    }

    async fn read(&self, selectors: &[String], attr: Option<&str>) -> Result<Option<String>, EnrichError> {
        self.eval(FRAME_READ_SCRIPT, &json!({ "selectors": selectors, "attr": attr }))
            .await
    }

    async fn click(&self, selectors: &[String]) -> Result<bool, EnrichError> {
        Ok(self
            .eval::<bool>(FRAME_CLICK_SCRIPT, &json!({ "selectors": selectors }))
            .await?
            .unwrap_or(false))
    }
}

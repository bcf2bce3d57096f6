use crate::error::{BrowserError, Result};
use crate::exhaust::ScrollExhauster;
use chromiumoxide::Page;
use pagedrain_core::{CssSelector, ExhaustOutcome, ScrollConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Page operations the scroll loop drives.
///
/// Implementations must re-query selectors on every call; element handles
/// go stale as content is appended.
#[async_trait::async_trait]
pub trait PageActions: Send + Sync {
    /// Current scrollable height of the document body
    async fn content_height(&self) -> Result<u64>;

    /// Move the viewport so its top sits at `y`
    async fn scroll_to(&self, y: u64) -> Result<()>;

    /// Click the first element matching `selector`.
    ///
    /// Returns `false` when nothing matches.
    async fn click_first(&self, selector: &str) -> Result<bool>;
}

const CONTENT_HEIGHT_JS: &str = "document.body ? document.body.scrollHeight : 0";

#[async_trait::async_trait]
impl PageActions for Page {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    async fn content_height(&self) -> Result<u64> {
        let height: f64 = self
            .evaluate_expression(CONTENT_HEIGHT_JS)
            .await
            .map_err(|e| BrowserError::ScriptError(format!("measuring height: {e}")))?
            .into_value()
            .map_err(|e| BrowserError::ScriptError(format!("unexpected height value: {e}")))?;

        Ok(height.max(0.0).round() as u64)
    }

    async fn scroll_to(&self, y: u64) -> Result<()> {
        self.evaluate_expression(format!("window.scrollTo(0, {y})"))
            .await
            .map_err(|e| BrowserError::ScriptError(format!("scrolling to {y}: {e}")))?;
        Ok(())
    }

    async fn click_first(&self, selector: &str) -> Result<bool> {
        let js = click_script(selector)?;
        let clicked: bool = self
            .evaluate_expression(js)
            .await
            .map_err(|e| BrowserError::ScriptError(format!("clicking {selector}: {e}")))?
            .into_value()
            .map_err(|e| BrowserError::ScriptError(format!("unexpected click result: {e}")))?;
        Ok(clicked)
    }
}

fn click_script(selector: &str) -> Result<String> {
    let quoted = serde_json::to_string(selector)
        .map_err(|e| BrowserError::ScriptError(format!("encoding selector: {e}")))?;
    Ok(format!(
        "(() => {{ const el = document.querySelector({quoted}); \
         if (el === null) {{ return false; }} el.click(); return true; }})()"
    ))
}

/// One step run against a loaded page before its HTML is extracted.
///
/// Lists are written as JSON, e.g.
/// `[{"click": {"element": "#accept"}}, {"scroll": {"max_pages": 3}}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    /// Click the first element matching a selector
    Click {
        /// Selector of the element to click
        element: CssSelector,
    },
    /// Scroll (or click a control) until the page stops growing
    Scroll(ScrollConfig),
    /// Pause for a fixed time
    Wait {
        /// Pause length in milliseconds
        ms: u64,
    },
}

impl PageAction {
    /// Parse a JSON action list.
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json).map_err(|e| BrowserError::InvalidAction(e.to_string()))
    }

    /// Run the action against `page`.
    ///
    /// Returns the session outcome for `Scroll` actions.
    pub async fn run<P>(
        &self,
        page: &P,
        cancel: &CancellationToken,
    ) -> Result<Option<ExhaustOutcome>>
    where
        P: PageActions + ?Sized,
    {
        match self {
            Self::Click { element } => {
                if !page.click_first(element.as_str()).await? {
                    tracing::warn!("Click action matched nothing: {}", element);
                }
                Ok(None)
            }
            Self::Scroll(config) => {
                let exhauster = ScrollExhauster::new(config.clone())?;
                exhauster.exhaust(page, cancel).await.map(Some)
            }
            Self::Wait { ms } => {
                tokio::select! {
                    () = cancel.cancelled() => Err(BrowserError::Cancelled),
                    () = tokio::time::sleep(Duration::from_millis(*ms)) => Ok(None),
                }
            }
        }
    }
}

/// Parse and check a request URL before a page is opened for it.
pub fn validate_url(url: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(url.trim())
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" | "file" => {}
        other => {
            return Err(BrowserError::NavigationError(format!(
                "Unsupported URL scheme: {other}"
            )))
        }
    }

    if parsed.scheme() != "file" && parsed.host_str().is_none() {
        return Err(BrowserError::NavigationError("No host in URL".to_string()));
    }

    Ok(parsed)
}

use crate::actions::{validate_url, PageAction};
use crate::error::{BrowserError, Result};
use chrono::{DateTime, Utc};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use pagedrain_core::{BrowserConfig, ExhaustOutcome, ScrollConfig};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A page to load and the actions to run on it before extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub actions: Vec<PageAction>,
}

impl FetchRequest {
    /// Request that loads `url` and runs no actions.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            actions: Vec::new(),
        }
    }

    /// Request that loads `url` and scrolls it until exhausted.
    pub fn scrolled(url: impl Into<String>, scroll: ScrollConfig) -> Self {
        Self::new(url).with_action(PageAction::Scroll(scroll))
    }

    #[must_use]
    pub fn with_action(mut self, action: PageAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// Final document after all actions ran.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
    /// One entry per `Scroll` action, in order
    pub outcomes: Vec<ExhaustOutcome>,
    pub fetched_at: DateTime<Utc>,
}

/// Browser automation engine
pub struct BrowserEngine {
    browser: Browser,
    config: BrowserConfig,
    handler: JoinHandle<()>,
}

impl BrowserEngine {
    /// Launch a browser with default settings
    pub async fn new() -> Result<Self> {
        Self::launch(&BrowserConfig::default()).await
    }

    /// Launch a browser with the given settings
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let chrome_config = chrome_config(config)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drive the CDP connection until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        tracing::info!(
            "Browser launched (headless: {}, {}x{})",
            config.headless,
            config.window_width,
            config.window_height
        );

        Ok(Self {
            browser,
            config: config.clone(),
            handler,
        })
    }

    /// Load a page, run the request's actions and return the rendered HTML.
    ///
    /// The page is closed before returning, whether the actions succeeded or not.
    pub async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<RenderedPage> {
        let url = validate_url(&request.url)?;
        let page = self.open(url.as_str()).await?;

        let result = Self::render(&page, url.as_str(), &request.actions, cancel).await;

        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close page {}: {}", url, e);
        }
        result
    }

    async fn open(&self, url: &str) -> Result<Page> {
        let timeout = self.config.navigation_timeout();
        tracing::debug!("Navigating to {} (timeout {:?})", url, timeout);

        let navigation = async {
            let page = self
                .browser
                .new_page(url)
                .await
                .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
            Ok::<_, BrowserError>(page)
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| {
                BrowserError::Timeout(format!(
                    "navigation to {url} took longer than {}s",
                    timeout.as_secs()
                ))
            })?
    }

    async fn render(
        page: &Page,
        url: &str,
        actions: &[PageAction],
        cancel: &CancellationToken,
    ) -> Result<RenderedPage> {
        let mut outcomes = Vec::new();
        for action in actions {
            if let Some(outcome) = action.run(page, cancel).await? {
                outcomes.push(outcome);
            }
        }

        let html = page
            .content()
            .await
            .map_err(|e| BrowserError::ScriptError(format!("reading document: {e}")))?;

        tracing::debug!("Extracted {} bytes from {}", html.len(), url);

        Ok(RenderedPage {
            url: url.to_string(),
            html,
            outcomes,
            fetched_at: Utc::now(),
        })
    }

    /// Close the browser and stop the handler task.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}

fn chrome_config(config: &BrowserConfig) -> Result<ChromeConfig> {
    let mut builder = ChromeConfig::builder()
        .no_sandbox()
        .window_size(config.window_width, config.window_height);

    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(path) = &config.executable {
        builder = builder.chrome_executable(path);
    }
    if let Some(user_agent) = &config.user_agent {
        builder = builder.arg(format!("--user-agent={user_agent}"));
    }

    builder.build().map_err(BrowserError::ChromiumError)
}

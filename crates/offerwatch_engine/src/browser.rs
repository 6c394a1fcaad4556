use std::time::Duration;

use crate::types::RunError;

/// Connection settings for the browser-automation endpoint supplied by
/// the execution environment (chromedriver, geckodriver, a Selenium hub).
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Base URL of the WebDriver endpoint, e.g. `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    /// Deadline for establishing a browser session.
    pub launch_timeout: Duration,
    /// How often ready-condition polls hit the endpoint.
    pub poll_interval: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_owned(),
            headless: true,
            launch_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// The named page-ready contract: a CSS selector that must match at
/// least one element within the deadline. No arbitrary sleeps.
#[derive(Debug, Clone)]
pub struct ReadyCondition {
    pub selector: String,
    pub timeout: Duration,
}

/// One scripted interaction performed after the ready condition and
/// before extraction. Some listing pages only render their offers after
/// a menu click or two (calendar widgets, "load more" buttons).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStep {
    Click { selector: String },
    WaitFor { selector: String },
}

/// Opens browser sessions. The seam the coordinator is tested through.
#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, RunError>;
}

/// One live browser tab. The coordinator guarantees `close` is called
/// exactly once on every exit path after a successful `open`.
#[async_trait::async_trait]
pub trait BrowserSession: Send + std::fmt::Debug {
    async fn goto(&mut self, url: &str) -> Result<(), RunError>;

    /// Block until `selector` matches at least one element, or fail with
    /// `RunError::NavigationTimeout` once `timeout` has elapsed.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), RunError>;

    /// Find the first element matching `selector` (waiting up to
    /// `timeout` for it to appear) and click it.
    async fn click(&mut self, selector: &str, timeout: Duration) -> Result<(), RunError>;

    /// Serialized source of the rendered document.
    async fn page_html(&mut self) -> Result<String, RunError>;

    /// Release all browser resources.
    async fn close(&mut self) -> Result<(), RunError>;
}

//! W3C WebDriver wire-protocol client over HTTP.
//!
//! The execution environment provides a driver endpoint (chromedriver or
//! compatible); this module speaks the JSON protocol to it directly. Only
//! the handful of commands the pipeline needs are implemented: session
//! create/delete, navigate, find-elements, click and page source.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;

use offerwatch_logging::watch_debug;

use crate::browser::{Browser, BrowserSession, BrowserSettings};
use crate::types::RunError;

/// Key under which the W3C protocol nests an element reference.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// `Browser` implementation backed by a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverBrowser {
    settings: BrowserSettings,
    client: reqwest::Client,
}

impl WebDriverBrowser {
    pub fn new(settings: BrowserSettings) -> Result<Self, RunError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.launch_timeout)
            .build()
            .map_err(|err| RunError::SessionLaunch(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--no-sandbox"];
        if self.settings.headless {
            args.insert(0, "--headless=new");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait::async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, RunError> {
        let url = format!("{}/session", self.settings.webdriver_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .timeout(self.settings.launch_timeout)
            .json(&self.capabilities())
            .send()
            .await
            .map_err(|err| RunError::SessionLaunch(err.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| RunError::SessionLaunch(err.to_string()))?;
        if !status.is_success() {
            return Err(RunError::SessionLaunch(protocol_message(&body, status)));
        }

        let session_id = body["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| RunError::SessionLaunch("no sessionId in response".to_owned()))?
            .to_owned();
        watch_debug!("webdriver session {session_id} opened");

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!(
                "{}/session/{session_id}",
                self.settings.webdriver_url.trim_end_matches('/')
            ),
            poll_interval: self.settings.poll_interval,
        }))
    }
}

/// One live WebDriver session.
#[derive(Debug)]
pub struct WebDriverSession {
    client: reqwest::Client,
    session_url: String,
    poll_interval: Duration,
}

impl WebDriverSession {
    async fn command(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value, RunError> {
        let url = format!("{}{path}", self.session_url);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| RunError::Protocol(err.to_string()))?;
        if !status.is_success() {
            return Err(driver_error(&body, status));
        }
        Ok(body)
    }

    /// One find-elements probe; returns how many elements matched.
    async fn count_matches(&self, selector: &str) -> Result<usize, RunError> {
        let body = self
            .command(
                reqwest::Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        Ok(body["value"].as_array().map_or(0, Vec::len))
    }

    /// Poll until `selector` matches, returning the first element id.
    async fn await_element(&self, selector: &str, timeout: Duration) -> Result<String, RunError> {
        let deadline = Instant::now() + timeout;
        loop {
            let body = self
                .command(
                    reqwest::Method::POST,
                    "/elements",
                    Some(json!({ "using": "css selector", "value": selector })),
                )
                .await?;
            if let Some(id) = body["value"][0][ELEMENT_KEY].as_str() {
                return Ok(id.to_owned());
            }
            if Instant::now() >= deadline {
                return Err(RunError::NavigationTimeout(format!(
                    "selector `{selector}` did not match within {timeout:?}"
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait::async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<(), RunError> {
        self.command(reqwest::Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), RunError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.count_matches(selector).await? > 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(RunError::NavigationTimeout(format!(
                    "selector `{selector}` did not match within {timeout:?}"
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn click(&mut self, selector: &str, timeout: Duration) -> Result<(), RunError> {
        let element_id = self.await_element(selector, timeout).await?;
        self.command(
            reqwest::Method::POST,
            &format!("/element/{element_id}/click"),
            Some(json!({})),
        )
        .await?;
        watch_debug!("clicked `{selector}`");
        Ok(())
    }

    async fn page_html(&mut self) -> Result<String, RunError> {
        let body = self.command(reqwest::Method::GET, "/source", None).await?;
        body["value"]
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or_else(|| RunError::Protocol("page source missing from response".to_owned()))
    }

    async fn close(&mut self) -> Result<(), RunError> {
        self.command(reqwest::Method::DELETE, "", None).await?;
        watch_debug!("webdriver session closed");
        Ok(())
    }
}

fn protocol_message(body: &Value, status: reqwest::StatusCode) -> String {
    match body["value"]["message"].as_str() {
        Some(message) => format!("{status}: {message}"),
        None => status.to_string(),
    }
}

/// Only timeout-shaped transport failures are recoverable; connection
/// refusals and the like stay protocol errors.
fn transport_error(err: reqwest::Error) -> RunError {
    if err.is_timeout() {
        RunError::NavigationTimeout(err.to_string())
    } else {
        RunError::Protocol(err.to_string())
    }
}

/// Classify a driver-reported failure by its W3C error code. A page
/// load that ran out of time is recoverable; an invalid session or a
/// crashed tab is not.
fn driver_error(body: &Value, status: reqwest::StatusCode) -> RunError {
    let message = protocol_message(body, status);
    match body["value"]["error"].as_str() {
        Some("timeout") | Some("script timeout") => RunError::NavigationTimeout(message),
        _ => RunError::Protocol(message),
    }
}

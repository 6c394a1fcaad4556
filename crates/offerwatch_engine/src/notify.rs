use std::time::Duration;

use thiserror::Error;

use offerwatch_core::Offer;
use offerwatch_logging::watch_info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

/// External notification boundary. Called with the NEW set only, one
/// attempt, no retry; transport guarantees are the collaborator's
/// problem, not the core's.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, offers: &[Offer]) -> Result<(), NotifyError>;
}

/// Default notifier when no endpoint is configured: writes the new
/// offers to the log and nothing else.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, offers: &[Offer]) -> Result<(), NotifyError> {
        for offer in offers {
            watch_info!(
                "new offer [{}]: {} ({}) {}",
                offer.id,
                offer.title,
                offer.price.as_deref().unwrap_or("price n/a"),
                offer.link
            );
        }
        Ok(())
    }
}

/// Posts the new offers as a JSON array to a webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| NotifyError(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, offers: &[Offer]) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(offers)
            .send()
            .await
            .map_err(|err| NotifyError(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError(format!("webhook answered {status}")));
        }
        watch_info!("notified webhook about {} new offers", offers.len());
        Ok(())
    }
}

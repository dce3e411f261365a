use anyhow::Context;
use async_trait::async_trait;

use super::Notifier;

/// Posts each notification as JSON to a configured endpoint, which owns the
/// actual email/SMS delivery.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, event: &str, payload: serde_json::Value) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(&serde_json::json!({
                "event": event,
                "data": payload,
            }))
            .send()
            .await
            .context("failed to reach notification endpoint")?
            .error_for_status()
            .context("notification endpoint returned error")?;

        Ok(())
    }
}

pub mod webhook;

use async_trait::async_trait;

/// Best-effort outbound notifications (email/SMS fan-out happens behind the
/// webhook). Failures are logged by callers, never propagated to users.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &str, payload: serde_json::Value) -> anyhow::Result<()>;
}

/// Used when no notification endpoint is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, event: &str, _payload: serde_json::Value) -> anyhow::Result<()> {
        tracing::debug!(event, "notification endpoint not configured, dropping");
        Ok(())
    }
}

pub mod stripe;

use async_trait::async_trait;

/// A charge attempt at the card processor, referenced by its id.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: IntentStatus,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentStatus {
    Processing,
    Succeeded,
    Failed,
}

/// What the processor said when asked for a refund. Confirmation may also
/// arrive later through the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundOutcome {
    Confirmed,
    Pending,
}

/// Pass-through to the card processor's hosted API. Charges and refunds are
/// asynchronous on the processor side; webhooks deliver the final word.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_intent(
        &self,
        booking_id: &str,
        amount_cents: i64,
        currency: &str,
        description: &str,
    ) -> anyhow::Result<PaymentIntent>;

    async fn retrieve_intent(&self, intent_id: &str) -> anyhow::Result<PaymentIntent>;

    async fn refund(
        &self,
        booking_id: &str,
        intent_id: &str,
        amount_cents: i64,
    ) -> anyhow::Result<RefundOutcome>;
}

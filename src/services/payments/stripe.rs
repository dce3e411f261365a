use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{IntentStatus, PaymentIntent, PaymentProvider, RefundOutcome};

const API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeProvider {
    secret_key: String,
    client: reqwest::Client,
}

impl StripeProvider {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: Option<String>,
    status: String,
    amount: i64,
    currency: String,
}

#[derive(Deserialize)]
struct RefundResponse {
    status: String,
}

fn map_intent_status(status: &str) -> IntentStatus {
    match status {
        "succeeded" => IntentStatus::Succeeded,
        "canceled" => IntentStatus::Failed,
        // requires_payment_method, requires_action, requires_confirmation,
        // processing — the customer hasn't finished paying yet
        _ => IntentStatus::Processing,
    }
}

impl From<IntentResponse> for PaymentIntent {
    fn from(r: IntentResponse) -> Self {
        PaymentIntent {
            status: map_intent_status(&r.status),
            id: r.id,
            client_secret: r.client_secret,
            amount_cents: r.amount,
            currency: r.currency,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_intent(
        &self,
        booking_id: &str,
        amount_cents: i64,
        currency: &str,
        description: &str,
    ) -> anyhow::Result<PaymentIntent> {
        let amount = amount_cents.to_string();
        let response: IntentResponse = self
            .client
            .post(format!("{API_BASE}/payment_intents"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("description", description),
                ("metadata[booking_id]", booking_id),
                ("automatic_payment_methods[enabled]", "true"),
            ])
            .send()
            .await
            .context("failed to reach payment processor")?
            .error_for_status()
            .context("payment processor rejected intent creation")?
            .json()
            .await
            .context("invalid payment processor response")?;

        Ok(response.into())
    }

    async fn retrieve_intent(&self, intent_id: &str) -> anyhow::Result<PaymentIntent> {
        let response: IntentResponse = self
            .client
            .get(format!("{API_BASE}/payment_intents/{intent_id}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .context("failed to reach payment processor")?
            .error_for_status()
            .context("payment processor rejected intent lookup")?
            .json()
            .await
            .context("invalid payment processor response")?;

        Ok(response.into())
    }

    async fn refund(
        &self,
        booking_id: &str,
        intent_id: &str,
        amount_cents: i64,
    ) -> anyhow::Result<RefundOutcome> {
        let amount = amount_cents.to_string();
        let response: RefundResponse = self
            .client
            .post(format!("{API_BASE}/refunds"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("payment_intent", intent_id),
                ("amount", amount.as_str()),
                ("metadata[booking_id]", booking_id),
            ])
            .send()
            .await
            .context("failed to reach payment processor")?
            .error_for_status()
            .context("payment processor rejected refund")?
            .json()
            .await
            .context("invalid payment processor response")?;

        Ok(match response.status.as_str() {
            "succeeded" => RefundOutcome::Confirmed,
            _ => RefundOutcome::Pending,
        })
    }
}

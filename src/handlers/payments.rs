use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;
use crate::state::AppState;

use super::auth;

// POST /api/payments/intent
#[derive(Deserialize)]
pub struct IntentRequest {
    pub booking_id: String,
}

pub async fn create_intent(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<IntentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::actor(&headers)?;
    let intent = state
        .lifecycle
        .create_payment_intent(&actor, &body.booking_id)
        .await?;

    Ok(Json(serde_json::json!({
        "payment_intent_id": intent.id,
        "client_secret": intent.client_secret,
        "amount_cents": intent.amount_cents,
        "currency": intent.currency,
    })))
}

// POST /api/payments/confirm
#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub booking_id: String,
}

pub async fn confirm(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ConfirmRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(
        state.lifecycle.confirm_payment(&actor, &body.booking_id).await?,
    ))
}

// POST /api/payments/refund — admin retry for a refund that failed in-line
#[derive(Deserialize)]
pub struct RefundRequest {
    pub booking_id: String,
}

pub async fn refund(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RefundRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth::actor(&headers)?;
    auth::require_admin(&actor)?;
    let requested = state.lifecycle.request_refund(&body.booking_id).await?;
    Ok(Json(serde_json::json!({ "requested": requested })))
}

fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
    expected == signature
}

// POST /api/payments/webhook
//
// Asynchronous charge/refund outcomes from the processor. Replays are
// harmless: every state change behind these events is idempotent.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    // Signature check is skipped when no secret is configured (dev mode)
    if !state.config.payment_webhook_secret.is_empty() {
        let signature = headers
            .get("x-payment-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(&state.config.payment_webhook_secret, signature, &body) {
            tracing::warn!("payment webhook signature mismatch");
            return Err(AppError::Forbidden);
        }
    }

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("invalid webhook payload".into()))?;
    let event_type = event["type"].as_str().unwrap_or("");
    let object = &event["data"]["object"];

    // The booking travels in metadata; fall back to the intent id we stored
    let booking_id = match object["metadata"]["booking_id"].as_str() {
        Some(id) => Some(id.to_string()),
        None => {
            let intent_id = object["id"].as_str().unwrap_or("");
            let db = state.db.lock().unwrap();
            queries::get_booking_by_intent(&db, intent_id)?.map(|b| b.id)
        }
    };
    let Some(booking_id) = booking_id else {
        tracing::warn!(event_type, "payment webhook for unknown booking");
        return Ok(Json(serde_json::json!({ "received": true })));
    };

    match event_type {
        "payment_intent.succeeded" => {
            state.lifecycle.record_payment_succeeded(&booking_id).await?;
        }
        "payment_intent.payment_failed" => {
            state.lifecycle.record_payment_failed(&booking_id)?;
        }
        "refund.succeeded" => {
            state.lifecycle.record_refund_confirmed(&booking_id).await?;
        }
        other => {
            tracing::debug!(event_type = other, "ignoring payment webhook event");
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip() {
        let secret = "whsec_test";
        let body = br#"{"type":"payment_intent.succeeded"}"#;

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let signature =
            base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        assert!(verify_signature(secret, &signature, body));
        assert!(!verify_signature(secret, &signature, b"tampered"));
        assert!(!verify_signature("other_secret", &signature, body));
    }
}

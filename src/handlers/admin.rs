use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

/// Ops endpoints are called by machinery (the external scheduler), not by
/// logged-in users, so they authenticate with the admin bearer token.
fn check_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/admin/reminders/run
#[derive(Deserialize, Default)]
pub struct RemindersRequest {
    pub date: Option<NaiveDate>,
}

pub async fn run_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<RemindersRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;

    // Default: remind for tomorrow's confirmed appointments
    let date = body
        .and_then(|Json(b)| b.date)
        .unwrap_or_else(|| Utc::now().date_naive() + chrono::Duration::days(1));

    let sent = state.lifecycle.run_reminders(date).await?;
    tracing::info!(%date, sent, "reminder run finished");

    Ok(Json(serde_json::json!({ "date": date, "sent": sent })))
}

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::db::queries::{self, StatScope};
use crate::errors::AppError;
use crate::models::Role;
use crate::state::AppState;

use super::auth;

// GET /api/dashboard/stats
#[derive(Serialize)]
pub struct StatsResponse {
    pub total_bookings: i64,
    pub upcoming_bookings: i64,
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub revenue_cents: i64,
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let actor = auth::actor(&headers)?;
    let scope = match actor.role {
        Role::Admin => StatScope::All,
        Role::Customer => StatScope::Customer(&actor.id),
        Role::Stylist => StatScope::Stylist(&actor.id),
    };

    let stats = {
        let db = state.db.lock().unwrap();
        queries::dashboard_stats(&db, &scope, Utc::now().date_naive())?
    };

    Ok(Json(StatsResponse {
        total_bookings: stats.total_bookings,
        upcoming_bookings: stats.upcoming_bookings,
        completed_bookings: stats.completed_bookings,
        cancelled_bookings: stats.cancelled_bookings,
        revenue_cents: stats.revenue_cents,
    }))
}

// GET /api/dashboard/events — SSE stream of booking events
#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
    pub last_id: Option<i64>,
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, Response> {
    // Auth via query param (EventSource can't set headers)
    let token = query.token.as_deref().unwrap_or("");
    if token != state.config.admin_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }

    let last_id = query.last_id.unwrap_or(0);

    // Catch up on missed events from the audit log
    let catchup_events = {
        let db = state.db.lock().unwrap();
        queries::events_since(&db, last_id).unwrap_or_default()
    };

    let rx = state.events_tx.subscribe();

    let catchup_stream = tokio_stream::iter(catchup_events.into_iter().map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("booking_event"))
    }));

    let live_stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("booking_event")))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let keepalive_stream = tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    let combined = catchup_stream.chain(live_stream);
    let merged = StreamExt::merge(combined, keepalive_stream);

    Ok(Sse::new(merged))
}

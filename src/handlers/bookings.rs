use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, RecurringPattern, Role};
use crate::services::scheduling::{CreateBookingRequest, RecurringOutcome};
use crate::state::AppState;

use super::auth;

// POST /api/bookings
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let actor = auth::actor(&headers)?;
    let booking = state.lifecycle.create_booking(&actor, &body).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// POST /api/bookings/recurring
#[derive(Deserialize)]
pub struct RecurringRequest {
    #[serde(flatten)]
    pub base: CreateBookingRequest,
    pub pattern: String,
    pub occurrences: u32,
}

pub async fn create_recurring(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RecurringRequest>,
) -> Result<(StatusCode, Json<RecurringOutcome>), AppError> {
    let actor = auth::actor(&headers)?;
    let pattern = RecurringPattern::parse(&body.pattern).ok_or_else(|| {
        AppError::BadRequest("pattern must be weekly, bi-weekly or monthly".into())
    })?;
    let outcome = state
        .lifecycle
        .create_recurring(&actor, &body.base, pattern, body.occurrences)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let actor = auth::actor(&headers)?;

    let bookings = match actor.role {
        Role::Admin => {
            let db = state.db.lock().unwrap();
            queries::list_all(&db, query.status.as_deref(), query.limit.unwrap_or(50))?
        }
        Role::Customer => state.lifecycle.list_for_customer(&actor, &actor.id)?,
        Role::Stylist => {
            let today = Utc::now().date_naive();
            let from = query.from.unwrap_or(today);
            let to = query.to.unwrap_or(today + chrono::Duration::days(30));
            state.lifecycle.list_for_stylist(&actor, &actor.id, from, to)?
        }
    };

    Ok(Json(bookings))
}

// GET /api/bookings/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(state.lifecycle.get_booking(&actor, &id)?))
}

// POST /api/bookings/:id/confirm
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(state.lifecycle.confirm_booking(&actor, &id).await?))
}

// POST /api/bookings/:id/start
pub async fn start(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(state.lifecycle.mark_started(&actor, &id)?))
}

// POST /api/bookings/:id/complete
pub async fn complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(state.lifecycle.mark_completed(&actor, &id)?))
}

// POST /api/bookings/:id/no-show
pub async fn no_show(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(state.lifecycle.mark_no_show(&actor, &id)?))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(
        state.lifecycle.cancel_booking(&actor, &id, body.reason).await?,
    ))
}

// POST /api/bookings/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time: String,
}

pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(
        state
            .lifecycle
            .reschedule_booking(&actor, &id, body.date, &body.time)
            .await?,
    ))
}

// POST /api/bookings/:id/review
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
    pub review: Option<String>,
}

pub async fn review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Booking>, AppError> {
    let actor = auth::actor(&headers)?;
    Ok(Json(
        state
            .lifecycle
            .review_booking(&actor, &id, body.rating, body.review)?,
    ))
}

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Stylist, WorkingHours};
use crate::state::AppState;

use super::auth;

// GET /api/stylists
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Stylist>>, AppError> {
    let stylists = {
        let db = state.db.lock().unwrap();
        queries::list_stylists(&db)?
    };
    Ok(Json(stylists))
}

// GET /api/stylists/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Stylist>, AppError> {
    let stylist = {
        let db = state.db.lock().unwrap();
        queries::get_stylist(&db, &id)?
    };
    stylist.map(Json).ok_or(AppError::NotFound("stylist"))
}

// POST /api/stylists
#[derive(Deserialize)]
pub struct CreateStylistRequest {
    pub name: String,
    pub specialties: Option<Vec<String>>,
    pub working_hours: Option<WorkingHours>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateStylistRequest>,
) -> Result<(StatusCode, Json<Stylist>), AppError> {
    let actor = auth::actor(&headers)?;
    auth::require_admin(&actor)?;

    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let working_hours = body.working_hours.unwrap_or(WorkingHours { windows: vec![] });
    // Round-trip through the validating parser to reject bad days/times
    WorkingHours::from_json(&serde_json::to_string(&working_hours).map_err(anyhow::Error::from)?)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let stylist = Stylist {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        specialties: body.specialties.unwrap_or_default(),
        working_hours,
        is_active: true,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_stylist(&db, &stylist)?;
    }
    tracing::info!(stylist_id = %stylist.id, "stylist created");

    Ok((StatusCode::CREATED, Json(stylist)))
}

// GET /api/stylists/:id/schedule?date=YYYY-MM-DD
//
// Public availability view: occupied intervals only, no customer detail.
#[derive(Deserialize)]
pub struct ScheduleQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct OccupiedSlot {
    pub start: String,
    pub end: String,
}

pub async fn schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<OccupiedSlot>>, AppError> {
    {
        let db = state.db.lock().unwrap();
        queries::get_stylist(&db, &id)?.ok_or(AppError::NotFound("stylist"))?;
    }

    let hhmm = |minutes: u32| format!("{:02}:{:02}", minutes / 60, minutes % 60);
    let slots = state
        .lifecycle
        .day_schedule(&id, query.date)
        .into_iter()
        .map(|entry| OccupiedSlot {
            start: hhmm(entry.span.start),
            end: hhmm(entry.span.end),
        })
        .collect();

    Ok(Json(slots))
}

// GET /api/stylists/:id/bookings?from&to
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let actor = auth::actor(&headers)?;
    let today = Utc::now().date_naive();
    let from = query.from.unwrap_or(today);
    let to = query.to.unwrap_or(today + chrono::Duration::days(30));

    Ok(Json(state.lifecycle.list_for_stylist(&actor, &id, from, to)?))
}

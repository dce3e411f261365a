use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::db::queries;
use crate::services::calendar::{generate_feed, generate_ics};
use crate::state::AppState;

// GET /calendar/:booking_id — single appointment as .ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    // Strip .ics suffix if present
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let db = state.db.lock().unwrap();
    let booking = match queries::get_booking(&db, booking_id) {
        Ok(Some(b)) => b,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Booking not found").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load booking for .ics");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    let service_name = queries::get_service(&db, &booking.service_id)
        .ok()
        .flatten()
        .map(|s| s.name)
        .unwrap_or_else(|| "Appointment".to_string());
    let stylist_name = queries::get_stylist(&db, &booking.stylist_id)
        .ok()
        .flatten()
        .map(|s| s.name)
        .unwrap_or_else(|| "your stylist".to_string());
    drop(db);

    let ics = generate_ics(&booking, &service_name, &stylist_name);
    let filename = format!("booking-{booking_id}.ics");

    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                &format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response()
}

// GET /calendar/stylists/:id/feed.ics — a stylist's upcoming appointments
pub async fn stylist_feed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let db = state.db.lock().unwrap();
    let stylist = match queries::get_stylist(&db, &id) {
        Ok(Some(s)) => s,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Stylist not found").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load stylist for feed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    let today = Utc::now().date_naive();
    let bookings = match queries::list_for_stylist(&db, &id, today, today + chrono::Duration::days(90))
    {
        Ok(bookings) => bookings,
        Err(e) => {
            tracing::error!(error = %e, "failed to load bookings for feed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    let entries: Vec<_> = bookings
        .into_iter()
        .filter(|b| b.status.reserves_slot())
        .map(|b| {
            let service_name = queries::get_service(&db, &b.service_id)
                .ok()
                .flatten()
                .map(|s| s.name)
                .unwrap_or_else(|| "Appointment".to_string());
            (b, service_name)
        })
        .collect();
    drop(db);

    let feed = generate_feed(&entries, &stylist.name);

    (
        [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
        feed,
    )
        .into_response()
}

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Service, ServiceCategory, MIN_SERVICE_DURATION_MINUTES};
use crate::state::AppState;

use super::auth;

// GET /api/services
#[derive(Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub popular: Option<bool>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Serialize)]
pub struct ServiceListResponse {
    pub count: usize,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub data: Vec<Service>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ServiceListResponse>, AppError> {
    if let Some(category) = query.category.as_deref() {
        if ServiceCategory::parse(category).is_none() {
            return Err(AppError::BadRequest(format!("unknown category: {category}")));
        }
    }
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let popular_only = query.popular.unwrap_or(false);

    let (services, total) = {
        let db = state.db.lock().unwrap();
        let services = queries::list_services(
            &db,
            query.category.as_deref(),
            popular_only,
            limit,
            (page - 1) * limit,
        )?;
        let total = queries::count_services(&db, query.category.as_deref(), popular_only)?;
        (services, total)
    };

    Ok(Json(ServiceListResponse {
        count: services.len(),
        total,
        page,
        pages: (total + limit - 1) / limit,
        data: services,
    }))
}

// GET /api/services/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Service>, AppError> {
    let service = {
        let db = state.db.lock().unwrap();
        queries::get_service(&db, &id)?
    };
    service.map(Json).ok_or(AppError::NotFound("service"))
}

// POST /api/services
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: String,
    pub long_description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub duration_minutes: u32,
    pub is_popular: Option<bool>,
    pub max_bookings_per_day: Option<u32>,
    pub cancellation_policy: Option<String>,
}

fn validate(name: &str, description: &str, price_cents: i64, duration: u32) -> Result<(), AppError> {
    if !(2..=100).contains(&name.len()) {
        return Err(AppError::BadRequest(
            "name must be between 2 and 100 characters".into(),
        ));
    }
    if !(10..=500).contains(&description.len()) {
        return Err(AppError::BadRequest(
            "description must be between 10 and 500 characters".into(),
        ));
    }
    if price_cents < 0 {
        return Err(AppError::BadRequest("price cannot be negative".into()));
    }
    if duration < MIN_SERVICE_DURATION_MINUTES {
        return Err(AppError::BadRequest(format!(
            "duration must be at least {MIN_SERVICE_DURATION_MINUTES} minutes"
        )));
    }
    Ok(())
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let actor = auth::actor(&headers)?;
    auth::require_admin(&actor)?;

    let category = ServiceCategory::parse(&body.category)
        .ok_or_else(|| AppError::BadRequest(format!("unknown category: {}", body.category)))?;
    validate(&body.name, &body.description, body.price_cents, body.duration_minutes)?;

    let now = Utc::now().naive_utc();
    let service = Service {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        description: body.description,
        long_description: body.long_description,
        category,
        price_cents: body.price_cents,
        duration_minutes: body.duration_minutes,
        is_active: true,
        is_popular: body.is_popular.unwrap_or(false),
        max_bookings_per_day: body.max_bookings_per_day.unwrap_or(10),
        cancellation_policy: body
            .cancellation_policy
            .unwrap_or_else(|| "24 hours notice required for cancellation".to_string()),
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_service(&db, &service)?;
    }
    tracing::info!(service_id = %service.id, "service created");

    Ok((StatusCode::CREATED, Json(service)))
}

// PUT /api/services/:id
#[derive(Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<u32>,
    pub is_active: Option<bool>,
    pub is_popular: Option<bool>,
    pub max_bookings_per_day: Option<u32>,
    pub cancellation_policy: Option<String>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    let actor = auth::actor(&headers)?;
    auth::require_admin(&actor)?;

    let mut service = {
        let db = state.db.lock().unwrap();
        queries::get_service(&db, &id)?
    }
    .ok_or(AppError::NotFound("service"))?;

    if let Some(name) = body.name {
        service.name = name;
    }
    if let Some(description) = body.description {
        service.description = description;
    }
    if let Some(long_description) = body.long_description {
        service.long_description = Some(long_description);
    }
    if let Some(category) = body.category {
        service.category = ServiceCategory::parse(&category)
            .ok_or_else(|| AppError::BadRequest(format!("unknown category: {category}")))?;
    }
    if let Some(price_cents) = body.price_cents {
        service.price_cents = price_cents;
    }
    if let Some(duration_minutes) = body.duration_minutes {
        service.duration_minutes = duration_minutes;
    }
    if let Some(is_active) = body.is_active {
        service.is_active = is_active;
    }
    if let Some(is_popular) = body.is_popular {
        service.is_popular = is_popular;
    }
    if let Some(max) = body.max_bookings_per_day {
        service.max_bookings_per_day = max;
    }
    if let Some(policy) = body.cancellation_policy {
        service.cancellation_policy = policy;
    }
    validate(
        &service.name,
        &service.description,
        service.price_cents,
        service.duration_minutes,
    )?;
    service.updated_at = Utc::now().naive_utc();

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_service(&db, &service)?
    };
    if !updated {
        return Err(AppError::NotFound("service"));
    }

    Ok(Json(service))
}

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::models::{Actor, Role};

/// Identity is resolved upstream (gateway/auth proxy) and passed through as
/// trusted headers. Missing or malformed identity is a 401; what the actor
/// may do is decided per operation by the lifecycle manager.
pub fn actor(headers: &HeaderMap) -> Result<Actor, AppError> {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim();
    if id.is_empty() {
        return Err(AppError::Unauthorized);
    }
    let role = headers
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(Role::parse)
        .ok_or(AppError::Unauthorized)?;

    Ok(Actor {
        id: id.to_string(),
        role,
    })
}

pub fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

use serde::{Deserialize, Serialize};

/// Append-only audit record for one lifecycle event. Also the payload of
/// the dashboard SSE stream; `id` lets clients resume with `last_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub id: i64,
    pub booking_id: String,
    pub kind: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: String,
}

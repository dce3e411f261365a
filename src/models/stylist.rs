use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::WorkingHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stylist {
    pub id: String,
    pub name: String,
    pub specialties: Vec<String>,
    pub working_hours: WorkingHours,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const MIN_SERVICE_DURATION_MINUTES: u32 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub long_description: Option<String>,
    pub category: ServiceCategory,
    pub price_cents: i64,
    pub duration_minutes: u32,
    pub is_active: bool,
    pub is_popular: bool,
    pub max_bookings_per_day: u32,
    pub cancellation_policy: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Hair,
    Styling,
    Treatments,
    Special,
    Makeup,
    Nails,
    Spa,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Hair => "hair",
            ServiceCategory::Styling => "styling",
            ServiceCategory::Treatments => "treatments",
            ServiceCategory::Special => "special",
            ServiceCategory::Makeup => "makeup",
            ServiceCategory::Nails => "nails",
            ServiceCategory::Spa => "spa",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hair" => Some(ServiceCategory::Hair),
            "styling" => Some(ServiceCategory::Styling),
            "treatments" => Some(ServiceCategory::Treatments),
            "special" => Some(ServiceCategory::Special),
            "makeup" => Some(ServiceCategory::Makeup),
            "nails" => Some(ServiceCategory::Nails),
            "spa" => Some(ServiceCategory::Spa),
            _ => None,
        }
    }
}

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::SlotSpan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    pub stylist_id: String,
    pub service_id: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: u32,
    pub total_price_cents: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_intent_id: Option<String>,
    pub special_requests: Option<String>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelActor>,
    pub cancellation_date: Option<NaiveDateTime>,
    pub reminder_sent: bool,
    pub reminder_date: Option<NaiveDateTime>,
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub review_date: Option<NaiveDateTime>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<RecurringPattern>,
    pub parent_booking: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// The occupied interval `[time, time + duration)`, if it fits in one day.
    pub fn slot_span(&self) -> Option<SlotSpan> {
        SlotSpan::starting_at(self.appointment_time, self.duration_minutes)
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
    Cancelled,
    #[serde(rename = "no-show")]
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "in-progress" => BookingStatus::InProgress,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            "no-show" => BookingStatus::NoShow,
            _ => BookingStatus::Pending,
        }
    }

    /// Statuses that hold a reservation in the slot index.
    pub fn reserves_slot(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// The legal transition table. Everything else is rejected.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (InProgress, Completed)
                | (InProgress, NoShow)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            "refunded" => PaymentStatus::Refunded,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    MobileMoney,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cash" => PaymentMethod::Cash,
            "mobile_money" => PaymentMethod::MobileMoney,
            "bank_transfer" => PaymentMethod::BankTransfer,
            _ => PaymentMethod::Card,
        }
    }
}

/// Who drove a booking into `cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CancelActor {
    Customer,
    Stylist,
    Admin,
    System,
}

impl CancelActor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelActor::Customer => "customer",
            CancelActor::Stylist => "stylist",
            CancelActor::Admin => "admin",
            CancelActor::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(CancelActor::Customer),
            "stylist" => Some(CancelActor::Stylist),
            "admin" => Some(CancelActor::Admin),
            "system" => Some(CancelActor::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurringPattern {
    Weekly,
    #[serde(rename = "bi-weekly")]
    BiWeekly,
    Monthly,
}

impl RecurringPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringPattern::Weekly => "weekly",
            RecurringPattern::BiWeekly => "bi-weekly",
            RecurringPattern::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(RecurringPattern::Weekly),
            "bi-weekly" => Some(RecurringPattern::BiWeekly),
            "monthly" => Some(RecurringPattern::Monthly),
            _ => None,
        }
    }

    /// The occurrence after `date`.
    pub fn next_date(&self, date: NaiveDate) -> NaiveDate {
        match self {
            RecurringPattern::Weekly => date + chrono::Duration::days(7),
            RecurringPattern::BiWeekly => date + chrono::Duration::days(14),
            RecurringPattern::Monthly => date
                .checked_add_months(chrono::Months::new(1))
                .unwrap_or(date + chrono::Duration::days(30)),
        }
    }
}

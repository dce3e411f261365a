pub mod capacity;
pub mod lifecycle;
pub mod slots;

pub use capacity::CapacityLedger;
pub use lifecycle::{
    CreateBookingRequest, LifecycleManager, RecurringOutcome, SkippedOccurrence,
};
pub use slots::{SlotEntry, SlotIndex};

use crate::models::{BookingStatus, SlotSpan};

/// Everything a lifecycle operation can fail with. All variants are
/// recoverable at the HTTP boundary; `Internal` carries infrastructure
/// failures (database, payment processor) that the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("time slot {requested} is already booked ({competing})")]
    Conflict {
        competing_booking_id: String,
        competing: SlotSpan,
        requested: SlotSpan,
    },

    #[error("service is fully booked on that day ({booked}/{max})")]
    CapacityExceeded { booked: u32, max: u32 },

    #[error("booking status '{from}' does not allow transition to '{to}'")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not allowed")]
    Unauthorized,

    #[error("that time is outside working hours; available: {hours}")]
    OutsideWorkingHours { hours: String },

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

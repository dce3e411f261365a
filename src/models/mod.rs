pub mod actor;
pub mod booking;
pub mod event;
pub mod service;
pub mod slot;
pub mod stylist;
pub mod working_hours;

pub use actor::{Actor, Role};
pub use booking::{
    Booking, BookingStatus, CancelActor, PaymentMethod, PaymentStatus, RecurringPattern,
};
pub use event::BookingEvent;
pub use service::{Service, ServiceCategory, MIN_SERVICE_DURATION_MINUTES};
pub use slot::{Minutes, SlotSpan};
pub use stylist::Stylist;
pub use working_hours::{WorkWindow, WorkingHours};

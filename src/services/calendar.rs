use chrono::Duration;

use crate::models::Booking;

fn render_event(booking: &Booking, summary: &str) -> String {
    let start = booking.starts_at();
    let dtstart = start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = (start + Duration::minutes(booking.duration_minutes as i64))
        .format("%Y%m%dT%H%M%S")
        .to_string();
    let dtstamp = booking.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@salonbook", booking.id);
    let description = booking
        .special_requests
        .as_deref()
        .unwrap_or("No special requests");

    format!(
        "BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n"
    )
}

pub fn generate_ics(booking: &Booking, service_name: &str, stylist_name: &str) -> String {
    let summary = format!("{service_name} with {stylist_name}");
    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Booking//EN\r\n\
         {}END:VCALENDAR\r\n",
        render_event(booking, &summary)
    )
}

/// All of a stylist's appointments as one feed, for calendar subscriptions.
pub fn generate_feed(bookings: &[(Booking, String)], stylist_name: &str) -> String {
    let mut out = format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Booking//EN\r\n\
         X-WR-CALNAME:{stylist_name}\r\n"
    );
    for (booking, service_name) in bookings {
        out.push_str(&render_event(booking, service_name));
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentMethod, PaymentStatus};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn booking(id: &str, date: &str, time: &str) -> Booking {
        let now =
            NaiveDateTime::parse_from_str("2030-06-10 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        Booking {
            id: id.into(),
            customer_id: "cust-1".into(),
            stylist_id: "sty-1".into(),
            service_id: "svc-1".into(),
            appointment_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            appointment_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            duration_minutes: 60,
            total_price_cents: 5000,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::Card,
            payment_intent_id: None,
            special_requests: Some("Window seat".into()),
            notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            cancellation_date: None,
            reminder_sent: false,
            reminder_date: None,
            rating: None,
            review: None,
            review_date: None,
            is_recurring: false,
            recurring_pattern: None,
            parent_booking: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn single_booking_ics() {
        let ics = generate_ics(&booking("bk-1", "2030-06-17", "14:00"), "Signature Cut", "Amara");
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("DTSTART:20300617T140000"));
        assert!(ics.contains("DTEND:20300617T150000"));
        assert!(ics.contains("SUMMARY:Signature Cut with Amara"));
        assert!(ics.contains("DESCRIPTION:Window seat"));
        assert!(ics.contains("UID:bk-1@salonbook"));
        assert!(ics.contains("END:VCALENDAR"));
    }

    #[test]
    fn feed_lists_every_booking() {
        let feed = generate_feed(
            &[
                (booking("bk-1", "2030-06-17", "10:00"), "Cut".into()),
                (booking("bk-2", "2030-06-17", "14:00"), "Color".into()),
            ],
            "Amara",
        );
        assert!(feed.contains("X-WR-CALNAME:Amara"));
        assert_eq!(feed.matches("BEGIN:VEVENT").count(), 2);
        assert!(feed.contains("UID:bk-1@salonbook"));
        assert!(feed.contains("UID:bk-2@salonbook"));
        assert!(feed.ends_with("END:VCALENDAR\r\n"));
    }
}

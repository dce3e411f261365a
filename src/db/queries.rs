use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingEvent, BookingStatus, CancelActor, PaymentMethod, PaymentStatus,
    RecurringPattern, Service, ServiceCategory, Stylist, WorkingHours,
};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

const BOOKING_COLS: &str = "id, customer_id, stylist_id, service_id, appointment_date, \
     appointment_time, duration_minutes, total_price_cents, status, payment_status, \
     payment_method, payment_intent_id, special_requests, notes, cancellation_reason, \
     cancelled_by, cancellation_date, reminder_sent, reminder_date, rating, review, \
     review_date, is_recurring, recurring_pattern, parent_booking, created_at, updated_at";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FMT).to_string()
}

fn parse_dt(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DT_FMT)
        .map_err(|_| anyhow::anyhow!("invalid datetime in database: {s}"))
}

fn parse_opt_dt(s: Option<String>) -> anyhow::Result<Option<NaiveDateTime>> {
    s.as_deref().map(parse_dt).transpose()
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, \
             ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, \
             ?25, ?26, ?27)"
        ),
        params![
            booking.id,
            booking.customer_id,
            booking.stylist_id,
            booking.service_id,
            booking.appointment_date.format(DATE_FMT).to_string(),
            booking.appointment_time.format(TIME_FMT).to_string(),
            booking.duration_minutes,
            booking.total_price_cents,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.payment_method.as_str(),
            booking.payment_intent_id,
            booking.special_requests,
            booking.notes,
            booking.cancellation_reason,
            booking.cancelled_by.map(|a| a.as_str()),
            booking.cancellation_date.as_ref().map(fmt_dt),
            booking.reminder_sent as i32,
            booking.reminder_date.as_ref().map(fmt_dt),
            booking.rating.map(|r| r as i64),
            booking.review,
            booking.review_date.as_ref().map(fmt_dt),
            booking.is_recurring as i32,
            booking.recurring_pattern.map(|p| p.as_str()),
            booking.parent_booking,
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Persist every mutable field. Lifecycle transitions mutate the struct and
/// save it back in one call while holding the connection lock.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET appointment_date = ?1, appointment_time = ?2, status = ?3, \
         payment_status = ?4, payment_intent_id = ?5, cancellation_reason = ?6, \
         cancelled_by = ?7, cancellation_date = ?8, reminder_sent = ?9, reminder_date = ?10, \
         rating = ?11, review = ?12, review_date = ?13, updated_at = ?14 WHERE id = ?15",
        params![
            booking.appointment_date.format(DATE_FMT).to_string(),
            booking.appointment_time.format(TIME_FMT).to_string(),
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.payment_intent_id,
            booking.cancellation_reason,
            booking.cancelled_by.map(|a| a.as_str()),
            booking.cancellation_date.as_ref().map(fmt_dt),
            booking.reminder_sent as i32,
            booking.reminder_date.as_ref().map(fmt_dt),
            booking.rating.map(|r| r as i64),
            booking.review,
            booking.review_date.as_ref().map(fmt_dt),
            fmt_dt(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

/// Like `update_booking` but only if the row still has `expected_status`.
/// Returns false when another transition won the race.
pub fn update_booking_if_status(
    conn: &Connection,
    booking: &Booking,
    expected_status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET appointment_date = ?1, appointment_time = ?2, status = ?3, \
         payment_status = ?4, updated_at = ?5 WHERE id = ?6 AND status = ?7",
        params![
            booking.appointment_date.format(DATE_FMT).to_string(),
            booking.appointment_time.format(TIME_FMT).to_string(),
            booking.status.as_str(),
            booking.payment_status.as_str(),
            fmt_dt(&booking.updated_at),
            booking.id,
            expected_status.as_str(),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_by_intent(
    conn: &Connection,
    intent_id: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE payment_intent_id = ?1"),
        params![intent_id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_for_customer(conn: &Connection, customer_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE customer_id = ?1 \
         ORDER BY appointment_date DESC, appointment_time DESC"
    ))?;
    let rows = stmt.query_map(params![customer_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn list_for_stylist(
    conn: &Connection,
    stylist_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE stylist_id = ?1 \
         AND appointment_date >= ?2 AND appointment_date <= ?3 \
         ORDER BY appointment_date ASC, appointment_time ASC"
    ))?;
    let rows = stmt.query_map(
        params![
            stylist_id,
            from.format(DATE_FMT).to_string(),
            to.format(DATE_FMT).to_string()
        ],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn list_all(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLS} FROM bookings WHERE status = ?1 \
                 ORDER BY appointment_date DESC, appointment_time DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLS} FROM bookings \
                 ORDER BY appointment_date DESC, appointment_time DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Bookings whose status still reserves a slot. Startup uses this to
/// rebuild the slot index and capacity counters.
pub fn active_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings \
         WHERE status IN ('pending', 'confirmed', 'in-progress') \
         ORDER BY appointment_date ASC, appointment_time ASC"
    ))?;
    let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn bookings_needing_reminder(
    conn: &Connection,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE appointment_date = ?1 \
         AND status = 'confirmed' AND reminder_sent = 0 \
         ORDER BY appointment_time ASC"
    ))?;
    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let customer_id: String = row.get(1)?;
    let stylist_id: String = row.get(2)?;
    let service_id: String = row.get(3)?;
    let date_str: String = row.get(4)?;
    let time_str: String = row.get(5)?;
    let duration_minutes: u32 = row.get(6)?;
    let total_price_cents: i64 = row.get(7)?;
    let status_str: String = row.get(8)?;
    let payment_status_str: String = row.get(9)?;
    let payment_method_str: String = row.get(10)?;
    let payment_intent_id: Option<String> = row.get(11)?;
    let special_requests: Option<String> = row.get(12)?;
    let notes: Option<String> = row.get(13)?;
    let cancellation_reason: Option<String> = row.get(14)?;
    let cancelled_by_str: Option<String> = row.get(15)?;
    let cancellation_date_str: Option<String> = row.get(16)?;
    let reminder_sent: bool = row.get::<_, i32>(17)? != 0;
    let reminder_date_str: Option<String> = row.get(18)?;
    let rating: Option<i64> = row.get(19)?;
    let review: Option<String> = row.get(20)?;
    let review_date_str: Option<String> = row.get(21)?;
    let is_recurring: bool = row.get::<_, i32>(22)? != 0;
    let recurring_pattern_str: Option<String> = row.get(23)?;
    let parent_booking: Option<String> = row.get(24)?;
    let created_at_str: String = row.get(25)?;
    let updated_at_str: String = row.get(26)?;

    let appointment_date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .map_err(|_| anyhow::anyhow!("invalid appointment date in database: {date_str}"))?;
    let appointment_time = NaiveTime::parse_from_str(&time_str, TIME_FMT)
        .map_err(|_| anyhow::anyhow!("invalid appointment time in database: {time_str}"))?;

    Ok(Booking {
        id,
        customer_id,
        stylist_id,
        service_id,
        appointment_date,
        appointment_time,
        duration_minutes,
        total_price_cents,
        status: BookingStatus::parse(&status_str),
        payment_status: PaymentStatus::parse(&payment_status_str),
        payment_method: PaymentMethod::parse(&payment_method_str),
        payment_intent_id,
        special_requests,
        notes,
        cancellation_reason,
        cancelled_by: cancelled_by_str.as_deref().and_then(CancelActor::parse),
        cancellation_date: parse_opt_dt(cancellation_date_str)?,
        reminder_sent,
        reminder_date: parse_opt_dt(reminder_date_str)?,
        rating: rating.map(|r| r as u8),
        review,
        review_date: parse_opt_dt(review_date_str)?,
        is_recurring,
        recurring_pattern: recurring_pattern_str
            .as_deref()
            .and_then(RecurringPattern::parse),
        parent_booking,
        created_at: parse_dt(&created_at_str)?,
        updated_at: parse_dt(&updated_at_str)?,
    })
}

// ── Services ──

const SERVICE_COLS: &str = "id, name, description, long_description, category, price_cents, \
     duration_minutes, is_active, is_popular, max_bookings_per_day, cancellation_policy, \
     created_at, updated_at";

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO services ({SERVICE_COLS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            service.id,
            service.name,
            service.description,
            service.long_description,
            service.category.as_str(),
            service.price_cents,
            service.duration_minutes,
            service.is_active as i32,
            service.is_popular as i32,
            service.max_bookings_per_day,
            service.cancellation_policy,
            fmt_dt(&service.created_at),
            fmt_dt(&service.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, long_description = ?3, \
         category = ?4, price_cents = ?5, duration_minutes = ?6, is_active = ?7, \
         is_popular = ?8, max_bookings_per_day = ?9, cancellation_policy = ?10, \
         updated_at = ?11 WHERE id = ?12",
        params![
            service.name,
            service.description,
            service.long_description,
            service.category.as_str(),
            service.price_cents,
            service.duration_minutes,
            service.is_active as i32,
            service.is_popular as i32,
            service.max_bookings_per_day,
            service.cancellation_policy,
            fmt_dt(&service.updated_at),
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        &format!("SELECT {SERVICE_COLS} FROM services WHERE id = ?1"),
        params![id],
        |row| Ok(parse_service_row(row)),
    );

    match result {
        Ok(service) => Ok(Some(service?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(
    conn: &Connection,
    category: Option<&str>,
    popular_only: bool,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Service>> {
    let mut sql = format!("SELECT {SERVICE_COLS} FROM services WHERE is_active = 1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(category) = category {
        params_vec.push(Box::new(category.to_string()));
        sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
    }
    if popular_only {
        sql.push_str(" AND is_popular = 1");
    }
    params_vec.push(Box::new(limit));
    sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ?{}", params_vec.len()));
    params_vec.push(Box::new(offset));
    sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn count_services(
    conn: &Connection,
    category: Option<&str>,
    popular_only: bool,
) -> anyhow::Result<i64> {
    let mut sql = String::from("SELECT COUNT(*) FROM services WHERE is_active = 1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(category) = category {
        params_vec.push(Box::new(category.to_string()));
        sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
    }
    if popular_only {
        sql.push_str(" AND is_popular = 1");
    }

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let count = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(count)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let description: String = row.get(2)?;
    let long_description: Option<String> = row.get(3)?;
    let category_str: String = row.get(4)?;
    let price_cents: i64 = row.get(5)?;
    let duration_minutes: u32 = row.get(6)?;
    let is_active: bool = row.get::<_, i32>(7)? != 0;
    let is_popular: bool = row.get::<_, i32>(8)? != 0;
    let max_bookings_per_day: u32 = row.get(9)?;
    let cancellation_policy: String = row.get(10)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Service {
        id,
        name,
        description,
        long_description,
        category: ServiceCategory::parse(&category_str)
            .ok_or_else(|| anyhow::anyhow!("unknown service category: {category_str}"))?,
        price_cents,
        duration_minutes,
        is_active,
        is_popular,
        max_bookings_per_day,
        cancellation_policy,
        created_at: parse_dt(&created_at_str)?,
        updated_at: parse_dt(&updated_at_str)?,
    })
}

// ── Stylists ──

pub fn insert_stylist(conn: &Connection, stylist: &Stylist) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO stylists (id, name, specialties, working_hours, is_active, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stylist.id,
            stylist.name,
            serde_json::to_string(&stylist.specialties)?,
            serde_json::to_string(&stylist.working_hours)?,
            stylist.is_active as i32,
            fmt_dt(&stylist.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_stylist(conn: &Connection, id: &str) -> anyhow::Result<Option<Stylist>> {
    let result = conn.query_row(
        "SELECT id, name, specialties, working_hours, is_active, created_at \
         FROM stylists WHERE id = ?1",
        params![id],
        |row| Ok(parse_stylist_row(row)),
    );

    match result {
        Ok(stylist) => Ok(Some(stylist?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_stylists(conn: &Connection) -> anyhow::Result<Vec<Stylist>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, specialties, working_hours, is_active, created_at \
         FROM stylists WHERE is_active = 1 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_stylist_row(row)))?;

    let mut stylists = vec![];
    for row in rows {
        stylists.push(row??);
    }
    Ok(stylists)
}

fn parse_stylist_row(row: &rusqlite::Row) -> anyhow::Result<Stylist> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let specialties_json: String = row.get(2)?;
    let working_hours_json: String = row.get(3)?;
    let is_active: bool = row.get::<_, i32>(4)? != 0;
    let created_at_str: String = row.get(5)?;

    Ok(Stylist {
        id,
        name,
        specialties: serde_json::from_str(&specialties_json).unwrap_or_default(),
        working_hours: WorkingHours::from_json(&working_hours_json)?,
        is_active,
        created_at: parse_dt(&created_at_str)?,
    })
}

// ── Booking events ──

pub fn insert_booking_event(
    conn: &Connection,
    booking_id: &str,
    kind: &str,
    detail: Option<&serde_json::Value>,
    created_at: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO booking_events (booking_id, kind, detail, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            booking_id,
            kind,
            detail.map(|d| d.to_string()),
            created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn events_since(conn: &Connection, since_id: i64) -> anyhow::Result<Vec<BookingEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, kind, detail, created_at FROM booking_events \
         WHERE id > ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![since_id], |row| {
        let detail_json: Option<String> = row.get(3)?;
        Ok(BookingEvent {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            kind: row.get(2)?,
            detail: detail_json.and_then(|d| serde_json::from_str(&d).ok()),
            created_at: row.get(4)?,
        })
    })?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

pub fn has_event(conn: &Connection, booking_id: &str, kind: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM booking_events WHERE booking_id = ?1 AND kind = ?2",
        params![booking_id, kind],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ── Dashboard ──

pub enum StatScope<'a> {
    All,
    Customer(&'a str),
    Stylist(&'a str),
}

pub struct DashboardStats {
    pub total_bookings: i64,
    pub upcoming_bookings: i64,
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub revenue_cents: i64,
}

pub fn dashboard_stats(
    conn: &Connection,
    scope: &StatScope,
    today: NaiveDate,
) -> anyhow::Result<DashboardStats> {
    let (who_clause, who): (&str, Option<String>) = match scope {
        StatScope::All => ("1 = 1", None),
        StatScope::Customer(id) => ("customer_id = ?1", Some((*id).to_string())),
        StatScope::Stylist(id) => ("stylist_id = ?1", Some((*id).to_string())),
    };
    let today_ph = if who.is_some() { "?2" } else { "?1" };
    let today_str = today.format(DATE_FMT).to_string();

    let count = |condition: &str, with_today: bool| -> anyhow::Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM bookings WHERE {who_clause} AND {condition}");
        let mut params_refs: Vec<&dyn rusqlite::types::ToSql> = vec![];
        if let Some(who) = &who {
            params_refs.push(who);
        }
        if with_today {
            params_refs.push(&today_str);
        }
        Ok(conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?)
    };

    let total_bookings = count("1 = 1", false)?;
    let upcoming_bookings = count(
        &format!(
            "status IN ('pending', 'confirmed') AND appointment_date >= {today_ph}"
        ),
        true,
    )?;
    let completed_bookings = count("status = 'completed'", false)?;
    let cancelled_bookings = count("status = 'cancelled'", false)?;

    let revenue_sql = format!(
        "SELECT COALESCE(SUM(total_price_cents), 0) FROM bookings \
         WHERE {who_clause} AND payment_status = 'paid'"
    );
    let mut params_refs: Vec<&dyn rusqlite::types::ToSql> = vec![];
    if let Some(who) = &who {
        params_refs.push(who);
    }
    let revenue_cents = conn.query_row(&revenue_sql, params_refs.as_slice(), |row| row.get(0))?;

    Ok(DashboardStats {
        total_bookings,
        upcoming_bookings,
        completed_bookings,
        cancelled_bookings,
        revenue_cents,
    })
}

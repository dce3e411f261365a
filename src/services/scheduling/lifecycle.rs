use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use dashmap::DashSet;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{
    Actor, Booking, BookingEvent, BookingStatus, PaymentMethod, PaymentStatus, RecurringPattern,
    Role, SlotSpan,
};
use crate::services::notifications::Notifier;
use crate::services::payments::{IntentStatus, PaymentIntent, PaymentProvider, RefundOutcome};

use super::{BookingError, CapacityLedger, SlotEntry, SlotIndex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub const MAX_RECURRING_OCCURRENCES: u32 = 26;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    /// Admins book on behalf of a customer; customers book for themselves.
    pub customer_id: Option<String>,
    pub stylist_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    /// 24-hour `HH:MM`, validated here.
    pub time: String,
    pub payment_method: Option<PaymentMethod>,
    pub special_requests: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecurringOutcome {
    pub created: Vec<Booking>,
    pub skipped: Vec<SkippedOccurrence>,
}

#[derive(Debug, Serialize)]
pub struct SkippedOccurrence {
    pub date: NaiveDate,
    pub reason: String,
}

/// Owns appointment creation, conflict detection, state transitions and
/// their side effects. The only writer of the slot index and capacity
/// counters; handlers never touch those directly.
pub struct LifecycleManager {
    db: Arc<Mutex<Connection>>,
    slots: SlotIndex,
    capacity: CapacityLedger,
    payments: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn Notifier>,
    events_tx: broadcast::Sender<BookingEvent>,
    /// Cancellations closer than this to the appointment are flagged late.
    cancel_notice_hours: i64,
    currency: String,
    /// Refund calls in flight, so a concurrent retry can't double-charge
    /// the processor before the audit row lands.
    refunds_in_flight: DashSet<String>,
}

impl LifecycleManager {
    /// Build the manager and rebuild the slot index and capacity counters
    /// from persisted active bookings.
    pub fn new(
        db: Arc<Mutex<Connection>>,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        events_tx: broadcast::Sender<BookingEvent>,
        cancel_notice_hours: i64,
        currency: String,
    ) -> anyhow::Result<Self> {
        let slots = SlotIndex::new();
        let capacity = CapacityLedger::new();

        {
            let conn = db.lock().unwrap();
            let active = queries::active_bookings(&conn)?;
            let mut counts: std::collections::HashMap<(String, NaiveDate), u32> =
                std::collections::HashMap::new();

            for booking in &active {
                let Some(span) = booking.slot_span() else {
                    tracing::warn!(booking_id = %booking.id, "rebuild: booking has no valid interval, skipping");
                    continue;
                };
                if let Err(e) = slots.reserve(
                    &booking.stylist_id,
                    booking.appointment_date,
                    span,
                    &booking.id,
                ) {
                    tracing::warn!(booking_id = %booking.id, error = %e, "rebuild: overlapping booking in storage, skipping");
                    continue;
                }
                *counts
                    .entry((booking.service_id.clone(), booking.appointment_date))
                    .or_default() += 1;
            }
            for ((service_id, date), count) in counts {
                capacity.seed(&service_id, date, count);
            }
            tracing::info!(active = active.len(), "rebuilt slot index from storage");
        }

        Ok(Self {
            db,
            slots,
            capacity,
            payments,
            notifier,
            events_tx,
            cancel_notice_hours,
            currency,
            refunds_in_flight: DashSet::new(),
        })
    }

    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    /// Admin acts on anything; customers and stylists only on their own
    /// bookings.
    fn authorize(&self, actor: &Actor, booking: &Booking) -> Result<(), BookingError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Customer if actor.id == booking.customer_id => Ok(()),
            Role::Stylist if actor.id == booking.stylist_id => Ok(()),
            _ => Err(BookingError::Unauthorized),
        }
    }

    fn record_event(
        &self,
        booking_id: &str,
        kind: &str,
        detail: Option<serde_json::Value>,
    ) -> anyhow::Result<()> {
        let created_at = self.now().format(DT_FMT).to_string();
        let id = {
            let conn = self.db.lock().unwrap();
            queries::insert_booking_event(&conn, booking_id, kind, detail.as_ref(), &created_at)?
        };
        let _ = self.events_tx.send(BookingEvent {
            id,
            booking_id: booking_id.to_string(),
            kind: kind.to_string(),
            detail,
            created_at,
        });
        Ok(())
    }

    fn record_event_logged(&self, booking_id: &str, kind: &str, detail: Option<serde_json::Value>) {
        if let Err(e) = self.record_event(booking_id, kind, detail) {
            tracing::warn!(booking_id, kind, error = %e, "failed to record booking event");
        }
    }

    async fn notify(&self, event: &str, payload: serde_json::Value) {
        if let Err(e) = self.notifier.send(event, payload).await {
            tracing::warn!(event, error = %e, "notification failed");
        }
    }

    // ── Creation ─────────────────────────────────────────────

    pub async fn create_booking(
        &self,
        actor: &Actor,
        req: &CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let booking = self.create_one(actor, req, req.date, None)?;

        self.record_event_logged(
            &booking.id,
            "created",
            Some(json!({
                "stylist_id": booking.stylist_id,
                "service_id": booking.service_id,
                "date": booking.appointment_date,
                "time": req.time,
            })),
        );
        self.notify(
            "booking.created",
            json!({
                "booking_id": booking.id,
                "customer_id": booking.customer_id,
                "stylist_id": booking.stylist_id,
                "date": booking.appointment_date,
                "time": req.time,
            }),
        )
        .await;

        tracing::info!(booking_id = %booking.id, stylist_id = %booking.stylist_id, "booking created");
        Ok(booking)
    }

    /// The synchronous creation pipeline: validate, claim capacity, claim
    /// the slot, persist. Compensates every claim on a later failure so a
    /// rejected request leaves no trace.
    fn create_one(
        &self,
        actor: &Actor,
        req: &CreateBookingRequest,
        date: NaiveDate,
        recurring: Option<(RecurringPattern, Option<String>)>,
    ) -> Result<Booking, BookingError> {
        let customer_id = match actor.role {
            Role::Customer => {
                if req.customer_id.as_deref().is_some_and(|c| c != actor.id) {
                    return Err(BookingError::Unauthorized);
                }
                actor.id.clone()
            }
            Role::Admin => req
                .customer_id
                .clone()
                .ok_or_else(|| BookingError::Invalid("customer_id is required".into()))?,
            Role::Stylist => return Err(BookingError::Unauthorized),
        };

        let time = NaiveTime::parse_from_str(&req.time, "%H:%M")
            .map_err(|_| BookingError::Invalid("appointment time must be HH:MM".into()))?;

        let (service, stylist) = {
            let conn = self.db.lock().unwrap();
            let service = queries::get_service(&conn, &req.service_id)?
                .filter(|s| s.is_active)
                .ok_or(BookingError::NotFound("service"))?;
            let stylist = queries::get_stylist(&conn, &req.stylist_id)?
                .filter(|s| s.is_active)
                .ok_or(BookingError::NotFound("stylist"))?;
            (service, stylist)
        };

        let span = SlotSpan::starting_at(time, service.duration_minutes).ok_or_else(|| {
            BookingError::Invalid("appointment does not fit within the day".into())
        })?;

        if !stylist.working_hours.covers(date, &span) {
            return Err(BookingError::OutsideWorkingHours {
                hours: stylist.working_hours.to_human_readable(),
            });
        }

        self.capacity
            .check_and_reserve(&service.id, date, service.max_bookings_per_day)?;

        let id = Uuid::new_v4().to_string();
        if let Err(e) = self.slots.reserve(&stylist.id, date, span, &id) {
            self.capacity.release(&service.id, date);
            return Err(e);
        }

        let now = self.now();
        let booking = Booking {
            id,
            customer_id,
            stylist_id: stylist.id.clone(),
            service_id: service.id.clone(),
            appointment_date: date,
            appointment_time: time,
            duration_minutes: service.duration_minutes,
            total_price_cents: service.price_cents,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: req.payment_method.unwrap_or(PaymentMethod::Card),
            payment_intent_id: None,
            special_requests: req.special_requests.clone(),
            notes: req.notes.clone(),
            cancellation_reason: None,
            cancelled_by: None,
            cancellation_date: None,
            reminder_sent: false,
            reminder_date: None,
            rating: None,
            review: None,
            review_date: None,
            is_recurring: recurring.is_some(),
            recurring_pattern: recurring.as_ref().map(|(p, _)| *p),
            parent_booking: recurring.and_then(|(_, parent)| parent),
            created_at: now,
            updated_at: now,
        };

        let inserted = {
            let conn = self.db.lock().unwrap();
            queries::create_booking(&conn, &booking)
        };
        if let Err(e) = inserted {
            self.slots.release(&stylist.id, date, &booking.id);
            self.capacity.release(&service.id, date);
            return Err(BookingError::Internal(e));
        }

        Ok(booking)
    }

    /// Expand a recurring pattern into independent bookings. Every
    /// occurrence runs the full capacity+conflict pipeline; failures are
    /// reported per occurrence instead of aborting the series.
    pub async fn create_recurring(
        &self,
        actor: &Actor,
        req: &CreateBookingRequest,
        pattern: RecurringPattern,
        occurrences: u32,
    ) -> Result<RecurringOutcome, BookingError> {
        if !(2..=MAX_RECURRING_OCCURRENCES).contains(&occurrences) {
            return Err(BookingError::Invalid(format!(
                "occurrences must be between 2 and {MAX_RECURRING_OCCURRENCES}"
            )));
        }

        let mut created: Vec<Booking> = Vec::new();
        let mut skipped: Vec<SkippedOccurrence> = Vec::new();
        let mut parent: Option<String> = None;
        let mut date = req.date;

        for _ in 0..occurrences {
            match self.create_one(actor, req, date, Some((pattern, parent.clone()))) {
                Ok(booking) => {
                    if parent.is_none() {
                        parent = Some(booking.id.clone());
                    }
                    self.record_event_logged(
                        &booking.id,
                        "created",
                        Some(json!({
                            "recurring": pattern.as_str(),
                            "date": date,
                        })),
                    );
                    created.push(booking);
                }
                // Infrastructure failures abort; domain rejections are
                // reported and the series continues.
                Err(BookingError::Internal(e)) => return Err(BookingError::Internal(e)),
                Err(e) => skipped.push(SkippedOccurrence {
                    date,
                    reason: e.to_string(),
                }),
            }
            date = pattern.next_date(date);
        }

        self.notify(
            "booking.series_created",
            json!({
                "pattern": pattern.as_str(),
                "created": created.len(),
                "skipped": skipped.len(),
            }),
        )
        .await;

        Ok(RecurringOutcome { created, skipped })
    }

    // ── Transitions ──────────────────────────────────────────

    /// Load, authorize, check the transition table, persist — all under one
    /// connection lock, so concurrent drivers of the same booking serialize
    /// and exactly one wins.
    fn apply_transition(
        &self,
        actor: &Actor,
        id: &str,
        to: BookingStatus,
        staff_only: bool,
    ) -> Result<Booking, BookingError> {
        let conn = self.db.lock().unwrap();
        let mut booking = queries::get_booking(&conn, id)?.ok_or(BookingError::NotFound("booking"))?;
        self.authorize(actor, &booking)?;
        if staff_only && actor.role == Role::Customer {
            return Err(BookingError::Unauthorized);
        }
        if !booking.status.can_transition_to(to) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to,
            });
        }
        booking.status = to;
        booking.updated_at = self.now();
        queries::update_booking(&conn, &booking)?;
        Ok(booking)
    }

    pub async fn confirm_booking(&self, actor: &Actor, id: &str) -> Result<Booking, BookingError> {
        let booking = self.apply_transition(actor, id, BookingStatus::Confirmed, true)?;
        self.record_event_logged(&booking.id, "confirmed", None);
        self.notify(
            "booking.confirmed",
            json!({
                "booking_id": booking.id,
                "customer_id": booking.customer_id,
                "date": booking.appointment_date,
            }),
        )
        .await;
        Ok(booking)
    }

    pub fn mark_started(&self, actor: &Actor, id: &str) -> Result<Booking, BookingError> {
        let booking = self.apply_transition(actor, id, BookingStatus::InProgress, true)?;
        self.record_event_logged(&booking.id, "started", None);
        Ok(booking)
    }

    /// Completion keeps the slot consumed and unlocks rating/review.
    pub fn mark_completed(&self, actor: &Actor, id: &str) -> Result<Booking, BookingError> {
        let booking = self.apply_transition(actor, id, BookingStatus::Completed, true)?;
        self.record_event_logged(&booking.id, "completed", None);
        Ok(booking)
    }

    /// No-show frees the stylist's slot; payment is forfeited.
    pub fn mark_no_show(&self, actor: &Actor, id: &str) -> Result<Booking, BookingError> {
        let booking = self.apply_transition(actor, id, BookingStatus::NoShow, true)?;
        self.slots
            .release(&booking.stylist_id, booking.appointment_date, &booking.id);
        self.record_event_logged(&booking.id, "no_show", None);
        Ok(booking)
    }

    pub async fn cancel_booking(
        &self,
        actor: &Actor,
        id: &str,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let now = self.now();
        let booking = {
            let conn = self.db.lock().unwrap();
            let mut booking =
                queries::get_booking(&conn, id)?.ok_or(BookingError::NotFound("booking"))?;
            self.authorize(actor, &booking)?;
            if !booking.status.can_transition_to(BookingStatus::Cancelled) {
                return Err(BookingError::InvalidTransition {
                    from: booking.status,
                    to: BookingStatus::Cancelled,
                });
            }
            booking.status = BookingStatus::Cancelled;
            booking.cancellation_reason = reason;
            booking.cancelled_by = Some(actor.cancel_actor());
            booking.cancellation_date = Some(now);
            booking.updated_at = now;
            queries::update_booking(&conn, &booking)?;
            booking
        };

        self.slots
            .release(&booking.stylist_id, booking.appointment_date, &booking.id);
        self.capacity
            .release(&booking.service_id, booking.appointment_date);

        let late_cancellation =
            booking.starts_at() - now < chrono::Duration::hours(self.cancel_notice_hours);

        self.record_event_logged(
            &booking.id,
            "cancelled",
            Some(json!({
                "cancelled_by": booking.cancelled_by.map(|a| a.as_str()),
                "reason": booking.cancellation_reason,
                "late_cancellation": late_cancellation,
            })),
        );
        self.notify(
            "booking.cancelled",
            json!({
                "booking_id": booking.id,
                "customer_id": booking.customer_id,
                "stylist_id": booking.stylist_id,
                "date": booking.appointment_date,
                "late_cancellation": late_cancellation,
            }),
        )
        .await;

        // A paid booking gets exactly one refund request. Cancellation is
        // already persisted; a processor failure here surfaces to the
        // caller, who retries through the refund endpoint.
        if booking.payment_status == PaymentStatus::Paid {
            self.request_refund(&booking.id).await?;
        }

        tracing::info!(booking_id = %booking.id, late_cancellation, "booking cancelled");
        Ok(booking)
    }

    pub async fn reschedule_booking(
        &self,
        actor: &Actor,
        id: &str,
        new_date: NaiveDate,
        new_time: &str,
    ) -> Result<Booking, BookingError> {
        let new_time = NaiveTime::parse_from_str(new_time, "%H:%M")
            .map_err(|_| BookingError::Invalid("appointment time must be HH:MM".into()))?;

        let (booking, service, stylist) = {
            let conn = self.db.lock().unwrap();
            let booking =
                queries::get_booking(&conn, id)?.ok_or(BookingError::NotFound("booking"))?;
            self.authorize(actor, &booking)?;
            if !matches!(
                booking.status,
                BookingStatus::Pending | BookingStatus::Confirmed
            ) {
                return Err(BookingError::InvalidTransition {
                    from: booking.status,
                    to: booking.status,
                });
            }
            let service = queries::get_service(&conn, &booking.service_id)?
                .ok_or(BookingError::NotFound("service"))?;
            let stylist = queries::get_stylist(&conn, &booking.stylist_id)?
                .ok_or(BookingError::NotFound("stylist"))?;
            (booking, service, stylist)
        };

        let new_span = SlotSpan::starting_at(new_time, booking.duration_minutes).ok_or_else(
            || BookingError::Invalid("appointment does not fit within the day".into()),
        )?;
        if !stylist.working_hours.covers(new_date, &new_span) {
            return Err(BookingError::OutsideWorkingHours {
                hours: stylist.working_hours.to_human_readable(),
            });
        }

        let old_date = booking.appointment_date;
        let old_span = booking.slot_span();

        // Claim the new slot before giving up the old one, so the booking is
        // never slotless. Same-day moves swap under one day lock instead.
        if new_date == old_date {
            self.slots
                .move_within_day(&booking.stylist_id, old_date, &booking.id, new_span)?;
        } else {
            self.capacity
                .check_and_reserve(&service.id, new_date, service.max_bookings_per_day)?;
            if let Err(e) = self
                .slots
                .reserve(&booking.stylist_id, new_date, new_span, &booking.id)
            {
                self.capacity.release(&service.id, new_date);
                return Err(e);
            }
            self.slots.release(&booking.stylist_id, old_date, &booking.id);
            self.capacity.release(&service.id, old_date);
        }

        let mut updated = booking.clone();
        updated.appointment_date = new_date;
        updated.appointment_time = new_time;
        updated.updated_at = self.now();

        let persisted = {
            let conn = self.db.lock().unwrap();
            queries::update_booking_if_status(&conn, &updated, booking.status)
        };
        match persisted {
            Ok(true) => {}
            other => {
                // Lost the race (or the write failed): put the reservation
                // back where the stored row says it is.
                self.rollback_move(&booking, old_date, old_span, new_date);
                return match other {
                    Ok(false) => Err(BookingError::InvalidTransition {
                        from: booking.status,
                        to: booking.status,
                    }),
                    Err(e) => Err(BookingError::Internal(e)),
                    Ok(true) => unreachable!(),
                };
            }
        }

        self.record_event_logged(
            &updated.id,
            "rescheduled",
            Some(json!({
                "from_date": old_date,
                "to_date": new_date,
                "to_time": new_time.format("%H:%M").to_string(),
            })),
        );
        self.notify(
            "booking.rescheduled",
            json!({
                "booking_id": updated.id,
                "customer_id": updated.customer_id,
                "date": new_date,
                "time": new_time.format("%H:%M").to_string(),
            }),
        )
        .await;

        Ok(updated)
    }

    fn rollback_move(
        &self,
        booking: &Booking,
        old_date: NaiveDate,
        old_span: Option<SlotSpan>,
        new_date: NaiveDate,
    ) {
        self.slots
            .release(&booking.stylist_id, new_date, &booking.id);
        if new_date != old_date {
            self.capacity.release(&booking.service_id, new_date);
            self.capacity.reclaim(&booking.service_id, old_date);
        }
        if let Some(span) = old_span {
            if let Err(e) = self
                .slots
                .reserve(&booking.stylist_id, old_date, span, &booking.id)
            {
                tracing::error!(booking_id = %booking.id, error = %e, "failed to restore slot after aborted reschedule");
            }
        }
    }

    // ── Reviews ──────────────────────────────────────────────

    /// Rating/review unlock only once the appointment is completed, and
    /// only for the customer who sat in the chair.
    pub fn review_booking(
        &self,
        actor: &Actor,
        id: &str,
        rating: u8,
        review: Option<String>,
    ) -> Result<Booking, BookingError> {
        if !(1..=5).contains(&rating) {
            return Err(BookingError::Invalid("rating must be between 1 and 5".into()));
        }

        let conn = self.db.lock().unwrap();
        let mut booking =
            queries::get_booking(&conn, id)?.ok_or(BookingError::NotFound("booking"))?;
        if actor.role != Role::Customer || actor.id != booking.customer_id {
            return Err(BookingError::Unauthorized);
        }
        if booking.status != BookingStatus::Completed {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Completed,
            });
        }
        let now = self.now();
        booking.rating = Some(rating);
        booking.review = review;
        booking.review_date = Some(now);
        booking.updated_at = now;
        queries::update_booking(&conn, &booking)?;
        drop(conn);

        self.record_event_logged(&booking.id, "reviewed", Some(json!({ "rating": rating })));
        Ok(booking)
    }

    // ── Payments ─────────────────────────────────────────────

    pub async fn create_payment_intent(
        &self,
        actor: &Actor,
        booking_id: &str,
    ) -> Result<PaymentIntent, BookingError> {
        let booking = self.get_booking(actor, booking_id)?;
        if !booking.status.reserves_slot() {
            return Err(BookingError::Invalid(
                "booking is no longer payable".into(),
            ));
        }
        if !matches!(
            booking.payment_status,
            PaymentStatus::Pending | PaymentStatus::Failed
        ) {
            return Err(BookingError::Invalid("booking is already paid".into()));
        }
        // Processor minimum charge
        if booking.total_price_cents < 50 {
            return Err(BookingError::Invalid(
                "amount below the processor minimum of 50 cents".into(),
            ));
        }

        let intent = self
            .payments
            .create_intent(
                &booking.id,
                booking.total_price_cents,
                &self.currency,
                &format!("Salon booking {}", booking.id),
            )
            .await
            .map_err(BookingError::Internal)?;

        {
            let conn = self.db.lock().unwrap();
            if let Some(mut fresh) = queries::get_booking(&conn, booking_id)? {
                fresh.payment_intent_id = Some(intent.id.clone());
                fresh.updated_at = self.now();
                queries::update_booking(&conn, &fresh)?;
            }
        }
        self.record_event_logged(booking_id, "payment_intent_created", None);

        Ok(intent)
    }

    /// Poll the processor for the intent's outcome, on behalf of a client
    /// that just finished the hosted payment flow.
    pub async fn confirm_payment(
        &self,
        actor: &Actor,
        booking_id: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking(actor, booking_id)?;
        let intent_id = booking
            .payment_intent_id
            .clone()
            .ok_or_else(|| BookingError::Invalid("no payment intent for booking".into()))?;

        let intent = self
            .payments
            .retrieve_intent(&intent_id)
            .await
            .map_err(BookingError::Internal)?;

        match intent.status {
            IntentStatus::Succeeded => self.record_payment_succeeded(booking_id).await,
            IntentStatus::Failed => {
                self.record_payment_failed(booking_id)?;
                Err(BookingError::Invalid("payment failed".into()))
            }
            IntentStatus::Processing => {
                Err(BookingError::Invalid("payment not completed yet".into()))
            }
        }
    }

    /// Idempotent: replayed webhooks for an already-paid booking are no-ops.
    /// A successful payment auto-confirms a pending booking; payment landing
    /// on an already-cancelled booking goes straight to refund.
    pub async fn record_payment_succeeded(
        &self,
        booking_id: &str,
    ) -> Result<Booking, BookingError> {
        let (booking, changed) = {
            let conn = self.db.lock().unwrap();
            let mut booking =
                queries::get_booking(&conn, booking_id)?.ok_or(BookingError::NotFound("booking"))?;
            match booking.payment_status {
                PaymentStatus::Paid | PaymentStatus::Refunded => (booking, false),
                _ => {
                    booking.payment_status = PaymentStatus::Paid;
                    if booking.status.can_transition_to(BookingStatus::Confirmed) {
                        booking.status = BookingStatus::Confirmed;
                    }
                    booking.updated_at = self.now();
                    queries::update_booking(&conn, &booking)?;
                    (booking, true)
                }
            }
        };

        if changed {
            self.record_event_logged(
                booking_id,
                "payment_paid",
                Some(json!({ "status": booking.status.as_str() })),
            );
            if booking.status == BookingStatus::Confirmed {
                self.notify(
                    "booking.confirmed",
                    json!({
                        "booking_id": booking.id,
                        "customer_id": booking.customer_id,
                        "date": booking.appointment_date,
                    }),
                )
                .await;
            }
            // Payment confirmed after the booking was already cancelled:
            // give the money back.
            if booking.status == BookingStatus::Cancelled {
                self.request_refund(booking_id).await?;
            }
        }
        Ok(booking)
    }

    pub fn record_payment_failed(&self, booking_id: &str) -> Result<Booking, BookingError> {
        let conn = self.db.lock().unwrap();
        let mut booking =
            queries::get_booking(&conn, booking_id)?.ok_or(BookingError::NotFound("booking"))?;
        if booking.payment_status == PaymentStatus::Pending {
            booking.payment_status = PaymentStatus::Failed;
            booking.updated_at = self.now();
            queries::update_booking(&conn, &booking)?;
        }
        Ok(booking)
    }

    /// Ask the processor to refund a cancelled, paid booking. Keyed by
    /// booking id: the `refund_requested` audit row plus an in-flight guard
    /// make this safe to call any number of times while sending at most one
    /// refund to the processor.
    pub async fn request_refund(&self, booking_id: &str) -> Result<bool, BookingError> {
        let booking = {
            let conn = self.db.lock().unwrap();
            queries::get_booking(&conn, booking_id)?.ok_or(BookingError::NotFound("booking"))?
        };
        if booking.status != BookingStatus::Cancelled
            || booking.payment_status != PaymentStatus::Paid
        {
            return Err(BookingError::Invalid(
                "refund requires a cancelled, paid booking".into(),
            ));
        }
        let already_requested = {
            let conn = self.db.lock().unwrap();
            queries::has_event(&conn, booking_id, "refund_requested")?
        };
        if already_requested || !self.refunds_in_flight.insert(booking_id.to_string()) {
            return Ok(false);
        }

        let intent_id = match booking.payment_intent_id.clone() {
            Some(id) => id,
            None => {
                self.refunds_in_flight.remove(booking_id);
                return Err(BookingError::Invalid("no payment on file".into()));
            }
        };

        let outcome = self
            .payments
            .refund(booking_id, &intent_id, booking.total_price_cents)
            .await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.refunds_in_flight.remove(booking_id);
                return Err(BookingError::Internal(e));
            }
        };

        if let Err(e) = self.record_event(booking_id, "refund_requested", None) {
            tracing::error!(booking_id, error = %e, "refund sent but audit row failed");
        }
        self.refunds_in_flight.remove(booking_id);

        // Some refunds settle synchronously; the rest confirm via webhook.
        if outcome == RefundOutcome::Confirmed {
            self.record_refund_confirmed(booking_id).await?;
        }
        Ok(true)
    }

    /// Webhook confirmation: flip to refunded exactly once; replays no-op.
    pub async fn record_refund_confirmed(&self, booking_id: &str) -> Result<(), BookingError> {
        let booking = {
            let conn = self.db.lock().unwrap();
            let mut booking =
                queries::get_booking(&conn, booking_id)?.ok_or(BookingError::NotFound("booking"))?;
            if booking.payment_status != PaymentStatus::Paid
                || booking.status != BookingStatus::Cancelled
            {
                None
            } else {
                booking.payment_status = PaymentStatus::Refunded;
                booking.updated_at = self.now();
                queries::update_booking(&conn, &booking)?;
                Some(booking)
            }
        };

        if let Some(booking) = booking {
            self.record_event_logged(&booking.id, "refund_confirmed", None);
            self.notify(
                "payment.refunded",
                json!({
                    "booking_id": booking.id,
                    "customer_id": booking.customer_id,
                    "amount_cents": booking.total_price_cents,
                }),
            )
            .await;
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────

    /// Non-owners get `NotFound`, not `Unauthorized`, so probing for other
    /// people's booking ids reveals nothing.
    pub fn get_booking(&self, actor: &Actor, id: &str) -> Result<Booking, BookingError> {
        let booking = {
            let conn = self.db.lock().unwrap();
            queries::get_booking(&conn, id)?
        }
        .ok_or(BookingError::NotFound("booking"))?;
        if self.authorize(actor, &booking).is_err() {
            return Err(BookingError::NotFound("booking"));
        }
        Ok(booking)
    }

    pub fn list_for_customer(
        &self,
        actor: &Actor,
        customer_id: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        if !actor.is_admin() && !(actor.role == Role::Customer && actor.id == customer_id) {
            return Err(BookingError::Unauthorized);
        }
        let conn = self.db.lock().unwrap();
        Ok(queries::list_for_customer(&conn, customer_id)?)
    }

    pub fn list_for_stylist(
        &self,
        actor: &Actor,
        stylist_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>, BookingError> {
        if !actor.is_admin() && !(actor.role == Role::Stylist && actor.id == stylist_id) {
            return Err(BookingError::Unauthorized);
        }
        let conn = self.db.lock().unwrap();
        Ok(queries::list_for_stylist(&conn, stylist_id, from, to)?)
    }

    /// Occupied intervals for a stylist-day, for availability displays.
    /// Carries no customer detail, so it is safe to expose publicly.
    pub fn day_schedule(&self, stylist_id: &str, date: NaiveDate) -> Vec<SlotEntry> {
        self.slots.query(stylist_id, date)
    }

    // ── Reminders ────────────────────────────────────────────

    /// Invoked by the external scheduler. Best-effort: a notification
    /// failure skips the booking and leaves it due for the next run.
    pub async fn run_reminders(&self, date: NaiveDate) -> Result<u32, BookingError> {
        let due = {
            let conn = self.db.lock().unwrap();
            queries::bookings_needing_reminder(&conn, date)?
        };

        let mut sent = 0;
        for mut booking in due {
            let result = self
                .notifier
                .send(
                    "booking.reminder",
                    json!({
                        "booking_id": booking.id,
                        "customer_id": booking.customer_id,
                        "date": booking.appointment_date,
                        "time": booking.appointment_time.format("%H:%M").to_string(),
                    }),
                )
                .await;
            if let Err(e) = result {
                tracing::warn!(booking_id = %booking.id, error = %e, "reminder notification failed");
                continue;
            }

            let now = self.now();
            booking.reminder_sent = true;
            booking.reminder_date = Some(now);
            booking.updated_at = now;
            let saved = {
                let conn = self.db.lock().unwrap();
                queries::update_booking(&conn, &booking)
            };
            if let Err(e) = saved {
                tracing::warn!(booking_id = %booking.id, error = %e, "failed to mark reminder sent");
                continue;
            }
            self.record_event_logged(&booking.id, "reminder_sent", None);
            sent += 1;
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Service, ServiceCategory, Stylist, WorkingHours};
    use async_trait::async_trait;

    struct MockPayments {
        refunds: Arc<Mutex<Vec<String>>>,
        refund_outcome: RefundOutcome,
        intent_status: IntentStatus,
    }

    #[async_trait]
    impl PaymentProvider for MockPayments {
        async fn create_intent(
            &self,
            booking_id: &str,
            amount_cents: i64,
            currency: &str,
            _description: &str,
        ) -> anyhow::Result<PaymentIntent> {
            Ok(PaymentIntent {
                id: format!("pi_{booking_id}"),
                client_secret: Some("cs_test".into()),
                status: IntentStatus::Processing,
                amount_cents,
                currency: currency.to_string(),
            })
        }

        async fn retrieve_intent(&self, intent_id: &str) -> anyhow::Result<PaymentIntent> {
            Ok(PaymentIntent {
                id: intent_id.to_string(),
                client_secret: None,
                status: self.intent_status,
                amount_cents: 5000,
                currency: "usd".into(),
            })
        }

        async fn refund(
            &self,
            booking_id: &str,
            _intent_id: &str,
            _amount_cents: i64,
        ) -> anyhow::Result<RefundOutcome> {
            self.refunds.lock().unwrap().push(booking_id.to_string());
            Ok(self.refund_outcome)
        }
    }

    struct MockNotifier {
        sent: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, event: &str, payload: serde_json::Value) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push((event.to_string(), payload));
            Ok(())
        }
    }

    type Refunds = Arc<Mutex<Vec<String>>>;
    type Sent = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    fn seed(conn: &Connection) {
        let now = Utc::now().naive_utc();
        let service = Service {
            id: "svc-cut".into(),
            name: "Signature Cut".into(),
            description: "Cut and finish".into(),
            long_description: None,
            category: ServiceCategory::Hair,
            price_cents: 5000,
            duration_minutes: 60,
            is_active: true,
            is_popular: true,
            max_bookings_per_day: 10,
            cancellation_policy: "24 hours notice required for cancellation".into(),
            created_at: now,
            updated_at: now,
        };
        queries::insert_service(conn, &service).unwrap();

        let limited = Service {
            id: "svc-color".into(),
            name: "Full Color".into(),
            duration_minutes: 30,
            max_bookings_per_day: 1,
            ..service.clone()
        };
        queries::insert_service(conn, &limited).unwrap();

        for id in ["sty-amara", "sty-bea"] {
            let stylist = Stylist {
                id: id.into(),
                name: id.into(),
                specialties: vec!["hair".into()],
                working_hours: WorkingHours { windows: vec![] },
                is_active: true,
                created_at: now,
            };
            queries::insert_stylist(conn, &stylist).unwrap();
        }
    }

    fn manager_with(
        db: Arc<Mutex<Connection>>,
        refund_outcome: RefundOutcome,
    ) -> (LifecycleManager, Refunds, Sent) {
        let refunds: Refunds = Arc::new(Mutex::new(vec![]));
        let sent: Sent = Arc::new(Mutex::new(vec![]));
        let payments = MockPayments {
            refunds: Arc::clone(&refunds),
            refund_outcome,
            intent_status: IntentStatus::Succeeded,
        };
        let notifier = MockNotifier {
            sent: Arc::clone(&sent),
        };
        let (events_tx, _) = broadcast::channel(64);
        let manager = LifecycleManager::new(
            db,
            Arc::new(payments),
            Arc::new(notifier),
            events_tx,
            24,
            "usd".into(),
        )
        .unwrap();
        (manager, refunds, sent)
    }

    fn test_manager() -> (LifecycleManager, Refunds, Sent) {
        let conn = db::init_db(":memory:").unwrap();
        seed(&conn);
        manager_with(Arc::new(Mutex::new(conn)), RefundOutcome::Pending)
    }

    fn customer(id: &str) -> Actor {
        Actor {
            id: id.into(),
            role: Role::Customer,
        }
    }

    fn staff(id: &str) -> Actor {
        Actor {
            id: id.into(),
            role: Role::Stylist,
        }
    }

    fn request(service: &str, stylist: &str, date: &str, time: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            customer_id: None,
            stylist_id: stylist.into(),
            service_id: service.into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: time.into(),
            payment_method: None,
            special_requests: None,
            notes: None,
        }
    }

    async fn pay(manager: &LifecycleManager, actor: &Actor, booking_id: &str) {
        manager.create_payment_intent(actor, booking_id).await.unwrap();
        manager.record_payment_succeeded(booking_id).await.unwrap();
    }

    #[tokio::test]
    async fn overlapping_slot_rejected_back_to_back_accepted() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");

        manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();

        let err = manager
            .create_booking(&alice, &request("svc-color", "sty-amara", "2030-06-17", "10:30"))
            .await
            .unwrap_err();
        match err {
            BookingError::Conflict { competing, requested, .. } => {
                assert_eq!(competing.to_string(), "10:00-11:00");
                assert_eq!(requested.to_string(), "10:30-11:00");
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        manager
            .create_booking(&alice, &request("svc-color", "sty-amara", "2030-06-17", "11:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn capacity_admits_exactly_max_per_day() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");
        let bob = customer("cust-bob");

        // svc-color allows one booking per day; stylists and times differ
        let req_alice = request("svc-color", "sty-amara", "2030-06-17", "10:00");
        let req_bob = request("svc-color", "sty-bea", "2030-06-17", "14:00");
        let (first, second) = tokio::join!(
            manager.create_booking(&alice, &req_alice),
            manager.create_booking(&bob, &req_bob),
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(BookingError::CapacityExceeded { booked: 1, max: 1 })
        )));

        // A different day is unaffected
        manager
            .create_booking(&alice, &request("svc-color", "sty-amara", "2030-06-18", "10:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_frees_slot_and_capacity() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-color", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        manager.cancel_booking(&alice, &booking.id, None).await.unwrap();

        // Identical slot and the single unit of capacity are both free again
        manager
            .create_booking(&alice, &request("svc-color", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_paid_booking_refunds_exactly_once() {
        let (manager, refunds, _) = test_manager();
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        pay(&manager, &alice, &booking.id).await;

        let cancelled = manager
            .cancel_booking(&alice, &booking.id, Some("sick".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some(crate::models::CancelActor::Customer));
        assert_eq!(refunds.lock().unwrap().len(), 1);

        // Refund request sent, confirmation still outstanding
        let after = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(after.payment_status, PaymentStatus::Paid);

        // A second cancellation is an illegal transition and must not refund again
        let err = manager
            .cancel_booking(&alice, &booking.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
        assert_eq!(refunds.lock().unwrap().len(), 1);

        // Explicit retry is a no-op once the request is on record
        assert!(!manager.request_refund(&booking.id).await.unwrap());
        assert_eq!(refunds.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refund_confirmation_is_idempotent() {
        let (manager, refunds, _) = test_manager();
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        pay(&manager, &alice, &booking.id).await;
        manager.cancel_booking(&alice, &booking.id, None).await.unwrap();

        manager.record_refund_confirmed(&booking.id).await.unwrap();
        let after = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(after.payment_status, PaymentStatus::Refunded);

        // Replayed webhook changes nothing
        manager.record_refund_confirmed(&booking.id).await.unwrap();
        let after = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(after.payment_status, PaymentStatus::Refunded);
        assert_eq!(refunds.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn synchronous_refund_settles_immediately() {
        let conn = db::init_db(":memory:").unwrap();
        seed(&conn);
        let (manager, refunds, _) =
            manager_with(Arc::new(Mutex::new(conn)), RefundOutcome::Confirmed);
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        pay(&manager, &alice, &booking.id).await;
        manager.cancel_booking(&alice, &booking.id, None).await.unwrap();

        assert_eq!(refunds.lock().unwrap().len(), 1);
        let after = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(after.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn reschedule_moves_or_leaves_unchanged() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");
        let bob = customer("cust-bob");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        let blocker = manager
            .create_booking(&bob, &request("svc-cut", "sty-amara", "2030-06-18", "14:00"))
            .await
            .unwrap();
        assert_eq!(blocker.status, BookingStatus::Pending);

        // Target overlaps the blocker: nothing may change
        let date = NaiveDate::from_ymd_opt(2030, 6, 18).unwrap();
        let err = manager
            .reschedule_booking(&alice, &booking.id, date, "14:30")
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict { .. }));

        let unchanged = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(unchanged.appointment_date, booking.appointment_date);
        assert_eq!(unchanged.appointment_time, booking.appointment_time);
        // The original slot is still held
        assert!(manager
            .day_schedule("sty-amara", booking.appointment_date)
            .iter()
            .any(|e| e.booking_id == booking.id));

        // A free target works, and the old slot opens up
        let moved = manager
            .reschedule_booking(&alice, &booking.id, date, "09:00")
            .await
            .unwrap();
        assert_eq!(moved.appointment_date, date);
        assert!(manager
            .day_schedule("sty-amara", booking.appointment_date)
            .iter()
            .all(|e| e.booking_id != booking.id));
        manager
            .create_booking(&bob, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reschedule_shifts_within_own_interval() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        // 10:30 overlaps the booking's own 10:00-11:00 interval
        let moved = manager
            .reschedule_booking(&alice, &booking.id, booking.appointment_date, "10:30")
            .await
            .unwrap();
        assert_eq!(moved.appointment_time.format("%H:%M").to_string(), "10:30");

        let schedule = manager.day_schedule("sty-amara", booking.appointment_date);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].span.to_string(), "10:30-11:30");
    }

    #[tokio::test]
    async fn reschedule_rejected_for_terminal_booking() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        manager.cancel_booking(&alice, &booking.id, None).await.unwrap();

        let err = manager
            .reschedule_booking(&alice, &booking.id, booking.appointment_date, "12:00")
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn illegal_transition_changes_nothing() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");
        let amara = staff("sty-amara");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();

        // pending -> completed is not in the table
        let err = manager.mark_completed(&amara, &booking.id).unwrap_err();
        assert!(matches!(
            err,
            BookingError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Completed,
            }
        ));

        let unchanged = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(unchanged.status, BookingStatus::Pending);
        assert_eq!(
            manager.day_schedule("sty-amara", booking.appointment_date).len(),
            1
        );
    }

    #[tokio::test]
    async fn no_show_releases_slot_without_refund() {
        let (manager, refunds, _) = test_manager();
        let alice = customer("cust-alice");
        let amara = staff("sty-amara");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        pay(&manager, &alice, &booking.id).await;

        let marked = manager.mark_no_show(&amara, &booking.id).unwrap();
        assert_eq!(marked.status, BookingStatus::NoShow);
        assert!(manager.day_schedule("sty-amara", booking.appointment_date).is_empty());
        // Policy: no-show forfeits payment
        assert!(refunds.lock().unwrap().is_empty());
        let after = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(after.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn payment_success_confirms_pending_booking() {
        let (manager, _, sent) = test_manager();
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        pay(&manager, &alice, &booking.id).await;

        let after = manager.get_booking(&alice, &booking.id).unwrap();
        assert_eq!(after.status, BookingStatus::Confirmed);
        assert_eq!(after.payment_status, PaymentStatus::Paid);

        // Replayed success webhook is a no-op
        manager.record_payment_succeeded(&booking.id).await.unwrap();
        let confirmations = sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(event, _)| event == "booking.confirmed")
            .count();
        assert_eq!(confirmations, 1);
    }

    #[tokio::test]
    async fn working_hours_are_enforced() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");
        // Give sty-bea real hours: Tuesdays 09:00-17:00
        {
            let conn = manager.db.lock().unwrap();
            conn.execute(
                "UPDATE stylists SET working_hours = ?1 WHERE id = 'sty-bea'",
                [r#"{"windows":[{"day":"tue","start":"09:00","end":"17:00"}]}"#],
            )
            .unwrap();
        }

        // 2030-06-18 is a Tuesday
        manager
            .create_booking(&alice, &request("svc-cut", "sty-bea", "2030-06-18", "09:00"))
            .await
            .unwrap();
        let err = manager
            .create_booking(&alice, &request("svc-cut", "sty-bea", "2030-06-18", "16:30"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::OutsideWorkingHours { .. }));
        // Wednesday is not a working day
        let err = manager
            .create_booking(&alice, &request("svc-cut", "sty-bea", "2030-06-19", "10:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::OutsideWorkingHours { .. }));
    }

    #[tokio::test]
    async fn malformed_time_is_rejected() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");

        for bad in ["25:00", "10:65", "noon", "10.30"] {
            let err = manager
                .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", bad))
                .await
                .unwrap_err();
            assert!(matches!(err, BookingError::Invalid(_)), "{bad} should be rejected");
        }
    }

    #[tokio::test]
    async fn recurring_series_reports_skipped_occurrences() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");
        let bob = customer("cust-bob");

        // Block the second weekly occurrence
        manager
            .create_booking(&bob, &request("svc-cut", "sty-amara", "2030-06-24", "10:00"))
            .await
            .unwrap();

        let outcome = manager
            .create_recurring(
                &alice,
                &request("svc-cut", "sty-amara", "2030-06-17", "10:00"),
                RecurringPattern::Weekly,
                3,
            )
            .await
            .unwrap();

        assert_eq!(outcome.created.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(
            outcome.skipped[0].date,
            NaiveDate::from_ymd_opt(2030, 6, 24).unwrap()
        );
        assert!(outcome.skipped[0].reason.contains("already booked"));

        let parent_id = &outcome.created[0].id;
        assert!(outcome.created[0].parent_booking.is_none());
        assert_eq!(outcome.created[1].parent_booking.as_ref(), Some(parent_id));
        assert!(outcome.created.iter().all(|b| b.is_recurring));
    }

    #[tokio::test]
    async fn rebuild_restores_reservations_from_storage() {
        let conn = db::init_db(":memory:").unwrap();
        seed(&conn);
        let db = Arc::new(Mutex::new(conn));
        let (manager, _, _) = manager_with(Arc::clone(&db), RefundOutcome::Pending);
        let alice = customer("cust-alice");

        let booking = manager
            .create_booking(&alice, &request("svc-color", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();

        // Fresh manager over the same database, as after a restart
        let (rebuilt, _, _) = manager_with(db, RefundOutcome::Pending);
        let err = rebuilt
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:30"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict { .. }));
        // Capacity counter was rebuilt too (svc-color max is 1)
        let err = rebuilt
            .create_booking(&alice, &request("svc-color", "sty-bea", "2030-06-17", "14:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::CapacityExceeded { .. }));
        assert!(rebuilt
            .day_schedule("sty-amara", booking.appointment_date)
            .iter()
            .any(|e| e.booking_id == booking.id));
    }

    #[tokio::test]
    async fn review_requires_completion_and_valid_rating() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");
        let amara = staff("sty-amara");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();

        let err = manager
            .review_booking(&alice, &booking.id, 5, None)
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        manager.confirm_booking(&amara, &booking.id).await.unwrap();
        manager.mark_started(&amara, &booking.id).unwrap();
        manager.mark_completed(&amara, &booking.id).unwrap();

        let err = manager
            .review_booking(&alice, &booking.id, 6, None)
            .unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));

        let reviewed = manager
            .review_booking(&alice, &booking.id, 5, Some("Great cut".into()))
            .unwrap();
        assert_eq!(reviewed.rating, Some(5));
        assert!(reviewed.review_date.is_some());

        // Other customers cannot review someone else's appointment
        let err = manager
            .review_booking(&customer("cust-bob"), &booking.id, 1, None)
            .unwrap_err();
        assert!(matches!(err, BookingError::Unauthorized));
    }

    #[tokio::test]
    async fn foreign_bookings_are_invisible_and_untouchable() {
        let (manager, _, _) = test_manager();
        let alice = customer("cust-alice");
        let bob = customer("cust-bob");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();

        // Reads come back as not-found so ids can't be probed
        let err = manager.get_booking(&bob, &booking.id).unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));

        let err = manager
            .cancel_booking(&bob, &booking.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Unauthorized));

        // The owning stylist may cancel
        manager
            .cancel_booking(&staff("sty-amara"), &booking.id, Some("double booked".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn late_cancellation_is_flagged_for_notification() {
        let (manager, _, sent) = test_manager();
        let alice = customer("cust-alice");

        // Appointment two hours from now: inside the 24h notice window
        let soon = Utc::now().naive_utc() + chrono::Duration::hours(2);
        let req = request(
            "svc-cut",
            "sty-amara",
            &soon.format("%Y-%m-%d").to_string(),
            &soon.format("%H:%M").to_string(),
        );
        if SlotSpan::starting_at(soon.time(), 60).is_none() {
            // Appointment would cross midnight; skip this run
            return;
        }
        let booking = manager.create_booking(&alice, &req).await.unwrap();
        manager.cancel_booking(&alice, &booking.id, None).await.unwrap();

        let sent = sent.lock().unwrap();
        let (_, payload) = sent
            .iter()
            .find(|(event, _)| event == "booking.cancelled")
            .expect("cancellation notification");
        assert_eq!(payload["late_cancellation"], true);
    }

    #[tokio::test]
    async fn reminders_mark_and_notify_once() {
        let (manager, _, sent) = test_manager();
        let alice = customer("cust-alice");
        let amara = staff("sty-amara");

        let booking = manager
            .create_booking(&alice, &request("svc-cut", "sty-amara", "2030-06-17", "10:00"))
            .await
            .unwrap();
        manager.confirm_booking(&amara, &booking.id).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2030, 6, 17).unwrap();
        assert_eq!(manager.run_reminders(date).await.unwrap(), 1);
        assert_eq!(manager.run_reminders(date).await.unwrap(), 0);

        let reminders = sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(event, _)| event == "booking.reminder")
            .count();
        assert_eq!(reminders, 1);
    }
}

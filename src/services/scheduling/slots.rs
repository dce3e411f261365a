use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use dashmap::DashMap;

use crate::models::SlotSpan;

use super::BookingError;

/// One reserved interval on a stylist's day, tagged with the owning booking.
#[derive(Debug, Clone)]
pub struct SlotEntry {
    pub booking_id: String,
    pub span: SlotSpan,
}

type DayKey = (String, NaiveDate);
type DaySlots = Arc<Mutex<Vec<SlotEntry>>>;

/// Per-(stylist, date) index of reserved intervals.
///
/// Each stylist-day has its own lock, held for the whole check+reserve, so
/// two concurrent creations for the same day serialize while different
/// stylist-days never contend. Entries stay sorted by span start and
/// pairwise disjoint; that invariant is what makes the neighbor-only
/// conflict check in [`find_conflict`] sufficient.
#[derive(Default)]
pub struct SlotIndex {
    days: DashMap<DayKey, DaySlots>,
}

impl SlotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn day(&self, stylist_id: &str, date: NaiveDate) -> DaySlots {
        self.days
            .entry((stylist_id.to_string(), date))
            .or_default()
            .clone()
    }

    /// Insert a non-overlapping interval or fail with `Conflict`.
    pub fn reserve(
        &self,
        stylist_id: &str,
        date: NaiveDate,
        span: SlotSpan,
        booking_id: &str,
    ) -> Result<(), BookingError> {
        let day = self.day(stylist_id, date);
        let mut slots = day.lock().unwrap();
        insert_checked(
            &mut slots,
            SlotEntry {
                booking_id: booking_id.to_string(),
                span,
            },
        )
    }

    /// Remove a booking's interval. Idempotent: releasing an absent booking
    /// is a no-op.
    pub fn release(&self, stylist_id: &str, date: NaiveDate, booking_id: &str) {
        if let Some(day) = self.days.get(&(stylist_id.to_string(), date)) {
            day.lock().unwrap().retain(|e| e.booking_id != booking_id);
        }
    }

    /// Move a booking to a new interval on the same stylist-day, atomically
    /// under the day lock. The booking's own current interval is ignored
    /// when checking, so shifting within or adjacent to it works. On
    /// conflict nothing changes.
    pub fn move_within_day(
        &self,
        stylist_id: &str,
        date: NaiveDate,
        booking_id: &str,
        new_span: SlotSpan,
    ) -> Result<(), BookingError> {
        let day = self.day(stylist_id, date);
        let mut slots = day.lock().unwrap();
        let old = slots
            .iter()
            .position(|e| e.booking_id == booking_id)
            .map(|pos| slots.remove(pos));
        let result = insert_checked(
            &mut slots,
            SlotEntry {
                booking_id: booking_id.to_string(),
                span: new_span,
            },
        );
        if result.is_err() {
            if let Some(old) = old {
                let pos = slots.partition_point(|e| e.span.start < old.span.start);
                slots.insert(pos, old);
            }
        }
        result
    }

    /// Pure conflict probe: `Ok` or the same `Conflict` that `reserve`
    /// would return. No side effects.
    pub fn check(
        &self,
        stylist_id: &str,
        date: NaiveDate,
        span: &SlotSpan,
    ) -> Result<(), BookingError> {
        if let Some(day) = self.days.get(&(stylist_id.to_string(), date)) {
            let slots = day.lock().unwrap();
            if let Some(taken) = find_conflict(&slots, span) {
                return Err(conflict_error(taken, span));
            }
        }
        Ok(())
    }

    /// Current reservations for a stylist-day, ordered by start time.
    pub fn query(&self, stylist_id: &str, date: NaiveDate) -> Vec<SlotEntry> {
        self.days
            .get(&(stylist_id.to_string(), date))
            .map(|day| day.lock().unwrap().clone())
            .unwrap_or_default()
    }
}

fn insert_checked(slots: &mut Vec<SlotEntry>, entry: SlotEntry) -> Result<(), BookingError> {
    if let Some(taken) = find_conflict(slots, &entry.span) {
        return Err(conflict_error(taken, &entry.span));
    }
    let pos = slots.partition_point(|e| e.span.start < entry.span.start);
    slots.insert(pos, entry);
    Ok(())
}

fn conflict_error(taken: &SlotEntry, requested: &SlotSpan) -> BookingError {
    BookingError::Conflict {
        competing_booking_id: taken.booking_id.clone(),
        competing: taken.span,
        requested: *requested,
    }
}

/// Sorted + disjoint entries mean a new interval can only collide with the
/// neighbors of its insertion point.
pub fn find_conflict<'a>(slots: &'a [SlotEntry], span: &SlotSpan) -> Option<&'a SlotEntry> {
    let pos = slots.partition_point(|e| e.span.start < span.start);
    if pos > 0 && slots[pos - 1].span.overlaps(span) {
        return Some(&slots[pos - 1]);
    }
    if pos < slots.len() && slots[pos].span.overlaps(span) {
        return Some(&slots[pos]);
    }
    None
}

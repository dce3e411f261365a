use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use dashmap::DashMap;

use super::BookingError;

type CapKey = (String, NaiveDate);

/// Per-(service, date) count of active bookings.
///
/// Counters are derived state: seeded from persisted active bookings at
/// startup and moved in lockstep with slot reservations afterwards, so
/// there is no stored counter column to reset at day boundaries. The
/// check-and-increment runs under the per-key mutex, making it atomic for
/// concurrent creations of the same service-day.
#[derive(Default)]
pub struct CapacityLedger {
    counts: DashMap<CapKey, Arc<Mutex<u32>>>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, service_id: &str, date: NaiveDate) -> Arc<Mutex<u32>> {
        self.counts
            .entry((service_id.to_string(), date))
            .or_default()
            .clone()
    }

    /// Claim one unit of the service's daily ceiling, or fail with
    /// `CapacityExceeded` carrying the current and maximum counts.
    pub fn check_and_reserve(
        &self,
        service_id: &str,
        date: NaiveDate,
        max: u32,
    ) -> Result<(), BookingError> {
        let counter = self.counter(service_id, date);
        let mut booked = counter.lock().unwrap();
        if *booked >= max {
            return Err(BookingError::CapacityExceeded { booked: *booked, max });
        }
        *booked += 1;
        Ok(())
    }

    /// Give one unit back (cancellation). Saturates at zero.
    pub fn release(&self, service_id: &str, date: NaiveDate) {
        let counter = self.counter(service_id, date);
        let mut booked = counter.lock().unwrap();
        *booked = booked.saturating_sub(1);
    }

    /// Re-claim a unit that was just released, bypassing the ceiling.
    /// Only for compensating a failed move back to its original day.
    pub fn reclaim(&self, service_id: &str, date: NaiveDate) {
        let counter = self.counter(service_id, date);
        *counter.lock().unwrap() += 1;
    }

    pub fn booked(&self, service_id: &str, date: NaiveDate) -> u32 {
        *self.counter(service_id, date).lock().unwrap()
    }

    /// Seed a counter during the startup rebuild.
    pub fn seed(&self, service_id: &str, date: NaiveDate, count: u32) {
        *self.counter(service_id, date).lock().unwrap() = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    #[test]
    fn ceiling_is_enforced() {
        let ledger = CapacityLedger::new();
        ledger.check_and_reserve("svc", date(), 2).unwrap();
        ledger.check_and_reserve("svc", date(), 2).unwrap();
        let err = ledger.check_and_reserve("svc", date(), 2).unwrap_err();
        match err {
            BookingError::CapacityExceeded { booked, max } => {
                assert_eq!(booked, 2);
                assert_eq!(max, 2);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn release_frees_exactly_one_unit() {
        let ledger = CapacityLedger::new();
        ledger.check_and_reserve("svc", date(), 1).unwrap();
        assert!(ledger.check_and_reserve("svc", date(), 1).is_err());
        ledger.release("svc", date());
        ledger.check_and_reserve("svc", date(), 1).unwrap();
    }

    #[test]
    fn release_saturates_at_zero() {
        let ledger = CapacityLedger::new();
        ledger.release("svc", date());
        assert_eq!(ledger.booked("svc", date()), 0);
    }

    #[test]
    fn days_are_independent() {
        let ledger = CapacityLedger::new();
        let other = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        ledger.check_and_reserve("svc", date(), 1).unwrap();
        ledger.check_and_reserve("svc", other, 1).unwrap();
    }

    #[test]
    fn zero_ceiling_rejects_everything() {
        let ledger = CapacityLedger::new();
        assert!(ledger.check_and_reserve("svc", date(), 0).is_err());
    }

    #[test]
    fn concurrent_claims_respect_the_ceiling() {
        let ledger = Arc::new(CapacityLedger::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(std::thread::spawn(move || {
                ledger.check_and_reserve("svc", date(), 3)
            }));
        }
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(successes, 3);
        assert_eq!(ledger.booked("svc", date()), 3);
    }
}

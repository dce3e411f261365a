use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes since midnight. Appointments are minute-resolution and never
/// cross a day boundary.
pub type Minutes = u32;

const DAY_MINUTES: Minutes = 24 * 60;

/// Half-open interval `[start, end)` within a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpan {
    pub start: Minutes,
    pub end: Minutes,
}

impl SlotSpan {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start < end, "SlotSpan start must be before end");
        Self { start, end }
    }

    /// Span starting at `time` and running for `duration_minutes`.
    /// Returns `None` if the appointment would cross midnight.
    pub fn starting_at(time: NaiveTime, duration_minutes: u32) -> Option<Self> {
        let start = time.hour() * 60 + time.minute();
        let end = start + duration_minutes;
        if duration_minutes == 0 || end > DAY_MINUTES {
            return None;
        }
        Some(Self { start, end })
    }

    pub fn duration_minutes(&self) -> Minutes {
        self.end - self.start
    }

    /// Half-open overlap: back-to-back spans (`self.end == other.start`) do
    /// not overlap.
    pub fn overlaps(&self, other: &SlotSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for SlotSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn starting_at_basic() {
        let span = SlotSpan::starting_at(t("10:00"), 60).unwrap();
        assert_eq!(span, SlotSpan::new(600, 660));
        assert_eq!(span.duration_minutes(), 60);
    }

    #[test]
    fn starting_at_rejects_midnight_crossing() {
        assert!(SlotSpan::starting_at(t("23:30"), 60).is_none());
        assert!(SlotSpan::starting_at(t("23:00"), 60).is_some());
    }

    #[test]
    fn starting_at_rejects_zero_duration() {
        assert!(SlotSpan::starting_at(t("10:00"), 0).is_none());
    }

    #[test]
    fn overlap_is_half_open() {
        let a = SlotSpan::new(600, 660);
        let b = SlotSpan::new(630, 660);
        let c = SlotSpan::new(660, 690);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Back-to-back never conflicts
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn display_format() {
        let span = SlotSpan::starting_at(t("09:05"), 30).unwrap();
        assert_eq!(span.to_string(), "09:05-09:35");
    }
}

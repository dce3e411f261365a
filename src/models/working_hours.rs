use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use super::SlotSpan;

/// One bookable window on a weekday, e.g. `{"day":"mon","start":"09:00","end":"17:00"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkWindow {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// A stylist's weekly working hours, stored as JSON.
///
/// No windows means no restriction: the stylist takes appointments at any
/// time (hours simply haven't been configured yet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    pub windows: Vec<WorkWindow>,
}

impl WorkingHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: WorkingHours = serde_json::from_str(s)?;
        for window in &hours.windows {
            parse_weekday(&window.day)
                .ok_or_else(|| anyhow::anyhow!("invalid weekday: {}", window.day))?;
            let start = parse_minutes(&window.start)?;
            let end = parse_minutes(&window.end)?;
            anyhow::ensure!(
                start < end,
                "window end must be after start: {}-{}",
                window.start,
                window.end
            );
        }
        Ok(hours)
    }

    /// True when `span` starts and ends inside one window of the date's
    /// weekday. An unconfigured (empty) schedule accepts everything.
    pub fn covers(&self, date: NaiveDate, span: &SlotSpan) -> bool {
        if self.windows.is_empty() {
            return true;
        }
        let weekday = date.weekday();
        self.windows.iter().any(|w| {
            parse_weekday(&w.day) == Some(weekday)
                && matches!(
                    (parse_minutes(&w.start), parse_minutes(&w.end)),
                    (Ok(start), Ok(end)) if start <= span.start && span.end <= end
                )
        })
    }

    /// Windows sorted Monday-first, rendered for user-facing messages.
    pub fn to_human_readable(&self) -> String {
        let mut sorted: Vec<&WorkWindow> = self.windows.iter().collect();
        sorted.sort_by_key(|w| {
            parse_weekday(&w.day).map_or(7, |d| d.num_days_from_monday())
        });
        sorted
            .iter()
            .map(|w| {
                let day = parse_weekday(&w.day)
                    .map_or_else(|| w.day.clone(), |d| d.to_string());
                format!("{day} {}-{}", w.start, w.end)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_minutes(s: &str) -> anyhow::Result<u32> {
    let time = NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| anyhow::anyhow!("invalid time: {s}"))?;
    Ok(time.hour() * 60 + time.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn hours(json: &str) -> WorkingHours {
        WorkingHours::from_json(json).unwrap()
    }

    fn span(start: &str, minutes: u32) -> SlotSpan {
        SlotSpan::starting_at(NaiveTime::parse_from_str(start, "%H:%M").unwrap(), minutes)
            .unwrap()
    }

    // 2025-06-16 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    #[test]
    fn parse_valid() {
        let h = hours(r#"{"windows":[{"day":"mon","start":"09:00","end":"17:00"}]}"#);
        assert_eq!(h.windows.len(), 1);
    }

    #[test]
    fn parse_rejects_bad_day() {
        assert!(WorkingHours::from_json(
            r#"{"windows":[{"day":"xyz","start":"09:00","end":"17:00"}]}"#
        )
        .is_err());
    }

    #[test]
    fn parse_rejects_bad_time() {
        assert!(WorkingHours::from_json(
            r#"{"windows":[{"day":"mon","start":"25:00","end":"17:00"}]}"#
        )
        .is_err());
    }

    #[test]
    fn parse_rejects_inverted_window() {
        assert!(WorkingHours::from_json(
            r#"{"windows":[{"day":"mon","start":"17:00","end":"09:00"}]}"#
        )
        .is_err());
    }

    #[test]
    fn covers_inside_window() {
        let h = hours(r#"{"windows":[{"day":"mon","start":"09:00","end":"17:00"}]}"#);
        assert!(h.covers(monday(), &span("09:00", 60)));
        assert!(h.covers(monday(), &span("16:00", 60)));
    }

    #[test]
    fn covers_rejects_outside_window() {
        let h = hours(r#"{"windows":[{"day":"mon","start":"09:00","end":"17:00"}]}"#);
        assert!(!h.covers(monday(), &span("08:00", 60)));
        assert!(!h.covers(monday(), &span("17:00", 30)));
        // Starts inside, ends past closing
        assert!(!h.covers(monday(), &span("16:30", 60)));
    }

    #[test]
    fn covers_rejects_wrong_day() {
        let h = hours(r#"{"windows":[{"day":"mon","start":"09:00","end":"17:00"}]}"#);
        let tuesday = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        assert!(!h.covers(tuesday, &span("10:00", 60)));
    }

    #[test]
    fn empty_schedule_accepts_everything() {
        let h = hours(r#"{"windows":[]}"#);
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert!(h.covers(sunday, &span("20:00", 60)));
    }

    #[test]
    fn human_readable_sorted_by_weekday() {
        let h = hours(
            r#"{"windows":[{"day":"fri","start":"10:00","end":"16:00"},{"day":"mon","start":"09:00","end":"17:00"}]}"#,
        );
        assert_eq!(h.to_human_readable(), "Mon 09:00-17:00, Fri 10:00-16:00");
    }
}

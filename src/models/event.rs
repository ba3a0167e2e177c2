use super::event_status::EventStatus;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;

/// One scheduled attendance session.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEvent {
    pub id: i64,
    pub date: NaiveDate,               // ⇔ attendance_events.date (TEXT "YYYY-MM-DD")
    pub label: String,                 // ⇔ attendance_events.label
    pub cohort: Option<String>,        // ⇔ attendance_events.cohort (NULL = everybody)
    pub time_in: NaiveTime,            // ⇔ attendance_events.time_in (TEXT "HH:MM")
    pub time_out: NaiveTime,           // ⇔ attendance_events.time_out (TEXT "HH:MM")
    pub in_grace_minutes: i64,         // ⇔ attendance_events.in_grace_minutes
    pub out_grace_minutes: i64,        // ⇔ attendance_events.out_grace_minutes
    pub status: EventStatus,           // ⇔ attendance_events.status ('active' | 'closed')
    pub closed_at: Option<String>,     // ⇔ attendance_events.closed_at (ISO8601, NULL while active)
}

impl AttendanceEvent {
    /// Build a new active event, as the event-management flow would.
    /// `id` is 0 until the row is inserted.
    pub fn new(
        date: NaiveDate,
        label: &str,
        time_in: NaiveTime,
        in_grace_minutes: i64,
        time_out: NaiveTime,
        out_grace_minutes: i64,
    ) -> Self {
        Self {
            id: 0,
            date,
            label: label.to_string(),
            cohort: None,
            time_in,
            time_out,
            in_grace_minutes,
            out_grace_minutes,
            status: EventStatus::Active,
            closed_at: None,
        }
    }

    pub fn with_cohort(mut self, cohort: &str) -> Self {
        self.cohort = Some(cohort.to_string());
        self
    }

    /// Last instant at which a check-in is still on time.
    /// `None` when the grace period does not fit the calendar.
    pub fn check_in_deadline(&self) -> Option<NaiveDateTime> {
        self.deadline(self.time_in, self.in_grace_minutes)
    }

    /// Last instant at which a check-out is still on time.
    pub fn check_out_deadline(&self) -> Option<NaiveDateTime> {
        self.deadline(self.time_out, self.out_grace_minutes)
    }

    fn deadline(&self, at: NaiveTime, grace_minutes: i64) -> Option<NaiveDateTime> {
        let grace = TimeDelta::try_minutes(grace_minutes)?;
        self.date.and_time(at).checked_add_signed(grace)
    }

    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

use super::presence::PresenceLabel;
use chrono::NaiveDateTime;
use serde::Serialize;

/// One member's check-in/check-out evidence for one event.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub event_id: i64,
    pub member_id: i64,
    pub time_in: Option<NaiveDateTime>,
    pub time_out: Option<NaiveDateTime>,
    pub presence: PresenceLabel,
    pub photo: Option<String>,
}

impl AttendanceRecord {
    pub fn new(event_id: i64, member_id: i64) -> Self {
        Self {
            id: 0,
            event_id,
            member_id,
            time_in: None,
            time_out: None,
            presence: PresenceLabel::AbsentPending,
            photo: None,
        }
    }

    pub fn checked_in(mut self, at: NaiveDateTime) -> Self {
        self.time_in = Some(at);
        self
    }

    pub fn checked_out(mut self, at: NaiveDateTime) -> Self {
        self.time_out = Some(at);
        self
    }

    pub fn has_activity(&self) -> bool {
        self.time_in.is_some() || self.time_out.is_some()
    }
}

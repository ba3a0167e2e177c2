//! Window evaluation: pure classification of one member's compliance with
//! one event's check-in/check-out windows at a given instant.
//!
//! Deadlines are inclusive for the member: a check-in stamped exactly at
//! the deadline is on time, and the window counts as closed from the
//! deadline instant onwards.

use crate::errors::{AppError, AppResult};
use crate::models::cause::SanctionCause;
use crate::models::event::AttendanceEvent;
use crate::models::record::AttendanceRecord;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// When a member with no attendance evidence becomes "Absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsencePolicy {
    /// Only once the check-out window has closed too. A late arrival is
    /// still possible until then and must not be fined as absent.
    #[default]
    AfterCheckOutWindow,
    /// As soon as the check-in window has closed.
    AfterCheckInWindow,
}

pub const DEFAULT_ABSENCE_POLICY: AbsencePolicy = AbsencePolicy::AfterCheckOutWindow;

/// Which windows of an event have closed at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub check_in_deadline: NaiveDateTime,
    pub check_out_deadline: NaiveDateTime,
    pub check_in_closed: bool,
    pub check_out_closed: bool,
}

impl WindowState {
    /// Fails with `EventWindowOutOfRange` when a grace period pushes a
    /// deadline past what the calendar can represent.
    pub fn at(event: &AttendanceEvent, now: NaiveDateTime) -> AppResult<Self> {
        let out_of_range = || AppError::EventWindowOutOfRange(event.id);
        let check_in_deadline = event.check_in_deadline().ok_or_else(out_of_range)?;
        let check_out_deadline = event.check_out_deadline().ok_or_else(out_of_range)?;
        Ok(Self {
            check_in_deadline,
            check_out_deadline,
            check_in_closed: now >= check_in_deadline,
            check_out_closed: now >= check_out_deadline,
        })
    }
}

/// Causes a member deserves for `event` as of `now`.
///
/// The result is empty (no verdict), exactly `[Absent]`, or a subset of
/// `[NoTimeIn, NoTimeOut]` in that order. `Absent` never appears together
/// with another cause. A record with neither timestamp is treated like no
/// record at all.
pub fn evaluate(
    event: &AttendanceEvent,
    record: Option<&AttendanceRecord>,
    now: NaiveDateTime,
    policy: AbsencePolicy,
) -> AppResult<Vec<SanctionCause>> {
    if event.status.is_closed() {
        return Ok(Vec::new());
    }

    let windows = WindowState::at(event, now)?;
    if !windows.check_in_closed {
        return Ok(Vec::new());
    }

    let Some(rec) = record.filter(|r| r.has_activity()) else {
        let absence_final = match policy {
            AbsencePolicy::AfterCheckOutWindow => windows.check_out_closed,
            AbsencePolicy::AfterCheckInWindow => true,
        };
        return Ok(if absence_final {
            vec![SanctionCause::Absent]
        } else {
            Vec::new()
        });
    };

    let mut causes = Vec::with_capacity(2);

    let on_time_in = rec
        .time_in
        .is_some_and(|t| t <= windows.check_in_deadline);
    if !on_time_in {
        causes.push(SanctionCause::NoTimeIn);
    }

    if windows.check_out_closed {
        let on_time_out = rec
            .time_out
            .is_some_and(|t| t <= windows.check_out_deadline);
        if !on_time_out {
            causes.push(SanctionCause::NoTimeOut);
        }
    }

    Ok(causes)
}

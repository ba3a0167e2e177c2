//! Data-access contracts consumed by the reconciliation engine.
//!
//! The engine reads events and records, and writes only sanctions. SQLite
//! implementations live in `crate::db::store`.

use crate::errors::AppResult;
use crate::models::cause::SanctionCause;
use crate::models::event::AttendanceEvent;
use crate::models::record::AttendanceRecord;
use crate::models::sanction::{NewSanction, Sanction};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub trait AttendanceStore {
    /// Events scheduled on `date` whose status is still active.
    ///
    /// Each event is decoded on its own: a malformed row comes back as an
    /// `Err` entry and does not hide the other events of the day.
    fn active_events_on(&self, date: NaiveDate) -> AppResult<Vec<AppResult<AttendanceEvent>>>;

    fn record_for(&self, event_id: i64, member_id: i64) -> AppResult<Option<AttendanceRecord>>;

    fn find_sanction(
        &self,
        member_id: i64,
        event_id: i64,
        cause: SanctionCause,
    ) -> AppResult<Option<Sanction>>;

    /// Must be backed by a unique (member, event, cause) key and report a
    /// conflict as `AppError::DuplicateSanction`.
    fn insert_sanction(&self, new: &NewSanction) -> AppResult<Sanction>;
}

pub trait RosterProvider {
    fn roster_for(&self, event: &AttendanceEvent) -> AppResult<BTreeSet<i64>>;
}

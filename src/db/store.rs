//! SQLite-backed attendance store and roster provider.

use crate::core::store::{AttendanceStore, RosterProvider};
use crate::db::queries;
use crate::errors::AppResult;
use crate::models::cause::SanctionCause;
use crate::models::event::AttendanceEvent;
use crate::models::record::AttendanceRecord;
use crate::models::sanction::{NewSanction, Sanction};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::BTreeSet;

pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl AttendanceStore for SqliteStore<'_> {
    fn active_events_on(&self, date: NaiveDate) -> AppResult<Vec<AppResult<AttendanceEvent>>> {
        queries::load_active_events_each(self.conn, &date)
    }

    fn record_for(&self, event_id: i64, member_id: i64) -> AppResult<Option<AttendanceRecord>> {
        queries::load_record(self.conn, event_id, member_id)
    }

    fn find_sanction(
        &self,
        member_id: i64,
        event_id: i64,
        cause: SanctionCause,
    ) -> AppResult<Option<Sanction>> {
        queries::find_sanction(self.conn, member_id, event_id, cause)
    }

    fn insert_sanction(&self, new: &NewSanction) -> AppResult<Sanction> {
        queries::insert_sanction(self.conn, new)
    }
}

/// Roster = active members of the event's cohort (all active members when
/// the event has no cohort).
pub struct SqliteRoster<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRoster<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl RosterProvider for SqliteRoster<'_> {
    fn roster_for(&self, event: &AttendanceEvent) -> AppResult<BTreeSet<i64>> {
        queries::load_roster(self.conn, event.cohort.as_deref())
    }
}

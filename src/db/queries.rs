use crate::errors::{AppError, AppResult};
use crate::models::cause::SanctionCause;
use crate::models::event::AttendanceEvent;
use crate::models::event_status::EventStatus;
use crate::models::money::Money;
use crate::models::presence::PresenceLabel;
use crate::models::record::AttendanceRecord;
use crate::models::sanction::{NewSanction, Sanction};
use crate::models::sanction_status::SanctionStatus;
use crate::utils::time::{format_datetime, format_time, parse_datetime};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::ffi;
use rusqlite::{Connection, OptionalExtension, Result, Row, ToSql, params};
use std::collections::BTreeSet;

const EVENT_COLUMNS: &str = "id, date, label, cohort, time_in, time_out, \
     in_grace_minutes, out_grace_minutes, status, closed_at";

const RECORD_COLUMNS: &str = "id, event_id, member_id, time_in, time_out, presence, photo";

const SANCTION_COLUMNS: &str =
    "id, member_id, event_id, cause, amount_cents, status, paid_at, created_at";

// ------------------------------------------------
// Row mapping
// ------------------------------------------------

fn conversion_err(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_opt_datetime(row: &Row, col: &str, idx: usize) -> Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(col)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| conversion_err(idx, AppError::InvalidDateTime(s))),
    }
}

pub fn map_event_row(row: &Row) -> Result<AttendanceEvent> {
    let date_str: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|_| conversion_err(1, AppError::InvalidDate(date_str.clone())))?;

    let parse_hhmm = |col: &str, idx: usize| -> Result<NaiveTime> {
        let s: String = row.get(col)?;
        NaiveTime::parse_from_str(&s, "%H:%M")
            .map_err(|_| conversion_err(idx, AppError::InvalidTime(s.clone())))
    };
    let time_in = parse_hhmm("time_in", 4)?;
    let time_out = parse_hhmm("time_out", 5)?;

    let status_str: String = row.get("status")?;
    let status = EventStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_err(8, AppError::InvalidEventStatus(status_str.clone())))?;

    Ok(AttendanceEvent {
        id: row.get("id")?,
        date,
        label: row.get("label")?,
        cohort: row.get("cohort")?,
        time_in,
        time_out,
        in_grace_minutes: row.get("in_grace_minutes")?,
        out_grace_minutes: row.get("out_grace_minutes")?,
        status,
        closed_at: row.get("closed_at")?,
    })
}

pub fn map_record_row(row: &Row) -> Result<AttendanceRecord> {
    let presence: String = row.get("presence")?;
    Ok(AttendanceRecord {
        id: row.get("id")?,
        event_id: row.get("event_id")?,
        member_id: row.get("member_id")?,
        time_in: parse_opt_datetime(row, "time_in", 3)?,
        time_out: parse_opt_datetime(row, "time_out", 4)?,
        presence: PresenceLabel::from_label(&presence),
        photo: row.get("photo")?,
    })
}

pub fn map_sanction_row(row: &Row) -> Result<Sanction> {
    let cause_str: String = row.get("cause")?;
    let cause = SanctionCause::from_db_str(&cause_str)
        .ok_or_else(|| conversion_err(3, AppError::InvalidCause(cause_str.clone())))?;

    let status_str: String = row.get("status")?;
    let status = SanctionStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_err(5, AppError::InvalidStatus(status_str.clone())))?;

    Ok(Sanction {
        id: row.get("id")?,
        member_id: row.get("member_id")?,
        event_id: row.get("event_id")?,
        amount: Money::from_cents(row.get("amount_cents")?),
        cause,
        status,
        paid_at: row.get("paid_at")?,
        created_at: row.get("created_at")?,
    })
}

// ------------------------------------------------
// Members / roster
// ------------------------------------------------

pub fn insert_member(
    conn: &Connection,
    name: &str,
    cohort: Option<&str>,
    active: bool,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO members (name, cohort, active) VALUES (?1, ?2, ?3)",
        params![name, cohort, if active { 1 } else { 0 }],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Active members expected at an event of the given cohort.
/// `None` means the event is open to every active member.
pub fn load_roster(conn: &Connection, cohort: Option<&str>) -> AppResult<BTreeSet<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM members
         WHERE active = 1 AND (?1 IS NULL OR cohort = ?1)
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([cohort], |row| row.get::<_, i64>(0))?;

    let mut out = BTreeSet::new();
    for r in rows {
        out.insert(r?);
    }
    Ok(out)
}

// ------------------------------------------------
// Attendance events
// ------------------------------------------------

pub fn insert_event(conn: &Connection, ev: &AttendanceEvent) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO attendance_events
            (date, label, cohort, time_in, time_out, in_grace_minutes, out_grace_minutes, status, closed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            ev.date_str(),
            ev.label,
            ev.cohort,
            format_time(&ev.time_in),
            format_time(&ev.time_out),
            ev.in_grace_minutes,
            ev.out_grace_minutes,
            ev.status.to_db_str(),
            ev.closed_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_event(conn: &Connection, id: i64) -> AppResult<Option<AttendanceEvent>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM attendance_events WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_event_row).optional()?)
}

/// Every event of a day, whatever its status.
pub fn load_events_by_date(conn: &Connection, date: &NaiveDate) -> AppResult<Vec<AttendanceEvent>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM attendance_events
         WHERE date = ?1
         ORDER BY time_in ASC, id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;

    let date_str = date.format("%Y-%m-%d").to_string();
    let rows = stmt.query_map([date_str], map_event_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Active events of a day, decoded row by row. The outer error covers the id
/// lookup only; a row that fails to decode is returned as its own `Err`.
pub fn load_active_events_each(
    conn: &Connection,
    date: &NaiveDate,
) -> AppResult<Vec<AppResult<AttendanceEvent>>> {
    let ids = {
        let mut stmt = conn.prepare_cached(
            "SELECT id FROM attendance_events
             WHERE date = ?1 AND status = 'active'
             ORDER BY time_in ASC, id ASC",
        )?;
        let date_str = date.format("%Y-%m-%d").to_string();
        let rows = stmt.query_map([date_str], |row| row.get::<_, i64>(0))?;
        rows.collect::<Result<Vec<i64>>>()?
    };

    Ok(ids
        .into_iter()
        .map(|id| load_event(conn, id)?.ok_or(AppError::EventNotFound(id)))
        .collect())
}

/// Close an active event. Returns `false` if it was already closed.
/// Closing is terminal: a closed event is never reopened.
pub fn close_event(conn: &Connection, id: i64, at: &NaiveDateTime) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE attendance_events
            SET status = 'closed', closed_at = ?2
          WHERE id = ?1 AND status = 'active'",
        params![id, format_datetime(at)],
    )?;

    if changed == 1 {
        return Ok(true);
    }

    match load_event(conn, id)? {
        Some(_) => Ok(false),
        None => Err(AppError::EventNotFound(id)),
    }
}

// ------------------------------------------------
// Attendance records
// ------------------------------------------------

/// Insert or update the record for (event, member). Used by the capture flow
/// and by fixtures; the reconciliation engine never writes records.
pub fn upsert_record(conn: &Connection, rec: &AttendanceRecord) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO attendance_records (event_id, member_id, time_in, time_out, presence, photo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(event_id, member_id) DO UPDATE SET
            time_in  = excluded.time_in,
            time_out = excluded.time_out,
            presence = excluded.presence,
            photo    = excluded.photo",
        params![
            rec.event_id,
            rec.member_id,
            rec.time_in.as_ref().map(format_datetime),
            rec.time_out.as_ref().map(format_datetime),
            rec.presence.to_db_str(),
            rec.photo,
        ],
    )?;

    let id: i64 = conn.query_row(
        "SELECT id FROM attendance_records WHERE event_id = ?1 AND member_id = ?2",
        params![rec.event_id, rec.member_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub fn load_record(
    conn: &Connection,
    event_id: i64,
    member_id: i64,
) -> AppResult<Option<AttendanceRecord>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records
         WHERE event_id = ?1 AND member_id = ?2"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt
        .query_row(params![event_id, member_id], map_record_row)
        .optional()?)
}

// ------------------------------------------------
// Sanctions
// ------------------------------------------------

pub fn find_sanction(
    conn: &Connection,
    member_id: i64,
    event_id: i64,
    cause: SanctionCause,
) -> AppResult<Option<Sanction>> {
    let sql = format!(
        "SELECT {SANCTION_COLUMNS} FROM sanctions
         WHERE member_id = ?1 AND event_id = ?2 AND cause = ?3"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt
        .query_row(params![member_id, event_id, cause.to_db_str()], map_sanction_row)
        .optional()?)
}

pub fn load_sanction(conn: &Connection, id: i64) -> AppResult<Option<Sanction>> {
    let sql = format!("SELECT {SANCTION_COLUMNS} FROM sanctions WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_sanction_row).optional()?)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

/// Plain INSERT: a concurrent writer that got there first surfaces as
/// `AppError::DuplicateSanction` instead of being silently ignored.
pub fn insert_sanction(conn: &Connection, new: &NewSanction) -> AppResult<Sanction> {
    let created_at = Local::now().to_rfc3339();

    let res = conn.execute(
        "INSERT INTO sanctions (member_id, event_id, cause, amount_cents, status, paid_at, created_at)
         VALUES (?1, ?2, ?3, ?4, 'unpaid', NULL, ?5)",
        params![
            new.member_id,
            new.event_id,
            new.cause.to_db_str(),
            new.amount.cents(),
            created_at,
        ],
    );

    match res {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::DuplicateSanction {
                member_id: new.member_id,
                event_id: new.event_id,
                cause: new.cause.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Sanction {
        id: conn.last_insert_rowid(),
        member_id: new.member_id,
        event_id: new.event_id,
        amount: new.amount,
        cause: new.cause,
        status: SanctionStatus::Unpaid,
        paid_at: None,
        created_at,
    })
}

/// Filters for `list_sanctions`; every field is optional.
#[derive(Debug, Default, Clone)]
pub struct SanctionFilter {
    pub date: Option<NaiveDate>,
    pub event_id: Option<i64>,
    pub member_id: Option<i64>,
    pub status: Option<SanctionStatus>,
}

pub fn list_sanctions(conn: &Connection, filter: &SanctionFilter) -> AppResult<Vec<Sanction>> {
    let mut sql = String::from(
        "SELECT s.id, s.member_id, s.event_id, s.cause, s.amount_cents, s.status, s.paid_at, s.created_at
         FROM sanctions s
         JOIN attendance_events e ON e.id = s.event_id
         WHERE 1 = 1",
    );
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(d) = filter.date {
        sql.push_str(" AND e.date = ?");
        values.push(Box::new(d.format("%Y-%m-%d").to_string()));
    }
    if let Some(id) = filter.event_id {
        sql.push_str(" AND s.event_id = ?");
        values.push(Box::new(id));
    }
    if let Some(id) = filter.member_id {
        sql.push_str(" AND s.member_id = ?");
        values.push(Box::new(id));
    }
    if let Some(st) = filter.status {
        sql.push_str(" AND s.status = ?");
        values.push(Box::new(st.to_db_str()));
    }
    sql.push_str(" ORDER BY e.date ASC, s.event_id ASC, s.member_id ASC, s.cause ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
        map_sanction_row,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Move an unpaid sanction to `paid` or `excused`.
/// Terminal sanctions are never touched again.
pub fn settle_sanction(
    conn: &Connection,
    id: i64,
    status: SanctionStatus,
    paid_at: Option<&NaiveDateTime>,
) -> AppResult<Sanction> {
    if !status.is_terminal() {
        return Err(AppError::InvalidStatus(status.to_string()));
    }

    let changed = conn.execute(
        "UPDATE sanctions
            SET status = ?2, paid_at = ?3
          WHERE id = ?1 AND status = 'unpaid'",
        params![id, status.to_db_str(), paid_at.map(format_datetime)],
    )?;

    let current = load_sanction(conn, id)?.ok_or(AppError::SanctionNotFound(id))?;

    if changed == 0 {
        return Err(AppError::InvalidTransition {
            id,
            status: current.status.to_string(),
        });
    }

    Ok(current)
}

// ------------------------------------------------
// Counters (db --info)
// ------------------------------------------------

pub fn count_rows(conn: &Connection, table: &str) -> AppResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

pub fn count_sanctions_by_status(conn: &Connection) -> AppResult<Vec<(SanctionStatus, i64, Money)>> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*), COALESCE(SUM(amount_cents), 0)
         FROM sanctions GROUP BY status ORDER BY status ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let status: String = row.get(0)?;
        let status = SanctionStatus::from_db_str(&status)
            .ok_or_else(|| conversion_err(0, AppError::InvalidStatus(status.clone())))?;
        Ok((status, row.get(1)?, Money::from_cents(row.get(2)?)))
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

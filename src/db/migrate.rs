//! Schema migrations.
//!
//! Each migration runs once; applied versions are recorded in the `log`
//! table as `migration_applied` rows, so the runner is safe to call on
//! every start-up.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, Result};
use tracing::info;

/// Ensure that the `log` table exists. It doubles as the migration ledger.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )
}

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20251101_0001_members",
        description: "Create members table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS members (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL,
            cohort  TEXT,
            active  INTEGER NOT NULL DEFAULT 1 CHECK(active IN (0,1))
        );
        CREATE INDEX IF NOT EXISTS idx_members_cohort ON members(cohort, active);
        "#,
    },
    Migration {
        version: "20251101_0002_attendance_events",
        description: "Create attendance_events table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS attendance_events (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            date               TEXT NOT NULL,
            label              TEXT NOT NULL DEFAULT '',
            cohort             TEXT,
            time_in            TEXT NOT NULL,
            time_out           TEXT NOT NULL,
            in_grace_minutes   INTEGER NOT NULL DEFAULT 0 CHECK(in_grace_minutes >= 0),
            out_grace_minutes  INTEGER NOT NULL DEFAULT 0 CHECK(out_grace_minutes >= 0),
            status             TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','closed')),
            closed_at          TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_attendance_events_date_status
            ON attendance_events(date, status);
        "#,
    },
    Migration {
        version: "20251101_0003_attendance_records",
        description: "Create attendance_records table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS attendance_records (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id   INTEGER NOT NULL REFERENCES attendance_events(id),
            member_id  INTEGER NOT NULL REFERENCES members(id),
            time_in    TEXT,
            time_out   TEXT,
            presence   TEXT NOT NULL DEFAULT '',
            photo      TEXT,
            UNIQUE(event_id, member_id)
        );
        "#,
    },
    Migration {
        version: "20251101_0004_sanctions",
        description: "Create sanctions table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS sanctions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id     INTEGER NOT NULL REFERENCES members(id),
            event_id      INTEGER NOT NULL REFERENCES attendance_events(id),
            cause         TEXT NOT NULL CHECK(cause IN ('Absent','No time in','No time out')),
            amount_cents  INTEGER NOT NULL CHECK(amount_cents >= 0),
            status        TEXT NOT NULL DEFAULT 'unpaid' CHECK(status IN ('unpaid','paid','excused')),
            paid_at       TEXT,
            created_at    TEXT NOT NULL,
            UNIQUE(member_id, event_id, cause)
        );
        CREATE INDEX IF NOT EXISTS idx_sanctions_event ON sanctions(event_id);
        "#,
    },
    Migration {
        version: "20251101_0005_job_locks",
        description: "Create job_locks lease table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS job_locks (
            name         TEXT PRIMARY KEY,
            holder       TEXT NOT NULL,
            acquired_at  INTEGER NOT NULL,
            expires_at   INTEGER NOT NULL
        );
        "#,
    },
];

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(m.sql)?;
    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.version, m.description],
    )?;
    tx.commit()
}

/// Versions not yet applied, in order.
pub fn pending_migrations(conn: &Connection) -> Result<Vec<&'static str>> {
    ensure_log_table(conn)?;
    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            out.push(m.version);
        }
    }
    Ok(out)
}

/// Public entry point: run all pending migrations.
///
/// Invocata da db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_log_table(conn)?;

    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m).map_err(|e| {
            AppError::Migration(format!("{} ({}): {}", m.version, m.description, e))
        })?;
        info!(version = m.version, "migration applied");
    }

    Ok(())
}

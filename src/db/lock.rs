//! Lease lock backed by the `job_locks` table.
//!
//! Every process sharing the database file competes for the same row, so
//! this is the cluster-wide lock for deployments that share one SQLite file.

use crate::core::lock::{Lease, LockService, lease_expiry};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};

pub struct SqliteLockService<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteLockService<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Current lease for `name`, expired or not.
    pub fn current(&self, name: &str) -> AppResult<Option<Lease>> {
        let row = self
            .conn
            .query_row(
                "SELECT holder, expires_at FROM job_locks WHERE name = ?1",
                [name],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((holder, expires_ms)) => {
                let expires_at = DateTime::<Utc>::from_timestamp_millis(expires_ms)
                    .ok_or_else(|| AppError::Other(format!("bad lease expiry: {expires_ms}")))?;
                Ok(Some(Lease {
                    name: name.to_string(),
                    holder,
                    expires_at,
                }))
            }
        }
    }
}

impl LockService for SqliteLockService<'_> {
    fn try_acquire_at(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Lease>> {
        let expires_at = lease_expiry(now, ttl)?;

        // Single statement: insert, or take over only an expired lease.
        let changed = self.conn.execute(
            "INSERT INTO job_locks (name, holder, acquired_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                holder      = excluded.holder,
                acquired_at = excluded.acquired_at,
                expires_at  = excluded.expires_at
             WHERE job_locks.expires_at <= excluded.acquired_at",
            params![
                name,
                holder,
                now.timestamp_millis(),
                expires_at.timestamp_millis()
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        Ok(Some(Lease {
            name: name.to_string(),
            holder: holder.to_string(),
            expires_at,
        }))
    }

    fn release(&self, lease: &Lease) -> AppResult<()> {
        self.conn.execute(
            "DELETE FROM job_locks WHERE name = ?1 AND holder = ?2",
            params![lease.name, lease.holder],
        )?;
        Ok(())
    }
}

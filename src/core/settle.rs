//! External mutation paths around the engine: settling sanctions and
//! closing events. The reconciliation job never calls these.

use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::models::sanction::Sanction;
use crate::models::sanction_status::SanctionStatus;
use chrono::NaiveDateTime;

pub struct SettleLogic;

impl SettleLogic {
    /// Record a payment (the payment itself happens elsewhere).
    pub fn pay(pool: &DbPool, id: i64, at: NaiveDateTime) -> AppResult<Sanction> {
        let s = queries::settle_sanction(&pool.conn, id, SanctionStatus::Paid, Some(&at))?;
        ttlog_quiet(
            &pool.conn,
            "pay",
            &format!("sanction {}", id),
            &format!("{} for '{}' paid by member {}", s.amount, s.cause, s.member_id),
        );
        Ok(s)
    }

    pub fn excuse(pool: &DbPool, id: i64) -> AppResult<Sanction> {
        let s = queries::settle_sanction(&pool.conn, id, SanctionStatus::Excused, None)?;
        ttlog_quiet(
            &pool.conn,
            "excuse",
            &format!("sanction {}", id),
            &format!("'{}' excused for member {}", s.cause, s.member_id),
        );
        Ok(s)
    }
}

pub struct EventLogic;

impl EventLogic {
    /// Administrative close. Returns `false` if the event was already closed.
    pub fn close(pool: &DbPool, id: i64, at: NaiveDateTime) -> AppResult<bool> {
        let closed = queries::close_event(&pool.conn, id, &at)?;
        if closed {
            ttlog_quiet(&pool.conn, "close_event", &format!("event {}", id), "Event closed");
        }
        Ok(closed)
    }
}

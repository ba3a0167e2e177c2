//! Wiring of the reconciliation job to the SQLite store, plus the
//! fixed-interval trigger used by `schedule`.

use crate::config::Config;
use crate::core::job::{JobSettings, ReconciliationJob};
use crate::core::tariff::ConfigTariff;
use crate::db::lock::SqliteLockService;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::store::{SqliteRoster, SqliteStore};
use crate::errors::AppResult;
use crate::models::run_summary::RunOutcome;
use crate::utils::date::today;
use crate::utils::time::now_local;
use chrono::{NaiveDate, NaiveDateTime};
use std::time::{Duration, Instant};
use tracing::{error, info};

pub struct RunLogic;

impl RunLogic {
    /// One reconciliation pass for `date` evaluated at `now`.
    /// The outcome is also written to the internal log table.
    pub fn execute(
        pool: &DbPool,
        cfg: &Config,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> AppResult<RunOutcome> {
        let store = SqliteStore::new(&pool.conn);
        let roster = SqliteRoster::new(&pool.conn);
        let tariff = ConfigTariff::from_config(cfg);
        let locks = SqliteLockService::new(&pool.conn);

        let job = ReconciliationJob::new(&store, &roster, &tariff, &locks, JobSettings::from(cfg));
        let outcome = job.run_at(date, now)?;

        let target = date.format("%Y-%m-%d").to_string();
        match &outcome {
            RunOutcome::Skipped { lock } => ttlog_quiet(
                &pool.conn,
                "reconcile_skipped",
                &target,
                &format!("lock '{}' held by another pass", lock),
            ),
            RunOutcome::Completed(s) => ttlog_quiet(
                &pool.conn,
                "reconcile",
                &target,
                &format!(
                    "events={} members={} created={} present={} terminal={} config_skipped={} errored={}",
                    s.events,
                    s.members,
                    s.created,
                    s.already_present,
                    s.skipped_terminal,
                    s.config_skipped,
                    s.errored
                ),
            ),
        }

        Ok(outcome)
    }

    /// Fire a pass for "today" every `interval`. Ticks that fall due while a
    /// pass is still running are dropped, not queued. Stops after
    /// `max_ticks` passes when given, otherwise runs forever.
    pub fn schedule<F>(
        pool: &DbPool,
        cfg: &Config,
        interval: Duration,
        max_ticks: Option<u64>,
        mut on_tick: F,
    ) -> AppResult<u64>
    where
        F: FnMut(u64, &AppResult<RunOutcome>),
    {
        let mut ticks = 0u64;
        let mut next = Instant::now();

        loop {
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            }

            ticks += 1;
            let result = Self::execute(pool, cfg, today(), now_local());
            if let Err(e) = &result {
                error!(tick = ticks, error = %e, "reconciliation tick failed");
            }
            on_tick(ticks, &result);

            if max_ticks.is_some_and(|max| ticks >= max) {
                return Ok(ticks);
            }

            next += interval;
            let mut dropped = 0u32;
            while next <= Instant::now() {
                next += interval;
                dropped += 1;
            }
            if dropped > 0 {
                info!(dropped, "pass overran the interval, missed ticks dropped");
            }
        }
    }
}

//! Reconciliation job: one end-to-end pass for a target date.
//!
//! lock → active events of the day → roster → record per member →
//! window verdict → ledger. Errors are confined to the smallest unit (event,
//! member or cause) and counted; the pass itself never fails once the lock
//! is held.

use crate::config::Config;
use crate::core::ledger::{LedgerOutcome, SanctionLedger};
use crate::core::lock::{LockGuard, LockService, holder_id};
use crate::core::store::{AttendanceStore, RosterProvider};
use crate::core::tariff::TariffPolicy;
use crate::core::window::{AbsencePolicy, WindowState, evaluate};
use crate::errors::AppResult;
use crate::models::cause::SanctionCause;
use crate::models::event::AttendanceEvent;
use crate::models::run_summary::{RunOutcome, RunSummary};
use crate::utils::time::now_local;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct JobSettings {
    pub lock_name: String,
    pub lease: Duration,
    pub absence_policy: AbsencePolicy,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            lock_name: crate::config::DEFAULT_LOCK_NAME.to_string(),
            lease: Duration::minutes(10),
            absence_policy: AbsencePolicy::default(),
        }
    }
}

impl From<&Config> for JobSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            lock_name: cfg.lock_name.clone(),
            lease: cfg.lock_lease(),
            absence_policy: cfg.absence_policy,
        }
    }
}

pub struct ReconciliationJob<'a> {
    store: &'a dyn AttendanceStore,
    roster: &'a dyn RosterProvider,
    tariff: &'a dyn TariffPolicy,
    locks: &'a dyn LockService,
    settings: JobSettings,
}

/// Per-pass mutable state.
struct Pass {
    summary: RunSummary,
    disabled_causes: HashSet<SanctionCause>,
}

impl<'a> ReconciliationJob<'a> {
    pub fn new(
        store: &'a dyn AttendanceStore,
        roster: &'a dyn RosterProvider,
        tariff: &'a dyn TariffPolicy,
        locks: &'a dyn LockService,
        settings: JobSettings,
    ) -> Self {
        Self {
            store,
            roster,
            tariff,
            locks,
            settings,
        }
    }

    /// Scheduler entry point: evaluate against the current local time.
    pub fn run(&self, date: NaiveDate) -> AppResult<RunOutcome> {
        self.run_at(date, now_local())
    }

    /// Run one pass for `date`, judging deadlines against `now`.
    ///
    /// Returns `Skipped` when another pass holds the lock. An `Err` is only
    /// returned when the lock service itself fails.
    pub fn run_at(&self, date: NaiveDate, now: NaiveDateTime) -> AppResult<RunOutcome> {
        let holder = holder_id();
        let lock_name = self.settings.lock_name.as_str();

        let Some(guard) = LockGuard::acquire(self.locks, lock_name, &holder, self.settings.lease)?
        else {
            info!(lock = lock_name, %date, "reconciliation already in flight, skipping tick");
            return Ok(RunOutcome::Skipped {
                lock: lock_name.to_string(),
            });
        };

        debug!(lock = lock_name, %holder, %date, %now, "lock acquired");

        let summary = self.reconcile_date(date, now);

        if let Err(e) = guard.release() {
            warn!(lock = lock_name, %holder, error = %e, "failed to release lock; it will expire");
        }

        info!(
            %date,
            events = summary.events,
            members = summary.members,
            created = summary.created,
            already_present = summary.already_present,
            skipped_terminal = summary.skipped_terminal,
            config_skipped = summary.config_skipped,
            errored = summary.errored,
            "reconciliation pass finished"
        );

        Ok(RunOutcome::Completed(summary))
    }

    fn reconcile_date(&self, date: NaiveDate, now: NaiveDateTime) -> RunSummary {
        let mut pass = Pass {
            summary: RunSummary::default(),
            disabled_causes: HashSet::new(),
        };

        let events = match self.store.active_events_on(date) {
            Ok(events) => events,
            Err(e) => {
                error!(%date, error = %e, "failed to load events");
                pass.summary.errored += 1;
                return pass.summary;
            }
        };

        let ledger = SanctionLedger::new(self.store, self.tariff);

        for loaded in events {
            let event = match loaded {
                Ok(ev) => ev,
                Err(e) => {
                    warn!(%date, error = %e, "failed to decode event, event skipped");
                    pass.summary.errored += 1;
                    continue;
                }
            };

            // Closed events are frozen even if the store hands one back.
            if event.status.is_closed() {
                continue;
            }

            if let Err(e) = WindowState::at(&event, now) {
                warn!(event_id = event.id, error = %e, "unusable event window, event skipped");
                pass.summary.errored += 1;
                continue;
            }
            pass.summary.events += 1;

            let roster = match self.roster.roster_for(&event) {
                Ok(r) => r,
                Err(e) => {
                    warn!(event_id = event.id, error = %e, "failed to load roster, event skipped");
                    pass.summary.errored += 1;
                    continue;
                }
            };

            for member_id in roster {
                pass.summary.members += 1;
                self.reconcile_member(&ledger, &event, member_id, now, &mut pass);
            }
        }

        pass.summary
    }

    fn reconcile_member(
        &self,
        ledger: &SanctionLedger<'_>,
        event: &AttendanceEvent,
        member_id: i64,
        now: NaiveDateTime,
        pass: &mut Pass,
    ) {
        let record = match self.store.record_for(event.id, member_id) {
            Ok(r) => r,
            Err(e) => {
                warn!(event_id = event.id, member_id, error = %e, "failed to load attendance record");
                pass.summary.errored += 1;
                return;
            }
        };

        let causes = match evaluate(event, record.as_ref(), now, self.settings.absence_policy) {
            Ok(c) => c,
            Err(e) => {
                warn!(event_id = event.id, member_id, error = %e, "window evaluation failed");
                pass.summary.errored += 1;
                return;
            }
        };

        for cause in causes {
            if pass.disabled_causes.contains(&cause) {
                pass.summary.config_skipped += 1;
                continue;
            }

            match ledger.reconcile(member_id, event.id, cause) {
                Ok(LedgerOutcome::Created) => {
                    debug!(event_id = event.id, member_id, %cause, "sanction created");
                    pass.summary.created += 1;
                }
                Ok(LedgerOutcome::AlreadyPresent) => pass.summary.already_present += 1,
                Ok(LedgerOutcome::SkippedTerminal) => pass.summary.skipped_terminal += 1,
                Err(e) if e.is_configuration() => {
                    error!(%cause, error = %e, "tariff unusable, cause disabled for this pass");
                    pass.disabled_causes.insert(cause);
                    pass.summary.config_skipped += 1;
                }
                Err(e) => {
                    warn!(event_id = event.id, member_id, %cause, error = %e, "sanction write failed, will retry next tick");
                    pass.summary.errored += 1;
                }
            }
        }
    }
}

//! Sanction ledger: turns a verdict into at most one durable sanction row
//! per (member, event, cause), never touching paid or excused rows.

use crate::core::store::AttendanceStore;
use crate::core::tariff::TariffPolicy;
use crate::errors::{AppError, AppResult};
use crate::models::cause::SanctionCause;
use crate::models::sanction::NewSanction;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOutcome {
    Created,
    AlreadyPresent,
    SkippedTerminal,
}

pub struct SanctionLedger<'a> {
    store: &'a dyn AttendanceStore,
    tariff: &'a dyn TariffPolicy,
}

impl<'a> SanctionLedger<'a> {
    pub fn new(store: &'a dyn AttendanceStore, tariff: &'a dyn TariffPolicy) -> Self {
        Self { store, tariff }
    }

    /// Idempotent: any number of calls with the same key leave one row.
    ///
    /// Errors: store failures propagate unchanged (the caller retries on the
    /// next tick); a missing tariff surfaces as `MissingTariff` before any
    /// write. A unique-key conflict from a concurrent writer is reported as
    /// `AlreadyPresent`.
    pub fn reconcile(
        &self,
        member_id: i64,
        event_id: i64,
        cause: SanctionCause,
    ) -> AppResult<LedgerOutcome> {
        if let Some(existing) = self.store.find_sanction(member_id, event_id, cause)? {
            return Ok(if existing.status.is_terminal() {
                LedgerOutcome::SkippedTerminal
            } else {
                LedgerOutcome::AlreadyPresent
            });
        }

        let amount = self.tariff.amount_for(cause)?;

        let new = NewSanction {
            member_id,
            event_id,
            amount,
            cause,
        };

        match self.store.insert_sanction(&new) {
            Ok(_) => Ok(LedgerOutcome::Created),
            Err(AppError::DuplicateSanction { .. }) => {
                debug!(member_id, event_id, %cause, "sanction created concurrently");
                Ok(LedgerOutcome::AlreadyPresent)
            }
            Err(e) => Err(e),
        }
    }
}

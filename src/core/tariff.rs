//! Sanction cause → amount lookup.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::cause::SanctionCause;
use crate::models::money::Money;
use std::collections::BTreeMap;

pub trait TariffPolicy {
    /// Fails with `MissingTariff` / `InvalidAmount` when the cause has no
    /// usable amount; the caller skips that cause.
    fn amount_for(&self, cause: SanctionCause) -> AppResult<Money>;
}

/// Tariffs read from the `tariffs` section of the configuration file.
/// Amounts are parsed on lookup so one bad entry only disables its cause.
#[derive(Debug, Clone)]
pub struct ConfigTariff {
    amounts: BTreeMap<String, String>,
}

impl ConfigTariff {
    pub fn new(amounts: BTreeMap<String, String>) -> Self {
        Self { amounts }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.tariffs.clone())
    }
}

impl TariffPolicy for ConfigTariff {
    fn amount_for(&self, cause: SanctionCause) -> AppResult<Money> {
        let raw = self
            .amounts
            .get(cause.label())
            .ok_or_else(|| AppError::MissingTariff(cause.to_string()))?;
        raw.parse()
    }
}

/// Fixed in-code tariff table.
#[derive(Debug, Clone, Default)]
pub struct StaticTariff {
    amounts: BTreeMap<SanctionCause, Money>,
}

impl StaticTariff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, cause: SanctionCause, amount: Money) -> Self {
        self.amounts.insert(cause, amount);
        self
    }
}

impl TariffPolicy for StaticTariff {
    fn amount_for(&self, cause: SanctionCause) -> AppResult<Money> {
        self.amounts
            .get(&cause)
            .copied()
            .ok_or_else(|| AppError::MissingTariff(cause.to_string()))
    }
}

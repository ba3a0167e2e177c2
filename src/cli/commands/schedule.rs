use crate::cli::commands::run::print_outcome;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::run::RunLogic;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, info};
use crate::utils::date::today;
use std::time::Duration;

/// Fixed-interval trigger: one pass for today per tick.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Schedule { interval, ticks } = cmd {
        let secs = interval.unwrap_or(cfg.schedule_interval_secs);
        if secs == 0 {
            return Err(AppError::Config("--interval must be positive".into()));
        }

        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        info(format!(
            "Scheduling reconciliation every {}s (lock '{}')",
            secs, cfg.lock_name
        ));

        let done = RunLogic::schedule(
            &pool,
            cfg,
            Duration::from_secs(secs),
            *ticks,
            |n, result| match result {
                Ok(outcome) => {
                    println!("-- tick {} --", n);
                    print_outcome(&today().to_string(), outcome);
                }
                Err(e) => error(format!("tick {} failed: {}", n, e)),
            },
        )?;

        info(format!("Scheduler stopped after {} tick(s)", done));
    }
    Ok(())
}

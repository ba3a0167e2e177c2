use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::run::RunLogic;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::run_summary::{RunOutcome, RunSummary};
use crate::ui::messages::{skipped, success, warning};
use crate::utils::date;
use crate::utils::table::Table;
use crate::utils::time::{now_local, parse_optional_datetime};

/// Run one reconciliation pass.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Run { date, now, json } = cmd {
        let d = date::date_or_today(date.as_ref())?;
        let now = parse_optional_datetime(now.as_ref())?.unwrap_or_else(now_local);

        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        let outcome = RunLogic::execute(&pool, cfg, d, now)?;

        if *json {
            let out = serde_json::to_string_pretty(&outcome)
                .map_err(|e| AppError::Other(e.to_string()))?;
            println!("{}", out);
            return Ok(());
        }

        print_outcome(&d.to_string(), &outcome);
    }
    Ok(())
}

pub fn print_outcome(target: &str, outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Skipped { lock } => {
            skipped(format!(
                "Reconciliation for {} skipped: lock '{}' is held by another pass",
                target, lock
            ));
        }
        RunOutcome::Completed(s) => {
            print!("{}", summary_table(s).render());
            if s.is_clean() {
                success(format!("Reconciliation for {} completed", target));
            } else {
                warning(format!(
                    "Reconciliation for {} completed with {} error(s) and {} skipped cause(s); they will be retried on the next tick",
                    target, s.errored, s.config_skipped
                ));
            }
        }
    }
}

fn summary_table(s: &RunSummary) -> Table {
    let mut t = Table::new(&["EVENTS", "MEMBERS", "CREATED", "PRESENT", "TERMINAL", "CFG-SKIP", "ERRORS"]);
    t.add_row(vec![
        s.events.to_string(),
        s.members.to_string(),
        s.created.to_string(),
        s.already_present.to_string(),
        s.skipped_terminal.to_string(),
        s.config_skipped.to_string(),
        s.errored.to_string(),
    ]);
    t
}

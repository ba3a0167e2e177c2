use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::settle::EventLogic;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::queries::load_events_by_date;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{GREEN, GREY, RESET};
use crate::utils::date::date_or_today;
use crate::utils::table::Table;
use crate::utils::time::{format_time, now_local};

/// List the events of a day, or close one.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Events { date, close } = cmd {
        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        if let Some(id) = close {
            if EventLogic::close(&pool, *id, now_local())? {
                success(format!("Event {} closed", id));
            } else {
                warning(format!("Event {} was already closed", id));
            }
            return Ok(());
        }

        let d = date_or_today(date.as_ref())?;
        let events = load_events_by_date(&pool.conn, &d)?;
        if events.is_empty() {
            info(format!("No events for {}", d));
            return Ok(());
        }

        let mut table = Table::new(&["ID", "LABEL", "COHORT", "IN", "GRACE", "OUT", "GRACE", "STATUS"]);
        for ev in &events {
            let status = if ev.status.is_active() {
                format!("{GREEN}{}{RESET}", ev.status.to_db_str())
            } else {
                format!("{GREY}{}{RESET}", ev.status.to_db_str())
            };
            table.add_row(vec![
                ev.id.to_string(),
                ev.label.clone(),
                ev.cohort.clone().unwrap_or_else(|| "*".to_string()),
                format_time(&ev.time_in),
                format!("{}m", ev.in_grace_minutes),
                format_time(&ev.time_out),
                format!("{}m", ev.out_grace_minutes),
                status,
            ]);
        }
        print!("{}", table.render());
    }
    Ok(())
}

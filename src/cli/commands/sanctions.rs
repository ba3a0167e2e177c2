use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::settle::SettleLogic;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::queries::{SanctionFilter, list_sanctions};
use crate::errors::{AppError, AppResult};
use crate::models::sanction_status::SanctionStatus;
use crate::ui::messages::{info, success};
use crate::utils::colors::{RESET, color_for_status, colorize_optional};
use crate::utils::date::parse_date;
use crate::utils::table::Table;
use crate::utils::time::{now_local, parse_optional_datetime};

/// List sanctions, or settle one with --pay / --excuse.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sanctions {
        date,
        event,
        member,
        status,
        pay,
        at,
        excuse,
    } = cmd
    {
        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        if let Some(id) = pay {
            let at = parse_optional_datetime(at.as_ref())?.unwrap_or_else(now_local);
            let s = SettleLogic::pay(&pool, *id, at)?;
            success(format!("Sanction {} ({}, {}) marked as paid", s.id, s.cause, s.amount));
            return Ok(());
        }

        if let Some(id) = excuse {
            let s = SettleLogic::excuse(&pool, *id)?;
            success(format!("Sanction {} ({}) excused", s.id, s.cause));
            return Ok(());
        }

        let filter = SanctionFilter {
            date: match date {
                Some(d) => Some(parse_date(d).ok_or_else(|| AppError::InvalidDate(d.clone()))?),
                None => None,
            },
            event_id: *event,
            member_id: *member,
            status: match status {
                Some(s) => Some(s.parse::<SanctionStatus>()?),
                None => None,
            },
        };

        let rows = list_sanctions(&pool.conn, &filter)?;
        if rows.is_empty() {
            info("No sanctions found.");
            return Ok(());
        }

        let mut table = Table::new(&["ID", "EVENT", "MEMBER", "CAUSE", "AMOUNT", "STATUS", "PAID AT"]);
        for s in &rows {
            table.add_row(vec![
                s.id.to_string(),
                s.event_id.to_string(),
                s.member_id.to_string(),
                s.cause.to_string(),
                s.amount.to_string(),
                format!("{}{}{}", color_for_status(s.status), s.status, RESET),
                colorize_optional(s.paid_at.as_deref().unwrap_or("--")),
            ]);
        }
        print!("{}", table.render());
    }
    Ok(())
}

use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::table::Table;
use ansi_term::Colour;

const MAX_MESSAGE: usize = 80;

/// Restituisce il colore ANSI in base all'operazione
fn color_for_operation(op: &str) -> Colour {
    match op {
        "reconcile" => Colour::Green,
        "reconcile_skipped" => Colour::Yellow,
        "pay" => Colour::Cyan,
        "excuse" => Colour::Blue,
        "close_event" => Colour::Red,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51), // arancione
        _ => Colour::White,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut t: String = s.chars().take(max - 3).collect();
        t.push_str("...");
        t
    } else {
        s.to_string()
    }
}

pub struct LogLogic;

impl LogLogic {
    /// Rows of the internal log, oldest first: (id, date, operation, target, message).
    pub fn load(pool: &DbPool) -> AppResult<Vec<(i64, String, String, String, String)>> {
        let mut stmt = pool.conn.prepare_cached(
            "SELECT id, date, operation, COALESCE(target, ''), message FROM log ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let raw_date: String = row.get(1)?;
            let date = chrono::DateTime::parse_from_rfc3339(&raw_date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or(raw_date);
            Ok((row.get(0)?, date, row.get(2)?, row.get(3)?, row.get(4)?))
        })?;

        let mut entries = Vec::new();
        for r in rows {
            entries.push(r?);
        }
        Ok(entries)
    }

    pub fn print_log(pool: &DbPool) -> AppResult<()> {
        let entries = Self::load(pool)?;

        println!("📜 Internal log:\n");

        let mut table = Table::new(&["ID", "DATE", "OPERATION", "TARGET", "MESSAGE"]);
        for (id, date, operation, target, message) in entries {
            let color = color_for_operation(&operation);
            table.add_row(vec![
                id.to_string(),
                date,
                color.paint(operation).to_string(),
                target,
                truncate(&message, MAX_MESSAGE),
            ]);
        }

        print!("{}", table.render());
        Ok(())
    }
}

use crate::db::lock::SqliteLockService;
use crate::db::pool::DbPool;
use crate::db::queries::{count_rows, count_sanctions_by_status};
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW, color_for_status};
use chrono::Utc;
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &DbPool, db_path: &str, lock_name: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) ROW COUNTS
    //
    for (label, table) in [
        ("Members", "members"),
        ("Events", "attendance_events"),
        ("Records", "attendance_records"),
        ("Sanctions", "sanctions"),
    ] {
        let n = count_rows(&pool.conn, table)?;
        println!("{}• {}:{} {}{}{}", CYAN, label, RESET, GREEN, n, RESET);
    }

    //
    // 3) SANCTIONS BY STATUS
    //
    let by_status = count_sanctions_by_status(&pool.conn)?;
    if !by_status.is_empty() {
        println!("{}• Sanctions by status:{}", CYAN, RESET);
        for (status, n, total) in by_status {
            println!(
                "    {}{:<8}{} {:>5}  {}",
                color_for_status(status),
                status,
                RESET,
                n,
                total
            );
        }
    }

    //
    // 4) EVENT DATE RANGE
    //
    let range: Option<(Option<String>, Option<String>)> = pool
        .conn
        .query_row(
            "SELECT MIN(date), MAX(date) FROM attendance_events",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (first, last) = range.unwrap_or((None, None));
    println!("{}• Event date range:{}", CYAN, RESET);
    println!(
        "    from: {}",
        first.unwrap_or_else(|| format!("{GREY}--{RESET}"))
    );
    println!(
        "    to:   {}",
        last.unwrap_or_else(|| format!("{GREY}--{RESET}"))
    );

    //
    // 5) LOCK STATE
    //
    let locks = SqliteLockService::new(&pool.conn);
    match locks.current(lock_name)? {
        Some(lease) if lease.expires_at > Utc::now() => println!(
            "{}• Lock '{}':{} held by {} until {}",
            CYAN,
            lock_name,
            RESET,
            lease.holder,
            lease.expires_at.to_rfc3339()
        ),
        Some(lease) => println!(
            "{}• Lock '{}':{} {}expired lease from {}{}",
            CYAN, lock_name, RESET, GREY, lease.holder, RESET
        ),
        None => println!("{}• Lock '{}':{} free", CYAN, lock_name, RESET),
    }

    println!();
    Ok(())
}

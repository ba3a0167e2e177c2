#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rsanctions::db::initialize::init_db;
use rsanctions::db::pool::DbPool;
use rsanctions::db::queries;
use rsanctions::models::event::AttendanceEvent;
use rsanctions::models::record::AttendanceRecord;
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn rsn() -> Command {
    cargo_bin_cmd!("rsanctions")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rsanctions.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Write a configuration file next to the test DB and return its path
pub fn write_config(name: &str, yaml: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rsanctions.conf", name));
    let p = path.to_string_lossy().to_string();
    fs::write(&p, yaml).expect("write config");
    p
}

/// Open (and migrate) a test database through the library API
pub fn open_db(db_path: &str) -> DbPool {
    let pool = DbPool::new(db_path).expect("open db");
    init_db(&pool.conn).expect("init db");
    pool
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
}

pub fn hm(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("time")
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("datetime")
}

/// 2025-11-20, in 08:00 (+30), out 17:00 (+30)
pub fn standard_event() -> AttendanceEvent {
    AttendanceEvent::new(date("2025-11-20"), "General assembly", hm("08:00"), 30, hm("17:00"), 30)
}

pub struct Scenario {
    pub event_id: i64,
    /// No record at all
    pub absent: i64,
    /// In 07:55, out 17:10
    pub compliant: i64,
    /// In 08:45 (late), out 17:05
    pub late: i64,
    /// In 07:58, never checked out
    pub no_out: i64,
}

/// Standard event with four members covering every verdict
pub fn seed_scenario(pool: &DbPool) -> Scenario {
    let conn = &pool.conn;
    let event_id = queries::insert_event(conn, &standard_event()).expect("event");

    let absent = queries::insert_member(conn, "Ada", None, true).expect("member");
    let compliant = queries::insert_member(conn, "Bruno", None, true).expect("member");
    let late = queries::insert_member(conn, "Chiara", None, true).expect("member");
    let no_out = queries::insert_member(conn, "Dario", None, true).expect("member");

    queries::upsert_record(
        conn,
        &AttendanceRecord::new(event_id, compliant)
            .checked_in(at("2025-11-20 07:55"))
            .checked_out(at("2025-11-20 17:10")),
    )
    .expect("record");
    queries::upsert_record(
        conn,
        &AttendanceRecord::new(event_id, late)
            .checked_in(at("2025-11-20 08:45"))
            .checked_out(at("2025-11-20 17:05")),
    )
    .expect("record");
    queries::upsert_record(
        conn,
        &AttendanceRecord::new(event_id, no_out).checked_in(at("2025-11-20 07:58")),
    )
    .expect("record");

    Scenario {
        event_id,
        absent,
        compliant,
        late,
        no_out,
    }
}

mod common;
use common::{at, date, hm, open_db, seed_scenario, setup_test_db};

use chrono::{Duration, NaiveDate, Utc};
use rsanctions::core::job::{JobSettings, ReconciliationJob};
use rsanctions::core::lock::{InMemoryLockService, LockService};
use rsanctions::core::store::AttendanceStore;
use rsanctions::core::tariff::{ConfigTariff, StaticTariff, TariffPolicy};
use rsanctions::core::window::AbsencePolicy;
use rsanctions::db::lock::SqliteLockService;
use rsanctions::db::pool::DbPool;
use rsanctions::db::queries::{self, SanctionFilter};
use rsanctions::db::store::{SqliteRoster, SqliteStore};
use rsanctions::errors::{AppError, AppResult};
use rsanctions::models::cause::SanctionCause;
use rsanctions::models::event::AttendanceEvent;
use rsanctions::models::money::Money;
use rsanctions::models::record::AttendanceRecord;
use rsanctions::models::run_summary::{RunOutcome, RunSummary};
use rsanctions::models::sanction::{NewSanction, Sanction};
use rsanctions::models::sanction_status::SanctionStatus;
use std::collections::BTreeMap;

fn default_tariff() -> ConfigTariff {
    ConfigTariff::new(rsanctions::config::default_tariffs())
}

fn run_sqlite(pool: &DbPool, tariff: &dyn TariffPolicy, now: &str) -> RunOutcome {
    let store = SqliteStore::new(&pool.conn);
    let roster = SqliteRoster::new(&pool.conn);
    let locks = SqliteLockService::new(&pool.conn);
    ReconciliationJob::new(&store, &roster, tariff, &locks, JobSettings::default())
        .run_at(date("2025-11-20"), at(now))
        .expect("run")
}

fn completed(outcome: RunOutcome) -> RunSummary {
    match outcome {
        RunOutcome::Completed(s) => s,
        RunOutcome::Skipped { lock } => panic!("unexpected skip on lock '{}'", lock),
    }
}

fn causes_of(pool: &DbPool, member_id: i64) -> Vec<SanctionCause> {
    let filter = SanctionFilter {
        member_id: Some(member_id),
        ..SanctionFilter::default()
    };
    queries::list_sanctions(&pool.conn, &filter)
        .expect("list")
        .into_iter()
        .map(|s| s.cause)
        .collect()
}

#[test]
fn test_nothing_before_any_deadline_passes() {
    let db_path = setup_test_db("job_before_deadline");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 07:30"));

    assert_eq!(summary.events, 1);
    assert_eq!(summary.members, 4);
    assert_eq!(summary.created, 0);
    assert_eq!(queries::count_rows(&pool.conn, "sanctions").expect("count"), 0);
}

#[test]
fn test_absence_waits_for_check_out_window() {
    let db_path = setup_test_db("job_absence_wait");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 08:31"));

    // Only the late arrival is judged after the check-in window.
    assert_eq!(summary.created, 1);
    assert!(causes_of(&pool, sc.absent).is_empty());
    assert_eq!(causes_of(&pool, sc.late), vec![SanctionCause::NoTimeIn]);
}

#[test]
fn test_full_day_verdicts() {
    let db_path = setup_test_db("job_full_day");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31"));

    assert_eq!(summary.created, 3);
    assert!(summary.is_clean());
    assert_eq!(causes_of(&pool, sc.absent), vec![SanctionCause::Absent]);
    assert!(causes_of(&pool, sc.compliant).is_empty());
    assert_eq!(causes_of(&pool, sc.late), vec![SanctionCause::NoTimeIn]);
    assert_eq!(causes_of(&pool, sc.no_out), vec![SanctionCause::NoTimeOut]);

    let absent = queries::find_sanction(&pool.conn, sc.absent, sc.event_id, SanctionCause::Absent)
        .expect("query")
        .expect("row");
    assert_eq!(absent.amount, Money::from_cents(10_000));
    assert_eq!(absent.status, SanctionStatus::Unpaid);
}

#[test]
fn test_repeated_runs_are_idempotent() {
    let db_path = setup_test_db("job_idempotent");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    let first = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31"));
    let second = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:35"));
    let third = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 23:00"));

    assert_eq!(first.created, 3);
    assert_eq!(second.created, 0);
    assert_eq!(second.already_present, 3);
    assert_eq!(third.created, 0);
    assert_eq!(queries::count_rows(&pool.conn, "sanctions").expect("count"), 3);
}

#[test]
fn test_settled_sanctions_are_not_recreated() {
    let db_path = setup_test_db("job_settled");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31"));

    let absent = queries::find_sanction(&pool.conn, sc.absent, sc.event_id, SanctionCause::Absent)
        .expect("query")
        .expect("row");
    let late = queries::find_sanction(&pool.conn, sc.late, sc.event_id, SanctionCause::NoTimeIn)
        .expect("query")
        .expect("row");
    queries::settle_sanction(
        &pool.conn,
        absent.id,
        SanctionStatus::Paid,
        Some(&at("2025-11-20 18:00")),
    )
    .expect("pay");
    queries::settle_sanction(&pool.conn, late.id, SanctionStatus::Excused, None).expect("excuse");

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 19:00"));

    assert_eq!(summary.created, 0);
    assert_eq!(summary.skipped_terminal, 2);
    assert_eq!(summary.already_present, 1);

    let absent = queries::load_sanction(&pool.conn, absent.id).expect("load").expect("row");
    assert_eq!(absent.status, SanctionStatus::Paid);
    assert_eq!(absent.paid_at.as_deref(), Some("2025-11-20 18:00:00"));
    assert_eq!(queries::count_rows(&pool.conn, "sanctions").expect("count"), 3);
}

#[test]
fn test_closed_event_is_frozen() {
    let db_path = setup_test_db("job_closed_event");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    assert!(queries::close_event(&pool.conn, sc.event_id, &at("2025-11-20 17:00")).expect("close"));

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 23:00"));

    assert_eq!(summary.events, 0);
    assert_eq!(summary.created, 0);
    assert_eq!(queries::count_rows(&pool.conn, "sanctions").expect("count"), 0);
}

#[test]
fn test_other_dates_are_ignored() {
    let db_path = setup_test_db("job_other_dates");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    let store = SqliteStore::new(&pool.conn);
    let roster = SqliteRoster::new(&pool.conn);
    let locks = SqliteLockService::new(&pool.conn);
    let tariff = default_tariff();
    let outcome = ReconciliationJob::new(&store, &roster, &tariff, &locks, JobSettings::default())
        .run_at(date("2025-11-21"), at("2025-11-21 23:00"))
        .expect("run");

    assert_eq!(completed(outcome), RunSummary::default());
}

#[test]
fn test_roster_follows_event_cohort() {
    let db_path = setup_test_db("job_cohort");
    let pool = open_db(&db_path);
    let conn = &pool.conn;

    let ev = AttendanceEvent::new(date("2025-11-20"), "Choir", hm("18:00"), 15, hm("20:00"), 15)
        .with_cohort("choir");
    queries::insert_event(conn, &ev).expect("event");
    let singer = queries::insert_member(conn, "Elena", Some("choir"), true).expect("member");
    let retired = queries::insert_member(conn, "Franco", Some("choir"), false).expect("member");
    let outsider = queries::insert_member(conn, "Gina", Some("band"), true).expect("member");

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 21:00"));

    assert_eq!(summary.members, 1);
    assert_eq!(causes_of(&pool, singer), vec![SanctionCause::Absent]);
    assert!(causes_of(&pool, retired).is_empty());
    assert!(causes_of(&pool, outsider).is_empty());
}

#[test]
fn test_after_check_in_window_policy_marks_absent_early() {
    let db_path = setup_test_db("job_policy_in_window");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    let store = SqliteStore::new(&pool.conn);
    let roster = SqliteRoster::new(&pool.conn);
    let locks = SqliteLockService::new(&pool.conn);
    let tariff = default_tariff();
    let settings = JobSettings {
        absence_policy: AbsencePolicy::AfterCheckInWindow,
        ..JobSettings::default()
    };
    completed(
        ReconciliationJob::new(&store, &roster, &tariff, &locks, settings)
            .run_at(date("2025-11-20"), at("2025-11-20 08:31"))
            .expect("run"),
    );

    assert_eq!(causes_of(&pool, sc.absent), vec![SanctionCause::Absent]);
}

#[test]
fn test_missing_tariff_disables_only_that_cause() {
    let db_path = setup_test_db("job_missing_tariff");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    let tariff = ConfigTariff::new(BTreeMap::from([
        ("Absent".to_string(), "100.00".to_string()),
        ("No time in".to_string(), "25.00".to_string()),
    ]));
    let summary = completed(run_sqlite(&pool, &tariff, "2025-11-20 17:31"));

    assert_eq!(summary.created, 2);
    assert_eq!(summary.config_skipped, 1);
    assert_eq!(summary.errored, 0);
    assert!(causes_of(&pool, sc.no_out).is_empty());

    // Fixing the tariff lets the next pass catch up.
    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:40"));
    assert_eq!(summary.created, 1);
    assert_eq!(causes_of(&pool, sc.no_out), vec![SanctionCause::NoTimeOut]);
}

#[test]
fn test_skipped_when_lock_is_held() {
    let db_path = setup_test_db("job_lock_held");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    let locks = SqliteLockService::new(&pool.conn);
    let other = locks
        .try_acquire("calculate-sanctions", "other-node:1:0", Duration::minutes(10))
        .expect("acquire")
        .expect("lock free");

    let outcome = run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31");
    assert_eq!(
        outcome,
        RunOutcome::Skipped {
            lock: "calculate-sanctions".to_string()
        }
    );
    assert_eq!(queries::count_rows(&pool.conn, "sanctions").expect("count"), 0);

    // The other holder keeps its lease.
    let current = locks.current("calculate-sanctions").expect("current").expect("lease");
    assert_eq!(current.holder, other.holder);
}

#[test]
fn test_expired_lock_is_taken_over() {
    let db_path = setup_test_db("job_lock_expired");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    let locks = SqliteLockService::new(&pool.conn);
    locks
        .try_acquire_at(
            "calculate-sanctions",
            "crashed-node:1:0",
            Duration::minutes(10),
            Utc::now() - Duration::hours(1),
        )
        .expect("acquire")
        .expect("lock free");

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31"));
    assert_eq!(summary.created, 3);
}

#[test]
fn test_lock_released_after_pass() {
    let db_path = setup_test_db("job_lock_released");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31"));

    let locks = SqliteLockService::new(&pool.conn);
    assert!(locks.current("calculate-sanctions").expect("current").is_none());
}

#[test]
fn test_in_memory_lock_serialises_passes() {
    let db_path = setup_test_db("job_in_memory_lock");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    let store = SqliteStore::new(&pool.conn);
    let roster = SqliteRoster::new(&pool.conn);
    let tariff = default_tariff();
    let locks = InMemoryLockService::new();
    let job = ReconciliationJob::new(&store, &roster, &tariff, &locks, JobSettings::default());

    let held = locks
        .try_acquire("calculate-sanctions", "someone-else", Duration::minutes(1))
        .expect("acquire")
        .expect("free");
    assert!(matches!(
        job.run_at(date("2025-11-20"), at("2025-11-20 17:31")).expect("run"),
        RunOutcome::Skipped { .. }
    ));

    locks.release(&held).expect("release");
    let summary = completed(job.run_at(date("2025-11-20"), at("2025-11-20 17:31")).expect("run"));
    assert_eq!(summary.created, 3);
}

/// Delegates to SQLite but fails every read of one member's record.
struct FlakyStore<'c> {
    inner: SqliteStore<'c>,
    broken_member: i64,
}

impl AttendanceStore for FlakyStore<'_> {
    fn active_events_on(&self, date: NaiveDate) -> AppResult<Vec<AppResult<AttendanceEvent>>> {
        self.inner.active_events_on(date)
    }

    fn record_for(&self, event_id: i64, member_id: i64) -> AppResult<Option<AttendanceRecord>> {
        if member_id == self.broken_member {
            return Err(AppError::Other("simulated read failure".into()));
        }
        self.inner.record_for(event_id, member_id)
    }

    fn find_sanction(
        &self,
        member_id: i64,
        event_id: i64,
        cause: SanctionCause,
    ) -> AppResult<Option<Sanction>> {
        self.inner.find_sanction(member_id, event_id, cause)
    }

    fn insert_sanction(&self, new: &NewSanction) -> AppResult<Sanction> {
        self.inner.insert_sanction(new)
    }
}

#[test]
fn test_member_failure_does_not_stop_the_pass() {
    let db_path = setup_test_db("job_member_failure");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    let store = FlakyStore {
        inner: SqliteStore::new(&pool.conn),
        broken_member: sc.late,
    };
    let roster = SqliteRoster::new(&pool.conn);
    let locks = SqliteLockService::new(&pool.conn);
    let tariff = StaticTariff::new()
        .with(SanctionCause::Absent, Money::from_cents(10_000))
        .with(SanctionCause::NoTimeIn, Money::from_cents(2_500))
        .with(SanctionCause::NoTimeOut, Money::from_cents(2_500));

    let summary = completed(
        ReconciliationJob::new(&store, &roster, &tariff, &locks, JobSettings::default())
            .run_at(date("2025-11-20"), at("2025-11-20 17:31"))
            .expect("run"),
    );

    assert_eq!(summary.errored, 1);
    assert_eq!(summary.created, 2);
    assert_eq!(causes_of(&pool, sc.absent), vec![SanctionCause::Absent]);
    assert_eq!(causes_of(&pool, sc.no_out), vec![SanctionCause::NoTimeOut]);
    assert!(causes_of(&pool, sc.late).is_empty());

    // The lock is released even though a member failed.
    assert!(
        SqliteLockService::new(&pool.conn)
            .current("calculate-sanctions")
            .expect("current")
            .is_none()
    );
}

#[test]
fn test_undecodable_event_does_not_hide_the_others() {
    let db_path = setup_test_db("job_bad_event_row");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    // Seconds in time_in do not match the stored HH:MM format.
    pool.conn
        .execute(
            "INSERT INTO attendance_events (date, label, time_in, time_out, status)
             VALUES ('2025-11-20', 'Broken', '09:00:00', '12:00', 'active')",
            [],
        )
        .expect("insert malformed event");

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31"));

    assert_eq!(summary.errored, 1);
    assert_eq!(summary.events, 1);
    assert_eq!(summary.created, 3);
    assert_eq!(causes_of(&pool, sc.absent), vec![SanctionCause::Absent]);
    assert_eq!(causes_of(&pool, sc.late), vec![SanctionCause::NoTimeIn]);
    assert_eq!(causes_of(&pool, sc.no_out), vec![SanctionCause::NoTimeOut]);
}

#[test]
fn test_out_of_range_grace_is_confined_to_its_event() {
    let db_path = setup_test_db("job_huge_grace");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    pool.conn
        .execute(
            "INSERT INTO attendance_events
                (date, label, time_in, time_out, in_grace_minutes, out_grace_minutes, status)
             VALUES ('2025-11-20', 'Endless', '09:00', '12:00', 200000000000000, 0, 'active')",
            [],
        )
        .expect("insert event");

    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 17:31"));

    assert_eq!(summary.errored, 1);
    assert_eq!(summary.events, 1);
    assert_eq!(summary.members, 4);
    assert_eq!(summary.created, 3);
    assert_eq!(causes_of(&pool, sc.absent), vec![SanctionCause::Absent]);
    assert!(causes_of(&pool, sc.compliant).is_empty());
}

#[test]
fn test_two_events_same_day() {
    let db_path = setup_test_db("job_two_events");
    let pool = open_db(&db_path);
    let sc = seed_scenario(&pool);

    let evening = AttendanceEvent::new(date("2025-11-20"), "Evening", hm("19:00"), 10, hm("21:00"), 10);
    let evening_id = queries::insert_event(&pool.conn, &evening).expect("event");
    queries::upsert_record(
        &pool.conn,
        &AttendanceRecord::new(evening_id, sc.compliant)
            .checked_in(at("2025-11-20 19:05"))
            .checked_out(at("2025-11-20 21:00")),
    )
    .expect("record");

    // Evening check-in window has closed, its check-out window has not.
    let summary = completed(run_sqlite(&pool, &default_tariff(), "2025-11-20 19:30"));
    assert_eq!(summary.events, 2);
    assert_eq!(summary.members, 8);
    assert_eq!(summary.created, 3);

    let evening_rows = queries::list_sanctions(
        &pool.conn,
        &SanctionFilter {
            event_id: Some(evening_id),
            ..SanctionFilter::default()
        },
    )
    .expect("list");
    assert!(evening_rows.is_empty());
}

#[test]
fn test_wall_clock_entry_point() {
    let db_path = setup_test_db("job_wall_clock");
    let pool = open_db(&db_path);
    seed_scenario(&pool);

    let store = SqliteStore::new(&pool.conn);
    let roster = SqliteRoster::new(&pool.conn);
    let locks = SqliteLockService::new(&pool.conn);
    let tariff = default_tariff();
    let job = ReconciliationJob::new(&store, &roster, &tariff, &locks, JobSettings::default());

    // The seeded event is long past: every verdict is final by now.
    let summary = completed(job.run(date("2025-11-20")).expect("run"));
    assert_eq!(summary.created, 3);
}

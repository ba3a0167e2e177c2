pub mod cause;
pub mod event;
pub mod event_status;
pub mod money;
pub mod presence;
pub mod record;
pub mod run_summary;
pub mod sanction;
pub mod sanction_status;

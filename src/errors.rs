//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid date/time format: {0}")]
    InvalidDateTime(String),

    #[error("Invalid sanction cause: {0}")]
    InvalidCause(String),

    #[error("Invalid sanction status: {0}")]
    InvalidStatus(String),

    #[error("Invalid event status: {0}")]
    InvalidEventStatus(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // ---------------------------
    // Domain errors
    // ---------------------------
    #[error("Sanction already exists for member {member_id}, event {event_id}, cause '{cause}'")]
    DuplicateSanction {
        member_id: i64,
        event_id: i64,
        cause: String,
    },

    #[error("Sanction {id} is {status}; only unpaid sanctions can be settled")]
    InvalidTransition { id: i64, status: String },

    #[error("Attendance event {0} not found")]
    EventNotFound(i64),

    #[error("Attendance event {0} has a window outside the supported calendar range")]
    EventWindowOutOfRange(i64),

    #[error("Sanction {0} not found")]
    SanctionNotFound(i64),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No tariff configured for cause '{0}'")]
    MissingTariff(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Errors that only concern a single cause and must not be retried blindly.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::MissingTariff(_) | AppError::InvalidAmount(_) | AppError::Config(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

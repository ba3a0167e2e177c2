use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Reason a sanction was issued.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SanctionCause {
    Absent,
    NoTimeIn,
    NoTimeOut,
}

impl SanctionCause {
    pub const ALL: [SanctionCause; 3] = [
        SanctionCause::Absent,
        SanctionCause::NoTimeIn,
        SanctionCause::NoTimeOut,
    ];

    /// Human label, also used as DB value and tariff key.
    pub fn label(&self) -> &'static str {
        match self {
            SanctionCause::Absent => "Absent",
            SanctionCause::NoTimeIn => "No time in",
            SanctionCause::NoTimeOut => "No time out",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        self.label()
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Absent" => Some(SanctionCause::Absent),
            "No time in" => Some(SanctionCause::NoTimeIn),
            "No time out" => Some(SanctionCause::NoTimeOut),
            _ => None,
        }
    }
}

impl fmt::Display for SanctionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for SanctionCause {
    type Err = AppError;

    /// Accepts the DB label as well as CLI-friendly spellings
    /// (`absent`, `no-time-in`, `no_time_out`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(c) = SanctionCause::from_db_str(s) {
            return Ok(c);
        }

        let norm = s.trim().to_lowercase().replace(['-', '_'], " ");
        match norm.as_str() {
            "absent" => Ok(SanctionCause::Absent),
            "no time in" => Ok(SanctionCause::NoTimeIn),
            "no time out" => Ok(SanctionCause::NoTimeOut),
            _ => Err(AppError::InvalidCause(s.to_string())),
        }
    }
}

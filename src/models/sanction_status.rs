use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Settlement state of a sanction. `Paid` and `Excused` are terminal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SanctionStatus {
    Unpaid,
    Paid,
    Excused,
}

impl SanctionStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SanctionStatus::Unpaid => "unpaid",
            SanctionStatus::Paid => "paid",
            SanctionStatus::Excused => "excused",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(SanctionStatus::Unpaid),
            "paid" => Some(SanctionStatus::Paid),
            "excused" => Some(SanctionStatus::Excused),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SanctionStatus::Paid | SanctionStatus::Excused)
    }
}

impl fmt::Display for SanctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.to_db_str())
    }
}

impl FromStr for SanctionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SanctionStatus::from_db_str(&s.trim().to_lowercase())
            .ok_or_else(|| AppError::InvalidStatus(s.to_string()))
    }
}

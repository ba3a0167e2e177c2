use serde::Serialize;

/// Lifecycle of an attendance event. `Closed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum EventStatus {
    Active,
    Closed,
}

impl EventStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Closed => "closed",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EventStatus::Active),
            "closed" => Some(EventStatus::Closed),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EventStatus::Active)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, EventStatus::Closed)
    }
}

use serde::Serialize;

/// Closed set of presence labels. The stored column is free text, so every
/// read goes through [`PresenceLabel::from_label`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum PresenceLabel {
    Present,
    AbsentPending,
    Late,
}

impl PresenceLabel {
    /// Lenient conversion of whatever the capture flow wrote.
    /// Unknown or empty values fall back to `AbsentPending`.
    pub fn from_label(raw: &str) -> Self {
        let norm = raw.trim().to_lowercase().replace(['-', '_'], " ");
        match norm.as_str() {
            "present" | "on time" | "ontime" | "in" => PresenceLabel::Present,
            "late" | "tardy" => PresenceLabel::Late,
            _ => PresenceLabel::AbsentPending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PresenceLabel::Present => "present",
            PresenceLabel::AbsentPending => "absent-pending",
            PresenceLabel::Late => "late",
        }
    }
}

use super::{cause::SanctionCause, money::Money, sanction_status::SanctionStatus};
use serde::Serialize;

/// One fine owed by one member for one cause at one event.
#[derive(Debug, Clone, Serialize)]
pub struct Sanction {
    pub id: i64,
    pub member_id: i64,
    pub event_id: i64,
    pub amount: Money,
    pub cause: SanctionCause,
    pub status: SanctionStatus,
    pub paid_at: Option<String>,
    pub created_at: String,
}

/// Insert payload; the ledger only ever creates unpaid rows.
#[derive(Debug, Clone)]
pub struct NewSanction {
    pub member_id: i64,
    pub event_id: i64,
    pub amount: Money,
    pub cause: SanctionCause,
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the balance ledger, keyed by (user_id, leave_type, leave_year).
/// `balance` and `used` are tracked independently: a credit only moves
/// `balance`, an approval moves `balance` down and `used` up by the same
/// amount.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct LeaveBalance {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: String,
    pub balance: f32,
    pub used: f32,
    pub leave_year: i32,
}

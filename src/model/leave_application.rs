use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct LeaveApplication {
    pub id: u64,
    pub user_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub reason: String,
    pub contact_address: Option<String>,
    pub contact_phone: Option<String>,
    pub status: String,
    /// Working days in the range, snapshotted at submission. Immutable after.
    pub number_of_days: i32,
    pub applied_on: NaiveDateTime,
    pub approved_by: Option<u64>,
    pub approved_on: Option<NaiveDateTime>,
    pub remarks: Option<String>,
    /// Manager's email captured at submission time so later notifications
    /// still reach the approver of record even if the org chart changes.
    pub superior_email: String,
}

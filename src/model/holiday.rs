use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// At most one holiday per calendar date (unique key on holiday_date).
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Holiday {
    pub id: u64,
    pub name: String,
    pub holiday_date: NaiveDate,
    pub holiday_type: Option<String>,
    pub description: Option<String>,
    pub is_recurring: bool,
}

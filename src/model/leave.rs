use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Category of absence. Each type is governed by its own policy and balance.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
}

/// Lifecycle state of a leave application. PENDING is the only non-terminal
/// state; the other three are one-shot.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_db_strings() {
        assert_eq!("PENDING".parse::<LeaveStatus>().unwrap(), LeaveStatus::Pending);
        assert_eq!(LeaveStatus::Withdrawn.as_ref(), "WITHDRAWN");
        assert_eq!("EARNED".parse::<LeaveType>().unwrap(), LeaveType::Earned);
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Withdrawn.is_terminal());
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::model::role::Role;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct LeavePolicy {
    pub id: u64,
    pub leave_type: String,
    pub description: String,
    pub annual_credit: f32,
    /// Hard cap on a balance after credits; NULL means unlimited.
    pub max_accumulation: Option<f32>,
    pub is_carry_forward: bool,
    pub min_duration: i32,
    /// NULL means unlimited.
    pub max_duration: Option<i32>,
    /// Minimum lead time, in days, between submission and leave start.
    pub notice_required: i32,
    /// Comma-separated role names, e.g. "EMPLOYEE,MANAGER".
    pub applicable_roles: String,
    pub is_active: bool,
}

impl LeavePolicy {
    pub fn roles(&self) -> Vec<Role> {
        self.applicable_roles
            .split(',')
            .filter_map(Role::parse)
            .collect()
    }

    pub fn applies_to(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(roles: &str) -> LeavePolicy {
        LeavePolicy {
            id: 1,
            leave_type: "CASUAL".into(),
            description: "casual leave".into(),
            annual_credit: 12.0,
            max_accumulation: None,
            is_carry_forward: false,
            min_duration: 1,
            max_duration: None,
            notice_required: 1,
            applicable_roles: roles.into(),
            is_active: true,
        }
    }

    #[test]
    fn parses_role_list() {
        let p = policy("EMPLOYEE, MANAGER");
        assert!(p.applies_to(Role::Employee));
        assert!(p.applies_to(Role::Manager));
        assert!(!p.applies_to(Role::Admin));
    }

    #[test]
    fn unknown_role_names_are_skipped() {
        let p = policy("EMPLOYEE,INTERN");
        assert_eq!(p.roles(), vec![Role::Employee]);
    }
}

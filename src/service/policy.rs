use sqlx::MySqlPool;
use tracing::warn;

use crate::error::LeaveError;
use crate::model::leave::LeaveType;
use crate::model::leave_policy::LeavePolicy;
use crate::model::role::Role;

const POLICY_COLUMNS: &str = "id, leave_type, description, annual_credit, max_accumulation, \
     is_carry_forward, min_duration, max_duration, notice_required, applicable_roles, is_active";

/// Resolve the single active policy governing `leave_type` for a user with
/// `role`. Ambiguous configurations (more than one active policy claiming
/// the same role for one leave type) are rejected at creation time; if one
/// slips in anyway this surfaces it as a conflict instead of silently
/// picking the first match.
pub async fn find_eligible_policy(
    pool: &MySqlPool,
    leave_type: LeaveType,
    role: Role,
) -> Result<LeavePolicy, LeaveError> {
    let candidates = sqlx::query_as::<_, LeavePolicy>(&format!(
        "SELECT {POLICY_COLUMNS} FROM leave_policies WHERE leave_type = ? AND is_active = TRUE"
    ))
    .bind(leave_type.as_ref())
    .fetch_all(pool)
    .await?;

    let matching = resolve_for_role(candidates, role)?;

    matching.ok_or_else(|| {
        LeaveError::not_found(
            "LeavePolicy",
            format!("no active policy for {leave_type} and role {}", role.as_str()),
        )
    })
}

/// Pure resolution step, split out so the ambiguity rule is testable.
fn resolve_for_role(
    candidates: Vec<LeavePolicy>,
    role: Role,
) -> Result<Option<LeavePolicy>, LeaveError> {
    let mut matching: Vec<LeavePolicy> = candidates
        .into_iter()
        .filter(|p| p.applies_to(role))
        .collect();

    if matching.len() > 1 {
        warn!(
            role = role.as_str(),
            count = matching.len(),
            "ambiguous policy configuration"
        );
        return Err(LeaveError::Conflict(format!(
            "multiple active policies match role {}; fix the policy configuration",
            role.as_str()
        )));
    }

    Ok(matching.pop())
}

pub async fn list_active(pool: &MySqlPool) -> Result<Vec<LeavePolicy>, LeaveError> {
    let policies = sqlx::query_as::<_, LeavePolicy>(&format!(
        "SELECT {POLICY_COLUMNS} FROM leave_policies WHERE is_active = TRUE ORDER BY leave_type"
    ))
    .fetch_all(pool)
    .await?;

    Ok(policies)
}

pub struct NewPolicy {
    pub leave_type: LeaveType,
    pub description: String,
    pub annual_credit: f32,
    pub max_accumulation: Option<f32>,
    pub is_carry_forward: bool,
    pub min_duration: i32,
    pub max_duration: Option<i32>,
    pub notice_required: i32,
    pub applicable_roles: Vec<Role>,
}

/// Create a policy, rejecting configurations that would make eligible-policy
/// resolution ambiguous: no role may be claimed by two active policies for
/// the same leave type.
pub async fn create_policy(pool: &MySqlPool, policy: NewPolicy) -> Result<u64, LeaveError> {
    if policy.applicable_roles.is_empty() {
        return Err(LeaveError::Validation(
            "policy must apply to at least one role".into(),
        ));
    }
    if policy.annual_credit < 0.0 {
        return Err(LeaveError::Validation("annual_credit cannot be negative".into()));
    }
    if policy.min_duration < 1 {
        return Err(LeaveError::Validation("min_duration must be at least 1".into()));
    }
    if let Some(max) = policy.max_duration {
        if max < policy.min_duration {
            return Err(LeaveError::Validation(
                "max_duration cannot be less than min_duration".into(),
            ));
        }
    }

    let existing = sqlx::query_as::<_, LeavePolicy>(&format!(
        "SELECT {POLICY_COLUMNS} FROM leave_policies WHERE leave_type = ? AND is_active = TRUE"
    ))
    .bind(policy.leave_type.as_ref())
    .fetch_all(pool)
    .await?;

    for role in &policy.applicable_roles {
        if existing.iter().any(|p| p.applies_to(*role)) {
            return Err(LeaveError::Conflict(format!(
                "an active {} policy already covers role {}",
                policy.leave_type,
                role.as_str()
            )));
        }
    }

    let roles_csv = policy
        .applicable_roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let result = sqlx::query(
        r#"
        INSERT INTO leave_policies
            (leave_type, description, annual_credit, max_accumulation, is_carry_forward,
             min_duration, max_duration, notice_required, applicable_roles, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(policy.leave_type.as_ref())
    .bind(&policy.description)
    .bind(policy.annual_credit)
    .bind(policy.max_accumulation)
    .bind(policy.is_carry_forward)
    .bind(policy.min_duration)
    .bind(policy.max_duration)
    .bind(policy.notice_required)
    .bind(roles_csv)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(id: u64, roles: &str) -> LeavePolicy {
        LeavePolicy {
            id,
            leave_type: "CASUAL".into(),
            description: "casual".into(),
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
    fn resolves_single_match() {
        let found = resolve_for_role(
            vec![policy(1, "EMPLOYEE"), policy(2, "MANAGER")],
            Role::Manager,
        )
        .unwrap();
        assert_eq!(found.unwrap().id, 2);
    }

    #[test]
    fn no_match_resolves_to_none() {
        let found = resolve_for_role(vec![policy(1, "EMPLOYEE")], Role::Admin).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn ambiguous_match_is_a_conflict() {
        let result = resolve_for_role(
            vec![policy(1, "EMPLOYEE"), policy(2, "EMPLOYEE,MANAGER")],
            Role::Employee,
        );
        assert!(matches!(result, Err(LeaveError::Conflict(_))));
    }
}

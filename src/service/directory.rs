use sqlx::MySqlPool;

use crate::error::LeaveError;
use crate::model::user::UserRecord;

const USER_COLUMNS: &str = "id, username, full_name, email, role_id, manager_id, is_active";

pub async fn get_user(pool: &MySqlPool, user_id: u64) -> Result<UserRecord, LeaveError> {
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| LeaveError::not_found("User", format!("id {user_id}")))
}

/// The applicant's direct manager, if one is assigned.
pub async fn get_manager(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Option<UserRecord>, LeaveError> {
    let manager = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT m.id, m.username, m.full_name, m.email, m.role_id, m.manager_id, m.is_active \
         FROM users u JOIN users m ON u.manager_id = m.id WHERE u.id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(manager)
}

pub async fn list_active_users(pool: &MySqlPool) -> Result<Vec<UserRecord>, LeaveError> {
    let users = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_active = TRUE"
    ))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::model::role::Role;

/// Directory view of a user, as consumed by the core services.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role_id: u8,
    pub manager_id: Option<u64>,
    pub is_active: bool,
}

impl UserRecord {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }
}

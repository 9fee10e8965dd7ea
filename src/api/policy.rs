use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::model::leave::LeaveType;
use crate::model::role::Role;
use crate::service::policy::{self, NewPolicy};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreatePolicy {
    #[schema(example = "casual")]
    pub leave_type: LeaveType,
    #[schema(example = "Casual leave for regular employees")]
    pub description: String,
    #[schema(example = 12.0)]
    pub annual_credit: f32,
    pub max_accumulation: Option<f32>,
    #[serde(default)]
    pub is_carry_forward: bool,
    #[schema(example = 1)]
    pub min_duration: i32,
    pub max_duration: Option<i32>,
    #[schema(example = 2)]
    pub notice_required: i32,
    /// Role names, e.g. ["EMPLOYEE", "MANAGER"]
    pub applicable_roles: Vec<String>,
}

/* =========================
Create policy (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/policy",
    request_body = CreatePolicy,
    responses(
        (status = 200, description = "Policy created"),
        (status = 400, description = "Bad policy shape or unknown role name"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Would make policy resolution ambiguous")
    ),
    security(("bearer_auth" = [])),
    tag = "Policy"
)]
pub async fn create_policy(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePolicy>,
) -> Result<HttpResponse, LeaveError> {
    auth.require_admin()?;

    let payload = payload.into_inner();

    let mut roles = Vec::with_capacity(payload.applicable_roles.len());
    for name in &payload.applicable_roles {
        let role = Role::parse(name)
            .ok_or_else(|| LeaveError::Validation(format!("unknown role name {name}")))?;
        roles.push(role);
    }

    let id = policy::create_policy(
        pool.get_ref(),
        NewPolicy {
            leave_type: payload.leave_type,
            description: payload.description,
            annual_credit: payload.annual_credit,
            max_accumulation: payload.max_accumulation,
            is_carry_forward: payload.is_carry_forward,
            min_duration: payload.min_duration,
            max_duration: payload.max_duration,
            notice_required: payload.notice_required,
            applicable_roles: roles,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave policy created",
        "id": id
    })))
}

/* =========================
List active policies
========================= */
#[utoipa::path(
    get,
    path = "/api/policy",
    responses(
        (status = 200, description = "Active policies"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Policy"
)]
pub async fn list_policies(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, LeaveError> {
    let policies = policy::list_active(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(policies))
}

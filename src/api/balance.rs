use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::model::leave::LeaveType;
use crate::service::{credit, ledger};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

/* =========================
Own balances (eligibility view)
========================= */
#[utoipa::path(
    get,
    path = "/api/balance",
    responses(
        (status = 200, description = "Current-year balances per leave type"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn my_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, LeaveError> {
    let year = Utc::now().year();
    let balances = ledger::list_for_user(pool.get_ref(), auth.user_id, year).await?;

    Ok(HttpResponse::Ok().json(balances))
}

/* =========================
Annual credit for one user (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/balance/{user_id}/annual-credit",
    params(("user_id" = u64, Path, description = "User to credit")),
    responses(
        (status = 200, description = "Credit outcome (credited / skipped counts)"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn annual_credit_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    auth.require_admin()?;

    let year = Utc::now().year();
    let outcome = credit::annual_credit_for_user(pool.get_ref(), path.into_inner(), year).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Deserialize, ToSchema)]
pub struct SpecialCredit {
    pub user_ids: Vec<u64>,
    #[schema(example = "earned")]
    pub leave_type: LeaveType,
    #[schema(example = 2.0)]
    pub amount: f32,
    #[schema(example = "Weekend release compensation")]
    pub reason: String,
}

/* =========================
Special credit (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/balance/special-credit",
    request_body = SpecialCredit,
    responses(
        (status = 200, description = "Per-user credit results"),
        (status = 400, description = "Negative amount or empty user list"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn special_credit(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SpecialCredit>,
) -> Result<HttpResponse, LeaveError> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    if payload.user_ids.is_empty() {
        return Err(LeaveError::Validation("user_ids cannot be empty".into()));
    }
    if payload.amount < 0.0 {
        return Err(LeaveError::Validation("credit amount cannot be negative".into()));
    }

    let year = Utc::now().year();
    let results = credit::special_credit(
        pool.get_ref(),
        &payload.user_ids,
        payload.leave_type,
        year,
        payload.amount,
        &payload.reason,
    )
    .await;

    Ok(HttpResponse::Ok().json(results))
}

use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::model::leave::LeaveType;
use crate::model::leave_application::LeaveApplication;
use crate::model::role::Role;
use crate::service::approval::{self, SubmitRequest};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = "2026-09-07", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-09-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "casual")]
    pub leave_type: LeaveType,
    #[schema(example = "Family function")]
    pub reason: String,
    pub contact_address: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ApprovalDecision {
    #[schema(example = "Enjoy your leave")]
    pub remarks: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Keep applications overlapping [start_date, end_date]
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
    /// Filter by status
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<LeaveApplication>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = ApplyLeave,
    responses(
        (status = 200, description = "Leave application created in PENDING state"),
        (status = 400, description = "Bad dates or missing manager email"),
        (status = 409, description = "Insufficient balance"),
        (status = 422, description = "Policy rule failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ApplyLeave>,
) -> Result<HttpResponse, LeaveError> {
    let payload = payload.into_inner();

    let application = approval::submit(
        pool.get_ref(),
        auth.user_id,
        SubmitRequest {
            start_date: payload.start_date,
            end_date: payload.end_date,
            leave_type: payload.leave_type,
            reason: payload.reason,
            contact_address: payload.contact_address,
            contact_phone: payload.contact_phone,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(application))
}

/* =========================
Own leave history (filterable)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, LeaveError> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE user_id = ?");
    let mut args: Vec<FilterValue> = vec![FilterValue::U64(auth.user_id)];

    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        where_sql.push_str(" AND start_date <= ? AND end_date >= ?");
        args.push(FilterValue::Date(end));
        args.push(FilterValue::Date(start));
    }
    if let Some(leave_type) = query.leave_type {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type.as_ref().to_string()));
    }
    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_uppercase()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_applications{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT id, user_id, start_date, end_date, leave_type, reason, contact_address, \
         contact_phone, status, number_of_days, applied_on, approved_by, approved_on, \
         remarks, superior_email \
         FROM leave_applications{where_sql} \
         ORDER BY applied_on DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, LeaveApplication>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }
    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/* =========================
Pending approval queue (manager)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/approvals",
    responses(
        (status = 200, description = "Applications pending this manager's approval"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_approvals(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, LeaveError> {
    auth.require_manager_or_admin()?;

    let applications = sqlx::query_as::<_, LeaveApplication>(
        "SELECT la.id, la.user_id, la.start_date, la.end_date, la.leave_type, la.reason, \
         la.contact_address, la.contact_phone, la.status, la.number_of_days, la.applied_on, \
         la.approved_by, la.approved_on, la.remarks, la.superior_email \
         FROM leave_applications la \
         JOIN users u ON la.user_id = u.id \
         WHERE u.manager_id = ? AND la.status = 'PENDING' \
         ORDER BY la.applied_on",
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(applications))
}

/* =========================
Single application
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    params(("id" = u64, Path, description = "Leave application id")),
    responses(
        (status = 200, description = "Leave application found"),
        (status = 403, description = "Not the owner, their manager, or an admin"),
        (status = 404, description = "Leave application not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let application = approval::get_application(pool.get_ref(), path.into_inner()).await?;

    if application.user_id != auth.user_id && auth.role != Role::Admin {
        let manager_id: Option<u64> =
            sqlx::query_scalar("SELECT manager_id FROM users WHERE id = ?")
                .bind(application.user_id)
                .fetch_one(pool.get_ref())
                .await?;

        if manager_id != Some(auth.user_id) {
            return Err(LeaveError::PermissionDenied(
                "You don't have permission to view this leave application".into(),
            ));
        }
    }

    Ok(HttpResponse::Ok().json(application))
}

/* =========================
Approve (direct manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(("id" = u64, Path, description = "Leave application id")),
    request_body = ApprovalDecision,
    responses(
        (status = 200, description = "Leave approved, balance debited"),
        (status = 403, description = "Caller is not the applicant's manager"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Already processed or insufficient balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ApprovalDecision>,
) -> Result<HttpResponse, LeaveError> {
    approval::approve(
        pool.get_ref(),
        path.into_inner(),
        auth.user_id,
        payload.into_inner().remarks,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave application approved successfully"
    })))
}

/* =========================
Reject (direct manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(("id" = u64, Path, description = "Leave application id")),
    request_body = ApprovalDecision,
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 403, description = "Caller is not the applicant's manager"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ApprovalDecision>,
) -> Result<HttpResponse, LeaveError> {
    approval::reject(
        pool.get_ref(),
        path.into_inner(),
        auth.user_id,
        payload.into_inner().remarks,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave application rejected successfully"
    })))
}

/* =========================
Withdraw (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/withdraw",
    params(("id" = u64, Path, description = "Leave application id")),
    responses(
        (status = 200, description = "Leave withdrawn"),
        (status = 403, description = "Caller does not own the application"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    approval::withdraw(pool.get_ref(), path.into_inner(), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave application withdrawn successfully"
    })))
}

use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::model::holiday::Holiday;
use crate::service::calendar;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "Republic Day")]
    pub name: String,
    #[schema(example = "2026-01-26", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "National")]
    pub holiday_type: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
}

#[derive(Deserialize, IntoParams)]
pub struct HolidayFilter {
    /// Restrict to one calendar year
    pub year: Option<i32>,
}

/* =========================
Create holiday (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/holiday",
    request_body = CreateHoliday,
    responses(
        (status = 200, description = "Holiday created"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "A holiday already exists on this date")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> Result<HttpResponse, LeaveError> {
    auth.require_admin()?;

    let payload = payload.into_inner();

    // One holiday per calendar date.
    if calendar::is_holiday(pool.get_ref(), payload.date).await? {
        return Err(LeaveError::Conflict(
            "A holiday already exists on this date".into(),
        ));
    }

    let result = sqlx::query(
        "INSERT INTO holidays (name, holiday_date, holiday_type, description, is_recurring) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(payload.date)
    .bind(&payload.holiday_type)
    .bind(&payload.description)
    .bind(payload.is_recurring)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Holiday created",
        "id": result.last_insert_id()
    })))
}

/* =========================
List holidays
========================= */
#[utoipa::path(
    get,
    path = "/api/holiday",
    params(HolidayFilter),
    responses(
        (status = 200, description = "Holidays, optionally limited to a year"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayFilter>,
) -> Result<HttpResponse, LeaveError> {
    let holidays = match query.year {
        Some(year) => {
            sqlx::query_as::<_, Holiday>(
                "SELECT id, name, holiday_date, holiday_type, description, is_recurring \
                 FROM holidays WHERE YEAR(holiday_date) = ? ORDER BY holiday_date",
            )
            .bind(year)
            .fetch_all(pool.get_ref())
            .await?
        }
        None => {
            sqlx::query_as::<_, Holiday>(
                "SELECT id, name, holiday_date, holiday_type, description, is_recurring \
                 FROM holidays ORDER BY holiday_date",
            )
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(holidays))
}

/* =========================
Delete holiday (admin)
========================= */
#[utoipa::path(
    delete,
    path = "/api/holiday/{id}",
    params(("id" = u64, Path, description = "Holiday id")),
    responses(
        (status = 200, description = "Holiday deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(LeaveError::not_found("Holiday", format!("id {id}")));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Holiday deleted"
    })))
}

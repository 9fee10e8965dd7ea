//! Leave application lifecycle: submit -> approve / reject / withdraw, plus
//! the scheduler-driven auto-approval path.
//!
//! The PENDING -> APPROVED transition and its ledger debit run in one
//! transaction: the application row is taken with `FOR UPDATE`, the status
//! update is guarded on `status = 'PENDING'`, and a failed debit rolls the
//! whole transition back. Terminal states are one-shot.

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{info, instrument, warn};

use crate::error::LeaveError;
use crate::model::holiday::Holiday;
use crate::model::leave::{LeaveStatus, LeaveType};
use crate::model::leave_application::LeaveApplication;
use crate::model::leave_policy::LeavePolicy;
use crate::service::{calendar, directory, ledger, notification, policy};
use crate::service::notification::NotificationKind;

const APPLICATION_COLUMNS: &str = "id, user_id, start_date, end_date, leave_type, reason, \
     contact_address, contact_phone, status, number_of_days, applied_on, approved_by, \
     approved_on, remarks, superior_email";

pub struct SubmitRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
    pub reason: String,
    pub contact_address: Option<String>,
    pub contact_phone: Option<String>,
}

/// Outcome of one auto-approval sweep. Per-item failures are counted, not
/// fatal to the batch.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub approved: usize,
    pub failed: usize,
}

/// Submit a leave application. All eligibility guards run here; on success a
/// PENDING record is created with `number_of_days` and the manager's email
/// snapshotted. No ledger mutation happens yet: the balance check is
/// advisory and does not reserve capacity.
#[instrument(skip(pool, request), fields(leave_type = %request.leave_type))]
pub async fn submit(
    pool: &MySqlPool,
    user_id: u64,
    request: SubmitRequest,
) -> Result<LeaveApplication, LeaveError> {
    let today = Utc::now().date_naive();

    // Date-shape errors come before any lookup, so an inverted or past range
    // fails with Validation even when the user or balance row is missing.
    check_date_window(request.start_date, request.end_date, today)?;

    let user = directory::get_user(pool, user_id).await?;
    let role = user
        .role()
        .ok_or_else(|| LeaveError::Validation("user has no recognized role".into()))?;

    let holidays =
        calendar::holidays_between(pool, request.start_date, request.end_date).await?;

    let eligible = policy::find_eligible_policy(pool, request.leave_type, role).await?;

    // Advisory read; approval re-checks under lock.
    let available = ledger::get_balance(pool, user_id, request.leave_type, today.year())
        .await?
        .balance;

    let number_of_days = validate_submission(
        request.start_date,
        request.end_date,
        today,
        &eligible,
        available,
        &holidays,
    )?;

    if has_overlapping_leave(pool, user_id, request.start_date, request.end_date).await? {
        return Err(LeaveError::PolicyViolation(
            "You already have pending or approved leave during this period".into(),
        ));
    }

    let manager = directory::get_manager(pool, user_id)
        .await?
        .filter(|m| !m.email.is_empty())
        .ok_or_else(|| {
            LeaveError::Validation("Your manager's email is not available. Please contact HR.".into())
        })?;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_applications
            (user_id, start_date, end_date, leave_type, reason, contact_address,
             contact_phone, status, number_of_days, superior_email)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'PENDING', ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(request.start_date)
    .bind(request.end_date)
    .bind(request.leave_type.as_ref())
    .bind(&request.reason)
    .bind(&request.contact_address)
    .bind(&request.contact_phone)
    .bind(number_of_days)
    .bind(&manager.email)
    .execute(pool)
    .await?;

    let application = get_application(pool, result.last_insert_id()).await?;

    info!(application_id = application.id, number_of_days, "leave application submitted");

    notification::notify(
        pool,
        manager.id,
        NotificationKind::LeaveApplication,
        &format!(
            "{} applied for {} leave ({} to {})",
            user.full_name, request.leave_type, request.start_date, request.end_date
        ),
    )
    .await;

    Ok(application)
}

/// Approve a PENDING application as the applicant's direct manager. The
/// status transition and the ledger debit commit or roll back together.
#[instrument(skip(pool, remarks))]
pub async fn approve(
    pool: &MySqlPool,
    application_id: u64,
    approver_id: u64,
    remarks: Option<String>,
) -> Result<(), LeaveError> {
    let today = Utc::now().date_naive();

    let mut tx = pool.begin().await?;
    let application = fetch_application_for_update(&mut tx, application_id).await?;

    check_pending(&application)?;

    let applicant = directory::get_user(pool, application.user_id).await?;
    check_approver(applicant.manager_id, approver_id)?;

    if application.start_date < today {
        return Err(LeaveError::PolicyViolation(
            "Cannot approve leave that has already started".into(),
        ));
    }

    transition_to_approved(&mut tx, &application, Some(approver_id), remarks.as_deref()).await?;
    tx.commit().await?;

    info!(application_id, approver_id, "leave application approved");

    notification::notify(
        pool,
        application.user_id,
        NotificationKind::LeaveApproved,
        &format!(
            "Your {} leave from {} to {} was approved",
            application.leave_type, application.start_date, application.end_date
        ),
    )
    .await;

    Ok(())
}

/// Reject a PENDING application. No ledger mutation.
#[instrument(skip(pool, remarks))]
pub async fn reject(
    pool: &MySqlPool,
    application_id: u64,
    approver_id: u64,
    remarks: Option<String>,
) -> Result<(), LeaveError> {
    let mut tx = pool.begin().await?;
    let application = fetch_application_for_update(&mut tx, application_id).await?;

    check_pending(&application)?;

    let applicant = directory::get_user(pool, application.user_id).await?;
    check_approver(applicant.manager_id, approver_id)?;

    let result = sqlx::query(
        "UPDATE leave_applications \
         SET status = 'REJECTED', approved_by = ?, approved_on = NOW(), remarks = ? \
         WHERE id = ? AND status = 'PENDING'",
    )
    .bind(approver_id)
    .bind(&remarks)
    .bind(application_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LeaveError::Conflict(
            "leave application was already processed".into(),
        ));
    }

    record_audit(&mut tx, Some(approver_id), application_id, "REJECTED", remarks.as_deref())
        .await?;
    tx.commit().await?;

    info!(application_id, approver_id, "leave application rejected");

    notification::notify(
        pool,
        application.user_id,
        NotificationKind::LeaveRejected,
        &format!(
            "Your {} leave from {} to {} was rejected",
            application.leave_type, application.start_date, application.end_date
        ),
    )
    .await;

    Ok(())
}

/// Withdraw one's own PENDING application. The balance was never reserved,
/// so there is nothing to credit back.
#[instrument(skip(pool))]
pub async fn withdraw(
    pool: &MySqlPool,
    application_id: u64,
    user_id: u64,
) -> Result<(), LeaveError> {
    let mut tx = pool.begin().await?;
    let application = fetch_application_for_update(&mut tx, application_id).await?;

    if application.user_id != user_id {
        return Err(LeaveError::PermissionDenied(
            "You don't have permission to withdraw this leave application".into(),
        ));
    }

    check_pending(&application)?;

    let result = sqlx::query(
        "UPDATE leave_applications SET status = 'WITHDRAWN' \
         WHERE id = ? AND status = 'PENDING'",
    )
    .bind(application_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LeaveError::Conflict(
            "leave application was already processed".into(),
        ));
    }

    tx.commit().await?;

    info!(application_id, user_id, "leave application withdrawn");

    if let Some(manager) = directory::get_manager(pool, user_id).await? {
        notification::notify(
            pool,
            manager.id,
            NotificationKind::LeaveWithdrawn,
            &format!("Leave application {application_id} was withdrawn"),
        )
        .await;
    }

    Ok(())
}

// The timeout is measured on the database clock, the same clock that fills
// applied_on, so the sweep is correct regardless of the server's timezone.
const SWEEP_QUERY: &str = "SELECT id FROM leave_applications \
     WHERE status = 'PENDING' AND applied_on <= NOW() - INTERVAL ? HOUR";

/// Approve every application pending longer than `timeout_hours`, one
/// transaction per application so a failure (typically insufficient
/// balance) never aborts the rest of the sweep.
#[instrument(skip(pool))]
pub async fn auto_approve(pool: &MySqlPool, timeout_hours: i64) -> Result<SweepOutcome, LeaveError> {
    let pending_ids: Vec<u64> = sqlx::query_scalar(SWEEP_QUERY)
        .bind(timeout_hours)
        .fetch_all(pool)
        .await?;

    let mut outcome = SweepOutcome::default();

    for id in pending_ids {
        match auto_approve_one(pool, id).await {
            Ok(()) => outcome.approved += 1,
            Err(e) => {
                // The manual-approval guard may also have won the race; both
                // cases are per-item failures, not sweep failures.
                warn!(application_id = id, error = %e, "auto-approval skipped application");
                outcome.failed += 1;
            }
        }
    }

    if outcome.approved > 0 || outcome.failed > 0 {
        info!(approved = outcome.approved, failed = outcome.failed, "auto-approval sweep done");
    }

    Ok(outcome)
}

/// Same transition as manual approval, with no approver and without the
/// manager and start-date guards.
async fn auto_approve_one(pool: &MySqlPool, application_id: u64) -> Result<(), LeaveError> {
    let mut tx = pool.begin().await?;
    let application = fetch_application_for_update(&mut tx, application_id).await?;

    check_pending(&application)?;

    transition_to_approved(&mut tx, &application, None, None).await?;
    tx.commit().await?;

    notification::notify(
        pool,
        application.user_id,
        NotificationKind::LeaveApproved,
        &format!(
            "Your {} leave from {} to {} was auto-approved",
            application.leave_type, application.start_date, application.end_date
        ),
    )
    .await;

    Ok(())
}

/// Shared APPROVED transition: status flip plus ledger debit, same
/// transaction. The debit targets the balance year of the leave's start
/// date.
async fn transition_to_approved(
    tx: &mut Transaction<'_, MySql>,
    application: &LeaveApplication,
    approver_id: Option<u64>,
    remarks: Option<&str>,
) -> Result<(), LeaveError> {
    let result = sqlx::query(
        "UPDATE leave_applications \
         SET status = 'APPROVED', approved_by = ?, approved_on = NOW(), remarks = ? \
         WHERE id = ? AND status = 'PENDING'",
    )
    .bind(approver_id)
    .bind(remarks)
    .bind(application.id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LeaveError::Conflict(
            "leave application was already processed".into(),
        ));
    }

    ledger::debit(
        tx,
        application.user_id,
        &application.leave_type,
        application.start_date.year(),
        application.number_of_days as f32,
    )
    .await?;

    let action = if approver_id.is_some() { "APPROVED" } else { "AUTO_APPROVED" };
    record_audit(tx, approver_id, application.id, action, remarks).await?;

    Ok(())
}

pub async fn get_application(
    pool: &MySqlPool,
    application_id: u64,
) -> Result<LeaveApplication, LeaveError> {
    let application = sqlx::query_as::<_, LeaveApplication>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM leave_applications WHERE id = ?"
    ))
    .bind(application_id)
    .fetch_optional(pool)
    .await?;

    application.ok_or_else(|| LeaveError::not_found("LeaveApplication", format!("id {application_id}")))
}

async fn fetch_application_for_update(
    tx: &mut Transaction<'_, MySql>,
    application_id: u64,
) -> Result<LeaveApplication, LeaveError> {
    let application = sqlx::query_as::<_, LeaveApplication>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM leave_applications WHERE id = ? FOR UPDATE"
    ))
    .bind(application_id)
    .fetch_optional(&mut **tx)
    .await?;

    application.ok_or_else(|| LeaveError::not_found("LeaveApplication", format!("id {application_id}")))
}

async fn has_overlapping_leave(
    pool: &MySqlPool,
    user_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<bool, LeaveError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leave_applications \
         WHERE user_id = ? AND status IN ('PENDING', 'APPROVED') \
         AND start_date <= ? AND end_date >= ?",
    )
    .bind(user_id)
    .bind(end)
    .bind(start)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

async fn record_audit(
    tx: &mut Transaction<'_, MySql>,
    actor_id: Option<u64>,
    application_id: u64,
    action: &str,
    details: Option<&str>,
) -> Result<(), LeaveError> {
    sqlx::query(
        "INSERT INTO audit_logs (actor_id, application_id, action, details) VALUES (?, ?, ?, ?)",
    )
    .bind(actor_id)
    .bind(application_id)
    .bind(action)
    .bind(details)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// All submit-time eligibility guards that need no further I/O. Returns the
/// working-day count to snapshot on the application.
fn validate_submission(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    eligible: &LeavePolicy,
    available: f32,
    holidays: &[Holiday],
) -> Result<i32, LeaveError> {
    check_date_window(start, end, today)?;

    if !holidays.is_empty() {
        let names: Vec<&str> = holidays.iter().map(|h| h.name.as_str()).collect();
        return Err(LeaveError::PolicyViolation(format!(
            "Leave dates conflict with public holidays: {}",
            names.join(", ")
        )));
    }

    let number_of_days = calendar::working_days(start, end);
    if number_of_days <= 0 {
        return Err(LeaveError::PolicyViolation(
            "Leave period contains no working days".into(),
        ));
    }

    if number_of_days < eligible.min_duration {
        return Err(LeaveError::PolicyViolation(format!(
            "Leave duration is less than minimum required: {} days",
            eligible.min_duration
        )));
    }
    if let Some(max) = eligible.max_duration {
        if number_of_days > max {
            return Err(LeaveError::PolicyViolation(format!(
                "Leave duration exceeds maximum allowed: {max} days"
            )));
        }
    }

    if calendar::days_between(today, start) < eligible.notice_required as i64 {
        return Err(LeaveError::PolicyViolation(format!(
            "Leave application doesn't meet the required notice period of {} days",
            eligible.notice_required
        )));
    }

    if available < number_of_days as f32 {
        return Err(LeaveError::InsufficientBalance {
            available,
            required: number_of_days as f32,
        });
    }

    Ok(number_of_days)
}

/// Range ordering and past-date rules. Pure; runs before any database read
/// on the submit path.
fn check_date_window(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), LeaveError> {
    if start > end {
        return Err(LeaveError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }
    if start < today {
        return Err(LeaveError::Validation(
            "Cannot apply leave for past dates".into(),
        ));
    }
    Ok(())
}

fn check_pending(application: &LeaveApplication) -> Result<(), LeaveError> {
    let status: LeaveStatus = application
        .status
        .parse()
        .map_err(|_| LeaveError::Conflict("application has an unrecognized status".into()))?;

    if status.is_terminal() {
        return Err(LeaveError::Conflict(
            "leave application was already processed".into(),
        ));
    }
    Ok(())
}

fn check_approver(applicant_manager: Option<u64>, approver_id: u64) -> Result<(), LeaveError> {
    match applicant_manager {
        Some(manager_id) if manager_id == approver_id => Ok(()),
        _ => Err(LeaveError::PermissionDenied(
            "Only the applicant's direct manager can act on this application".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn policy() -> LeavePolicy {
        LeavePolicy {
            id: 1,
            leave_type: "CASUAL".into(),
            description: "casual".into(),
            annual_credit: 12.0,
            max_accumulation: None,
            is_carry_forward: false,
            min_duration: 1,
            max_duration: Some(10),
            notice_required: 2,
            applicable_roles: "EMPLOYEE".into(),
            is_active: true,
        }
    }

    fn application(status: &str) -> LeaveApplication {
        LeaveApplication {
            id: 7,
            user_id: 42,
            start_date: d(2026, 9, 7),
            end_date: d(2026, 9, 9),
            leave_type: "CASUAL".into(),
            reason: "family".into(),
            contact_address: None,
            contact_phone: None,
            status: status.into(),
            number_of_days: 3,
            applied_on: NaiveDateTime::default(),
            approved_by: None,
            approved_on: None,
            remarks: None,
            superior_email: "boss@example.com".into(),
        }
    }

    fn holiday_on(date: NaiveDate) -> Holiday {
        Holiday {
            id: 1,
            name: "Founders Day".into(),
            holiday_date: date,
            holiday_type: None,
            description: None,
            is_recurring: false,
        }
    }

    // today is Wed 2026-08-26 in these tests; Mon 2026-09-07 is well past
    // the two-day notice period.
    const TODAY: (i32, u32, u32) = (2026, 8, 26);

    fn today() -> NaiveDate {
        let (y, m, day) = TODAY;
        d(y, m, day)
    }

    #[test]
    fn valid_submission_returns_working_days() {
        let days =
            validate_submission(d(2026, 9, 7), d(2026, 9, 9), today(), &policy(), 10.0, &[])
                .unwrap();
        assert_eq!(days, 3);
    }

    #[test]
    fn inverted_dates_fail_validation() {
        let err =
            validate_submission(d(2026, 9, 9), d(2026, 9, 7), today(), &policy(), 10.0, &[])
                .unwrap_err();
        assert!(matches!(err, LeaveError::Validation(_)));
    }

    #[test]
    fn past_start_date_fails_validation() {
        let err =
            validate_submission(d(2026, 8, 20), d(2026, 8, 28), today(), &policy(), 10.0, &[])
                .unwrap_err();
        assert!(matches!(err, LeaveError::Validation(_)));
    }

    #[test]
    fn holiday_in_range_is_a_policy_violation() {
        let err = validate_submission(
            d(2026, 9, 7),
            d(2026, 9, 9),
            today(),
            &policy(),
            10.0,
            &[holiday_on(d(2026, 9, 8))],
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::PolicyViolation(_)));
    }

    #[test]
    fn weekend_only_range_has_no_working_days() {
        let err =
            validate_submission(d(2026, 9, 5), d(2026, 9, 6), today(), &policy(), 10.0, &[])
                .unwrap_err();
        assert!(matches!(err, LeaveError::PolicyViolation(_)));
    }

    #[test]
    fn duration_above_max_is_rejected() {
        // Three full weeks of working days against a 10-day cap.
        let err =
            validate_submission(d(2026, 9, 7), d(2026, 9, 25), today(), &policy(), 30.0, &[])
                .unwrap_err();
        assert!(matches!(err, LeaveError::PolicyViolation(_)));
    }

    #[test]
    fn short_notice_is_rejected() {
        // Tomorrow violates the two-day notice requirement.
        let err =
            validate_submission(d(2026, 8, 27), d(2026, 8, 27), today(), &policy(), 10.0, &[])
                .unwrap_err();
        assert!(matches!(err, LeaveError::PolicyViolation(_)));
    }

    #[test]
    fn insufficient_balance_reports_both_numbers() {
        let err =
            validate_submission(d(2026, 9, 7), d(2026, 9, 9), today(), &policy(), 2.0, &[])
                .unwrap_err();
        match err {
            LeaveError::InsufficientBalance { available, required } => {
                assert_eq!(available, 2.0);
                assert_eq!(required, 3.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn date_window_rejects_inverted_and_past_ranges() {
        assert!(matches!(
            check_date_window(d(2026, 9, 9), d(2026, 9, 7), today()),
            Err(LeaveError::Validation(_))
        ));
        assert!(matches!(
            check_date_window(d(2026, 8, 20), d(2026, 8, 21), today()),
            Err(LeaveError::Validation(_))
        ));
        assert!(check_date_window(d(2026, 9, 7), d(2026, 9, 9), today()).is_ok());
    }

    #[test]
    fn sweep_threshold_is_computed_on_the_database_clock() {
        assert!(SWEEP_QUERY.contains("applied_on <= NOW() - INTERVAL ? HOUR"));
    }

    #[test]
    fn pending_guard_accepts_only_pending() {
        assert!(check_pending(&application("PENDING")).is_ok());
        for terminal in ["APPROVED", "REJECTED", "WITHDRAWN"] {
            let err = check_pending(&application(terminal)).unwrap_err();
            assert!(matches!(err, LeaveError::Conflict(_)), "{terminal}");
        }
    }

    #[test]
    fn unknown_status_is_a_conflict() {
        assert!(matches!(
            check_pending(&application("LIMBO")),
            Err(LeaveError::Conflict(_))
        ));
    }

    #[test]
    fn only_the_direct_manager_may_act() {
        assert!(check_approver(Some(9), 9).is_ok());
        assert!(matches!(
            check_approver(Some(9), 10),
            Err(LeaveError::PermissionDenied(_))
        ));
        assert!(matches!(
            check_approver(None, 9),
            Err(LeaveError::PermissionDenied(_))
        ));
    }
}

//! Annual and special balance credits.
//!
//! The annual pass is idempotent per (user, policy, year): a ledger row for
//! the current year is only ever created here, so an existing row means the
//! year was already credited and the pass skips it. Redundant trigger
//! invocations therefore never double-credit; the unique key on
//! (user_id, leave_type, leave_year) backstops the check under concurrency.

use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{info, instrument, warn};

use crate::error::LeaveError;
use crate::model::leave::LeaveType;
use crate::model::leave_policy::LeavePolicy;
use crate::model::user::UserRecord;
use crate::service::notification::NotificationKind;
use crate::service::{directory, ledger, notification, policy};

#[derive(Debug, Default, Serialize)]
pub struct CreditOutcome {
    pub credited: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Credit `year` entitlements for every active user and every active policy
/// matching the user's role. Per-user failures are isolated.
#[instrument(skip(pool))]
pub async fn annual_credit_all(pool: &MySqlPool, year: i32) -> Result<CreditOutcome, LeaveError> {
    let users = directory::list_active_users(pool).await?;
    let policies = policy::list_active(pool).await?;

    let mut outcome = CreditOutcome::default();

    for user in &users {
        let Some(role) = user.role() else {
            warn!(user_id = user.id, role_id = user.role_id, "user has unrecognized role");
            outcome.failed += 1;
            continue;
        };

        for entry in policies.iter().filter(|p| p.applies_to(role)) {
            match credit_user_policy(pool, user, entry, year).await {
                Ok(true) => outcome.credited += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    warn!(user_id = user.id, policy_id = entry.id, error = %e,
                        "annual credit failed for user/policy");
                    outcome.failed += 1;
                }
            }
        }
    }

    if outcome.credited > 0 {
        info!(year, credited = outcome.credited, skipped = outcome.skipped,
            failed = outcome.failed, "annual credit pass done");
    }

    Ok(outcome)
}

/// Admin-triggered annual credit for a single user.
#[instrument(skip(pool))]
pub async fn annual_credit_for_user(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
) -> Result<CreditOutcome, LeaveError> {
    let user = directory::get_user(pool, user_id).await?;
    let role = user
        .role()
        .ok_or_else(|| LeaveError::Validation("user has no recognized role".into()))?;

    let policies = policy::list_active(pool).await?;
    let mut outcome = CreditOutcome::default();

    for entry in policies.iter().filter(|p| p.applies_to(role)) {
        if credit_user_policy(pool, &user, entry, year).await? {
            outcome.credited += 1;
        } else {
            outcome.skipped += 1;
        }
    }

    Ok(outcome)
}

/// One user, one policy, one year. Returns false when the year was already
/// credited (no-op).
async fn credit_user_policy(
    pool: &MySqlPool,
    user: &UserRecord,
    entry: &LeavePolicy,
    year: i32,
) -> Result<bool, LeaveError> {
    let leave_type: LeaveType = entry
        .leave_type
        .parse()
        .map_err(|_| LeaveError::Validation(format!("unknown leave type {}", entry.leave_type)))?;

    // Already-credited guard: the current-year row only comes from this pass.
    if ledger::exists(pool, user.id, entry.leave_type.as_str(), year).await? {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;

    ledger::credit(
        &mut tx,
        user.id,
        leave_type,
        year,
        entry.annual_credit,
        entry.max_accumulation,
    )
    .await?;

    if entry.is_carry_forward {
        ledger::credit_with_carry_forward(
            &mut tx,
            user.id,
            leave_type,
            year - 1,
            year,
            entry.max_accumulation,
        )
        .await?;
    }

    tx.commit().await?;

    notification::notify(
        pool,
        user.id,
        NotificationKind::LeaveCredit,
        &format!("{} leave credited for {year}", leave_type),
    )
    .await;

    Ok(true)
}

#[derive(Debug, Serialize)]
pub struct SpecialCreditResult {
    pub user_id: u64,
    pub success: bool,
    pub message: String,
}

/// Credit an arbitrary amount to a set of users for one leave type. Each
/// user is attempted independently; failures are reported per user.
#[instrument(skip(pool, user_ids, reason))]
pub async fn special_credit(
    pool: &MySqlPool,
    user_ids: &[u64],
    leave_type: LeaveType,
    year: i32,
    amount: f32,
    reason: &str,
) -> Vec<SpecialCreditResult> {
    let mut results = Vec::with_capacity(user_ids.len());

    for &user_id in user_ids {
        let result = special_credit_one(pool, user_id, leave_type, year, amount, reason).await;
        results.push(match result {
            Ok(new_balance) => SpecialCreditResult {
                user_id,
                success: true,
                message: format!("credited {amount}; new balance {new_balance}"),
            },
            Err(e) => {
                warn!(user_id, error = %e, "special credit failed");
                SpecialCreditResult {
                    user_id,
                    success: false,
                    message: e.to_string(),
                }
            }
        });
    }

    results
}

async fn special_credit_one(
    pool: &MySqlPool,
    user_id: u64,
    leave_type: LeaveType,
    year: i32,
    amount: f32,
    reason: &str,
) -> Result<f32, LeaveError> {
    // Confirms the user exists before touching the ledger.
    directory::get_user(pool, user_id).await?;

    let mut tx = pool.begin().await?;
    let new_balance = ledger::credit(&mut tx, user_id, leave_type, year, amount, None).await?;
    tx.commit().await?;

    notification::notify(
        pool,
        user_id,
        NotificationKind::LeaveCredit,
        &format!("{amount} {leave_type} leave days credited: {reason}"),
    )
    .await;

    Ok(new_balance)
}

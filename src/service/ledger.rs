//! Authoritative store of per-(user, leave type, year) entitlement.
//!
//! Every mutation runs inside a caller-provided transaction and takes the
//! target row with `SELECT ... FOR UPDATE`, so concurrent debits against the
//! same key serialize at the database and the balance precondition is never
//! checked against a stale read.

use sqlx::{MySql, MySqlPool, Transaction};
use tracing::debug;

use crate::error::LeaveError;
use crate::model::leave::LeaveType;
use crate::model::leave_balance::LeaveBalance;

const BALANCE_COLUMNS: &str = "id, user_id, leave_type, balance, used, leave_year";

/// Advisory read, no lock. Submit-time eligibility uses this; the balance is
/// not reserved, so approval can still fail later with InsufficientBalance.
pub async fn get_balance(
    pool: &MySqlPool,
    user_id: u64,
    leave_type: LeaveType,
    year: i32,
) -> Result<LeaveBalance, LeaveError> {
    let balance = sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances \
         WHERE user_id = ? AND leave_type = ? AND leave_year = ?"
    ))
    .bind(user_id)
    .bind(leave_type.as_ref())
    .bind(year)
    .fetch_optional(pool)
    .await?;

    balance.ok_or_else(|| {
        LeaveError::not_found(
            "LeaveBalance",
            format!("user {user_id}, type {leave_type}, year {year}"),
        )
    })
}

pub async fn list_for_user(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
) -> Result<Vec<LeaveBalance>, LeaveError> {
    let balances = sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances \
         WHERE user_id = ? AND leave_year = ? ORDER BY leave_type"
    ))
    .bind(user_id)
    .bind(year)
    .fetch_all(pool)
    .await?;

    Ok(balances)
}

/// Lock the ledger row for this key, if it exists.
pub async fn fetch_for_update(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type: &str,
    year: i32,
) -> Result<Option<LeaveBalance>, LeaveError> {
    let row = sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances \
         WHERE user_id = ? AND leave_type = ? AND leave_year = ? FOR UPDATE"
    ))
    .bind(user_id)
    .bind(leave_type)
    .bind(year)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row)
}

/// Whether any ledger row exists for this key. Plain read; the annual-credit
/// pass uses it as its "already credited this year" guard.
pub async fn exists(
    pool: &MySqlPool,
    user_id: u64,
    leave_type: &str,
    year: i32,
) -> Result<bool, LeaveError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leave_balances \
         WHERE user_id = ? AND leave_type = ? AND leave_year = ?",
    )
    .bind(user_id)
    .bind(leave_type)
    .bind(year)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Add `amount` to the balance, creating the row lazily on first credit.
/// The result is clamped to `max_accumulation` when set. Returns the new
/// balance.
pub async fn credit(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type: LeaveType,
    year: i32,
    amount: f32,
    max_accumulation: Option<f32>,
) -> Result<f32, LeaveError> {
    if amount < 0.0 {
        return Err(LeaveError::Validation(
            "credit amount cannot be negative".into(),
        ));
    }

    match fetch_for_update(tx, user_id, leave_type.as_ref(), year).await? {
        Some(row) => {
            let new_balance = clamped_balance(row.balance, amount, max_accumulation);
            sqlx::query("UPDATE leave_balances SET balance = ? WHERE id = ?")
                .bind(new_balance)
                .bind(row.id)
                .execute(&mut **tx)
                .await?;
            debug!(user_id, %leave_type, year, new_balance, "credited balance");
            Ok(new_balance)
        }
        None => {
            let initial = clamped_balance(0.0, amount, max_accumulation);
            sqlx::query(
                "INSERT INTO leave_balances (user_id, leave_type, balance, used, leave_year) \
                 VALUES (?, ?, ?, 0, ?)",
            )
            .bind(user_id)
            .bind(leave_type.as_ref())
            .bind(initial)
            .bind(year)
            .execute(&mut **tx)
            .await?;
            debug!(user_id, %leave_type, year, balance = initial, "created balance row");
            Ok(initial)
        }
    }
}

/// Consume `amount` days: `balance -= amount; used += amount`. Fails with
/// InsufficientBalance when the locked row holds less than `amount`; the
/// caller's transaction rollback then undoes any correlated status change.
pub async fn debit(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type: &str,
    year: i32,
    amount: f32,
) -> Result<LeaveBalance, LeaveError> {
    if amount < 0.0 {
        return Err(LeaveError::Validation(
            "debit amount cannot be negative".into(),
        ));
    }

    let row = fetch_for_update(tx, user_id, leave_type, year)
        .await?
        .ok_or_else(|| {
            LeaveError::not_found(
                "LeaveBalance",
                format!("user {user_id}, type {leave_type}, year {year}"),
            )
        })?;

    if row.balance < amount {
        return Err(LeaveError::InsufficientBalance {
            available: row.balance,
            required: amount,
        });
    }

    let new_balance = row.balance - amount;
    let new_used = row.used + amount;

    sqlx::query("UPDATE leave_balances SET balance = ?, used = ? WHERE id = ?")
        .bind(new_balance)
        .bind(new_used)
        .bind(row.id)
        .execute(&mut **tx)
        .await?;

    debug!(user_id, leave_type, year, new_balance, new_used, "debited balance");

    Ok(LeaveBalance {
        balance: new_balance,
        used: new_used,
        ..row
    })
}

/// Roll unused balance from `from_year` into `to_year`. The carried amount
/// is clamped so the target-year balance never exceeds `max_accumulation`,
/// and is never negative. Returns the target-year balance after the carry.
pub async fn credit_with_carry_forward(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type: LeaveType,
    from_year: i32,
    to_year: i32,
    max_accumulation: Option<f32>,
) -> Result<f32, LeaveError> {
    let prior = fetch_for_update(tx, user_id, leave_type.as_ref(), from_year).await?;
    let from_balance = prior.map(|b| b.balance).unwrap_or(0.0);

    let target = fetch_for_update(tx, user_id, leave_type.as_ref(), to_year).await?;
    let to_balance = target.as_ref().map(|b| b.balance).unwrap_or(0.0);

    let carried = carry_forward_amount(from_balance, to_balance, max_accumulation);

    let new_balance = to_balance + carried;
    match target {
        Some(row) if carried > 0.0 => {
            sqlx::query("UPDATE leave_balances SET balance = ? WHERE id = ?")
                .bind(new_balance)
                .bind(row.id)
                .execute(&mut **tx)
                .await?;
        }
        Some(_) => {}
        None => {
            sqlx::query(
                "INSERT INTO leave_balances (user_id, leave_type, balance, used, leave_year) \
                 VALUES (?, ?, ?, 0, ?)",
            )
            .bind(user_id)
            .bind(leave_type.as_ref())
            .bind(new_balance)
            .bind(to_year)
            .execute(&mut **tx)
            .await?;
        }
    }

    debug!(user_id, %leave_type, from_year, to_year, carried, new_balance, "carry-forward applied");

    Ok(new_balance)
}

/// `current + amount`, clamped to the accumulation cap when one is set.
fn clamped_balance(current: f32, amount: f32, max_accumulation: Option<f32>) -> f32 {
    let next = current + amount;
    match max_accumulation {
        Some(cap) if next > cap => cap,
        _ => next,
    }
}

/// How much of `from_balance` may roll into a year whose balance is already
/// `to_balance`, without exceeding the cap. Never negative.
fn carry_forward_amount(from_balance: f32, to_balance: f32, max_accumulation: Option<f32>) -> f32 {
    let mut carried = from_balance;
    if let Some(cap) = max_accumulation {
        if to_balance + carried > cap {
            carried = cap - to_balance;
        }
    }
    carried.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_without_cap_is_plain_addition() {
        assert_eq!(clamped_balance(5.0, 12.0, None), 17.0);
    }

    #[test]
    fn credit_clamps_to_cap() {
        assert_eq!(clamped_balance(8.0, 12.0, Some(15.0)), 15.0);
    }

    #[test]
    fn credit_below_cap_is_untouched() {
        assert_eq!(clamped_balance(1.0, 3.0, Some(15.0)), 4.0);
    }

    #[test]
    fn carry_forward_clamps_against_target_sum() {
        // from 10, to 5, cap 12 -> target ends at 12, not 15
        let carried = carry_forward_amount(10.0, 5.0, Some(12.0));
        assert_eq!(carried, 7.0);
        assert_eq!(5.0 + carried, 12.0);
    }

    #[test]
    fn carry_forward_never_negative() {
        // Target already over the cap: nothing is carried, nothing removed.
        assert_eq!(carry_forward_amount(10.0, 13.0, Some(12.0)), 0.0);
    }

    #[test]
    fn carry_forward_unlimited_without_cap() {
        assert_eq!(carry_forward_amount(10.0, 5.0, None), 10.0);
    }

    #[test]
    fn credit_then_debit_restores_balance_and_moves_used() {
        // Arithmetic mirror of the ledger round trip: credit(n) then
        // debit(n) leaves balance unchanged and used increased by n.
        let balance = clamped_balance(7.0, 3.0, None);
        let after_debit = balance - 3.0;
        let used = 0.0 + 3.0;
        assert_eq!(after_debit, 7.0);
        assert_eq!(used, 3.0);
    }
}

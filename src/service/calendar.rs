use chrono::{Datelike, Duration, NaiveDate, Weekday};
use sqlx::MySqlPool;

use crate::error::LeaveError;
use crate::model::holiday::Holiday;

/// Working days between two dates, inclusive, counting Mon-Fri only.
/// Holidays are NOT subtracted: this is the figure stored on an application
/// as `number_of_days` and debited from the ledger on approval. The apply
/// path instead rejects ranges that contain a registered holiday outright.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> i32 {
    if start > end {
        return 0;
    }

    let mut days = 0;
    let mut current = start;
    while current <= end {
        if !is_weekend(current) {
            days += 1;
        }
        current += Duration::days(1);
    }
    days
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Signed day count from `start` to `end` (negative if `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Working days minus registered holidays. Reporting only; the apply path
/// uses [`working_days`].
pub fn leave_days(start: NaiveDate, end: NaiveDate, holidays: &[Holiday]) -> i32 {
    if start > end {
        return 0;
    }

    let mut days = 0;
    let mut current = start;
    while current <= end {
        if !is_weekend(current) && !holidays.iter().any(|h| h.holiday_date == current) {
            days += 1;
        }
        current += Duration::days(1);
    }
    days
}

pub async fn holidays_between(
    pool: &MySqlPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Holiday>, LeaveError> {
    let holidays = sqlx::query_as::<_, Holiday>(
        r#"
        SELECT id, name, holiday_date, holiday_type, description, is_recurring
        FROM holidays
        WHERE holiday_date BETWEEN ? AND ?
        ORDER BY holiday_date
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(holidays)
}

pub async fn is_holiday(pool: &MySqlPool, date: NaiveDate) -> Result<bool, LeaveError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM holidays WHERE holiday_date = ?")
            .bind(date)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn holiday_on(date: NaiveDate) -> Holiday {
        Holiday {
            id: 1,
            name: "Test Day".into(),
            holiday_date: date,
            holiday_type: None,
            description: None,
            is_recurring: false,
        }
    }

    #[test]
    fn full_week_has_five_working_days() {
        // 2026-08-24 is a Monday
        assert_eq!(working_days(d(2026, 8, 24), d(2026, 8, 30)), 5);
    }

    #[test]
    fn weekend_only_range_has_zero_working_days() {
        assert_eq!(working_days(d(2026, 8, 29), d(2026, 8, 30)), 0);
    }

    #[test]
    fn single_weekday_counts_one() {
        assert_eq!(working_days(d(2026, 8, 26), d(2026, 8, 26)), 1);
    }

    #[test]
    fn inverted_range_counts_zero() {
        assert_eq!(working_days(d(2026, 8, 28), d(2026, 8, 24)), 0);
    }

    #[test]
    fn working_days_does_not_subtract_holidays() {
        // A mid-week holiday still counts toward the apply-path figure.
        let wed = d(2026, 8, 26);
        assert_eq!(working_days(d(2026, 8, 24), d(2026, 8, 28)), 5);
        assert_eq!(
            leave_days(d(2026, 8, 24), d(2026, 8, 28), &[holiday_on(wed)]),
            4
        );
    }

    #[test]
    fn leave_days_ignores_weekend_holidays() {
        let sat = d(2026, 8, 29);
        assert_eq!(
            leave_days(d(2026, 8, 24), d(2026, 8, 30), &[holiday_on(sat)]),
            5
        );
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(d(2026, 8, 24), d(2026, 8, 27)), 3);
        assert_eq!(days_between(d(2026, 8, 27), d(2026, 8, 24)), -3);
    }

    #[test]
    fn weekend_detection() {
        assert!(is_weekend(d(2026, 8, 29)));
        assert!(is_weekend(d(2026, 8, 30)));
        assert!(!is_weekend(d(2026, 8, 31)));
    }
}

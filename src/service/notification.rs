use sqlx::MySqlPool;
use strum::{AsRefStr, Display};
use tracing::error;

/// What happened, from the recipient's point of view.
#[derive(Debug, Copy, Clone, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    LeaveApplication,
    LeaveApproved,
    LeaveRejected,
    LeaveWithdrawn,
    LeaveCredit,
}

/// Best-effort, fire-and-forget. A failed insert is logged and swallowed;
/// it must never roll back the core transition that triggered it.
pub async fn notify(pool: &MySqlPool, user_id: u64, kind: NotificationKind, message: &str) {
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, kind, message) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(kind.as_ref())
    .bind(message)
    .execute(pool)
    .await;

    if let Err(e) = result {
        error!(error = %e, user_id, kind = %kind, "failed to store notification");
    }
}

//! Background triggers: the hourly auto-approval sweep and the annual
//! credit pass. Both call the same service entry points as the HTTP
//! handlers and run under the same invariants, so racing a manual approval
//! is resolved by the PENDING guard, and a repeated credit pass is a no-op.

use chrono::{Datelike, Utc};
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::service::{approval, credit};

pub fn spawn(pool: MySqlPool, config: &Config) {
    let sweep_pool = pool.clone();
    let timeout_hours = config.auto_approval_timeout_hours;
    let sweep_secs = config.auto_approval_sweep_secs;

    actix_web::rt::spawn(async move {
        let mut tick = actix_web::rt::time::interval(Duration::from_secs(sweep_secs));
        loop {
            tick.tick().await;
            if let Err(e) = approval::auto_approve(&sweep_pool, timeout_hours).await {
                error!(error = %e, "auto-approval sweep failed");
            }
        }
    });

    let credit_pool = pool;
    let credit_secs = config.annual_credit_sweep_secs;

    actix_web::rt::spawn(async move {
        let mut tick = actix_web::rt::time::interval(Duration::from_secs(credit_secs));
        loop {
            tick.tick().await;
            let year = Utc::now().year();
            match credit::annual_credit_all(&credit_pool, year).await {
                Ok(outcome) if outcome.credited > 0 => {
                    info!(year, credited = outcome.credited, "annual credit applied");
                }
                Ok(_) => {} // everyone already credited; normal for most ticks
                Err(e) => error!(error = %e, "annual credit pass failed"),
            }
        }
    });
}

use crate::api::balance::SpecialCredit;
use crate::api::holiday::CreateHoliday;
use crate::api::leave::{ApplyLeave, ApprovalDecision, LeaveListResponse};
use crate::api::policy::CreatePolicy;
use crate::model::leave::{LeaveStatus, LeaveType};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management System

Tracks employee leave entitlement and the lifecycle of leave requests.

### Key Features
- **Leave Applications**
  - Apply, withdraw, and view leave history
- **Approvals**
  - Manager approval queue, approve/reject with remarks, automatic
    approval of requests pending past the configured timeout
- **Balances**
  - Per-user, per-type, per-year ledger with annual and carry-forward
    credits
- **Policies & Holidays**
  - Per-type leave policies and an organization holiday calendar

### Security
Endpoints are protected using **JWT Bearer authentication**. Policy,
holiday, and credit administration require the **Admin** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::apply_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::pending_approvals,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::withdraw_leave,

        crate::api::balance::my_balances,
        crate::api::balance::annual_credit_user,
        crate::api::balance::special_credit,

        crate::api::policy::create_policy,
        crate::api::policy::list_policies,

        crate::api::holiday::create_holiday,
        crate::api::holiday::list_holidays,
        crate::api::holiday::delete_holiday
    ),
    components(
        schemas(
            ApplyLeave,
            ApprovalDecision,
            LeaveListResponse,
            SpecialCredit,
            CreatePolicy,
            CreateHoliday,
            LeaveType,
            LeaveStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave application lifecycle APIs"),
        (name = "Balance", description = "Leave balance ledger APIs"),
        (name = "Policy", description = "Leave policy administration APIs"),
        (name = "Holiday", description = "Holiday calendar APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

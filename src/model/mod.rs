pub mod holiday;
pub mod leave;
pub mod leave_application;
pub mod leave_balance;
pub mod leave_policy;
pub mod role;
pub mod user;

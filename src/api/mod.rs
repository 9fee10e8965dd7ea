pub mod balance;
pub mod holiday;
pub mod leave;
pub mod policy;

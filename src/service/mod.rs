pub mod approval;
pub mod calendar;
pub mod credit;
pub mod directory;
pub mod ledger;
pub mod notification;
pub mod policy;

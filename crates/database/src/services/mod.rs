pub mod booking;
pub mod component;
pub mod ledger;
pub mod penalty;
pub mod stats;
pub mod user;

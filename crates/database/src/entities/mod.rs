pub mod booking;
pub mod component;
pub mod penalty;
pub mod user;

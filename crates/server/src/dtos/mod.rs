pub mod auth;
pub mod booking;
pub mod component;
pub mod dashboard;
pub mod penalty;
pub mod user;

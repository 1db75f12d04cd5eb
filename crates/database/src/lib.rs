//! Persistence and business rules for the lab inventory.
//!
//! - [`services::ledger::InventoryLedger`] owns every stock quantity change
//! - [`services::booking::BookingService`] drives the booking state machine
//! - [`services::penalty::PenaltyService`] records overdue and damage charges

pub mod actor;
pub mod db;
pub mod entities;
pub mod error;
pub mod services;

pub use actor::Actor;
pub use error::{Error, Result};

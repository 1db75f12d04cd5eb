//! Domain vocabulary shared by the database and server crates.

pub mod booking_status;
pub mod component_status;
pub mod penalty;
pub mod penalty_policy;
pub mod role;
pub mod stock_bucket;

pub use booking_status::{BookingStatus, MAX_BOOKING_QUANTITY};
pub use component_status::ComponentStatus;
pub use penalty::{DamageSeverity, PenaltyStatus, PenaltyType};
pub use penalty_policy::{AmountRange, PenaltyPolicy, PolicyError, days_late};
pub use role::Role;
pub use stock_bucket::StockBucket;

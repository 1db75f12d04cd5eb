use crate::auth::JwtKeys;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use models::PenaltyPolicy;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt: Arc<JwtKeys>,
    pub policy: PenaltyPolicy,
    /// Offset of the lab's wall clock from UTC; decides when a day ends
    pub utc_offset: FixedOffset,
}

impl AppState {
    pub fn new(db: DatabaseConnection, jwt: JwtKeys, policy: PenaltyPolicy) -> Self {
        Self {
            db,
            jwt: Arc::new(jwt),
            policy,
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    /// Lab wall-clock time handed to the services
    pub fn now(&self) -> NaiveDateTime {
        local_time(Utc::now(), self.utc_offset)
    }

    /// The lab's calendar day, used for due dates and overdue checks
    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

fn local_time(instant: chrono::DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    instant.with_timezone(&offset).naive_local()
}

use crate::dtos::penalty::PenaltyResponse;
use chrono::{NaiveDate, NaiveDateTime};
use database::{
    entities::booking,
    services::booking::{Removal, SweepReport},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub component_id: Uuid,
    pub quantity: i32,
    /// One of `requested`, `approved`, `rejected`, `returned`, `overdue`, `cancelled`
    pub status: String,
    pub reason: String,
    pub requested_date: NaiveDateTime,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDateTime>,
    pub is_overdue: bool,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<booking::Model> for BookingResponse {
    fn from(model: booking::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            component_id: model.component_id,
            quantity: model.quantity,
            status: model.status.to_string(),
            reason: model.reason,
            requested_date: model.requested_date,
            expected_return_date: model.expected_return_date,
            actual_return_date: model.actual_return_date,
            is_overdue: model.is_overdue,
            decided_by: model.decided_by,
            decided_at: model.decided_at,
            rejection_reason: model.rejection_reason,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub component_id: Uuid,
    /// Between 1 and 5
    pub quantity: i32,
    pub expected_return_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingQueryParams {
    /// Booking status; `pending`, `active` and `completed` are accepted as aliases
    pub status: Option<String>,
    /// Admins only; ignored for students
    pub user_id: Option<Uuid>,
    pub component_id: Option<Uuid>,
}

/// A closed loan and the late-return penalty it produced, if any
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReturnResponse {
    pub booking: BookingResponse,
    pub penalty: Option<PenaltyResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteBookingResponse {
    /// `cancelled` or `deleted`
    pub outcome: String,
    pub booking: Option<BookingResponse>,
}

impl From<Removal> for DeleteBookingResponse {
    fn from(removal: Removal) -> Self {
        match removal {
            Removal::Cancelled(model) => Self {
                outcome: "cancelled".to_owned(),
                booking: Some(model.into()),
            },
            Removal::Deleted => Self {
                outcome: "deleted".to_owned(),
                booking: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SweepResponse {
    pub transitioned: u32,
    pub penalties_created: u32,
    pub penalties_updated: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            transitioned: report.transitioned,
            penalties_created: report.penalties_created,
            penalties_updated: report.penalties_updated,
            skipped: report.skipped,
            failed: report.failed,
        }
    }
}

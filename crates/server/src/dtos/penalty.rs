use chrono::NaiveDateTime;
use database::{entities::penalty, services::penalty::PenaltyTotals};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PenaltyResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub component_id: Uuid,
    /// `overdue`, `damage` or `lost`
    pub penalty_type: String,
    /// Display label such as "Late Return"
    pub label: String,
    pub amount: i64,
    /// `pending` or `paid`
    pub status: String,
    pub notes: Option<String>,
    pub penalty_date: NaiveDateTime,
    pub paid_at: Option<NaiveDateTime>,
    pub paid_by: Option<Uuid>,
}

impl From<penalty::Model> for PenaltyResponse {
    fn from(model: penalty::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            booking_id: model.booking_id,
            component_id: model.component_id,
            penalty_type: model.penalty_type.to_string(),
            label: model.penalty_type.label().to_owned(),
            amount: model.amount,
            status: model.status.to_string(),
            notes: model.notes,
            penalty_date: model.penalty_date,
            paid_at: model.paid_at,
            paid_by: model.paid_by,
        }
    }
}

/// Damage or loss report filed by an admin
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePenaltyRequest {
    pub component_id: Uuid,
    pub booking_id: Option<Uuid>,
    /// Required when `booking_id` is absent
    pub user_id: Option<Uuid>,
    /// `minor`, `major` or `lost`
    pub severity: String,
    /// Defaults to the bottom of the severity's range
    pub amount: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePenaltyStatusRequest {
    /// Only `paid` is accepted
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PenaltyQueryParams {
    /// `pending` or `paid`
    pub status: Option<String>,
    /// `overdue`, `damage` or `lost`
    pub penalty_type: Option<String>,
    /// Admins only; ignored for students
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PenaltyTotalsResponse {
    pub count: u64,
    pub total: i64,
    pub paid: i64,
    pub pending: i64,
}

impl From<PenaltyTotals> for PenaltyTotalsResponse {
    fn from(totals: PenaltyTotals) -> Self {
        Self {
            count: totals.count,
            total: totals.total,
            paid: totals.paid,
            pending: totals.pending,
        }
    }
}

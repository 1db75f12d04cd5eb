use crate::dtos::{component::ComponentResponse, penalty::PenaltyTotalsResponse};
use database::services::stats::{
    AdminStats, CategorySummary, ComponentUsage, InventoryTotals, UserStats,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryTotalsResponse {
    pub components: u64,
    pub total_units: i64,
    pub available_units: i64,
    pub on_loan_units: i64,
    pub damaged_units: i64,
    pub under_maintenance_units: i64,
}

impl From<InventoryTotals> for InventoryTotalsResponse {
    fn from(totals: InventoryTotals) -> Self {
        Self {
            components: totals.components,
            total_units: totals.total_units,
            available_units: totals.available_units,
            on_loan_units: totals.on_loan_units,
            damaged_units: totals.damaged_units,
            under_maintenance_units: totals.under_maintenance_units,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminStatsResponse {
    pub students: u64,
    pub inventory: InventoryTotalsResponse,
    /// Number of bookings in each status
    pub bookings: BTreeMap<String, u64>,
    pub penalties: PenaltyTotalsResponse,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(stats: AdminStats) -> Self {
        Self {
            students: stats.students,
            inventory: stats.inventory.into(),
            bookings: stats.bookings,
            penalties: stats.penalties.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserStatsResponse {
    pub total_bookings: u64,
    pub active_bookings: u64,
    pub overdue_bookings: u64,
    pub penalties: PenaltyTotalsResponse,
}

impl From<UserStats> for UserStatsResponse {
    fn from(stats: UserStats) -> Self {
        Self {
            total_bookings: stats.total_bookings,
            active_bookings: stats.active_bookings,
            overdue_bookings: stats.overdue_bookings,
            penalties: stats.penalties.into(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LowStockQueryParams {
    /// Defaults to 5
    #[serde(default = "default_threshold")]
    pub threshold: i32,
}

fn default_threshold() -> i32 {
    5
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListingQueryParams {
    /// Defaults to 10, at most 100
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    10
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopComponentResponse {
    pub component: ComponentResponse,
    /// Loans that were approved, whether or not they came back
    pub bookings: u64,
    pub units: i64,
}

impl From<ComponentUsage> for TopComponentResponse {
    fn from(usage: ComponentUsage) -> Self {
        Self {
            component: usage.component.into(),
            bookings: usage.bookings,
            units: usage.units,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategorySummaryResponse {
    pub category: String,
    pub components: u64,
    pub total_units: i64,
    pub available_units: i64,
    pub on_loan_units: i64,
}

impl From<CategorySummary> for CategorySummaryResponse {
    fn from(summary: CategorySummary) -> Self {
        Self {
            category: summary.category,
            components: summary.components,
            total_units: summary.total_units,
            available_units: summary.available_units,
            on_loan_units: summary.on_loan_units,
        }
    }
}

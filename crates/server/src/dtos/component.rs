use chrono::NaiveDateTime;
use database::{
    entities::component,
    services::{component::Removal, ledger::StockLevels},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub category: String,
    pub description: Option<String>,
    /// `active` or `retired`
    pub status: String,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub on_loan_quantity: i32,
    pub damaged_quantity: i32,
    pub under_maintenance_quantity: i32,
    pub replacement_cost: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<component::Model> for ComponentResponse {
    fn from(model: component::Model) -> Self {
        Self {
            on_loan_quantity: model.on_loan_quantity(),
            id: model.id,
            name: model.name,
            code: model.code,
            category: model.category,
            description: model.description,
            status: model.status.to_string(),
            total_quantity: model.total_quantity,
            available_quantity: model.available_quantity,
            damaged_quantity: model.damaged_quantity,
            under_maintenance_quantity: model.under_maintenance_quantity,
            replacement_cost: model.replacement_cost,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateComponentRequest {
    pub name: String,
    pub code: String,
    pub category: String,
    pub description: Option<String>,
    #[serde(default)]
    pub total_quantity: i32,
    /// Charged per unit when an item is lost
    #[serde(default)]
    pub replacement_cost: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateComponentRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub replacement_cost: Option<i64>,
    /// New total after an audit; cannot drop below units in use
    pub total_quantity: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ComponentQueryParams {
    pub category: Option<String>,
    /// Matches name or code
    pub search: Option<String>,
    #[serde(default)]
    pub include_retired: bool,
}

/// Units to move between stock buckets
#[derive(Debug, Deserialize, ToSchema)]
pub struct StockMoveRequest {
    pub quantity: i32,
    /// `available` or `on_loan` for damage and maintenance, `damaged` or
    /// `under_maintenance` for restore
    pub bucket: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockLevelsResponse {
    pub total: i32,
    pub available: i32,
    pub on_loan: i32,
    pub damaged: i32,
    pub under_maintenance: i32,
}

impl From<StockLevels> for StockLevelsResponse {
    fn from(levels: StockLevels) -> Self {
        Self {
            total: levels.total,
            available: levels.available,
            on_loan: levels.on_loan,
            damaged: levels.damaged,
            under_maintenance: levels.under_maintenance,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveComponentResponse {
    /// `retired` or `deleted`
    pub outcome: String,
    pub component: Option<ComponentResponse>,
}

impl From<Removal> for RemoveComponentResponse {
    fn from(removal: Removal) -> Self {
        match removal {
            Removal::Retired(model) => Self {
                outcome: "retired".to_owned(),
                component: Some(model.into()),
            },
            Removal::Deleted => Self {
                outcome: "deleted".to_owned(),
                component: None,
            },
        }
    }
}

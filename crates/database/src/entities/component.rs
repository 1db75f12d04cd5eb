use models::ComponentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A kind of lab hardware tracked by aggregate counts
///
/// The quantity columns are only ever changed through
/// [`InventoryLedger`](crate::services::ledger::InventoryLedger).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "components")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub category: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: ComponentStatus,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub damaged_quantity: i32,
    pub under_maintenance_quantity: i32,
    pub replacement_cost: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    /// Units currently out with borrowers
    pub fn on_loan_quantity(&self) -> i32 {
        self.total_quantity
            - self.available_quantity
            - self.damaged_quantity
            - self.under_maintenance_quantity
    }

    pub fn is_active(&self) -> bool {
        self.status == ComponentStatus::Active
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::penalty::Entity")]
    Penalties,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::penalty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Penalties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

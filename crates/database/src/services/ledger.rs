//! Inventory Ledger: the only code path that changes component quantities.
//!
//! Each operation is one conditional `UPDATE` scoped to a single component
//! row. The guard in the `WHERE` clause encodes the precondition, so two
//! callers racing on the same row can never both pass a check that only
//! one of them should. A zero affected-row count is turned into a typed
//! error by re-reading the row.

use crate::{
    entities::component,
    error::{Error, Result},
};
use log::{debug, info};
use models::StockBucket;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    prelude::Uuid,
    sea_query::{Expr, SimpleExpr},
};
use serde::Serialize;

/// Quantity buckets of one component at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockLevels {
    pub total: i32,
    pub available: i32,
    pub damaged: i32,
    pub under_maintenance: i32,
    pub on_loan: i32,
}

impl StockLevels {
    pub fn of(&self, bucket: StockBucket) -> i32 {
        match bucket {
            StockBucket::Available => self.available,
            StockBucket::OnLoan => self.on_loan,
            StockBucket::Damaged => self.damaged,
            StockBucket::UnderMaintenance => self.under_maintenance,
        }
    }
}

impl From<&component::Model> for StockLevels {
    fn from(model: &component::Model) -> Self {
        Self {
            total: model.total_quantity,
            available: model.available_quantity,
            damaged: model.damaged_quantity,
            under_maintenance: model.under_maintenance_quantity,
            on_loan: model.on_loan_quantity(),
        }
    }
}

pub struct InventoryLedger;

impl InventoryLedger {
    /// Reads the current buckets of a component
    pub async fn snapshot<C: ConnectionTrait>(conn: &C, component_id: Uuid) -> Result<StockLevels> {
        component::Entity::find_by_id(component_id)
            .one(conn)
            .await?
            .map(|model| StockLevels::from(&model))
            .ok_or(Error::NotFound("component"))
    }

    /// Takes `quantity` units out of the available pool
    pub async fn reserve<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        quantity: i32,
    ) -> Result<()> {
        ensure_positive(quantity)?;

        let result = component::Entity::update_many()
            .col_expr(
                component::Column::AvailableQuantity,
                Expr::col(component::Column::AvailableQuantity).sub(quantity),
            )
            .filter(component::Column::Id.eq(component_id))
            .filter(component::Column::AvailableQuantity.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let levels = Self::snapshot(conn, component_id).await?;
            debug!(
                "Reserve of {quantity} on component {component_id} refused, {} available",
                levels.available
            );
            return Err(Error::InsufficientStock {
                requested: quantity,
                available: levels.available,
            });
        }

        debug!("Reserved {quantity} units of component {component_id}");
        Ok(())
    }

    /// Puts `quantity` units back into the available pool
    ///
    /// The pool is capped at `total - damaged - under_maintenance`, so units
    /// written off while on loan are not resurrected by the return.
    pub async fn release<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        quantity: i32,
    ) -> Result<()> {
        ensure_positive(quantity)?;

        let ceiling = Expr::col(component::Column::TotalQuantity)
            .sub(Expr::col(component::Column::DamagedQuantity))
            .sub(Expr::col(component::Column::UnderMaintenanceQuantity));
        let raised = Expr::col(component::Column::AvailableQuantity).add(quantity);
        let capped = Expr::case(Expr::expr(raised.clone()).gt(ceiling.clone()), ceiling)
            .finally(raised);

        let result = component::Entity::update_many()
            .col_expr(
                component::Column::AvailableQuantity,
                SimpleExpr::Case(Box::new(capped)),
            )
            .filter(component::Column::Id.eq(component_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(Error::NotFound("component"));
        }

        debug!("Released {quantity} units of component {component_id}");
        Ok(())
    }

    /// Moves units from the available or on-loan bucket into `damaged`
    pub async fn mark_damaged<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        quantity: i32,
        source: StockBucket,
    ) -> Result<StockLevels> {
        Self::require_source(source, &[StockBucket::Available, StockBucket::OnLoan])?;
        Self::transfer(conn, component_id, quantity, source, StockBucket::Damaged).await
    }

    /// Moves units from the available or on-loan bucket into `under_maintenance`
    pub async fn mark_under_maintenance<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        quantity: i32,
        source: StockBucket,
    ) -> Result<StockLevels> {
        Self::require_source(source, &[StockBucket::Available, StockBucket::OnLoan])?;
        Self::transfer(
            conn,
            component_id,
            quantity,
            source,
            StockBucket::UnderMaintenance,
        )
        .await
    }

    /// Returns repaired units from `damaged` or `under_maintenance` to the pool
    pub async fn restore<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        quantity: i32,
        from: StockBucket,
    ) -> Result<StockLevels> {
        Self::require_source(from, &[StockBucket::Damaged, StockBucket::UnderMaintenance])?;
        Self::transfer(conn, component_id, quantity, from, StockBucket::Available).await
    }

    /// Adds newly purchased units to both the total and the available pool
    pub async fn restock<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        quantity: i32,
    ) -> Result<StockLevels> {
        ensure_positive(quantity)?;

        let result = component::Entity::update_many()
            .col_expr(
                component::Column::TotalQuantity,
                Expr::col(component::Column::TotalQuantity).add(quantity),
            )
            .col_expr(
                component::Column::AvailableQuantity,
                Expr::col(component::Column::AvailableQuantity).add(quantity),
            )
            .filter(component::Column::Id.eq(component_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(Error::NotFound("component"));
        }

        info!("Restocked component {component_id} with {quantity} units");
        Self::snapshot(conn, component_id).await
    }

    /// Sets the total after an audit or write-off
    ///
    /// The difference is applied to the available pool as a delta. Fails if
    /// the new total cannot cover units on loan, damaged or under maintenance.
    pub async fn set_total<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        new_total: i32,
    ) -> Result<StockLevels> {
        if new_total < 0 {
            return Err(Error::InvalidQuantity {
                requested: new_total,
                committed: 0,
            });
        }

        let committed = Expr::col(component::Column::TotalQuantity)
            .sub(Expr::col(component::Column::AvailableQuantity));

        let result = component::Entity::update_many()
            .col_expr(
                component::Column::AvailableQuantity,
                Expr::col(component::Column::AvailableQuantity)
                    .add(new_total)
                    .sub(Expr::col(component::Column::TotalQuantity)),
            )
            .col_expr(component::Column::TotalQuantity, Expr::value(new_total))
            .filter(component::Column::Id.eq(component_id))
            .filter(Expr::expr(committed).lte(new_total))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let levels = Self::snapshot(conn, component_id).await?;
            return Err(Error::InvalidQuantity {
                requested: new_total,
                committed: levels.total - levels.available,
            });
        }

        info!("Set total of component {component_id} to {new_total}");
        Self::snapshot(conn, component_id).await
    }

    fn require_source(bucket: StockBucket, allowed: &[StockBucket]) -> Result<()> {
        if allowed.contains(&bucket) {
            Ok(())
        } else {
            Err(Error::InvalidRequest(format!(
                "units cannot be moved out of the {bucket} bucket by this operation"
            )))
        }
    }

    /// Moves `quantity` units from one stored bucket (or the derived on-loan
    /// bucket) into another stored bucket in a single guarded update
    async fn transfer<C: ConnectionTrait>(
        conn: &C,
        component_id: Uuid,
        quantity: i32,
        from: StockBucket,
        to: StockBucket,
    ) -> Result<StockLevels> {
        ensure_positive(quantity)?;

        let target = column_of(to).ok_or_else(|| {
            Error::InvalidRequest("units only go on loan through an approved booking".to_owned())
        })?;

        let mut update = component::Entity::update_many()
            .filter(component::Column::Id.eq(component_id))
            .col_expr(target, Expr::col(target).add(quantity));

        update = match column_of(from) {
            Some(source) => update
                .col_expr(source, Expr::col(source).sub(quantity))
                .filter(source.gte(quantity)),
            None => update.filter(Expr::expr(on_loan_expr()).gte(quantity)),
        };

        let result = update.exec(conn).await?;

        if result.rows_affected == 0 {
            let levels = Self::snapshot(conn, component_id).await?;
            return Err(Error::InsufficientStock {
                requested: quantity,
                available: levels.of(from),
            });
        }

        info!("Moved {quantity} units of component {component_id} from {from} to {to}");
        Self::snapshot(conn, component_id).await
    }
}

fn ensure_positive(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(Error::InvalidRequest(format!(
            "quantity must be at least 1, got {quantity}"
        )));
    }
    Ok(())
}

fn column_of(bucket: StockBucket) -> Option<component::Column> {
    match bucket {
        StockBucket::Available => Some(component::Column::AvailableQuantity),
        StockBucket::Damaged => Some(component::Column::DamagedQuantity),
        StockBucket::UnderMaintenance => Some(component::Column::UnderMaintenanceQuantity),
        StockBucket::OnLoan => None,
    }
}

fn on_loan_expr() -> SimpleExpr {
    Expr::col(component::Column::TotalQuantity)
        .sub(Expr::col(component::Column::AvailableQuantity))
        .sub(Expr::col(component::Column::DamagedQuantity))
        .sub(Expr::col(component::Column::UnderMaintenanceQuantity))
}

use crate::{
    actor::Actor,
    entities::{booking, component, penalty},
    error::{Error, Result},
    services::ledger::{InventoryLedger, StockLevels},
};
use chrono::NaiveDateTime;
use log::info;
use models::{ComponentStatus, StockBucket};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::Uuid,
};

#[derive(Debug, Clone)]
pub struct NewComponent {
    pub name: String,
    pub code: String,
    pub category: String,
    pub description: Option<String>,
    pub total_quantity: i32,
    pub replacement_cost: i64,
}

/// Fields an admin may change; `None` leaves the field as it is
#[derive(Debug, Clone, Default)]
pub struct ComponentChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub replacement_cost: Option<i64>,
    /// Applied through [`InventoryLedger::set_total`]
    pub total_quantity: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentFilter {
    pub category: Option<String>,
    /// Case-insensitive match on name or code
    pub search: Option<String>,
    pub include_retired: bool,
}

/// Outcome of removing a component from the catalogue
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// Still referenced by bookings or penalties, so kept as retired
    Retired(component::Model),
    Deleted,
}

/// Which bucket movement an admin requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockMove {
    Restock,
    Damaged { source: StockBucket },
    Maintenance { source: StockBucket },
    Restore { from: StockBucket },
}

pub struct ComponentService;

impl ComponentService {
    pub async fn create(
        db: &DatabaseConnection,
        actor: &Actor,
        new: NewComponent,
        now: NaiveDateTime,
    ) -> Result<component::Model> {
        actor.require_admin()?;

        let name = required("name", &new.name)?;
        let code = required("code", &new.code)?.to_uppercase();
        let category = required("category", &new.category)?;
        if new.total_quantity < 0 {
            return Err(Error::InvalidRequest(
                "total quantity cannot be negative".to_owned(),
            ));
        }
        if new.replacement_cost < 0 {
            return Err(Error::InvalidRequest(
                "replacement cost cannot be negative".to_owned(),
            ));
        }

        let taken = component::Entity::find()
            .filter(component::Column::Code.eq(code.as_str()))
            .count(db)
            .await?;
        if taken > 0 {
            return Err(Error::InvalidRequest(format!(
                "component code {code} is already in use"
            )));
        }

        let created = component::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_owned()),
            code: Set(code),
            category: Set(category.to_owned()),
            description: Set(new.description.filter(|d| !d.trim().is_empty())),
            status: Set(ComponentStatus::Active),
            total_quantity: Set(new.total_quantity),
            available_quantity: Set(new.total_quantity),
            damaged_quantity: Set(0),
            under_maintenance_quantity: Set(0),
            replacement_cost: Set(new.replacement_cost),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(
            "Component {} ({}) created with {} units",
            created.code, created.id, created.total_quantity
        );
        Ok(created)
    }

    /// Updates descriptive fields and, if asked, the total in one transaction
    pub async fn update(
        db: &DatabaseConnection,
        actor: &Actor,
        component_id: Uuid,
        changes: ComponentChanges,
        now: NaiveDateTime,
    ) -> Result<component::Model> {
        actor.require_admin()?;

        let txn = db.begin().await?;
        let existing = component::Entity::find_by_id(component_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound("component"))?;

        if let Some(total) = changes.total_quantity {
            if total != existing.total_quantity {
                InventoryLedger::set_total(&txn, component_id, total).await?;
            }
        }

        // Re-read so the quantities written back are the ledger's
        let mut active = component::Entity::find_by_id(component_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound("component"))?
            .into_active_model();

        if let Some(name) = changes.name {
            active.name = Set(required("name", &name)?.to_owned());
        }
        if let Some(category) = changes.category {
            active.category = Set(required("category", &category)?.to_owned());
        }
        if let Some(description) = changes.description {
            let description = description.trim();
            active.description = Set((!description.is_empty()).then(|| description.to_owned()));
        }
        if let Some(cost) = changes.replacement_cost {
            if cost < 0 {
                return Err(Error::InvalidRequest(
                    "replacement cost cannot be negative".to_owned(),
                ));
            }
            active.replacement_cost = Set(cost);
        }
        active.updated_at = Set(now);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!("Component {} updated by {}", updated.code, actor.user_id);
        Ok(updated)
    }

    /// Deletes a component with no history, otherwise retires it
    pub async fn remove(
        db: &DatabaseConnection,
        actor: &Actor,
        component_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Removal> {
        actor.require_admin()?;

        let existing = Self::find(db, component_id).await?;

        let bookings = existing.find_related(booking::Entity).count(db).await?;
        let penalties = existing.find_related(penalty::Entity).count(db).await?;

        if bookings == 0 && penalties == 0 {
            existing.delete(db).await?;
            info!("Component {component_id} deleted");
            return Ok(Removal::Deleted);
        }

        let mut active = existing.into_active_model();
        active.status = Set(ComponentStatus::Retired);
        active.updated_at = Set(now);
        let retired = active.update(db).await?;

        info!(
            "Component {component_id} retired, it has {bookings} booking(s) and {penalties} penalty record(s)"
        );
        Ok(Removal::Retired(retired))
    }

    /// Applies an admin-initiated bucket movement
    pub async fn move_stock(
        db: &DatabaseConnection,
        actor: &Actor,
        component_id: Uuid,
        movement: StockMove,
        quantity: i32,
    ) -> Result<StockLevels> {
        actor.require_admin()?;

        match movement {
            StockMove::Restock => InventoryLedger::restock(db, component_id, quantity).await,
            StockMove::Damaged { source } => {
                InventoryLedger::mark_damaged(db, component_id, quantity, source).await
            }
            StockMove::Maintenance { source } => {
                InventoryLedger::mark_under_maintenance(db, component_id, quantity, source).await
            }
            StockMove::Restore { from } => {
                InventoryLedger::restore(db, component_id, quantity, from).await
            }
        }
    }

    pub async fn get(db: &DatabaseConnection, component_id: Uuid) -> Result<component::Model> {
        Self::find(db, component_id).await
    }

    /// Looks a component up by its catalogue code, ignoring case
    pub async fn get_by_code(db: &DatabaseConnection, code: &str) -> Result<component::Model> {
        component::Entity::find()
            .filter(component::Column::Code.eq(code.trim().to_uppercase()))
            .one(db)
            .await?
            .ok_or(Error::NotFound("component"))
    }

    pub async fn list(
        db: &DatabaseConnection,
        filter: ComponentFilter,
    ) -> Result<Vec<component::Model>> {
        let mut condition = Condition::all();

        if !filter.include_retired {
            condition = condition.add(component::Column::Status.eq(ComponentStatus::Active));
        }
        if let Some(category) = filter.category.filter(|c| !c.trim().is_empty()) {
            condition = condition.add(component::Column::Category.eq(category.trim()));
        }
        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let search = search.trim().to_owned();
            condition = condition.add(
                Condition::any()
                    .add(component::Column::Name.contains(search.as_str()))
                    .add(component::Column::Code.contains(search.to_uppercase())),
            );
        }

        Ok(component::Entity::find()
            .filter(condition)
            .order_by_asc(component::Column::Category)
            .order_by_asc(component::Column::Name)
            .all(db)
            .await?)
    }

    /// Distinct categories of bookable components
    pub async fn categories(db: &DatabaseConnection) -> Result<Vec<String>> {
        Ok(component::Entity::find()
            .select_only()
            .column(component::Column::Category)
            .filter(component::Column::Status.eq(ComponentStatus::Active))
            .distinct()
            .order_by_asc(component::Column::Category)
            .into_tuple::<String>()
            .all(db)
            .await?)
    }

    async fn find(db: &DatabaseConnection, component_id: Uuid) -> Result<component::Model> {
        component::Entity::find_by_id(component_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound("component"))
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidRequest(format!("{field} is required")));
    }
    Ok(value)
}

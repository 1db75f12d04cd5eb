#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use database::{
    Actor,
    entities::{booking, component, user},
    services::ledger::{InventoryLedger, StockLevels},
};
use migration::{Migrator, MigratorTrait};
use models::{ComponentStatus, Role};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
    EntityTrait, QueryFilter, prelude::Uuid,
};
use std::path::PathBuf;

/// Fresh in-memory database with the production schema
///
/// A single pooled connection keeps the memory database alive and makes
/// concurrent transactions queue behind each other.
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// File-backed database shared by `connections` pooled connections
///
/// Unlike [`setup`], statements from different connections really
/// interleave, with SQLite's busy timeout queueing competing writers.
/// Returns the file path so the caller can remove it afterwards.
pub async fn setup_pooled(connections: u32) -> (DatabaseConnection, PathBuf) {
    let path = std::env::temp_dir().join(format!("lab-inventory-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    (db, path)
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn seed_user(db: &DatabaseConnection, name: &str, role: Role) -> Actor {
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set(name.to_owned()),
        email: Set(format!("{}@lab.test", name.to_lowercase())),
        department: Set(Some("Electronics".to_owned())),
        phone: Set(None),
        role: Set(role),
        password_hash: Set("not-a-real-hash".to_owned()),
        created_at: Set(at(2025, 1, 1, 9)),
    }
    .insert(db)
    .await
    .unwrap();

    Actor::new(model.id, model.role)
}

pub async fn seed_component(db: &DatabaseConnection, code: &str, total: i32) -> component::Model {
    component::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Component {code}")),
        code: Set(code.to_owned()),
        category: Set("Microcontrollers".to_owned()),
        description: Set(None),
        status: Set(ComponentStatus::Active),
        total_quantity: Set(total),
        available_quantity: Set(total),
        damaged_quantity: Set(0),
        under_maintenance_quantity: Set(0),
        replacement_cost: Set(1200),
        created_at: Set(at(2025, 1, 1, 9)),
        updated_at: Set(at(2025, 1, 1, 9)),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn levels(db: &DatabaseConnection, component_id: Uuid) -> StockLevels {
    InventoryLedger::snapshot(db, component_id).await.unwrap()
}

/// No bucket is negative and the stored buckets never exceed the total
pub fn assert_conserved(levels: &StockLevels) {
    assert!(levels.total >= 0, "{levels:?}");
    assert!(levels.available >= 0, "{levels:?}");
    assert!(levels.damaged >= 0, "{levels:?}");
    assert!(levels.under_maintenance >= 0, "{levels:?}");
    assert!(
        levels.available + levels.damaged + levels.under_maintenance <= levels.total,
        "{levels:?}"
    );
}

/// Units on loan equal the quantities of the bookings that hold stock
///
/// Only holds while nothing on loan has been written off as damaged.
pub async fn assert_loans_match(db: &DatabaseConnection, component_id: Uuid) {
    let held: i32 = booking::Entity::find()
        .filter(booking::Column::ComponentId.eq(component_id))
        .all(db)
        .await
        .unwrap()
        .iter()
        .filter(|b| b.status.holds_stock())
        .map(|b| b.quantity)
        .sum();

    let levels = levels(db, component_id).await;
    assert_conserved(&levels);
    assert_eq!(levels.on_loan, held, "{levels:?}");
}

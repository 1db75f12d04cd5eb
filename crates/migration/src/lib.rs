pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_inventory_tables;
mod m20250301_000002_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_inventory_tables::Migration),
            Box::new(m20250301_000002_add_indexes::Migration),
        ]
    }
}

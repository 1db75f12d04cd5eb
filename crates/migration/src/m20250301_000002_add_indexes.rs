use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_inventory_tables::{Bookings, Components, Penalties};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The overdue sweep scans by status and due date
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_status_expected_return")
                    .table(Bookings::Table)
                    .col(Bookings::Status)
                    .col(Bookings::ExpectedReturnDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user_id")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_component_id")
                    .table(Bookings::Table)
                    .col(Bookings::ComponentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_penalties_user_id")
                    .table(Penalties::Table)
                    .col(Penalties::UserId)
                    .to_owned(),
            )
            .await?;

        // Overdue penalties are looked up by (booking, type) on every assessment
        manager
            .create_index(
                Index::create()
                    .name("idx_penalties_booking_id_type")
                    .table(Penalties::Table)
                    .col(Penalties::BookingId)
                    .col(Penalties::PenaltyType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_components_category")
                    .table(Components::Table)
                    .col(Components::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop indexes in reverse order
        for name in [
            "idx_components_category",
            "idx_penalties_booking_id_type",
            "idx_penalties_user_id",
            "idx_bookings_component_id",
            "idx_bookings_user_id",
            "idx_bookings_status_expected_return",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Department).string())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("student"),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Create components table; the buckets can never go negative or exceed the total
        manager
            .create_table(
                Table::create()
                    .table(Components::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Components::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Components::Name).string().not_null())
                    .col(
                        ColumnDef::new(Components::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Components::Category).string().not_null())
                    .col(ColumnDef::new(Components::Description).text())
                    .col(
                        ColumnDef::new(Components::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Components::TotalQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Components::AvailableQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Components::DamagedQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Components::UnderMaintenanceQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Components::ReplacementCost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Components::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Components::UpdatedAt).date_time().not_null())
                    .check(Expr::col(Components::AvailableQuantity).gte(0))
                    .check(Expr::col(Components::DamagedQuantity).gte(0))
                    .check(Expr::col(Components::UnderMaintenanceQuantity).gte(0))
                    .check(
                        Expr::expr(
                            Expr::col(Components::AvailableQuantity)
                                .add(Expr::col(Components::DamagedQuantity))
                                .add(Expr::col(Components::UnderMaintenanceQuantity)),
                        )
                        .lte(Expr::col(Components::TotalQuantity)),
                    )
                    .to_owned(),
            )
            .await?;

        // Create bookings table
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::ComponentId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string_len(16)
                            .not_null()
                            .default("requested"),
                    )
                    .col(ColumnDef::new(Bookings::Reason).text().not_null())
                    .col(ColumnDef::new(Bookings::RequestedDate).date_time().not_null())
                    .col(ColumnDef::new(Bookings::ExpectedReturnDate).date().not_null())
                    .col(ColumnDef::new(Bookings::ActualReturnDate).date_time())
                    .col(
                        ColumnDef::new(Bookings::IsOverdue)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Bookings::DecidedBy).uuid())
                    .col(ColumnDef::new(Bookings::DecidedAt).date_time())
                    .col(ColumnDef::new(Bookings::RejectionReason).text())
                    .col(ColumnDef::new(Bookings::UpdatedAt).date_time().not_null())
                    .check(Expr::col(Bookings::Quantity).between(1, 5))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-user_id")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-component_id")
                            .from(Bookings::Table, Bookings::ComponentId)
                            .to(Components::Table, Components::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create penalties table; rows are an audit trail and are never cascaded away
        manager
            .create_table(
                Table::create()
                    .table(Penalties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Penalties::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Penalties::UserId).uuid().not_null())
                    .col(ColumnDef::new(Penalties::BookingId).uuid())
                    .col(ColumnDef::new(Penalties::ComponentId).uuid().not_null())
                    .col(ColumnDef::new(Penalties::PenaltyType).string_len(16).not_null())
                    .col(ColumnDef::new(Penalties::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Penalties::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Penalties::Notes).text())
                    .col(ColumnDef::new(Penalties::PenaltyDate).date_time().not_null())
                    .col(ColumnDef::new(Penalties::PaidAt).date_time())
                    .col(ColumnDef::new(Penalties::PaidBy).uuid())
                    .check(Expr::col(Penalties::Amount).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-penalties-user_id")
                            .from(Penalties::Table, Penalties::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-penalties-booking_id")
                            .from(Penalties::Table, Penalties::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-penalties-component_id")
                            .from(Penalties::Table, Penalties::ComponentId)
                            .to(Components::Table, Components::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(Penalties::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Components::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum Users {
    Table,
    Id,
    FullName,
    Email,
    Department,
    Phone,
    Role,
    PasswordHash,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum Components {
    Table,
    Id,
    Name,
    Code,
    Category,
    Description,
    Status,
    TotalQuantity,
    AvailableQuantity,
    DamagedQuantity,
    UnderMaintenanceQuantity,
    ReplacementCost,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub(crate) enum Bookings {
    Table,
    Id,
    UserId,
    ComponentId,
    Quantity,
    Status,
    Reason,
    RequestedDate,
    ExpectedReturnDate,
    ActualReturnDate,
    IsOverdue,
    DecidedBy,
    DecidedAt,
    RejectionReason,
    UpdatedAt,
}

#[derive(Iden)]
pub(crate) enum Penalties {
    Table,
    Id,
    UserId,
    BookingId,
    ComponentId,
    PenaltyType,
    Amount,
    Status,
    Notes,
    PenaltyDate,
    PaidAt,
    PaidBy,
}

//! Read-only aggregates for the dashboards.

use crate::{
    actor::Actor,
    entities::{booking, component, user},
    error::Result,
    services::penalty::{PenaltyService, PenaltyTotals},
};
use chrono::NaiveDate;
use models::{BookingStatus, ComponentStatus, Role};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Upper bound for the `limit` of the ranked listings
pub const MAX_LISTING_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryTotals {
    pub components: u64,
    pub total_units: i64,
    pub available_units: i64,
    pub on_loan_units: i64,
    pub damaged_units: i64,
    pub under_maintenance_units: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub students: u64,
    pub inventory: InventoryTotals,
    /// Booking count per status, keyed by the status name
    pub bookings: BTreeMap<String, u64>,
    pub penalties: PenaltyTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_bookings: u64,
    pub active_bookings: u64,
    pub overdue_bookings: u64,
    pub penalties: PenaltyTotals,
}

/// How often a component has actually been lent out
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentUsage {
    pub component: component::Model,
    /// Approved, overdue or returned bookings
    pub bookings: u64,
    pub units: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub components: u64,
    pub total_units: i64,
    pub available_units: i64,
    pub on_loan_units: i64,
}

pub struct StatsService;

impl StatsService {
    pub async fn admin_stats(db: &DatabaseConnection, actor: &Actor) -> Result<AdminStats> {
        actor.require_admin()?;

        let students = user::Entity::find()
            .filter(user::Column::Role.eq(Role::Student))
            .count(db)
            .await?;

        let inventory = component::Entity::find()
            .filter(component::Column::Status.eq(ComponentStatus::Active))
            .all(db)
            .await?
            .iter()
            .fold(InventoryTotals::default(), |mut acc, c| {
                acc.components += 1;
                acc.total_units += i64::from(c.total_quantity);
                acc.available_units += i64::from(c.available_quantity);
                acc.on_loan_units += i64::from(c.on_loan_quantity());
                acc.damaged_units += i64::from(c.damaged_quantity);
                acc.under_maintenance_units += i64::from(c.under_maintenance_quantity);
                acc
            });

        let mut bookings = BTreeMap::new();
        for status in [
            BookingStatus::Requested,
            BookingStatus::Approved,
            BookingStatus::Overdue,
            BookingStatus::Returned,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ] {
            let count = booking::Entity::find()
                .filter(booking::Column::Status.eq(status))
                .count(db)
                .await?;
            bookings.insert(status.to_string(), count);
        }

        let penalties = PenaltyService::totals(db, None).await?;

        Ok(AdminStats {
            students,
            inventory,
            bookings,
            penalties,
        })
    }

    pub async fn user_stats(db: &DatabaseConnection, actor: &Actor) -> Result<UserStats> {
        let mine = booking::Entity::find()
            .filter(booking::Column::UserId.eq(actor.user_id))
            .all(db)
            .await?;

        let active_bookings = mine.iter().filter(|b| b.status.is_active()).count() as u64;
        let overdue_bookings = mine
            .iter()
            .filter(|b| b.status == BookingStatus::Overdue)
            .count() as u64;

        Ok(UserStats {
            total_bookings: mine.len() as u64,
            active_bookings,
            overdue_bookings,
            penalties: PenaltyService::totals(db, Some(actor.user_id)).await?,
        })
    }

    /// Active components whose available pool is at or below `threshold`
    pub async fn low_stock(
        db: &DatabaseConnection,
        actor: &Actor,
        threshold: i32,
    ) -> Result<Vec<component::Model>> {
        actor.require_admin()?;

        Ok(component::Entity::find()
            .filter(component::Column::Status.eq(ComponentStatus::Active))
            .filter(component::Column::AvailableQuantity.lte(threshold))
            .order_by_asc(component::Column::AvailableQuantity)
            .all(db)
            .await?)
    }

    /// Loans past their due date, whether or not the sweep has flagged them yet
    pub async fn overdue_bookings(
        db: &DatabaseConnection,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<Vec<booking::Model>> {
        actor.require_admin()?;

        Ok(booking::Entity::find()
            .filter(
                Condition::any()
                    .add(booking::Column::Status.eq(BookingStatus::Overdue))
                    .add(
                        Condition::all()
                            .add(booking::Column::Status.eq(BookingStatus::Approved))
                            .add(booking::Column::ExpectedReturnDate.lt(today)),
                    ),
            )
            .order_by_asc(booking::Column::ExpectedReturnDate)
            .all(db)
            .await?)
    }

    pub async fn recent_bookings(
        db: &DatabaseConnection,
        actor: &Actor,
        limit: u64,
    ) -> Result<Vec<booking::Model>> {
        actor.require_admin()?;

        Ok(booking::Entity::find()
            .order_by_desc(booking::Column::RequestedDate)
            .limit(limit.clamp(1, MAX_LISTING_LIMIT))
            .all(db)
            .await?)
    }

    /// Most borrowed components by units lent, then by number of loans
    pub async fn top_components(
        db: &DatabaseConnection,
        actor: &Actor,
        limit: u64,
    ) -> Result<Vec<ComponentUsage>> {
        actor.require_admin()?;

        let lent = booking::Entity::find()
            .filter(booking::Column::Status.is_in([
                BookingStatus::Approved,
                BookingStatus::Overdue,
                BookingStatus::Returned,
            ]))
            .all(db)
            .await?;

        let mut usage: HashMap<_, (u64, i64)> = HashMap::new();
        for booking in &lent {
            let entry = usage.entry(booking.component_id).or_default();
            entry.0 += 1;
            entry.1 += i64::from(booking.quantity);
        }

        let components = component::Entity::find()
            .filter(component::Column::Id.is_in(usage.keys().copied()))
            .all(db)
            .await?;

        let mut ranked: Vec<ComponentUsage> = components
            .into_iter()
            .filter_map(|component| {
                let (bookings, units) = usage.get(&component.id).copied()?;
                Some(ComponentUsage {
                    component,
                    bookings,
                    units,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.units
                .cmp(&a.units)
                .then(b.bookings.cmp(&a.bookings))
                .then_with(|| a.component.name.cmp(&b.component.name))
        });
        ranked.truncate(limit.clamp(1, MAX_LISTING_LIMIT) as usize);
        Ok(ranked)
    }

    /// Stock of bookable components grouped by category
    pub async fn category_summary(db: &DatabaseConnection) -> Result<Vec<CategorySummary>> {
        let components = component::Entity::find()
            .filter(component::Column::Status.eq(ComponentStatus::Active))
            .all(db)
            .await?;

        let mut by_category: BTreeMap<String, CategorySummary> = BTreeMap::new();
        for c in components {
            let summary = by_category
                .entry(c.category.clone())
                .or_insert_with(|| CategorySummary {
                    category: c.category.clone(),
                    ..Default::default()
                });
            summary.components += 1;
            summary.total_units += i64::from(c.total_quantity);
            summary.available_units += i64::from(c.available_quantity);
            summary.on_loan_units += i64::from(c.on_loan_quantity());
        }

        Ok(by_category.into_values().collect())
    }
}

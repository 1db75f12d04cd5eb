//! Penalty Calculator, persistent side.
//!
//! Amounts come from [`PenaltyPolicy`]; this module decides when a record
//! is created, recomputed or left alone. Paid penalties are never touched.

use crate::{
    actor::Actor,
    entities::{booking, component, penalty, user},
    error::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use models::{DamageSeverity, PenaltyPolicy, PenaltyStatus, PenaltyType, days_late};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, prelude::Uuid, sea_query::Expr,
};
use serde::Serialize;

/// Outcome of assessing a booking for lateness
#[derive(Debug, Clone, PartialEq)]
pub enum OverdueAssessment {
    /// Returned (or checked) on or before the due date
    NotLate,
    Created(penalty::Model),
    Updated(penalty::Model),
    /// Pending penalty already carries the current amount
    Unchanged(penalty::Model),
    /// Settled penalties are an audit record and keep their amount
    AlreadyPaid(penalty::Model),
}

impl OverdueAssessment {
    pub fn penalty(&self) -> Option<&penalty::Model> {
        match self {
            Self::NotLate => None,
            Self::Created(p)
            | Self::Updated(p)
            | Self::Unchanged(p)
            | Self::AlreadyPaid(p) => Some(p),
        }
    }
}

/// An admin's report of a damaged or lost component
#[derive(Debug, Clone)]
pub struct DamageReport {
    pub component_id: Uuid,
    pub booking_id: Option<Uuid>,
    /// Required when the damage is not tied to a booking
    pub user_id: Option<Uuid>,
    pub severity: DamageSeverity,
    /// Explicit amount; must fall inside the severity's range
    pub amount: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PenaltyFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<PenaltyStatus>,
    pub penalty_type: Option<PenaltyType>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PenaltyTotals {
    pub count: u64,
    pub total: i64,
    pub paid: i64,
    pub pending: i64,
}

pub struct PenaltyService;

impl PenaltyService {
    /// Creates or refreshes the overdue penalty of `booking` as of `as_of`
    ///
    /// Keyed on (booking, overdue): there is at most one such record per
    /// booking. Callers run this inside the transaction that owns the
    /// booking's state change, which serialises concurrent assessments.
    pub async fn assess_overdue<C: ConnectionTrait>(
        conn: &C,
        policy: &PenaltyPolicy,
        booking: &booking::Model,
        as_of: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<OverdueAssessment> {
        let amount = policy.overdue_amount(booking.expected_return_date, as_of, booking.quantity);
        if amount == 0 {
            return Ok(OverdueAssessment::NotLate);
        }

        let notes = format!(
            "{} day(s) late returning {} item(s)",
            days_late(booking.expected_return_date, as_of),
            booking.quantity
        );

        let existing = penalty::Entity::find()
            .filter(penalty::Column::BookingId.eq(booking.id))
            .filter(penalty::Column::PenaltyType.eq(PenaltyType::Overdue))
            .one(conn)
            .await?;

        let Some(existing) = existing else {
            let created = penalty::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(booking.user_id),
                booking_id: Set(Some(booking.id)),
                component_id: Set(booking.component_id),
                penalty_type: Set(PenaltyType::Overdue),
                amount: Set(amount),
                status: Set(PenaltyStatus::Pending),
                notes: Set(Some(notes)),
                penalty_date: Set(now),
                paid_at: Set(None),
                paid_by: Set(None),
            }
            .insert(conn)
            .await?;

            info!(
                "Overdue penalty {} of {amount} created for booking {}",
                created.id, booking.id
            );
            return Ok(OverdueAssessment::Created(created));
        };

        if existing.status == PenaltyStatus::Paid {
            debug!(
                "Overdue penalty {} for booking {} is paid, leaving it unchanged",
                existing.id, booking.id
            );
            return Ok(OverdueAssessment::AlreadyPaid(existing));
        }
        if existing.amount == amount {
            return Ok(OverdueAssessment::Unchanged(existing));
        }

        // Only a still-pending row may be recomputed
        let result = penalty::Entity::update_many()
            .col_expr(penalty::Column::Amount, Expr::value(amount))
            .col_expr(penalty::Column::Notes, Expr::value(Some(notes)))
            .filter(penalty::Column::Id.eq(existing.id))
            .filter(penalty::Column::Status.eq(PenaltyStatus::Pending))
            .exec(conn)
            .await?;

        let current = Self::find(conn, existing.id).await?;
        if result.rows_affected == 0 {
            return Ok(OverdueAssessment::AlreadyPaid(current));
        }

        debug!(
            "Overdue penalty {} for booking {} recomputed to {amount}",
            current.id, booking.id
        );
        Ok(OverdueAssessment::Updated(current))
    }

    /// Records a damage or loss charge; every report creates a new penalty
    pub async fn assess_damage(
        db: &DatabaseConnection,
        policy: &PenaltyPolicy,
        actor: &Actor,
        report: DamageReport,
        now: NaiveDateTime,
    ) -> Result<penalty::Model> {
        actor.require_admin()?;

        let component = component::Entity::find_by_id(report.component_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound("component"))?;

        let (user_id, quantity) = match report.booking_id {
            Some(booking_id) => {
                let booking = booking::Entity::find_by_id(booking_id)
                    .one(db)
                    .await?
                    .ok_or(Error::NotFound("booking"))?;

                if booking.component_id != component.id {
                    return Err(Error::InvalidRequest(
                        "booking is for a different component".to_owned(),
                    ));
                }
                if report.user_id.is_some_and(|u| u != booking.user_id) {
                    return Err(Error::InvalidRequest(
                        "booking belongs to a different user".to_owned(),
                    ));
                }

                (booking.user_id, booking.quantity)
            }
            None => {
                let user_id = report.user_id.ok_or_else(|| {
                    Error::InvalidRequest(
                        "user_id is required when the damage is not tied to a booking"
                            .to_owned(),
                    )
                })?;

                user::Entity::find_by_id(user_id)
                    .one(db)
                    .await?
                    .ok_or(Error::NotFound("user"))?;

                (user_id, 1)
            }
        };

        let amount = policy.damage_amount(
            report.severity,
            report.amount,
            component.replacement_cost,
            quantity,
        )?;

        let summary = match report.severity {
            DamageSeverity::Minor => "minor damage",
            DamageSeverity::Major => "major damage",
            DamageSeverity::Lost => "item lost",
        };
        let notes = match report.notes.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => format!("{summary}: {text}"),
            _ => summary.to_owned(),
        };

        let created = penalty::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            booking_id: Set(report.booking_id),
            component_id: Set(component.id),
            penalty_type: Set(report.severity.penalty_type()),
            amount: Set(amount),
            status: Set(PenaltyStatus::Pending),
            notes: Set(Some(notes)),
            penalty_date: Set(now),
            paid_at: Set(None),
            paid_by: Set(None),
        }
        .insert(db)
        .await?;

        info!(
            "{} penalty {} of {amount} recorded against user {user_id}",
            created.penalty_type.label(),
            created.id
        );
        Ok(created)
    }

    /// Settles a pending penalty; a paid penalty can never change again
    pub async fn mark_paid(
        db: &DatabaseConnection,
        actor: &Actor,
        penalty_id: Uuid,
        notes: Option<String>,
        now: NaiveDateTime,
    ) -> Result<penalty::Model> {
        actor.require_admin()?;

        let mut update = penalty::Entity::update_many()
            .col_expr(penalty::Column::Status, Expr::value(PenaltyStatus::Paid))
            .col_expr(penalty::Column::PaidAt, Expr::value(Some(now)))
            .col_expr(penalty::Column::PaidBy, Expr::value(Some(actor.user_id)));

        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            update = update.col_expr(penalty::Column::Notes, Expr::value(Some(notes)));
        }

        let result = update
            .filter(penalty::Column::Id.eq(penalty_id))
            .filter(penalty::Column::Status.eq(PenaltyStatus::Pending))
            .exec(db)
            .await?;

        let current = Self::find(db, penalty_id).await?;
        if result.rows_affected == 0 {
            return Err(Error::InvalidState(format!(
                "penalty {penalty_id} is already {}",
                current.status
            )));
        }

        info!("Penalty {penalty_id} marked paid by {}", actor.user_id);
        Ok(current)
    }

    pub async fn get(
        db: &DatabaseConnection,
        actor: &Actor,
        penalty_id: Uuid,
    ) -> Result<penalty::Model> {
        let penalty = Self::find(db, penalty_id).await?;
        actor.require_access(penalty.user_id)?;
        Ok(penalty)
    }

    /// Lists penalties, newest first; students only ever see their own
    pub async fn list(
        db: &DatabaseConnection,
        actor: &Actor,
        mut filter: PenaltyFilter,
    ) -> Result<Vec<penalty::Model>> {
        if !actor.is_admin() {
            filter.user_id = Some(actor.user_id);
        }

        let mut condition = Condition::all();
        if let Some(user_id) = filter.user_id {
            condition = condition.add(penalty::Column::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(penalty::Column::Status.eq(status));
        }
        if let Some(penalty_type) = filter.penalty_type {
            condition = condition.add(penalty::Column::PenaltyType.eq(penalty_type));
        }

        Ok(penalty::Entity::find()
            .filter(condition)
            .order_by_desc(penalty::Column::PenaltyDate)
            .all(db)
            .await?)
    }

    /// Sums penalty amounts, optionally for a single user
    pub async fn totals<C: ConnectionTrait>(conn: &C, user_id: Option<Uuid>) -> Result<PenaltyTotals> {
        let mut query = penalty::Entity::find();
        if let Some(user_id) = user_id {
            query = query.filter(penalty::Column::UserId.eq(user_id));
        }

        let totals = query
            .all(conn)
            .await?
            .into_iter()
            .fold(PenaltyTotals::default(), |mut acc, p| {
                acc.count += 1;
                acc.total += p.amount;
                match p.status {
                    PenaltyStatus::Paid => acc.paid += p.amount,
                    PenaltyStatus::Pending => acc.pending += p.amount,
                }
                acc
            });

        Ok(totals)
    }

    async fn find<C: ConnectionTrait>(conn: &C, penalty_id: Uuid) -> Result<penalty::Model> {
        penalty::Entity::find_by_id(penalty_id)
            .one(conn)
            .await?
            .ok_or(Error::NotFound("penalty"))
    }
}

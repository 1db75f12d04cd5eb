//! Booking Lifecycle Engine.
//!
//! Every transition is a compare-and-set on the booking's status, executed in
//! the same transaction as its ledger and penalty effects. When the guard
//! matches no row the booking is re-read and the caller gets `InvalidState`,
//! so of two racing transitions exactly one commits.

use crate::{
    actor::Actor,
    entities::{booking, component, penalty},
    error::{Error, Result},
    services::{
        ledger::InventoryLedger,
        penalty::{OverdueAssessment, PenaltyService},
    },
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error, info, warn};
use models::{BookingStatus, MAX_BOOKING_QUANTITY, PenaltyPolicy};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::Uuid, sea_query::Expr, sea_query::SimpleExpr,
};
use serde::Serialize;

/// A student's request to borrow a component
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub component_id: Uuid,
    pub quantity: i32,
    pub expected_return_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub user_id: Option<Uuid>,
    pub component_id: Option<Uuid>,
}

/// What a single overdue sweep did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Approved bookings moved to Overdue
    pub transitioned: u32,
    pub penalties_created: u32,
    pub penalties_updated: u32,
    /// Bookings that changed state under the sweep and were left alone
    pub skipped: u32,
    pub failed: u32,
}

/// Result of deleting a booking
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    Cancelled(booking::Model),
    Deleted,
}

pub struct BookingService;

impl BookingService {
    /// Records a new request; stock is not touched until approval
    pub async fn create(
        db: &DatabaseConnection,
        actor: &Actor,
        request: NewBooking,
        now: NaiveDateTime,
    ) -> Result<booking::Model> {
        if !(1..=MAX_BOOKING_QUANTITY).contains(&request.quantity) {
            return Err(Error::InvalidRequest(format!(
                "quantity must be between 1 and {MAX_BOOKING_QUANTITY}, got {}",
                request.quantity
            )));
        }
        if request.expected_return_date <= now.date() {
            return Err(Error::InvalidRequest(
                "expected return date must be in the future".to_owned(),
            ));
        }
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(Error::InvalidRequest("a reason is required".to_owned()));
        }

        let component = component::Entity::find_by_id(request.component_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound("component"))?;

        if !component.is_active() {
            return Err(Error::InvalidRequest(format!(
                "component {} is retired and cannot be booked",
                component.code
            )));
        }

        let created = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.user_id),
            component_id: Set(component.id),
            quantity: Set(request.quantity),
            status: Set(BookingStatus::Requested),
            reason: Set(reason.to_owned()),
            requested_date: Set(now),
            expected_return_date: Set(request.expected_return_date),
            actual_return_date: Set(None),
            is_overdue: Set(false),
            decided_by: Set(None),
            decided_at: Set(None),
            rejection_reason: Set(None),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(
            "Booking {} requested by {} for {} x {}",
            created.id, actor.user_id, created.quantity, component.code
        );
        Ok(created)
    }

    /// Approves a request and reserves its stock in one transaction
    pub async fn approve(
        db: &DatabaseConnection,
        actor: &Actor,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<booking::Model> {
        actor.require_admin()?;

        let txn = db.begin().await?;
        let booking = Self::find(&txn, booking_id).await?;

        let component = component::Entity::find_by_id(booking.component_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound("component"))?;
        if !component.is_active() {
            return Err(Error::InvalidRequest(format!(
                "component {} is retired and cannot be lent",
                component.code
            )));
        }

        Self::transition(
            &txn,
            booking_id,
            BookingStatus::Approved,
            vec![
                (booking::Column::DecidedBy, Expr::value(Some(actor.user_id))),
                (booking::Column::DecidedAt, Expr::value(Some(now))),
            ],
            now,
        )
        .await?;

        InventoryLedger::reserve(&txn, booking.component_id, booking.quantity).await?;

        let approved = Self::find(&txn, booking_id).await?;
        txn.commit().await?;

        info!(
            "Booking {booking_id} approved by {}, {} units reserved",
            actor.user_id, approved.quantity
        );
        Ok(approved)
    }

    pub async fn reject(
        db: &DatabaseConnection,
        actor: &Actor,
        booking_id: Uuid,
        reason: Option<String>,
        now: NaiveDateTime,
    ) -> Result<booking::Model> {
        actor.require_admin()?;

        let reason = reason.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
        Self::transition(
            db,
            booking_id,
            BookingStatus::Rejected,
            vec![
                (booking::Column::DecidedBy, Expr::value(Some(actor.user_id))),
                (booking::Column::DecidedAt, Expr::value(Some(now))),
                (booking::Column::RejectionReason, Expr::value(reason)),
            ],
            now,
        )
        .await?;

        info!("Booking {booking_id} rejected by {}", actor.user_id);
        Self::find(db, booking_id).await
    }

    /// Withdraws a request before an admin has decided on it
    pub async fn cancel(
        db: &DatabaseConnection,
        actor: &Actor,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<booking::Model> {
        let booking = Self::find(db, booking_id).await?;
        if booking.user_id != actor.user_id {
            return Err(Error::Forbidden);
        }

        Self::transition(db, booking_id, BookingStatus::Cancelled, vec![], now).await?;

        info!("Booking {booking_id} cancelled by its owner");
        Self::find(db, booking_id).await
    }

    /// Closes a loan, returns its stock and settles lateness
    pub async fn mark_returned(
        db: &DatabaseConnection,
        policy: &PenaltyPolicy,
        actor: &Actor,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<(booking::Model, OverdueAssessment)> {
        let txn = db.begin().await?;
        let booking = Self::find(&txn, booking_id).await?;
        actor.require_access(booking.user_id)?;

        let late = booking.status == BookingStatus::Overdue
            || now.date() > booking.expected_return_date;

        Self::transition(
            &txn,
            booking_id,
            BookingStatus::Returned,
            vec![
                (booking::Column::ActualReturnDate, Expr::value(Some(now))),
                (booking::Column::IsOverdue, Expr::value(late)),
            ],
            now,
        )
        .await?;

        InventoryLedger::release(&txn, booking.component_id, booking.quantity).await?;

        let returned = Self::find(&txn, booking_id).await?;
        let assessment = if late {
            PenaltyService::assess_overdue(&txn, policy, &returned, now.date(), now).await?
        } else {
            OverdueAssessment::NotLate
        };

        txn.commit().await?;

        info!(
            "Booking {booking_id} returned, {} units released",
            returned.quantity
        );
        Ok((returned, assessment))
    }

    /// Flags a single approved booking as overdue ahead of the sweep
    pub async fn mark_overdue(
        db: &DatabaseConnection,
        policy: &PenaltyPolicy,
        actor: &Actor,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<(booking::Model, OverdueAssessment)> {
        actor.require_admin()?;

        let booking = Self::find(db, booking_id).await?;
        if booking.expected_return_date >= now.date() {
            return Err(Error::InvalidState(format!(
                "booking {booking_id} is not past its expected return date"
            )));
        }

        let txn = db.begin().await?;
        let outcome = Self::overdue_in(&txn, policy, booking_id, now).await?;
        txn.commit().await?;

        info!("Booking {booking_id} marked overdue by {}", actor.user_id);
        Ok(outcome)
    }

    /// Moves every late approved booking to Overdue and brings the pending
    /// penalty of every overdue booking up to date
    ///
    /// Safe to run repeatedly and concurrently with other transitions. Each
    /// booking is handled in its own transaction, so one failure does not
    /// undo the rest.
    pub async fn sweep_overdue(
        db: &DatabaseConnection,
        policy: &PenaltyPolicy,
        now: NaiveDateTime,
    ) -> Result<SweepReport> {
        let today = now.date();
        let mut report = SweepReport::default();

        let late = booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Approved))
            .filter(booking::Column::ExpectedReturnDate.lt(today))
            .all(db)
            .await?;

        for booking in late {
            let txn = db.begin().await?;
            match Self::overdue_in(&txn, policy, booking.id, now).await {
                Ok((_, assessment)) => {
                    txn.commit().await?;
                    report.transitioned += 1;
                    report.count(&assessment);
                }
                Err(Error::InvalidState(reason)) => {
                    debug!("Sweep skipped booking {}: {reason}", booking.id);
                    report.skipped += 1;
                }
                Err(err) => {
                    error!("Sweep failed for booking {}: {err}", booking.id);
                    report.failed += 1;
                }
            }
        }

        let overdue = booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Overdue))
            .all(db)
            .await?;

        for booking in overdue {
            let txn = db.begin().await?;
            match Self::reassess_in(&txn, policy, booking.id, now).await {
                Ok(Some(assessment)) => {
                    txn.commit().await?;
                    report.count(&assessment);
                }
                Ok(None) => report.skipped += 1,
                Err(err) => {
                    error!("Sweep failed to reassess booking {}: {err}", booking.id);
                    report.failed += 1;
                }
            }
        }

        if report.failed > 0 {
            warn!("Overdue sweep finished with {} failures", report.failed);
        }
        info!(
            "Overdue sweep: {} transitioned, {} penalties created, {} updated",
            report.transitioned, report.penalties_created, report.penalties_updated
        );
        Ok(report)
    }

    /// Student: cancels their own request. Admin: cancels a request or
    /// removes a closed booking that carries no penalties.
    pub async fn delete(
        db: &DatabaseConnection,
        actor: &Actor,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Removal> {
        let booking = Self::find(db, booking_id).await?;

        if !actor.is_admin() {
            return Self::cancel(db, actor, booking_id, now)
                .await
                .map(Removal::Cancelled);
        }

        if booking.status == BookingStatus::Requested {
            Self::transition(db, booking_id, BookingStatus::Cancelled, vec![], now).await?;
            info!("Booking {booking_id} cancelled by admin {}", actor.user_id);
            return Self::find(db, booking_id).await.map(Removal::Cancelled);
        }

        if !booking.status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "booking {booking_id} is {} and still holds stock",
                booking.status
            )));
        }

        let penalties = booking
            .find_related(penalty::Entity)
            .count(db)
            .await?;
        if penalties > 0 {
            return Err(Error::InvalidState(format!(
                "booking {booking_id} has {penalties} penalty record(s) and is kept for audit"
            )));
        }

        booking.delete(db).await?;
        info!("Booking {booking_id} deleted by admin {}", actor.user_id);
        Ok(Removal::Deleted)
    }

    pub async fn get(
        db: &DatabaseConnection,
        actor: &Actor,
        booking_id: Uuid,
    ) -> Result<booking::Model> {
        let booking = Self::find(db, booking_id).await?;
        actor.require_access(booking.user_id)?;
        Ok(booking)
    }

    /// Lists bookings, newest first; students only ever see their own
    pub async fn list(
        db: &DatabaseConnection,
        actor: &Actor,
        mut filter: BookingFilter,
    ) -> Result<Vec<booking::Model>> {
        if !actor.is_admin() {
            filter.user_id = Some(actor.user_id);
        }

        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(booking::Column::Status.eq(status));
        }
        if let Some(user_id) = filter.user_id {
            condition = condition.add(booking::Column::UserId.eq(user_id));
        }
        if let Some(component_id) = filter.component_id {
            condition = condition.add(booking::Column::ComponentId.eq(component_id));
        }

        Ok(booking::Entity::find()
            .filter(condition)
            .order_by_desc(booking::Column::RequestedDate)
            .all(db)
            .await?)
    }

    pub async fn list_for_user(
        db: &DatabaseConnection,
        actor: &Actor,
    ) -> Result<Vec<booking::Model>> {
        let filter = BookingFilter {
            user_id: Some(actor.user_id),
            ..Default::default()
        };
        Self::list(db, actor, filter).await
    }

    /// Requests awaiting a decision, oldest first
    pub async fn list_pending(
        db: &DatabaseConnection,
        actor: &Actor,
    ) -> Result<Vec<booking::Model>> {
        actor.require_admin()?;

        Ok(booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Requested))
            .order_by_asc(booking::Column::RequestedDate)
            .all(db)
            .await?)
    }

    /// Approved -> Overdue plus the first assessment, on an open transaction
    async fn overdue_in<C: ConnectionTrait>(
        conn: &C,
        policy: &PenaltyPolicy,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<(booking::Model, OverdueAssessment)> {
        Self::transition(
            conn,
            booking_id,
            BookingStatus::Overdue,
            vec![(booking::Column::IsOverdue, Expr::value(true))],
            now,
        )
        .await?;

        let overdue = Self::find(conn, booking_id).await?;
        let assessment =
            PenaltyService::assess_overdue(conn, policy, &overdue, now.date(), now).await?;
        Ok((overdue, assessment))
    }

    /// Recomputes the penalty of a booking that is still overdue
    ///
    /// The status guard doubles as a row lock, so a concurrent return either
    /// finishes first (and the booking is skipped) or waits for this one.
    async fn reassess_in<C: ConnectionTrait>(
        conn: &C,
        policy: &PenaltyPolicy,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Option<OverdueAssessment>> {
        let touched = booking::Entity::update_many()
            .col_expr(booking::Column::IsOverdue, Expr::value(true))
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::Status.eq(BookingStatus::Overdue))
            .exec(conn)
            .await?;
        if touched.rows_affected == 0 {
            return Ok(None);
        }

        let booking = Self::find(conn, booking_id).await?;
        let assessment =
            PenaltyService::assess_overdue(conn, policy, &booking, now.date(), now).await?;
        Ok(Some(assessment))
    }

    /// Compare-and-set from any legal source state into `next`
    async fn transition<C: ConnectionTrait>(
        conn: &C,
        booking_id: Uuid,
        next: BookingStatus,
        extra: Vec<(booking::Column, SimpleExpr)>,
        now: NaiveDateTime,
    ) -> Result<()> {
        let mut update = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(next))
            .col_expr(booking::Column::UpdatedAt, Expr::value(now));
        for (column, value) in extra {
            update = update.col_expr(column, value);
        }

        let result = update
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::Status.is_in(BookingStatus::sources_of(next)))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let current = Self::find(conn, booking_id).await?;
            debug!(
                "Booking {booking_id} cannot move from {} to {next}",
                current.status
            );
            return Err(Error::InvalidState(format!(
                "booking {booking_id} is {} and cannot become {next}",
                current.status
            )));
        }

        Ok(())
    }

    async fn find<C: ConnectionTrait>(conn: &C, booking_id: Uuid) -> Result<booking::Model> {
        booking::Entity::find_by_id(booking_id)
            .one(conn)
            .await?
            .ok_or(Error::NotFound("booking"))
    }
}

impl SweepReport {
    fn count(&mut self, assessment: &OverdueAssessment) {
        match assessment {
            OverdueAssessment::Created(_) => self.penalties_created += 1,
            OverdueAssessment::Updated(_) => self.penalties_updated += 1,
            OverdueAssessment::NotLate
            | OverdueAssessment::Unchanged(_)
            | OverdueAssessment::AlreadyPaid(_) => {}
        }
    }
}

//! Overdue sweep and penalty bookkeeping.

mod common;

use common::{at, date, seed_component, seed_user, setup};
use database::{
    Error,
    entities::penalty,
    services::{
        booking::{BookingService, NewBooking, SweepReport},
        penalty::{DamageReport, OverdueAssessment, PenaltyFilter, PenaltyService},
    },
};
use models::{BookingStatus, DamageSeverity, PenaltyPolicy, PenaltyStatus, PenaltyType, Role};
use sea_orm::{DatabaseConnection, EntityTrait, prelude::Uuid};

async fn overdue_penalties(db: &DatabaseConnection) -> Vec<penalty::Model> {
    penalty::Entity::find()
        .all(db)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.penalty_type == PenaltyType::Overdue)
        .collect()
}

/// Books and approves `quantity` units due back on 2025-03-05
async fn approved_loan(
    db: &DatabaseConnection,
    student: &database::Actor,
    admin: &database::Actor,
    component_id: Uuid,
    quantity: i32,
) -> Uuid {
    let booking = BookingService::create(
        db,
        student,
        NewBooking {
            component_id,
            quantity,
            expected_return_date: date(2025, 3, 5),
            reason: "Robotics club".to_owned(),
        },
        at(2025, 3, 1, 10),
    )
    .await
    .unwrap();

    BookingService::approve(db, admin, booking.id, at(2025, 3, 1, 11))
        .await
        .unwrap();
    booking.id
}

#[tokio::test]
async fn test_sweep_marks_late_loans_overdue_with_one_penalty() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    let policy = PenaltyPolicy::default();

    let booking_id = approved_loan(&db, &student, &admin, arduino.id, 2).await;

    let report = BookingService::sweep_overdue(&db, &policy, at(2025, 3, 6, 0))
        .await
        .unwrap();
    assert_eq!(report.transitioned, 1);
    assert_eq!(report.penalties_created, 1);

    let booking = BookingService::get(&db, &admin, booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Overdue);
    assert!(booking.is_overdue);

    let penalties = overdue_penalties(&db).await;
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].amount, 50 * 2);
    assert_eq!(penalties[0].status, PenaltyStatus::Pending);
    assert_eq!(penalties[0].booking_id, Some(booking_id));
}

#[tokio::test]
async fn test_repeated_sweeps_are_idempotent() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    let policy = PenaltyPolicy::default();

    approved_loan(&db, &student, &admin, arduino.id, 1).await;
    let now = at(2025, 3, 6, 0);

    BookingService::sweep_overdue(&db, &policy, now).await.unwrap();
    let first = overdue_penalties(&db).await;

    let again = BookingService::sweep_overdue(&db, &policy, now).await.unwrap();
    assert_eq!(again, SweepReport::default());
    assert_eq!(overdue_penalties(&db).await, first);
}

#[tokio::test]
async fn test_later_sweep_grows_pending_penalty() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    let policy = PenaltyPolicy::default();

    approved_loan(&db, &student, &admin, arduino.id, 3).await;

    BookingService::sweep_overdue(&db, &policy, at(2025, 3, 6, 0))
        .await
        .unwrap();
    let report = BookingService::sweep_overdue(&db, &policy, at(2025, 3, 9, 0))
        .await
        .unwrap();
    assert_eq!(report.transitioned, 0);
    assert_eq!(report.penalties_updated, 1);

    let penalties = overdue_penalties(&db).await;
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].amount, 4 * 50 * 3);
}

#[tokio::test]
async fn test_paid_penalty_is_never_recomputed() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    let policy = PenaltyPolicy::default();

    let booking_id = approved_loan(&db, &student, &admin, arduino.id, 1).await;
    BookingService::sweep_overdue(&db, &policy, at(2025, 3, 6, 0))
        .await
        .unwrap();

    let penalty_id = overdue_penalties(&db).await[0].id;
    let paid = PenaltyService::mark_paid(
        &db,
        &admin,
        penalty_id,
        Some("Paid at the front desk".to_owned()),
        at(2025, 3, 6, 12),
    )
    .await
    .unwrap();
    assert_eq!(paid.status, PenaltyStatus::Paid);
    assert_eq!(paid.paid_by, Some(admin.user_id));

    let err = PenaltyService::mark_paid(&db, &admin, penalty_id, None, at(2025, 3, 6, 13))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    BookingService::sweep_overdue(&db, &policy, at(2025, 3, 10, 0))
        .await
        .unwrap();
    let (_, assessment) =
        BookingService::mark_returned(&db, &policy, &student, booking_id, at(2025, 3, 12, 9))
            .await
            .unwrap();
    assert!(matches!(assessment, OverdueAssessment::AlreadyPaid(_)));

    let penalties = overdue_penalties(&db).await;
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0], paid);
}

#[tokio::test]
async fn test_return_after_sweep_updates_the_same_penalty() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    let policy = PenaltyPolicy::default();

    let booking_id = approved_loan(&db, &student, &admin, arduino.id, 1).await;
    BookingService::sweep_overdue(&db, &policy, at(2025, 3, 6, 0))
        .await
        .unwrap();

    let (returned, assessment) =
        BookingService::mark_returned(&db, &policy, &student, booking_id, at(2025, 3, 8, 15))
            .await
            .unwrap();
    assert_eq!(returned.status, BookingStatus::Returned);
    assert!(matches!(assessment, OverdueAssessment::Updated(ref p) if p.amount == 150));
    assert_eq!(overdue_penalties(&db).await.len(), 1);

    // Closed bookings are no longer swept
    let report = BookingService::sweep_overdue(&db, &policy, at(2025, 3, 20, 0))
        .await
        .unwrap();
    assert_eq!(report, SweepReport::default());
    assert_eq!(overdue_penalties(&db).await[0].amount, 150);
}

#[tokio::test]
async fn test_damage_reports_always_create_new_penalties() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let scope = seed_component(&db, "OSC-01", 4).await;
    let policy = PenaltyPolicy::default();
    let now = at(2025, 3, 4, 9);

    let booking_id = approved_loan(&db, &student, &admin, scope.id, 2).await;

    let report = DamageReport {
        component_id: scope.id,
        booking_id: Some(booking_id),
        user_id: None,
        severity: DamageSeverity::Minor,
        amount: None,
        notes: Some("Cracked housing".to_owned()),
    };

    let first = PenaltyService::assess_damage(&db, &policy, &admin, report.clone(), now)
        .await
        .unwrap();
    let second = PenaltyService::assess_damage(&db, &policy, &admin, report, now)
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.user_id, student.user_id);
    assert_eq!(first.penalty_type, PenaltyType::Damage);
    assert_eq!(first.amount, 200);
    assert_eq!(first.notes.as_deref(), Some("minor damage: Cracked housing"));

    let lost = PenaltyService::assess_damage(
        &db,
        &policy,
        &admin,
        DamageReport {
            component_id: scope.id,
            booking_id: Some(booking_id),
            user_id: None,
            severity: DamageSeverity::Lost,
            amount: None,
            notes: None,
        },
        now,
    )
    .await
    .unwrap();
    assert_eq!(lost.penalty_type, PenaltyType::Lost);
    assert_eq!(lost.amount, 1200 * 2);

    let mine = PenaltyService::list(&db, &student, PenaltyFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 3);
}

#[tokio::test]
async fn test_damage_report_validation() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let scope = seed_component(&db, "OSC-01", 4).await;
    let other = seed_component(&db, "OSC-02", 4).await;
    let policy = PenaltyPolicy::default();
    let now = at(2025, 3, 4, 9);

    let booking_id = approved_loan(&db, &student, &admin, scope.id, 1).await;
    let base = DamageReport {
        component_id: scope.id,
        booking_id: None,
        user_id: None,
        severity: DamageSeverity::Major,
        amount: None,
        notes: None,
    };

    let cases = [
        // Nobody to charge
        base.clone(),
        // Amount outside the major range
        DamageReport {
            user_id: Some(student.user_id),
            amount: Some(100),
            ..base.clone()
        },
        // Booking for a different component
        DamageReport {
            component_id: other.id,
            booking_id: Some(booking_id),
            ..base.clone()
        },
    ];
    for case in cases {
        let err = PenaltyService::assess_damage(&db, &policy, &admin, case, now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)), "{err:?}");
    }

    let err = PenaltyService::assess_damage(
        &db,
        &policy,
        &student,
        DamageReport {
            user_id: Some(student.user_id),
            ..base.clone()
        },
        now,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Forbidden));

    let walk_in = PenaltyService::assess_damage(
        &db,
        &policy,
        &admin,
        DamageReport {
            user_id: Some(student.user_id),
            amount: Some(1500),
            ..base
        },
        now,
    )
    .await
    .unwrap();
    assert_eq!(walk_in.booking_id, None);
    assert_eq!(walk_in.amount, 1500);
}

#[tokio::test]
async fn test_penalty_visibility_and_totals() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let alice = seed_user(&db, "Alice", Role::Student).await;
    let bob = seed_user(&db, "Bob", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    let policy = PenaltyPolicy::default();

    approved_loan(&db, &alice, &admin, arduino.id, 1).await;
    approved_loan(&db, &bob, &admin, arduino.id, 2).await;
    BookingService::sweep_overdue(&db, &policy, at(2025, 3, 6, 0))
        .await
        .unwrap();

    let bobs = PenaltyService::list(&db, &bob, PenaltyFilter::default())
        .await
        .unwrap();
    assert_eq!(bobs.len(), 1);
    assert!(matches!(
        PenaltyService::get(&db, &alice, bobs[0].id).await,
        Err(Error::Forbidden)
    ));

    PenaltyService::mark_paid(&db, &admin, bobs[0].id, None, at(2025, 3, 6, 12))
        .await
        .unwrap();

    let totals = PenaltyService::totals(&db, None).await.unwrap();
    assert_eq!(totals.count, 2);
    assert_eq!(totals.total, 150);
    assert_eq!(totals.paid, 100);
    assert_eq!(totals.pending, 50);

    let pending_only = PenaltyFilter {
        status: Some(PenaltyStatus::Pending),
        ..Default::default()
    };
    let pending = PenaltyService::list(&db, &admin, pending_only).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, alice.user_id);
}

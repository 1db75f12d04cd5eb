//! Component catalogue, accounts and dashboard aggregates.

mod common;

use common::{assert_conserved, at, date, seed_component, seed_user, setup};
use chrono::NaiveDate;
use database::{
    Actor, Error,
    entities::booking,
    services::{
        booking::{BookingService, NewBooking},
        component::{
            ComponentChanges, ComponentFilter, ComponentService, NewComponent, Removal, StockMove,
        },
        stats::StatsService,
        user::{NewUser, ProfileChanges, UserChanges, UserService},
    },
};
use models::{ComponentStatus, PenaltyPolicy, Role, StockBucket};
use sea_orm::{DatabaseConnection, prelude::Uuid};

fn oscilloscope() -> NewComponent {
    NewComponent {
        name: "Digital Oscilloscope".to_owned(),
        code: "osc-100".to_owned(),
        category: "Test Equipment".to_owned(),
        description: Some("100 MHz, 4 channels".to_owned()),
        total_quantity: 4,
        replacement_cost: 25_000,
    }
}

#[tokio::test]
async fn test_create_component_requires_admin_and_unique_code() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let now = at(2025, 2, 1, 9);

    assert!(matches!(
        ComponentService::create(&db, &student, oscilloscope(), now).await,
        Err(Error::Forbidden)
    ));

    let created = ComponentService::create(&db, &admin, oscilloscope(), now)
        .await
        .unwrap();
    assert_eq!(created.code, "OSC-100");
    assert_eq!(created.available_quantity, 4);
    assert_eq!(created.status, ComponentStatus::Active);

    let err = ComponentService::create(&db, &admin, oscilloscope(), now)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let nameless = NewComponent {
        name: " ".to_owned(),
        code: "OSC-200".to_owned(),
        ..oscilloscope()
    };
    assert!(matches!(
        ComponentService::create(&db, &admin, nameless, now).await,
        Err(Error::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_update_applies_total_through_the_ledger() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;

    let booking = BookingService::create(
        &db,
        &student,
        NewBooking {
            component_id: arduino.id,
            quantity: 4,
            expected_return_date: date(2025, 3, 5),
            reason: "Workshop".to_owned(),
        },
        at(2025, 3, 1, 10),
    )
    .await
    .unwrap();
    BookingService::approve(&db, &admin, booking.id, at(2025, 3, 1, 11))
        .await
        .unwrap();

    let updated = ComponentService::update(
        &db,
        &admin,
        arduino.id,
        ComponentChanges {
            name: Some("Arduino Uno R4".to_owned()),
            total_quantity: Some(6),
            ..Default::default()
        },
        at(2025, 3, 2, 9),
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Arduino Uno R4");
    assert_eq!(updated.total_quantity, 6);
    assert_eq!(updated.available_quantity, 2);

    // Fails as a whole: the rename is not applied either
    let err = ComponentService::update(
        &db,
        &admin,
        arduino.id,
        ComponentChanges {
            name: Some("Renamed".to_owned()),
            total_quantity: Some(3),
            ..Default::default()
        },
        at(2025, 3, 2, 10),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidQuantity { .. }));

    let current = ComponentService::get(&db, arduino.id).await.unwrap();
    assert_eq!(current.name, "Arduino Uno R4");
    assert_eq!(current.total_quantity, 6);
}

#[tokio::test]
async fn test_remove_retires_components_with_history() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let unused = seed_component(&db, "LCD-16", 5).await;
    let used = seed_component(&db, "ARD-UNO", 5).await;
    let now = at(2025, 3, 1, 10);

    BookingService::create(
        &db,
        &student,
        NewBooking {
            component_id: used.id,
            quantity: 1,
            expected_return_date: date(2025, 3, 5),
            reason: "Lab 2".to_owned(),
        },
        now,
    )
    .await
    .unwrap();

    assert_eq!(
        ComponentService::remove(&db, &admin, unused.id, now)
            .await
            .unwrap(),
        Removal::Deleted
    );
    assert!(matches!(
        ComponentService::get(&db, unused.id).await,
        Err(Error::NotFound("component"))
    ));

    let Removal::Retired(retired) = ComponentService::remove(&db, &admin, used.id, now)
        .await
        .unwrap()
    else {
        panic!("component with bookings must be retired");
    };
    assert_eq!(retired.status, ComponentStatus::Retired);

    // Retired components disappear from the catalogue and cannot be booked
    let listed = ComponentService::list(&db, ComponentFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());
    let all = ComponentService::list(
        &db,
        ComponentFilter {
            include_retired: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 1);

    let err = BookingService::create(
        &db,
        &student,
        NewBooking {
            component_id: used.id,
            quantity: 1,
            expected_return_date: date(2025, 3, 5),
            reason: "Lab 2".to_owned(),
        },
        now,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn test_list_filters_and_categories() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let now = at(2025, 2, 1, 9);

    ComponentService::create(&db, &admin, oscilloscope(), now)
        .await
        .unwrap();
    seed_component(&db, "ARD-UNO", 10).await;
    seed_component(&db, "ESP-32", 10).await;

    let categories = ComponentService::categories(&db).await.unwrap();
    assert_eq!(categories, vec!["Microcontrollers", "Test Equipment"]);

    let micro = ComponentService::list(
        &db,
        ComponentFilter {
            category: Some("Microcontrollers".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(micro.len(), 2);

    let search = ComponentService::list(
        &db,
        ComponentFilter {
            search: Some("esp".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].code, "ESP-32");
}

#[tokio::test]
async fn test_stock_moves_are_admin_only() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let board = seed_component(&db, "RPI-4", 5).await;

    assert!(matches!(
        ComponentService::move_stock(&db, &student, board.id, StockMove::Restock, 2).await,
        Err(Error::Forbidden)
    ));

    let levels = ComponentService::move_stock(
        &db,
        &admin,
        board.id,
        StockMove::Maintenance {
            source: StockBucket::Available,
        },
        2,
    )
    .await
    .unwrap();
    assert_eq!(levels.under_maintenance, 2);
    assert_conserved(&levels);

    let levels = ComponentService::move_stock(
        &db,
        &admin,
        board.id,
        StockMove::Restore {
            from: StockBucket::UnderMaintenance,
        },
        2,
    )
    .await
    .unwrap();
    assert_eq!(levels.available, 5);
}

#[tokio::test]
async fn test_user_lifecycle() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let now = at(2025, 2, 1, 9);

    let created = UserService::create(
        &db,
        &admin,
        NewUser {
            full_name: "Grace Hopper".to_owned(),
            email: " Grace@Lab.Test ".to_owned(),
            department: Some("Computer Science".to_owned()),
            phone: None,
            role: Role::Student,
            password_hash: "hash".to_owned(),
        },
        now,
    )
    .await
    .unwrap();
    assert_eq!(created.email, "grace@lab.test");

    let duplicate = NewUser {
        full_name: "Grace Again".to_owned(),
        email: "grace@lab.test".to_owned(),
        department: None,
        phone: None,
        role: Role::Student,
        password_hash: "hash".to_owned(),
    };
    assert!(matches!(
        UserService::create(&db, &admin, duplicate, now).await,
        Err(Error::InvalidRequest(_))
    ));

    assert!(matches!(
        UserService::get(&db, &student, created.id).await,
        Err(Error::Forbidden)
    ));
    assert_eq!(
        UserService::list(&db, &admin, Some(Role::Student))
            .await
            .unwrap()
            .len(),
        2
    );

    UserService::delete(&db, &admin, created.id).await.unwrap();
    assert!(matches!(
        UserService::get(&db, &admin, created.id).await,
        Err(Error::NotFound("user"))
    ));
}

#[tokio::test]
async fn test_user_with_history_cannot_be_deleted() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;

    let booking = BookingService::create(
        &db,
        &student,
        NewBooking {
            component_id: arduino.id,
            quantity: 1,
            expected_return_date: date(2025, 3, 5),
            reason: "Capstone".to_owned(),
        },
        at(2025, 3, 1, 10),
    )
    .await
    .unwrap();

    assert!(matches!(
        UserService::delete(&db, &admin, student.user_id).await,
        Err(Error::InvalidState(_))
    ));

    BookingService::approve(&db, &admin, booking.id, at(2025, 3, 1, 11))
        .await
        .unwrap();
    BookingService::mark_returned(
        &db,
        &PenaltyPolicy::default(),
        &student,
        booking.id,
        at(2025, 3, 7, 9),
    )
    .await
    .unwrap();

    // The booking is closed but the late-return penalty stays on record
    assert!(matches!(
        UserService::delete(&db, &admin, student.user_id).await,
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        UserService::delete(&db, &admin, admin.user_id).await,
        Err(Error::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_dashboard_aggregates() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    seed_component(&db, "ESP-32", 2).await;
    let policy = PenaltyPolicy::default();

    let booking = BookingService::create(
        &db,
        &student,
        NewBooking {
            component_id: arduino.id,
            quantity: 5,
            expected_return_date: date(2025, 3, 5),
            reason: "Hackathon".to_owned(),
        },
        at(2025, 3, 1, 10),
    )
    .await
    .unwrap();
    BookingService::approve(&db, &admin, booking.id, at(2025, 3, 1, 11))
        .await
        .unwrap();
    BookingService::sweep_overdue(&db, &policy, at(2025, 3, 7, 0))
        .await
        .unwrap();

    let stats = StatsService::admin_stats(&db, &admin).await.unwrap();
    assert_eq!(stats.students, 1);
    assert_eq!(stats.inventory.components, 2);
    assert_eq!(stats.inventory.total_units, 12);
    assert_eq!(stats.inventory.on_loan_units, 5);
    assert_eq!(stats.bookings.get("overdue"), Some(&1));
    assert_eq!(stats.penalties.pending, 2 * 50 * 5);

    let mine = StatsService::user_stats(&db, &student).await.unwrap();
    assert_eq!(mine.total_bookings, 1);
    assert_eq!(mine.active_bookings, 1);
    assert_eq!(mine.overdue_bookings, 1);

    let low = StatsService::low_stock(&db, &admin, 5).await.unwrap();
    let codes: Vec<_> = low.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["ESP-32", "ARD-UNO"]);

    assert!(matches!(
        StatsService::admin_stats(&db, &student).await,
        Err(Error::Forbidden)
    ));
}

#[tokio::test]
async fn test_admin_account_edits() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    seed_user(&db, "Other", Role::Student).await;

    let edited = UserService::update(
        &db,
        &admin,
        student.user_id,
        UserChanges {
            full_name: Some("  Ada Lovelace ".to_owned()),
            email: Some("ADA@lab.test".to_owned()),
            phone: Some("555-0100".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(edited.full_name, "Ada Lovelace");
    assert_eq!(edited.email, "ada@lab.test");
    assert_eq!(edited.phone.as_deref(), Some("555-0100"));
    assert_eq!(edited.department.as_deref(), Some("Electronics"));

    let cleared = UserService::update(
        &db,
        &admin,
        student.user_id,
        UserChanges {
            department: Some("   ".to_owned()),
            role: Some(Role::Admin),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.department, None);
    assert_eq!(cleared.role, Role::Admin);

    for changes in [
        UserChanges {
            email: Some("other@lab.test".to_owned()),
            ..Default::default()
        },
        UserChanges {
            email: Some("nobody at lab".to_owned()),
            ..Default::default()
        },
        UserChanges {
            full_name: Some(" ".to_owned()),
            ..Default::default()
        },
    ] {
        assert!(matches!(
            UserService::update(&db, &admin, student.user_id, changes).await,
            Err(Error::InvalidRequest(_))
        ));
    }

    let demote_self = UserChanges {
        role: Some(Role::Student),
        ..Default::default()
    };
    assert!(matches!(
        UserService::update(&db, &admin, admin.user_id, demote_self).await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(
        UserService::update(&db, &admin, Uuid::new_v4(), UserChanges::default()).await,
        Err(Error::NotFound("user"))
    ));

    let unchanged = UserService::update(&db, &admin, student.user_id, UserChanges::default())
        .await
        .unwrap();
    assert_eq!(unchanged, cleared);
}

#[tokio::test]
async fn test_profile_and_password_reset() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;

    let profile = UserService::update_profile(
        &db,
        &student,
        ProfileChanges {
            department: Some("Mechatronics".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(profile.department.as_deref(), Some("Mechatronics"));
    assert_eq!(profile.email, "student@lab.test");
    assert_eq!(profile.role, Role::Student);

    assert!(matches!(
        UserService::update(&db, &student, student.user_id, UserChanges::default()).await,
        Err(Error::Forbidden)
    ));

    assert!(matches!(
        UserService::reset_password(&db, &student, student.user_id, "mine".to_owned()).await,
        Err(Error::Forbidden)
    ));
    UserService::reset_password(&db, &admin, student.user_id, "new-hash".to_owned())
        .await
        .unwrap();
    let stored = UserService::find_by_email(&db, "student@lab.test")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.password_hash, "new-hash");

    assert!(matches!(
        UserService::reset_password(&db, &admin, Uuid::new_v4(), "x".to_owned()).await,
        Err(Error::NotFound("user"))
    ));
}

#[tokio::test]
async fn test_lookup_by_code_ignores_case_and_padding() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let created = ComponentService::create(&db, &admin, oscilloscope(), at(2025, 2, 1, 9))
        .await
        .unwrap();

    let found = ComponentService::get_by_code(&db, " osc-100 ").await.unwrap();
    assert_eq!(found.id, created.id);

    assert!(matches!(
        ComponentService::get_by_code(&db, "OSC-999").await,
        Err(Error::NotFound("component"))
    ));
}

/// Books `quantity` units, requested at `hour` on 2025-03-01
async fn book(
    db: &DatabaseConnection,
    student: &Actor,
    component_id: Uuid,
    quantity: i32,
    due: NaiveDate,
    hour: u32,
) -> booking::Model {
    BookingService::create(
        db,
        student,
        NewBooking {
            component_id,
            quantity,
            expected_return_date: due,
            reason: "Lab session".to_owned(),
        },
        at(2025, 3, 1, hour),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_dashboard_listings() {
    let db = setup().await;
    let admin = seed_user(&db, "Admin", Role::Admin).await;
    let student = seed_user(&db, "Student", Role::Student).await;
    let arduino = seed_component(&db, "ARD-UNO", 10).await;
    let esp = seed_component(&db, "ESP-32", 6).await;
    ComponentService::create(&db, &admin, oscilloscope(), at(2025, 2, 1, 9))
        .await
        .unwrap();
    let policy = PenaltyPolicy::default();

    let late = book(&db, &student, arduino.id, 2, date(2025, 3, 5), 9).await;
    let on_time = book(&db, &student, esp.id, 3, date(2025, 3, 20), 10).await;
    let returned = book(&db, &student, arduino.id, 4, date(2025, 3, 4), 11).await;
    let pending = book(&db, &student, esp.id, 1, date(2025, 3, 20), 12).await;
    for booking in [&late, &on_time, &returned] {
        BookingService::approve(&db, &admin, booking.id, at(2025, 3, 1, 13))
            .await
            .unwrap();
    }
    BookingService::mark_returned(&db, &policy, &student, returned.id, at(2025, 3, 3, 9))
        .await
        .unwrap();

    // Past due but not yet swept
    let overdue = StatsService::overdue_bookings(&db, &admin, date(2025, 3, 7))
        .await
        .unwrap();
    assert_eq!(
        overdue.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![late.id]
    );
    BookingService::sweep_overdue(&db, &policy, at(2025, 3, 7, 0))
        .await
        .unwrap();
    let overdue = StatsService::overdue_bookings(&db, &admin, date(2025, 3, 7))
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);

    let recent = StatsService::recent_bookings(&db, &admin, 2).await.unwrap();
    assert_eq!(
        recent.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![pending.id, returned.id]
    );
    assert_eq!(
        StatsService::recent_bookings(&db, &admin, 0).await.unwrap().len(),
        1
    );

    let top = StatsService::top_components(&db, &admin, 10).await.unwrap();
    let ranking: Vec<_> = top
        .iter()
        .map(|u| (u.component.code.as_str(), u.bookings, u.units))
        .collect();
    assert_eq!(ranking, vec![("ARD-UNO", 2, 6), ("ESP-32", 1, 3)]);

    let summary = StatsService::category_summary(&db).await.unwrap();
    let categories: Vec<_> = summary.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(categories, vec!["Microcontrollers", "Test Equipment"]);
    assert_eq!(summary[0].components, 2);
    assert_eq!(summary[0].total_units, 16);
    assert_eq!(summary[0].on_loan_units, 5);
    assert_eq!(summary[0].available_units, 11);
    assert_eq!(summary[1].total_units, 4);

    for result in [
        StatsService::overdue_bookings(&db, &student, date(2025, 3, 7))
            .await
            .map(|_| ()),
        StatsService::recent_bookings(&db, &student, 5).await.map(|_| ()),
        StatsService::top_components(&db, &student, 5).await.map(|_| ()),
    ] {
        assert!(matches!(result, Err(Error::Forbidden)));
    }
}

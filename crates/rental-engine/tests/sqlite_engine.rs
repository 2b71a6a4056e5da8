//! End-to-end tests of the engine over an in-memory SQLite database.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use rental_core::{ComponentSpec, DateRange, OrderStatus, ProductStatus};
use rental_db::{Database, DbConfig, NewOrderItem};
use rental_engine::store::memory::{sample_pack, sample_product};
use rental_engine::store::sqlite::SqliteStore;
use rental_engine::availability::INACTIVE_PRODUCT_REASON;
use rental_engine::pack::INACTIVE_PACK_REASON;
use rental_engine::{DeleteKind, ErrorCode, FixedClock, RentalEngine, StockOperation};

fn june(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn item(product_id: &str, quantity: i64, start: u32, end: u32) -> NewOrderItem {
    NewOrderItem {
        product_id: product_id.to_string(),
        quantity,
        range: DateRange::new(june(start), june(end)).unwrap(),
    }
}

fn spec(component_id: &str, quantity_per_pack: i64) -> ComponentSpec {
    ComponentSpec {
        component_id: component_id.to_string(),
        quantity_per_pack,
    }
}

/// Fresh database with speaker (5), mixer (10) and an empty dj-set pack.
async fn setup() -> (Database, RentalEngine) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.products().insert(&sample_product("speaker", 5)).await.unwrap();
    db.products().insert(&sample_product("mixer", 10)).await.unwrap();
    db.products().insert(&sample_pack("dj-set")).await.unwrap();

    let engine = RentalEngine::builder(Arc::new(SqliteStore::new(db.clone())))
        .clock(Arc::new(FixedClock(june(1))))
        .build()
        .unwrap();
    (db, engine)
}

#[tokio::test]
async fn overlapping_reservation_limits_availability() {
    let (db, engine) = setup().await;
    db.orders()
        .create_order(OrderStatus::Pending, &[item("speaker", 2, 1, 3)])
        .await
        .unwrap();

    let result = engine
        .check_availability("speaker", june(2), june(4), 4)
        .await
        .unwrap();
    assert!(!result.available);
    assert_eq!(result.available_quantity, 3);
    assert_eq!(result.requested_quantity, 4);

    let result = engine
        .check_availability("speaker", june(4), june(6), 5)
        .await
        .unwrap();
    assert!(result.available);
    assert_eq!(result.available_quantity, 5);
}

#[tokio::test]
async fn completing_an_order_frees_its_stock() {
    let (db, engine) = setup().await;
    let (order, _) = db
        .orders()
        .create_order(OrderStatus::InProgress, &[item("speaker", 5, 1, 3)])
        .await
        .unwrap();

    let before = engine
        .check_availability("speaker", june(2), june(2), 1)
        .await
        .unwrap();
    assert!(!before.available);

    let updated = db
        .orders()
        .update_status(&order.id, OrderStatus::Completed)
        .await
        .unwrap();
    assert!(updated.is_some());

    let after = engine
        .check_availability("speaker", june(2), june(2), 5)
        .await
        .unwrap();
    assert!(after.available);

    let calendar = engine
        .availability_calendar("speaker", june(1), june(3))
        .await
        .unwrap();
    assert!(calendar.iter().all(|d| d.reserved == 0 && d.available == 5));
}

#[tokio::test]
async fn pack_bottleneck_and_checks() {
    let (db, engine) = setup().await;
    engine
        .set_pack_components("dj-set", vec![spec("speaker", 2), spec("mixer", 1)])
        .await
        .unwrap();

    let max = engine
        .pack_max_availability("dj-set", june(1), june(3))
        .await
        .unwrap();
    assert_eq!(max.max_available_quantity, 2);
    assert_eq!(max.bottleneck_component_id.as_deref(), Some("speaker"));

    db.orders()
        .create_order(OrderStatus::Pending, &[item("speaker", 2, 2, 2)])
        .await
        .unwrap();

    let check = engine
        .check_pack_availability("dj-set", june(1), june(3), 2)
        .await
        .unwrap();
    assert!(!check.available);
    assert_eq!(check.unavailable_components.len(), 1);
    assert_eq!(check.unavailable_components[0].component_id, "speaker");
    assert_eq!(check.unavailable_components[0].available, 3);

    let pricing = engine.pack_pricing("dj-set").await.unwrap();
    assert_eq!(pricing.individual_price.cents(), 3000);
}

#[tokio::test]
async fn deletion_outcomes() {
    let (db, engine) = setup().await;

    // History-free dependents go with a hard delete.
    db.products().insert(&sample_product("lamp", 2)).await.unwrap();
    db.engagement().add_review("lamp", 5, Some("bright")).await.unwrap();
    db.engagement().add_favorite("lamp", "user-1").await.unwrap();
    db.engagement().record_interaction("lamp", "view").await.unwrap();
    db.engagement().upsert_analytics("lamp", 10, 1).await.unwrap();

    let outcome = engine.delete_product("lamp", false).await.unwrap();
    assert_eq!(outcome.outcome, DeleteKind::Hard);
    assert!(db.products().get_by_id("lamp").await.unwrap().is_none());

    // Order history forces a soft delete.
    db.orders()
        .create_order(OrderStatus::Completed, &[item("mixer", 1, 1, 1)])
        .await
        .unwrap();
    let outcome = engine.delete_product("mixer", false).await.unwrap();
    assert_eq!(outcome.outcome, DeleteKind::Soft);
    let mixer = db.products().get_by_id("mixer").await.unwrap().unwrap();
    assert!(!mixer.is_active);
    assert_eq!(mixer.status, ProductStatus::Discontinued);

    // Forcing it runs into the foreign key on order_items.
    let err = engine.delete_product("mixer", true).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::DeleteConstraintError);
    assert!(db.products().get_by_id("mixer").await.unwrap().is_some());

    let err = engine.delete_product("ghost", false).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deletes_each_complete_once() {
    let (db, engine) = setup().await;
    let ids = ["light", "fog", "cable", "stand", "truss"];
    for id in ids {
        db.products().insert(&sample_product(id, 3)).await.unwrap();
        db.orders()
            .create_order(OrderStatus::Pending, &[item(id, 1, 2, 4)])
            .await
            .unwrap();
    }
    let engine = Arc::new(engine);

    let mut tasks = Vec::new();
    for id in ids {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move { engine.delete_product(id, false).await }));
    }

    for (task, id) in tasks.into_iter().zip(ids) {
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.product_id, id);
        assert_eq!(outcome.outcome, DeleteKind::Soft);
    }

    for id in ids {
        let product = db.products().get_by_id(id).await.unwrap().unwrap();
        assert!(!product.is_active);
        assert_eq!(product.status, ProductStatus::Discontinued);
    }
}

#[tokio::test]
async fn soft_deleted_items_leave_the_catalog() {
    let (_db, engine) = setup().await;
    engine
        .set_pack_components("dj-set", vec![spec("speaker", 1)])
        .await
        .unwrap();

    // The pack has components, so deletion only deactivates it.
    let outcome = engine.delete_product("dj-set", false).await.unwrap();
    assert_eq!(outcome.outcome, DeleteKind::Soft);

    let pack = engine
        .check_pack_availability("dj-set", june(2), june(3), 1)
        .await
        .unwrap();
    assert!(!pack.available);
    assert_eq!(pack.reason.as_deref(), Some(INACTIVE_PACK_REASON));

    // The speaker is a component of the pack, so it is soft deleted too.
    let outcome = engine.delete_product("speaker", false).await.unwrap();
    assert_eq!(outcome.outcome, DeleteKind::Soft);

    let speaker = engine
        .check_availability("speaker", june(2), june(3), 1)
        .await
        .unwrap();
    assert!(!speaker.available);
    assert_eq!(speaker.reason.as_deref(), Some(INACTIVE_PRODUCT_REASON));
}

#[tokio::test]
async fn stock_adjustment_is_conditional() {
    let (_db, engine) = setup().await;

    let speaker = engine
        .adjust_stock("speaker", 5, StockOperation::Decrease)
        .await
        .unwrap();
    assert_eq!(speaker.available_stock, 0);
    assert_eq!(speaker.status, ProductStatus::OutOfStock);

    let err = engine
        .adjust_stock("speaker", 1, StockOperation::Decrease)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);

    let speaker = engine
        .adjust_stock("speaker", 2, StockOperation::Increase)
        .await
        .unwrap();
    assert_eq!(speaker.status, ProductStatus::Available);
}

#[tokio::test]
async fn summary_over_upcoming_window() {
    let (db, engine) = setup().await;
    db.orders()
        .create_order(OrderStatus::Pending, &[item("speaker", 1, 2, 3)])
        .await
        .unwrap();
    db.orders()
        .create_order(OrderStatus::Pending, &[item("speaker", 3, 5, 8)])
        .await
        .unwrap();

    let summary = engine.availability_summary("speaker", 10).await.unwrap();
    assert_eq!(summary.total_bookings, 2);
    assert_eq!(summary.total_quantity_booked, 4);
    assert_eq!(summary.average_booking_days, 3);

    let booked = engine.booked_dates("speaker", june(1), june(4)).await.unwrap();
    assert_eq!(booked, vec![june(2), june(3)]);

    let far = june(1) + Duration::days(40);
    let exempt = engine
        .check_availability("speaker", far, far, 50)
        .await
        .unwrap();
    assert!(exempt.available);
}

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};

use shipment_tracker::auth::Actor;
use shipment_tracker::config::Config;
use shipment_tracker::engine::analytics::{
    create_prediction, get_prediction, list_models, list_performance_metrics,
};
use shipment_tracker::engine::clock::{Clock, ManualClock};
use shipment_tracker::engine::events::{append_event, list_events};
use shipment_tracker::engine::lifecycle::{
    create_shipment, get_shipment, set_status, track_by_number, ShipmentKey,
};
use shipment_tracker::engine::random::{RandomSource, SeededRandom};
use shipment_tracker::engine::tracking_number::is_tracking_number;
use shipment_tracker::error::AppError;
use shipment_tracker::models::shipment::{NewShipment, ShipmentStatus};
use shipment_tracker::models::tracking::NewTrackingEvent;
use shipment_tracker::state::{AppState, Collaborators};

const SENDER: u64 = 7;

/// Always the middle of the requested range. Indices cycle so consecutive
/// tracking numbers differ.
struct Midpoint {
    calls: AtomicUsize,
}

impl Midpoint {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for Midpoint {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        (low + high) / 2.0
    }

    fn index(&self, upper: usize) -> usize {
        self.calls.fetch_add(1, Ordering::Relaxed) % upper
    }
}

/// Same draw every time, so every tracking number is identical.
struct Constant;

impl RandomSource for Constant {
    fn uniform(&self, low: f64, _high: f64) -> f64 {
        low
    }

    fn index(&self, _upper: usize) -> usize {
        0
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

fn setup_with(random: Arc<dyn RandomSource>) -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let state = AppState::new(
        &Config::default(),
        Collaborators::with_sources(clock.clone(), random),
    );
    (state, clock)
}

fn setup() -> (AppState, Arc<ManualClock>) {
    setup_with(Arc::new(Midpoint::new()))
}

fn express_shipment() -> NewShipment {
    NewShipment {
        recipient_name: Some("Ana Costa".to_string()),
        origin_address: Some("1 Dock St".to_string()),
        destination_address: Some("9 Hill Rd".to_string()),
        origin_city: Some("Lisbon".to_string()),
        destination_city: Some("Madrid".to_string()),
        origin_country: Some("PT".to_string()),
        destination_country: Some("ES".to_string()),
        weight: Some(2.5),
        package_type: Some("box".to_string()),
        service_type: Some("express".to_string()),
        ..Default::default()
    }
}

#[test]
fn created_shipment_is_pending_with_estimate_and_first_event() {
    let (state, _clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    assert_eq!(shipment.status, ShipmentStatus::Pending);
    assert_eq!(shipment.estimated_delivery, t0() + Duration::days(3));
    assert!(is_tracking_number(&shipment.tracking_number));
    assert!(shipment.actual_delivery.is_none());

    let events = list_events(&state, shipment.id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "created");
    assert_eq!(events[0].description, "Shipment created and pending pickup");
    assert_eq!(events[0].location.as_deref(), Some("Lisbon"));
    assert_eq!(events[0].timestamp, t0());
}

#[test]
fn prediction_is_scored_when_the_shipment_is_delivered() {
    let (state, clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    let prediction = create_prediction(&state, shipment.id).unwrap();
    assert_eq!(prediction.predicted_delivery_date, t0() + Duration::days(3));
    assert!((prediction.confidence_score - 0.85).abs() < 1e-9);
    assert_eq!(prediction.factors["service_type"], "express");
    assert!(prediction.accuracy_score.is_none());

    clock.set(t0() + Duration::days(3) + Duration::hours(2));
    let delivered = set_status(
        &state,
        shipment.id,
        ShipmentStatus::Delivered,
        &Actor::admin(1),
        Some("Madrid".to_string()),
    )
    .unwrap();
    assert_eq!(delivered.actual_delivery, Some(clock.now()));

    let scored = get_prediction(&state, shipment.id).unwrap();
    assert_eq!(scored.actual_delivery_date, delivered.actual_delivery);
    assert_eq!(scored.accuracy_score, Some(1.0));

    let events = list_events(&state, shipment.id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].event_type, "delivered");
    assert_eq!(events[1].location.as_deref(), Some("Madrid"));
}

#[test]
fn late_delivery_lowers_accuracy() {
    let (state, clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();
    create_prediction(&state, shipment.id).unwrap();

    clock.set(t0() + Duration::days(8));
    set_status(
        &state,
        shipment.id,
        ShipmentStatus::Delivered,
        &Actor::admin(1),
        None,
    )
    .unwrap();

    // five days late
    let scored = get_prediction(&state, shipment.id).unwrap();
    assert_eq!(scored.accuracy_score, Some(0.4));
}

#[test]
fn prediction_after_delivery_is_scored_immediately() {
    let (state, clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    clock.set(t0() + Duration::days(4));
    set_status(
        &state,
        shipment.id,
        ShipmentStatus::Delivered,
        &Actor::admin(1),
        None,
    )
    .unwrap();

    let prediction = create_prediction(&state, shipment.id).unwrap();
    assert_eq!(prediction.actual_delivery_date, Some(t0() + Duration::days(4)));
    assert!(prediction.accuracy_score.is_some());
}

#[test]
fn second_prediction_is_a_duplicate_and_stores_nothing() {
    let (state, _clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    let first = create_prediction(&state, shipment.id).unwrap();
    let second = create_prediction(&state, shipment.id);

    assert!(matches!(second, Err(AppError::Duplicate(_))));
    assert_eq!(state.predictions.len(), 1);
    assert_eq!(get_prediction(&state, shipment.id).unwrap().id, first.id);
}

#[test]
fn default_model_is_registered_once() {
    let (state, _clock) = setup();
    let a = create_shipment(&state, SENDER, express_shipment()).unwrap();
    let b = create_shipment(&state, SENDER, express_shipment()).unwrap();

    let first = create_prediction(&state, a.id).unwrap();
    let second = create_prediction(&state, b.id).unwrap();

    let models = list_models(&state);
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "Default Delivery Time Model");
    assert_eq!(first.model_id, models[0].id);
    assert_eq!(second.model_id, models[0].id);
}

#[test]
fn prediction_for_unknown_shipment_is_not_found() {
    let (state, _clock) = setup();
    assert!(matches!(
        create_prediction(&state, 404),
        Err(AppError::NotFound(_))
    ));
    assert!(state.predictions.is_empty());
}

#[test]
fn non_admin_status_change_is_forbidden_and_changes_nothing() {
    let (state, _clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    let result = set_status(
        &state,
        shipment.id,
        ShipmentStatus::Delivered,
        &Actor::user(SENDER),
        None,
    );

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    let stored = get_shipment(&state, &ShipmentKey::Id(shipment.id)).unwrap();
    assert_eq!(stored.status, ShipmentStatus::Pending);
    assert_eq!(list_events(&state, shipment.id).unwrap().len(), 1);
}

#[test]
fn actual_delivery_tracks_the_delivered_status() {
    let (state, clock) = setup();
    let admin = Actor::admin(1);
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    let steps = [
        ShipmentStatus::InTransit,
        ShipmentStatus::Delivered,
        ShipmentStatus::Delivered,
        ShipmentStatus::Exception,
        ShipmentStatus::Other("returned_to_sender".to_string()),
    ];
    let mut first_delivery = None;

    for status in steps {
        clock.advance(Duration::hours(6));
        let updated = set_status(&state, shipment.id, status.clone(), &admin, None).unwrap();
        assert_eq!(updated.status, status);
        assert_eq!(
            updated.actual_delivery.is_some(),
            status == ShipmentStatus::Delivered
        );

        if status == ShipmentStatus::Delivered {
            let at = updated.actual_delivery.unwrap();
            assert_eq!(*first_delivery.get_or_insert(at), at);
        }
    }

    let events = list_events(&state, shipment.id).unwrap();
    assert_eq!(events.len(), 6);
    assert_eq!(events[5].event_type, "returned_to_sender");
    assert_eq!(events[5].description, "Status updated to returned_to_sender");
}

#[test]
fn leaving_delivered_clears_prediction_outcome() {
    let (state, clock) = setup();
    let admin = Actor::admin(1);
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();
    create_prediction(&state, shipment.id).unwrap();

    clock.advance(Duration::days(3));
    set_status(&state, shipment.id, ShipmentStatus::Delivered, &admin, None).unwrap();
    set_status(&state, shipment.id, ShipmentStatus::Exception, &admin, None).unwrap();

    let prediction = get_prediction(&state, shipment.id).unwrap();
    assert!(prediction.actual_delivery_date.is_none());
    assert!(prediction.accuracy_score.is_none());
}

#[test]
fn listing_events_is_idempotent() {
    let (state, clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();
    clock.advance(Duration::hours(1));
    append_event(
        &state,
        shipment.id,
        NewTrackingEvent {
            event_type: "picked_up".to_string(),
            description: "Collected from sender".to_string(),
            location: Some("Lisbon".to_string()),
            timestamp: None,
        },
    )
    .unwrap();

    let first = list_events(&state, shipment.id).unwrap();
    let second = list_events(&state, shipment.id).unwrap();

    let ids = |events: &[shipment_tracker::models::tracking::TrackingEvent]| {
        events.iter().map(|e| e.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first[1].timestamp, t0() + Duration::hours(1));
}

#[test]
fn appending_to_unknown_shipment_is_not_found() {
    let (state, _clock) = setup();
    let result = append_event(
        &state,
        12,
        NewTrackingEvent {
            event_type: "picked_up".to_string(),
            description: "Collected".to_string(),
            location: None,
            timestamp: None,
        },
    );
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
fn track_by_number_returns_history() {
    let (state, _clock) = setup();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    let tracked = track_by_number(&state, &shipment.tracking_number).unwrap();
    assert_eq!(tracked.shipment.id, shipment.id);
    assert_eq!(tracked.tracking_events.len(), 1);

    assert!(matches!(
        track_by_number(&state, "SHP00000000"),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn ten_thousand_tracking_numbers_are_unique() {
    let (state, _clock) = setup_with(Arc::new(SeededRandom::new(0x5eed)));

    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();
        assert!(seen.insert(shipment.tracking_number));
    }
    assert_eq!(state.tracking_numbers.len(), 10_000);
}

#[test]
fn exhausted_tracking_number_attempts_fail_cleanly() {
    let (state, _clock) = setup_with(Arc::new(Constant));

    create_shipment(&state, SENDER, express_shipment()).unwrap();
    let second = create_shipment(&state, SENDER, express_shipment());

    assert!(matches!(second, Err(AppError::Internal(_))));
    assert_eq!(state.shipments.len(), 1);
}

#[tokio::test]
async fn status_changes_are_broadcast() {
    let (state, _clock) = setup();
    let mut rx = state.tracking_events_tx.subscribe();
    let shipment = create_shipment(&state, SENDER, express_shipment()).unwrap();

    set_status(
        &state,
        shipment.id,
        ShipmentStatus::InTransit,
        &Actor::admin(1),
        None,
    )
    .unwrap();

    assert_eq!(rx.recv().await.unwrap().event_type, "created");
    assert_eq!(rx.recv().await.unwrap().event_type, "in_transit");
}

#[test]
fn oversized_metric_window_is_a_validation_error() {
    let (state, _clock) = setup();

    let result = list_performance_metrics(&state, None, Some(i64::MAX / 1000));
    assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "days"));

    assert!(list_performance_metrics(&state, None, Some(30)).unwrap().is_empty());
}

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::error::AppError;
use crate::models::tracking::{NewTrackingEvent, TrackingEvent};
use crate::state::{AppState, IdSequence};

/// Append-only per-shipment event history, kept sorted by
/// `(timestamp, id)` so reads never need to sort.
#[derive(Default)]
pub struct EventLog {
    by_shipment: DashMap<u64, Vec<TrackingEvent>>,
    ids: IdSequence,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an event without checking that the shipment exists. Callers
    /// that hold a shipment entry use this to avoid re-entering the map.
    pub(crate) fn record(
        &self,
        shipment_id: u64,
        event_type: &str,
        description: &str,
        location: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> TrackingEvent {
        let event = TrackingEvent {
            id: self.ids.next(),
            shipment_id,
            event_type: event_type.to_string(),
            description: description.to_string(),
            location,
            timestamp,
        };

        let mut history = self.by_shipment.entry(shipment_id).or_default();
        // ids only grow, so an equal timestamp always lands after existing events
        let position = history.partition_point(|existing| existing.timestamp <= event.timestamp);
        history.insert(position, event.clone());

        event
    }

    /// Snapshot of a shipment's history in ascending timestamp order.
    pub fn list(&self, shipment_id: u64) -> Vec<TrackingEvent> {
        self.by_shipment
            .get(&shipment_id)
            .map(|history| history.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_shipment.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Publishes a freshly stored event to metrics and live subscribers.
pub(crate) fn publish(state: &AppState, event: &TrackingEvent) {
    state.metrics.tracking_events_total.inc();
    let _ = state.tracking_events_tx.send(event.clone());
    debug!(
        shipment_id = event.shipment_id,
        event_type = %event.event_type,
        "tracking event appended"
    );
}

pub fn append_event(
    state: &AppState,
    shipment_id: u64,
    request: NewTrackingEvent,
) -> Result<TrackingEvent, AppError> {
    if request.event_type.trim().is_empty() {
        return Err(AppError::required("event_type"));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::required("description"));
    }
    if !state.shipments.contains_key(&shipment_id) {
        return Err(AppError::NotFound(format!("shipment {shipment_id} not found")));
    }

    let timestamp = request.timestamp.unwrap_or_else(|| state.clock.now());
    let event = state.events.record(
        shipment_id,
        request.event_type.trim(),
        request.description.trim(),
        request.location,
        timestamp,
    );
    publish(state, &event);

    Ok(event)
}

pub fn list_events(state: &AppState, shipment_id: u64) -> Result<Vec<TrackingEvent>, AppError> {
    if !state.shipments.contains_key(&shipment_id) {
        return Err(AppError::NotFound(format!("shipment {shipment_id} not found")));
    }
    Ok(state.events.list(shipment_id))
}

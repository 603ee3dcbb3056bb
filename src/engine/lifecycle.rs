use chrono::Duration;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use crate::auth::Actor;
use crate::engine::accuracy::score_prediction;
use crate::engine::events::publish;
use crate::engine::tracking_number::generate_tracking_number;
use crate::error::AppError;
use crate::models::shipment::{
    NewShipment, PackageType, ServiceType, Shipment, ShipmentStatus, TrackedShipment,
};
use crate::notify::shipment_notification;
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "USD";
const CREATED_EVENT: &str = "created";
const CREATED_DESCRIPTION: &str = "Shipment created and pending pickup";

/// How callers refer to a shipment: internal id or public tracking number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentKey {
    Id(u64),
    TrackingNumber(String),
}

impl ShipmentKey {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(id) => ShipmentKey::Id(id),
            Err(_) => ShipmentKey::TrackingNumber(raw.to_string()),
        }
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(AppError::required(field)),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

struct ValidShipment {
    recipient_name: String,
    origin_address: String,
    destination_address: String,
    origin_city: String,
    destination_city: String,
    origin_country: String,
    destination_country: String,
    weight: f64,
    package_type: PackageType,
    service_type: ServiceType,
    recipient_email: Option<String>,
    recipient_phone: Option<String>,
    dimensions: Option<String>,
    cost: Option<f64>,
    currency: String,
}

fn validate(request: NewShipment) -> Result<ValidShipment, AppError> {
    let recipient_name = required_text(request.recipient_name, "recipient_name")?;
    let origin_address = required_text(request.origin_address, "origin_address")?;
    let destination_address = required_text(request.destination_address, "destination_address")?;
    let origin_city = required_text(request.origin_city, "origin_city")?;
    let destination_city = required_text(request.destination_city, "destination_city")?;
    let origin_country = required_text(request.origin_country, "origin_country")?;
    let destination_country = required_text(request.destination_country, "destination_country")?;

    let weight = request.weight.ok_or_else(|| AppError::required("weight"))?;
    if !weight.is_finite() || weight <= 0.0 {
        return Err(AppError::validation("weight", "weight must be > 0"));
    }

    let package_type = required_text(request.package_type, "package_type")?;
    let package_type = PackageType::parse(&package_type).ok_or_else(|| {
        AppError::validation(
            "package_type",
            format!("unknown package_type: {package_type}, expected box/envelope/pallet"),
        )
    })?;

    let service_type = required_text(request.service_type, "service_type")?;
    let service_type = ServiceType::parse(&service_type).ok_or_else(|| {
        AppError::validation(
            "service_type",
            format!("unknown service_type: {service_type}, expected standard/express/overnight"),
        )
    })?;

    if let Some(cost) = request.cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(AppError::validation("cost", "cost must be >= 0"));
        }
    }

    let currency = match optional_text(request.currency) {
        Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
            code.to_ascii_uppercase()
        }
        Some(code) => {
            return Err(AppError::validation(
                "currency",
                format!("currency must be a 3-letter code, got {code}"),
            ));
        }
        None => DEFAULT_CURRENCY.to_string(),
    };

    Ok(ValidShipment {
        recipient_name,
        origin_address,
        destination_address,
        origin_city,
        destination_city,
        origin_country,
        destination_country,
        weight,
        package_type,
        service_type,
        recipient_email: optional_text(request.recipient_email),
        recipient_phone: optional_text(request.recipient_phone),
        dimensions: optional_text(request.dimensions),
        cost: request.cost,
        currency,
    })
}

/// Claims a fresh tracking number for `shipment_id`. The index entry is the
/// uniqueness constraint; a collision just draws again.
fn claim_tracking_number(state: &AppState, shipment_id: u64) -> Result<String, AppError> {
    for attempt in 1..=state.tracking_number_attempts {
        let candidate = generate_tracking_number(state.random.as_ref());
        match state.tracking_numbers.entry(candidate) {
            Entry::Vacant(slot) => {
                let number = slot.key().clone();
                slot.insert(shipment_id);
                return Ok(number);
            }
            Entry::Occupied(taken) => {
                warn!(
                    tracking_number = %taken.key(),
                    attempt,
                    "tracking number collision; regenerating"
                );
            }
        }
    }

    Err(AppError::Internal(format!(
        "could not allocate a unique tracking number after {} attempts",
        state.tracking_number_attempts
    )))
}

pub fn create_shipment(
    state: &AppState,
    sender_id: u64,
    request: NewShipment,
) -> Result<Shipment, AppError> {
    let valid = validate(request)?;

    let now = state.clock.now();
    let id = state.shipment_ids.next();
    let tracking_number = claim_tracking_number(state, id)?;

    let shipment = Shipment {
        id,
        tracking_number,
        sender_id,
        recipient_name: valid.recipient_name,
        recipient_email: valid.recipient_email,
        recipient_phone: valid.recipient_phone,
        origin_address: valid.origin_address,
        destination_address: valid.destination_address,
        origin_city: valid.origin_city,
        destination_city: valid.destination_city,
        origin_country: valid.origin_country,
        destination_country: valid.destination_country,
        weight: valid.weight,
        dimensions: valid.dimensions,
        package_type: valid.package_type,
        service_type: valid.service_type,
        status: ShipmentStatus::Pending,
        estimated_delivery: now + Duration::days(valid.service_type.base_days()),
        actual_delivery: None,
        created_at: now,
        updated_at: now,
        cost: valid.cost,
        currency: valid.currency,
    };

    state.shipments.insert(id, shipment.clone());

    let event = state.events.record(
        id,
        CREATED_EVENT,
        CREATED_DESCRIPTION,
        Some(shipment.origin_city.clone()),
        now,
    );
    publish(state, &event);

    state.notifications.enqueue(
        shipment.sender_id,
        shipment_notification(&shipment, CREATED_EVENT, now),
    );
    state.metrics.shipments_created_total.inc();

    info!(
        shipment_id = id,
        tracking_number = %shipment.tracking_number,
        service_type = shipment.service_type.as_str(),
        "shipment created"
    );

    Ok(shipment)
}

pub fn get_shipment(state: &AppState, key: &ShipmentKey) -> Result<Shipment, AppError> {
    let id = match key {
        ShipmentKey::Id(id) => *id,
        ShipmentKey::TrackingNumber(number) => *state
            .tracking_numbers
            .get(number)
            .ok_or_else(|| AppError::NotFound(format!("shipment {number} not found")))?
            .value(),
    };

    state
        .shipments
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("shipment {id} not found")))
}

/// All shipments, or only those sent by `owner`, in creation order.
pub fn list_shipments(state: &AppState, owner: Option<u64>) -> Vec<Shipment> {
    let mut shipments: Vec<Shipment> = state
        .shipments
        .iter()
        .filter(|entry| owner.is_none_or(|owner| entry.value().sender_id == owner))
        .map(|entry| entry.value().clone())
        .collect();
    shipments.sort_by_key(|shipment| shipment.id);
    shipments
}

/// Shipments the actor may see: everything for admins, their own otherwise.
pub fn visible_shipments(state: &AppState, actor: &Actor) -> Vec<Shipment> {
    let owner = if actor.is_admin { None } else { Some(actor.id) };
    list_shipments(state, owner)
}

pub fn ensure_can_view(actor: &Actor, shipment: &Shipment) -> Result<(), AppError> {
    if actor.is_admin || shipment.sender_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Forbidden("access denied".to_string()))
    }
}

/// Applies a status change. Any status may follow any other; delivered and
/// cancelled are terminal by convention only.
///
/// `actual_delivery` is stamped on the first move into `delivered` and kept
/// on repeats, and cleared when the shipment leaves `delivered`.
pub fn set_status(
    state: &AppState,
    shipment_id: u64,
    new_status: ShipmentStatus,
    actor: &Actor,
    location: Option<String>,
) -> Result<Shipment, AppError> {
    actor.require_admin()?;

    let now = state.clock.now();
    let mut entry = state
        .shipments
        .get_mut(&shipment_id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id} not found")))?;

    let previous = entry.status.clone();
    if previous.is_terminal() && previous != new_status {
        warn!(
            shipment_id,
            from = %previous,
            to = %new_status,
            "moving shipment out of a terminal status"
        );
    }

    entry.status = new_status.clone();
    if new_status == ShipmentStatus::Delivered {
        if entry.actual_delivery.is_none() {
            entry.actual_delivery = Some(now);
        }
    } else {
        entry.actual_delivery = None;
    }
    entry.updated_at = now;

    let event = state.events.record(
        shipment_id,
        new_status.as_str(),
        &new_status.event_description(),
        optional_text(location),
        now,
    );

    if let Some(mut prediction) = state.predictions.get_mut(&shipment_id) {
        let newly_delivered = prediction.actual_delivery_date.is_none();
        prediction.actual_delivery_date = entry.actual_delivery;
        match score_prediction(prediction.value_mut()) {
            Some(score) if newly_delivered => {
                state.metrics.prediction_accuracy_score.observe(score);
            }
            Some(_) => {}
            None => prediction.accuracy_score = None,
        }
    }

    let shipment = entry.value().clone();
    drop(entry);

    publish(state, &event);
    state.notifications.enqueue(
        shipment.sender_id,
        shipment_notification(&shipment, new_status.as_str(), now),
    );
    state
        .metrics
        .status_transitions_total
        .with_label_values(&[new_status.metric_label()])
        .inc();

    info!(
        shipment_id,
        from = %previous,
        to = %new_status,
        "shipment status updated"
    );

    Ok(shipment)
}

pub fn track_by_number(
    state: &AppState,
    tracking_number: &str,
) -> Result<TrackedShipment, AppError> {
    let key = ShipmentKey::TrackingNumber(tracking_number.to_string());
    let shipment = get_shipment(state, &key)?;
    let tracking_events = state.events.list(shipment.id);

    Ok(TrackedShipment {
        shipment,
        tracking_events,
    })
}

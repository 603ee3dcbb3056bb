use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::Actor;
use crate::engine::events::{append_event, list_events};
use crate::engine::lifecycle::{
    create_shipment, ensure_can_view, get_shipment, set_status, track_by_number,
    visible_shipments, ShipmentKey,
};
use crate::error::AppError;
use crate::models::shipment::{NewShipment, Shipment, ShipmentStatus, TrackedShipment};
use crate::models::tracking::{NewTrackingEvent, TrackingEvent};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shipments", post(create).get(list))
        .route("/shipments/:key", get(track))
        .route("/shipments/:key/status", put(update_status))
        .route("/shipments/:key/events", get(events).post(add_event))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub location: Option<String>,
}

#[derive(Serialize)]
pub struct ShipmentList {
    pub shipments: Vec<Shipment>,
}

fn shipment_id(key: &str) -> Result<u64, AppError> {
    match ShipmentKey::parse(key) {
        ShipmentKey::Id(id) => Ok(id),
        ShipmentKey::TrackingNumber(_) => Err(AppError::validation(
            "id",
            format!("expected a numeric shipment id, got {key}"),
        )),
    }
}

async fn create(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<NewShipment>,
) -> Result<(StatusCode, Json<Shipment>), AppError> {
    let shipment = create_shipment(&state, actor.id, payload)?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

async fn list(State(state): State<Arc<AppState>>, actor: Actor) -> Json<ShipmentList> {
    Json(ShipmentList {
        shipments: visible_shipments(&state, &actor),
    })
}

/// Public lookup by tracking number.
async fn track(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<TrackedShipment>, AppError> {
    Ok(Json(track_by_number(&state, &key)?))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(key): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Shipment>, AppError> {
    let id = shipment_id(&key)?;
    let status = ShipmentStatus::parse(payload.status.as_deref().unwrap_or_default())?;
    let shipment = set_status(&state, id, status, &actor, payload.location)?;
    Ok(Json(shipment))
}

async fn events(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(key): Path<String>,
) -> Result<Json<Vec<TrackingEvent>>, AppError> {
    let id = shipment_id(&key)?;
    let shipment = get_shipment(&state, &ShipmentKey::Id(id))?;
    ensure_can_view(&actor, &shipment)?;
    Ok(Json(list_events(&state, id)?))
}

async fn add_event(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(key): Path<String>,
    Json(payload): Json<NewTrackingEvent>,
) -> Result<(StatusCode, Json<TrackingEvent>), AppError> {
    actor.require_admin()?;
    let id = shipment_id(&key)?;
    let event = append_event(&state, id, payload)?;
    Ok((StatusCode::CREATED, Json(event)))
}

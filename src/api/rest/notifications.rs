use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::Actor;
use crate::engine::lifecycle::{get_shipment, ShipmentKey};
use crate::error::AppError;
use crate::models::analytics::Attributes;
use crate::models::notification::{Notification, NotificationKind};
use crate::notify::shipment_notification;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/:id/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/send", post(send))
        .route("/notifications/shipment-updates", post(shipment_updates))
        .route("/notifications/test", post(send_test))
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub total_count: usize,
    pub unread_count: usize,
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub user_ids: Vec<u64>,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub metadata: Attributes,
}

#[derive(Deserialize)]
pub struct ShipmentUpdateRequest {
    pub shipment_id: u64,
    pub event_type: String,
}

#[derive(Serialize)]
pub struct Delivered {
    pub notifications_sent: usize,
}

async fn list(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Json<NotificationList> {
    let all = state.notifications.list(actor.id);
    let total_count = all.len();
    let unread_count = all.iter().filter(|n| !n.read).count();

    let notifications = all
        .into_iter()
        .filter(|n| !query.unread_only || !n.read)
        .take(query.limit.unwrap_or(DEFAULT_LIMIT))
        .collect();

    Json(NotificationList {
        notifications,
        total_count,
        unread_count,
    })
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.notifications.mark_read(actor.id, id, state.clock.now()) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("notification {id} not found")))
    }
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Json<serde_json::Value> {
    let updated = state.notifications.mark_all_read(actor.id, state.clock.now());
    Json(json!({ "updated": updated }))
}

async fn send(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<SendRequest>,
) -> Result<(StatusCode, Json<Delivered>), AppError> {
    actor.require_admin()?;
    if payload.title.trim().is_empty() {
        return Err(AppError::required("title"));
    }
    if payload.message.trim().is_empty() {
        return Err(AppError::required("message"));
    }
    if payload.user_ids.is_empty() {
        return Err(AppError::required("user_ids"));
    }

    let now = state.clock.now();
    for user_id in &payload.user_ids {
        state.notifications.enqueue(
            *user_id,
            Notification::new(
                *user_id,
                payload.title.trim(),
                payload.message.trim(),
                payload.kind,
                payload.metadata.clone(),
                now,
            ),
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(Delivered {
            notifications_sent: payload.user_ids.len(),
        }),
    ))
}

async fn shipment_updates(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<ShipmentUpdateRequest>,
) -> Result<(StatusCode, Json<Delivered>), AppError> {
    actor.require_admin()?;
    if payload.event_type.trim().is_empty() {
        return Err(AppError::required("event_type"));
    }

    let shipment = get_shipment(&state, &ShipmentKey::Id(payload.shipment_id))?;
    let notification =
        shipment_notification(&shipment, payload.event_type.trim(), state.clock.now());
    state.notifications.enqueue(shipment.sender_id, notification);

    Ok((
        StatusCode::CREATED,
        Json(Delivered {
            notifications_sent: 1,
        }),
    ))
}

async fn send_test(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> (StatusCode, Json<Notification>) {
    let mut metadata = Attributes::new();
    metadata.insert("test".into(), json!(true));

    let notification = Notification::new(
        actor.id,
        "Test Notification",
        "This is a test notification.",
        NotificationKind::Info,
        metadata,
        state.clock.now(),
    );
    state.notifications.enqueue(actor.id, notification.clone());

    (StatusCode::CREATED, Json(notification))
}

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::Actor;
use crate::engine::analytics::{
    create_model, create_prediction, create_route_optimization, get_prediction,
    list_models, list_performance_metrics, list_route_optimizations, record_performance_metric,
};
use crate::engine::lifecycle::{ensure_can_view, get_shipment, visible_shipments, ShipmentKey};
use crate::engine::reporting::{
    advanced_dashboard, dashboard, recent_window_start, AdvancedDashboard, DashboardSummary,
};
use crate::error::AppError;
use crate::models::analytics::{
    DeliveryPrediction, NewPerformanceMetric, NewPredictiveModel, NewRouteOptimization,
    PerformanceMetric, PredictiveModel, RouteOptimization,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/analytics/predictions/delivery/:shipment_id",
            post(predict_delivery).get(delivery_prediction),
        )
        .route(
            "/analytics/route-optimization",
            post(optimize_route).get(route_optimizations),
        )
        .route(
            "/analytics/performance-metrics",
            post(add_performance_metric).get(performance_metrics),
        )
        .route("/analytics/models", post(register_model).get(models))
        .route("/analytics/dashboard", get(dashboard_summary))
        .route("/analytics/advanced-dashboard", get(advanced_summary))
}

#[derive(Deserialize)]
pub struct MetricsQuery {
    pub category: Option<String>,
    pub days: Option<i64>,
}

async fn predict_delivery(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(shipment_id): Path<u64>,
) -> Result<(StatusCode, Json<DeliveryPrediction>), AppError> {
    let shipment = get_shipment(&state, &ShipmentKey::Id(shipment_id))?;
    ensure_can_view(&actor, &shipment)?;
    let prediction = create_prediction(&state, shipment_id)?;
    Ok((StatusCode::CREATED, Json(prediction)))
}

async fn delivery_prediction(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(shipment_id): Path<u64>,
) -> Result<Json<DeliveryPrediction>, AppError> {
    let shipment = get_shipment(&state, &ShipmentKey::Id(shipment_id))?;
    ensure_can_view(&actor, &shipment)?;
    Ok(Json(get_prediction(&state, shipment_id)?))
}

async fn optimize_route(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<NewRouteOptimization>,
) -> Result<(StatusCode, Json<RouteOptimization>), AppError> {
    actor.require_admin()?;
    let optimization = create_route_optimization(&state, payload)?;
    Ok((StatusCode::CREATED, Json(optimization)))
}

async fn route_optimizations(
    State(state): State<Arc<AppState>>,
    _actor: Actor,
) -> Json<Vec<RouteOptimization>> {
    Json(list_route_optimizations(&state))
}

async fn add_performance_metric(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<NewPerformanceMetric>,
) -> Result<(StatusCode, Json<PerformanceMetric>), AppError> {
    actor.require_admin()?;
    let metric = record_performance_metric(&state, payload)?;
    Ok((StatusCode::CREATED, Json(metric)))
}

async fn performance_metrics(
    State(state): State<Arc<AppState>>,
    _actor: Actor,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<Vec<PerformanceMetric>>, AppError> {
    let metrics = list_performance_metrics(&state, query.category.as_deref(), query.days)?;
    Ok(Json(metrics))
}

async fn register_model(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<NewPredictiveModel>,
) -> Result<(StatusCode, Json<PredictiveModel>), AppError> {
    actor.require_admin()?;
    let model = create_model(&state, payload)?;
    Ok((StatusCode::CREATED, Json(model)))
}

async fn models(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<PredictiveModel>>, AppError> {
    actor.require_admin()?;
    Ok(Json(list_models(&state)))
}

async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Json<DashboardSummary> {
    Json(dashboard(&visible_shipments(&state, &actor)))
}

#[derive(Serialize)]
pub struct AdvancedDashboardResponse {
    pub advanced_analytics: AdvancedDashboard,
}

async fn advanced_summary(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Json<AdvancedDashboardResponse> {
    let now = state.clock.now();
    let shipments = visible_shipments(&state, &actor);
    let predicted: HashSet<u64> = state.predictions.iter().map(|entry| *entry.key()).collect();
    let window_start = recent_window_start(now);
    let recent_optimizations = state
        .optimizations
        .iter()
        .filter(|entry| entry.created_at >= window_start)
        .count();

    Json(AdvancedDashboardResponse {
        advanced_analytics: advanced_dashboard(&shipments, &predicted, recent_optimizations, now),
    })
}

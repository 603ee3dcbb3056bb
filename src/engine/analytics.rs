use chrono::Duration;
use dashmap::mapref::entry::Entry;
use serde_json::json;
use tracing::info;

use crate::engine::accuracy::score_prediction;
use crate::engine::prediction::assemble_waypoints;
use crate::error::AppError;
use crate::models::analytics::{
    Attributes, DeliveryPrediction, ModelType, NewPerformanceMetric, NewPredictiveModel,
    NewRouteOptimization, PerformanceMetric, PredictiveModel, RouteOptimization,
};
use crate::state::AppState;

const DEFAULT_MODEL_NAME: &str = "Default Delivery Time Model";
const DEFAULT_MODEL_VERSION: &str = "1.0";
const DEFAULT_MODEL_ACCURACY: f64 = 0.85;
const DEFAULT_METRIC_WINDOW_DAYS: i64 = 30;

fn non_empty(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::required(field));
    }
    Ok(trimmed.to_string())
}

pub fn create_model(
    state: &AppState,
    request: NewPredictiveModel,
) -> Result<PredictiveModel, AppError> {
    let name = non_empty(&request.name, "name")?;
    let version = non_empty(&request.version, "version")?;
    if let Some(accuracy) = request.accuracy {
        if !(0.0..=1.0).contains(&accuracy) {
            return Err(AppError::validation("accuracy", "accuracy must be within [0, 1]"));
        }
    }

    let now = state.clock.now();
    let model = PredictiveModel {
        id: state.model_ids.next(),
        name,
        model_type: request.model_type,
        version,
        accuracy: request.accuracy,
        parameters: request.parameters,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.models.insert(model.id, model.clone());

    info!(model_id = model.id, name = %model.name, "predictive model registered");
    Ok(model)
}

pub fn list_models(state: &AppState) -> Vec<PredictiveModel> {
    let mut models: Vec<PredictiveModel> =
        state.models.iter().map(|entry| entry.value().clone()).collect();
    models.sort_by_key(|model| model.id);
    models
}

/// Lowest-id active delivery-time model, registering the default one when
/// none exists.
fn delivery_model_id(state: &AppState) -> Result<u64, AppError> {
    let existing = state
        .models
        .iter()
        .filter(|entry| entry.is_active && entry.model_type == ModelType::DeliveryTime)
        .map(|entry| entry.id)
        .min();
    if let Some(id) = existing {
        return Ok(id);
    }

    let mut parameters = Attributes::new();
    parameters.insert("algorithm".into(), json!("weighted_factors"));
    parameters.insert(
        "factors".into(),
        json!(["service_type", "weight", "distance", "weather", "traffic"]),
    );

    let model = create_model(
        state,
        NewPredictiveModel {
            name: DEFAULT_MODEL_NAME.to_string(),
            model_type: ModelType::DeliveryTime,
            version: DEFAULT_MODEL_VERSION.to_string(),
            accuracy: Some(DEFAULT_MODEL_ACCURACY),
            parameters,
        },
    )?;
    Ok(model.id)
}

/// Creates the single prediction allowed per shipment. The shipment stays
/// read-locked until the prediction is stored so a concurrent delivery
/// cannot slip between the snapshot and the insert.
pub fn create_prediction(
    state: &AppState,
    shipment_id: u64,
) -> Result<DeliveryPrediction, AppError> {
    let shipment = state
        .shipments
        .get(&shipment_id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id} not found")))?;

    let slot = match state.predictions.entry(shipment_id) {
        Entry::Occupied(_) => {
            state
                .metrics
                .predictions_total
                .with_label_values(&["duplicate"])
                .inc();
            return Err(AppError::Duplicate(format!(
                "prediction already exists for shipment {shipment_id}"
            )));
        }
        Entry::Vacant(slot) => slot,
    };

    let model_id = delivery_model_id(state)?;
    let now = state.clock.now();
    let outcome = state.predictor.predict(shipment.value(), now);

    let mut prediction = DeliveryPrediction {
        id: state.prediction_ids.next(),
        shipment_id,
        model_id,
        predicted_delivery_date: outcome.predicted_delivery_date,
        confidence_score: outcome.confidence_score,
        factors: outcome.factors,
        actual_delivery_date: shipment.actual_delivery,
        accuracy_score: None,
        created_at: now,
    };
    if let Some(score) = score_prediction(&mut prediction) {
        state.metrics.prediction_accuracy_score.observe(score);
    }

    slot.insert(prediction.clone());
    drop(shipment);

    state
        .metrics
        .predictions_total
        .with_label_values(&["created"])
        .inc();
    info!(
        shipment_id,
        prediction_id = prediction.id,
        predicted = %prediction.predicted_delivery_date,
        "delivery prediction created"
    );

    Ok(prediction)
}

pub fn get_prediction(state: &AppState, shipment_id: u64) -> Result<DeliveryPrediction, AppError> {
    state
        .predictions
        .get(&shipment_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| {
            AppError::NotFound(format!("no prediction found for shipment {shipment_id}"))
        })
}

pub fn create_route_optimization(
    state: &AppState,
    request: NewRouteOptimization,
) -> Result<RouteOptimization, AppError> {
    let name = non_empty(request.name.as_deref().unwrap_or_default(), "name")?;
    let origin_city = non_empty(request.origin_city.as_deref().unwrap_or_default(), "origin_city")?;
    let destination_city = non_empty(
        request.destination_city.as_deref().unwrap_or_default(),
        "destination_city",
    )?;

    let optimized_route = assemble_waypoints(&origin_city, &destination_city, &request.waypoints);
    let estimate = state.route_estimator.estimate(&optimized_route);

    let optimization = RouteOptimization {
        id: state.optimization_ids.next(),
        name,
        origin_city,
        destination_city,
        optimized_route,
        estimated_time_hours: estimate.estimated_time_hours,
        estimated_cost: estimate.estimated_cost,
        fuel_efficiency: request.fuel_efficiency,
        carbon_footprint: request.carbon_footprint,
        traffic_factor: request.traffic_factor.unwrap_or(1.0),
        weather_factor: request.weather_factor.unwrap_or(1.0),
        created_at: state.clock.now(),
    };
    state
        .optimizations
        .insert(optimization.id, optimization.clone());

    info!(
        optimization_id = optimization.id,
        waypoints = optimization.optimized_route.len(),
        "route optimization stored"
    );
    Ok(optimization)
}

/// Newest first.
pub fn list_route_optimizations(state: &AppState) -> Vec<RouteOptimization> {
    let mut optimizations: Vec<RouteOptimization> = state
        .optimizations
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    optimizations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    optimizations
}

pub fn record_performance_metric(
    state: &AppState,
    request: NewPerformanceMetric,
) -> Result<PerformanceMetric, AppError> {
    let metric_name = non_empty(&request.metric_name, "metric_name")?;
    let category = non_empty(&request.category, "category")?;
    if !request.metric_value.is_finite() {
        return Err(AppError::validation("metric_value", "metric_value must be a number"));
    }
    if request.period_start > request.period_end {
        return Err(AppError::validation(
            "period_end",
            "period_end must not be before period_start",
        ));
    }

    let metric = PerformanceMetric {
        id: state.metric_ids.next(),
        metric_name,
        metric_value: request.metric_value,
        metric_unit: request.metric_unit,
        category,
        period_start: request.period_start,
        period_end: request.period_end,
        additional_data: request.additional_data,
        created_at: state.clock.now(),
    };
    state
        .performance_metrics
        .insert(metric.id, metric.clone());

    Ok(metric)
}

/// Metrics whose period started within the last `days` (default 30),
/// optionally restricted to one category, newest first.
pub fn list_performance_metrics(
    state: &AppState,
    category: Option<&str>,
    days: Option<i64>,
) -> Result<Vec<PerformanceMetric>, AppError> {
    let days = days.unwrap_or(DEFAULT_METRIC_WINDOW_DAYS);
    if days < 0 {
        return Err(AppError::validation("days", "days must be >= 0"));
    }
    let since = Duration::try_days(days)
        .and_then(|window| state.clock.now().checked_sub_signed(window))
        .ok_or_else(|| AppError::validation("days", format!("days out of range: {days}")))?;

    let mut metrics: Vec<PerformanceMetric> = state
        .performance_metrics
        .iter()
        .filter(|entry| category.is_none_or(|category| entry.category == category))
        .filter(|entry| entry.period_start >= since)
        .map(|entry| entry.value().clone())
        .collect();
    metrics.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(metrics)
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open-ended key/value data attached to analytics records.
pub type Attributes = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    DeliveryTime,
    CostOptimization,
    RouteOptimization,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveModel {
    pub id: u64,
    pub name: String,
    pub model_type: ModelType,
    pub version: String,
    pub accuracy: Option<f64>,
    pub parameters: Attributes,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPredictiveModel {
    pub name: String,
    pub model_type: ModelType,
    pub version: String,
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub parameters: Attributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPrediction {
    pub id: u64,
    pub shipment_id: u64,
    pub model_id: u64,
    pub predicted_delivery_date: DateTime<Utc>,
    /// Simulated; carries no information about the shipment.
    pub confidence_score: f64,
    pub factors: Attributes,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub accuracy_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub order: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaypointInput {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOptimization {
    pub id: u64,
    pub name: String,
    pub origin_city: String,
    pub destination_city: String,
    pub optimized_route: Vec<Waypoint>,
    pub estimated_time_hours: f64,
    pub estimated_cost: f64,
    pub fuel_efficiency: Option<f64>,
    pub carbon_footprint: Option<f64>,
    pub traffic_factor: f64,
    pub weather_factor: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRouteOptimization {
    pub name: Option<String>,
    pub origin_city: Option<String>,
    pub destination_city: Option<String>,
    #[serde(default)]
    pub waypoints: Vec<WaypointInput>,
    pub fuel_efficiency: Option<f64>,
    pub carbon_footprint: Option<f64>,
    pub traffic_factor: Option<f64>,
    pub weather_factor: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub id: u64,
    pub metric_name: String,
    pub metric_value: f64,
    pub metric_unit: Option<String>,
    pub category: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub additional_data: Attributes,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPerformanceMetric {
    pub metric_name: String,
    pub metric_value: f64,
    pub metric_unit: Option<String>,
    pub category: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(default)]
    pub additional_data: Attributes,
}

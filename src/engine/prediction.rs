//! Heuristic stand-ins for delivery-time prediction and route estimation.
//!
//! Nothing here is a trained model. Predictions combine a service-tier
//! baseline with random weather/traffic multipliers, and the reported
//! confidence is drawn independently of every input.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::engine::random::RandomSource;
use crate::models::analytics::{Attributes, Waypoint, WaypointInput};
use crate::models::shipment::{ServiceType, Shipment};

const WEATHER_RANGE: (f64, f64) = (0.9, 1.1);
const TRAFFIC_RANGE: (f64, f64) = (0.95, 1.05);
const NOISE_RANGE: (f64, f64) = (-0.5, 0.5);
const CONFIDENCE_RANGE: (f64, f64) = (0.75, 0.95);
const MIN_DAYS: f64 = 1.0;

const ROUTE_HOURS_RANGE: (f64, f64) = (8.0, 48.0);
const ROUTE_COST_RANGE: (f64, f64) = (500.0, 2000.0);

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub predicted_delivery_date: DateTime<Utc>,
    pub confidence_score: f64,
    pub factors: Attributes,
}

pub trait DeliveryPredictor: Send + Sync {
    fn predict(&self, shipment: &Shipment, now: DateTime<Utc>) -> PredictionOutcome;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteEstimate {
    pub estimated_time_hours: f64,
    pub estimated_cost: f64,
}

pub trait RouteEstimator: Send + Sync {
    fn estimate(&self, waypoints: &[Waypoint]) -> RouteEstimate;
}

/// Baseline days plus a weight surcharge: over 50 kg adds two days, over
/// 10 kg adds one.
pub fn weighted_base_days(service_type: ServiceType, weight: f64) -> f64 {
    let surcharge = if weight > 50.0 {
        2
    } else if weight > 10.0 {
        1
    } else {
        0
    };
    (service_type.base_days() + surcharge) as f64
}

pub struct HeuristicDeliveryPredictor {
    random: Arc<dyn RandomSource>,
}

impl HeuristicDeliveryPredictor {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

impl DeliveryPredictor for HeuristicDeliveryPredictor {
    fn predict(&self, shipment: &Shipment, now: DateTime<Utc>) -> PredictionOutcome {
        let weather_factor = self.random.uniform(WEATHER_RANGE.0, WEATHER_RANGE.1);
        let traffic_factor = self.random.uniform(TRAFFIC_RANGE.0, TRAFFIC_RANGE.1);
        let noise = self.random.uniform(NOISE_RANGE.0, NOISE_RANGE.1);

        let base = weighted_base_days(shipment.service_type, shipment.weight);
        let days = (base * weather_factor * traffic_factor + noise).max(MIN_DAYS);

        let confidence_score = self.random.uniform(CONFIDENCE_RANGE.0, CONFIDENCE_RANGE.1);

        let mut factors = Attributes::new();
        factors.insert("service_type".into(), json!(shipment.service_type.as_str()));
        factors.insert("weight".into(), json!(shipment.weight));
        factors.insert("distance_factor".into(), json!(1.0));
        factors.insert("weather_factor".into(), json!(weather_factor));
        factors.insert("traffic_factor".into(), json!(traffic_factor));

        let offset = Duration::milliseconds((days * MILLIS_PER_DAY).round() as i64);

        PredictionOutcome {
            predicted_delivery_date: now + offset,
            confidence_score,
            factors,
        }
    }
}

/// Origin first, caller-supplied stops in order, destination last.
/// Missing coordinates default to 0 and unnamed stops get a positional name.
pub fn assemble_waypoints(
    origin_city: &str,
    destination_city: &str,
    intermediate: &[WaypointInput],
) -> Vec<Waypoint> {
    let mut waypoints = Vec::with_capacity(intermediate.len() + 2);
    waypoints.push(Waypoint {
        city: origin_city.to_string(),
        lat: 0.0,
        lng: 0.0,
        order: 0,
    });

    for (i, stop) in intermediate.iter().enumerate() {
        waypoints.push(Waypoint {
            city: stop
                .city
                .clone()
                .unwrap_or_else(|| format!("Waypoint {}", i + 1)),
            lat: stop.lat.unwrap_or(0.0),
            lng: stop.lng.unwrap_or(0.0),
            order: i + 1,
        });
    }

    waypoints.push(Waypoint {
        city: destination_city.to_string(),
        lat: 0.0,
        lng: 0.0,
        order: intermediate.len() + 1,
    });
    waypoints
}

pub struct HeuristicRouteEstimator {
    random: Arc<dyn RandomSource>,
}

impl HeuristicRouteEstimator {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

impl RouteEstimator for HeuristicRouteEstimator {
    fn estimate(&self, _waypoints: &[Waypoint]) -> RouteEstimate {
        RouteEstimate {
            estimated_time_hours: self.random.uniform(ROUTE_HOURS_RANGE.0, ROUTE_HOURS_RANGE.1),
            estimated_cost: self.random.uniform(ROUTE_COST_RANGE.0, ROUTE_COST_RANGE.1),
        }
    }
}

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::shipment::{Shipment, ShipmentStatus};

const RECENT_WINDOW_DAYS: i64 = 30;
const TOP_ROUTES: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub total_shipments: usize,
    pub pending_shipments: usize,
    pub in_transit_shipments: usize,
    pub delivered_shipments: usize,
    pub service_type_distribution: BTreeMap<String, usize>,
    pub destination_country_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryPerformance {
    pub on_time_percentage: f64,
    pub average_delay_days: f64,
    pub total_delivered: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FinancialMetrics {
    pub total_revenue: f64,
    pub average_cost_per_shipment: f64,
    pub shipments_with_cost: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteUsage {
    pub route: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictiveAnalytics {
    pub active_predictions: usize,
    pub recent_optimizations: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdvancedDashboard {
    pub total_shipments: usize,
    pub recent_shipments_30d: usize,
    pub delivery_performance: DeliveryPerformance,
    pub financial_metrics: FinancialMetrics,
    pub top_routes: Vec<RouteUsage>,
    pub predictive_analytics: PredictiveAnalytics,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn dashboard(shipments: &[Shipment]) -> DashboardSummary {
    let count = |status: ShipmentStatus| shipments.iter().filter(|s| s.status == status).count();

    let mut service_type_distribution = BTreeMap::new();
    let mut destination_country_distribution = BTreeMap::new();
    for shipment in shipments {
        *service_type_distribution
            .entry(shipment.service_type.as_str().to_string())
            .or_insert(0) += 1;
        *destination_country_distribution
            .entry(shipment.destination_country.clone())
            .or_insert(0) += 1;
    }

    DashboardSummary {
        total_shipments: shipments.len(),
        pending_shipments: count(ShipmentStatus::Pending),
        in_transit_shipments: count(ShipmentStatus::InTransit),
        delivered_shipments: count(ShipmentStatus::Delivered),
        service_type_distribution,
        destination_country_distribution,
    }
}

/// On time means delivered no later than the estimated calendar day.
/// Average delay is taken over late deliveries only.
pub fn delivery_performance(shipments: &[Shipment]) -> DeliveryPerformance {
    let mut total_delivered = 0usize;
    let mut on_time = 0usize;
    let mut total_delay_days = 0i64;

    for shipment in shipments {
        let Some(actual) = shipment.actual_delivery else {
            continue;
        };
        if shipment.status != ShipmentStatus::Delivered {
            continue;
        }
        total_delivered += 1;

        let delay = (actual.date_naive() - shipment.estimated_delivery.date_naive()).num_days();
        if delay <= 0 {
            on_time += 1;
        } else {
            total_delay_days += delay;
        }
    }

    let late = total_delivered - on_time;
    DeliveryPerformance {
        on_time_percentage: if total_delivered == 0 {
            0.0
        } else {
            round2(on_time as f64 / total_delivered as f64 * 100.0)
        },
        average_delay_days: if late == 0 {
            0.0
        } else {
            round2(total_delay_days as f64 / late as f64)
        },
        total_delivered,
    }
}

pub fn financial_metrics(shipments: &[Shipment]) -> FinancialMetrics {
    let costs: Vec<f64> = shipments.iter().filter_map(|s| s.cost).collect();
    let total: f64 = costs.iter().sum();

    FinancialMetrics {
        total_revenue: round2(total),
        average_cost_per_shipment: if costs.is_empty() {
            0.0
        } else {
            round2(total / costs.len() as f64)
        },
        shipments_with_cost: costs.len(),
    }
}

/// Most common origin → destination city pairs; ties break alphabetically.
pub fn top_routes(shipments: &[Shipment]) -> Vec<RouteUsage> {
    let mut usage: BTreeMap<String, usize> = BTreeMap::new();
    for shipment in shipments {
        let key = format!("{} → {}", shipment.origin_city, shipment.destination_city);
        *usage.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<RouteUsage> = usage
        .into_iter()
        .map(|(route, count)| RouteUsage { route, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.route.cmp(&b.route)));
    ranked.truncate(TOP_ROUTES);
    ranked
}

/// `predicted` holds the ids of shipments that have a prediction.
pub fn advanced_dashboard(
    shipments: &[Shipment],
    predicted: &HashSet<u64>,
    recent_optimizations: usize,
    now: DateTime<Utc>,
) -> AdvancedDashboard {
    let window_start = recent_window_start(now);

    let active_predictions = shipments
        .iter()
        .filter(|s| matches!(s.status, ShipmentStatus::Pending | ShipmentStatus::InTransit))
        .filter(|s| predicted.contains(&s.id))
        .count();

    AdvancedDashboard {
        total_shipments: shipments.len(),
        recent_shipments_30d: shipments
            .iter()
            .filter(|s| s.created_at >= window_start)
            .count(),
        delivery_performance: delivery_performance(shipments),
        financial_metrics: financial_metrics(shipments),
        top_routes: top_routes(shipments),
        predictive_analytics: PredictiveAnalytics {
            active_predictions,
            recent_optimizations,
        },
    }
}

pub fn recent_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RECENT_WINDOW_DAYS)
}

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::events::EventLog;
use crate::engine::prediction::{
    DeliveryPredictor, HeuristicDeliveryPredictor, HeuristicRouteEstimator, RouteEstimator,
};
use crate::engine::random::{RandomSource, ThreadRandom};
use crate::models::analytics::{
    DeliveryPrediction, PerformanceMetric, PredictiveModel, RouteOptimization,
};
use crate::models::route::Route;
use crate::models::shipment::Shipment;
use crate::models::tracking::TrackingEvent;
use crate::notify::{InMemoryNotifications, NotificationSink};
use crate::observability::metrics::Metrics;

/// Monotonic numeric id allocator, starting at 1.
#[derive(Debug, Default)]
pub struct IdSequence(AtomicU64);

impl IdSequence {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Everything nondeterministic or external that the engine depends on.
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
    pub predictor: Arc<dyn DeliveryPredictor>,
    pub route_estimator: Arc<dyn RouteEstimator>,
    pub notifications: Arc<dyn NotificationSink>,
}

impl Collaborators {
    pub fn system() -> Self {
        Self::with_sources(Arc::new(SystemClock), Arc::new(ThreadRandom))
    }

    /// Heuristic strategies and an in-memory inbox over the given sources.
    pub fn with_sources(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            clock,
            predictor: Arc::new(HeuristicDeliveryPredictor::new(random.clone())),
            route_estimator: Arc::new(HeuristicRouteEstimator::new(random.clone())),
            random,
            notifications: Arc::new(InMemoryNotifications::new()),
        }
    }
}

pub struct AppState {
    pub shipments: DashMap<u64, Shipment>,
    /// Tracking number to shipment id. Entries are claimed before the
    /// shipment is stored, which makes the number unique.
    pub tracking_numbers: DashMap<String, u64>,
    pub events: EventLog,
    /// Keyed by shipment id; at most one prediction per shipment.
    pub predictions: DashMap<u64, DeliveryPrediction>,
    pub models: DashMap<u64, PredictiveModel>,
    pub routes: DashMap<u64, Route>,
    pub optimizations: DashMap<u64, RouteOptimization>,
    pub performance_metrics: DashMap<u64, PerformanceMetric>,
    pub shipment_ids: IdSequence,
    pub prediction_ids: IdSequence,
    pub model_ids: IdSequence,
    pub route_ids: IdSequence,
    pub optimization_ids: IdSequence,
    pub metric_ids: IdSequence,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
    pub predictor: Arc<dyn DeliveryPredictor>,
    pub route_estimator: Arc<dyn RouteEstimator>,
    pub notifications: Arc<dyn NotificationSink>,
    pub tracking_events_tx: broadcast::Sender<TrackingEvent>,
    pub jwt_secret: String,
    pub tracking_number_attempts: usize,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config, collaborators: Collaborators) -> Self {
        let (tracking_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size.max(1));

        Self {
            shipments: DashMap::new(),
            tracking_numbers: DashMap::new(),
            events: EventLog::new(),
            predictions: DashMap::new(),
            models: DashMap::new(),
            routes: DashMap::new(),
            optimizations: DashMap::new(),
            performance_metrics: DashMap::new(),
            shipment_ids: IdSequence::default(),
            prediction_ids: IdSequence::default(),
            model_ids: IdSequence::default(),
            route_ids: IdSequence::default(),
            optimization_ids: IdSequence::default(),
            metric_ids: IdSequence::default(),
            clock: collaborators.clock,
            random: collaborators.random,
            predictor: collaborators.predictor,
            route_estimator: collaborators.route_estimator,
            notifications: collaborators.notifications,
            tracking_events_tx,
            jwt_secret: config.jwt_secret.clone(),
            tracking_number_attempts: config.tracking_number_attempts.max(1),
            metrics: Metrics::new(),
        }
    }
}

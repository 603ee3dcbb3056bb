use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub shipments_created_total: IntCounter,
    pub status_transitions_total: IntCounterVec,
    pub tracking_events_total: IntCounter,
    pub predictions_total: IntCounterVec,
    pub prediction_accuracy_score: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let shipments_created_total =
            IntCounter::new("shipments_created_total", "Total shipments created")
                .expect("valid shipments_created_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Shipment status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let tracking_events_total =
            IntCounter::new("tracking_events_total", "Total tracking events appended")
                .expect("valid tracking_events_total metric");

        let predictions_total = IntCounterVec::new(
            Opts::new("predictions_total", "Delivery prediction requests by outcome"),
            &["outcome"],
        )
        .expect("valid predictions_total metric");

        let prediction_accuracy_score = Histogram::with_opts(
            HistogramOpts::new(
                "prediction_accuracy_score",
                "Accuracy grade of delivery predictions once delivered",
            )
            .buckets(vec![0.2, 0.4, 0.6, 0.8, 1.0]),
        )
        .expect("valid prediction_accuracy_score metric");

        registry
            .register(Box::new(shipments_created_total.clone()))
            .expect("register shipments_created_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(tracking_events_total.clone()))
            .expect("register tracking_events_total");
        registry
            .register(Box::new(predictions_total.clone()))
            .expect("register predictions_total");
        registry
            .register(Box::new(prediction_accuracy_score.clone()))
            .expect("register prediction_accuracy_score");

        Self {
            registry,
            shipments_created_total,
            status_transitions_total,
            tracking_events_total,
            predictions_total,
            prediction_accuracy_score,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::{DateTime, Utc};

use crate::models::analytics::DeliveryPrediction;

/// Step grade for the calendar-day gap between predicted and actual delivery.
pub fn grade(diff_days: i64) -> f64 {
    match diff_days.abs() {
        0 => 1.0,
        1 => 0.8,
        2..=3 => 0.6,
        4..=7 => 0.4,
        _ => 0.2,
    }
}

/// Compares dates only; time of day is discarded.
pub fn accuracy_for(predicted: DateTime<Utc>, actual: DateTime<Utc>) -> f64 {
    let diff_days = (actual.date_naive() - predicted.date_naive()).num_days();
    grade(diff_days)
}

/// Recomputes `accuracy_score` from the prediction's own dates. Leaves the
/// score untouched and returns `None` when the actual date is unknown.
pub fn score_prediction(prediction: &mut DeliveryPrediction) -> Option<f64> {
    let actual = prediction.actual_delivery_date?;
    let score = accuracy_for(prediction.predicted_delivery_date, actual);
    prediction.accuracy_score = Some(score);
    Some(score)
}

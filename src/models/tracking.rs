use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingEvent {
    pub id: u64,
    pub shipment_id: u64,
    pub event_type: String,
    pub description: String,
    pub location: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Manual event posted by an operator. `timestamp` may be backdated.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrackingEvent {
    pub event_type: String,
    pub description: String,
    pub location: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

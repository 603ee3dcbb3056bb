use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Truck,
    Plane,
    Ship,
    Train,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: u64,
    pub name: String,
    pub origin_city: String,
    pub destination_city: String,
    pub distance_km: f64,
    pub estimated_duration_hours: f64,
    pub transport_mode: TransportMode,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    pub name: String,
    pub origin_city: String,
    pub destination_city: String,
    pub distance_km: f64,
    pub estimated_duration_hours: f64,
    pub transport_mode: TransportMode,
}

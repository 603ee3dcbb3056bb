use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::tracking::TrackingEvent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Standard,
    Express,
    Overnight,
}

impl ServiceType {
    /// Baseline transit time promised at creation.
    pub fn base_days(self) -> i64 {
        match self {
            ServiceType::Standard => 7,
            ServiceType::Express => 3,
            ServiceType::Overnight => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Standard => "standard",
            ServiceType::Express => "express",
            ServiceType::Overnight => "overnight",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "standard" => Some(ServiceType::Standard),
            "express" => Some(ServiceType::Express),
            "overnight" => Some(ServiceType::Overnight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Box,
    Envelope,
    Pallet,
}

impl PackageType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "box" => Some(PackageType::Box),
            "envelope" => Some(PackageType::Envelope),
            "pallet" => Some(PackageType::Pallet),
            _ => None,
        }
    }
}

/// Shipment status. Values outside the known set are kept verbatim in
/// `Other` so newer clients can round-trip them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    OutForDelivery,
    Delivered,
    Cancelled,
    Exception,
    Other(String),
}

impl ShipmentStatus {
    /// Parses a status received at the API boundary. Empty input is rejected,
    /// unknown values fall back to `Other`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::required("status"));
        }
        Ok(Self::from(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
            ShipmentStatus::Exception => "exception",
            ShipmentStatus::Other(raw) => raw,
        }
    }

    /// Bounded label for metrics; free-form statuses share `other`.
    pub fn metric_label(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
            ShipmentStatus::Exception => "exception",
            ShipmentStatus::Other(_) => "other",
        }
    }

    /// Delivered and cancelled shipments see no further movement by
    /// convention; transitions out of them are still accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    pub fn event_description(&self) -> String {
        match self {
            ShipmentStatus::Pending => "Shipment is pending pickup".to_string(),
            ShipmentStatus::InTransit => "Shipment is in transit".to_string(),
            ShipmentStatus::OutForDelivery => "Shipment is out for delivery".to_string(),
            ShipmentStatus::Delivered => "Shipment has been delivered".to_string(),
            ShipmentStatus::Cancelled => "Shipment has been cancelled".to_string(),
            other => format!("Status updated to {}", other.as_str()),
        }
    }
}

impl From<String> for ShipmentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => ShipmentStatus::Pending,
            "in_transit" => ShipmentStatus::InTransit,
            "out_for_delivery" => ShipmentStatus::OutForDelivery,
            "delivered" => ShipmentStatus::Delivered,
            "cancelled" => ShipmentStatus::Cancelled,
            "exception" => ShipmentStatus::Exception,
            _ => ShipmentStatus::Other(raw),
        }
    }
}

impl From<ShipmentStatus> for String {
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: u64,
    pub tracking_number: String,
    pub sender_id: u64,
    pub recipient_name: String,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    pub origin_address: String,
    pub destination_address: String,
    pub origin_city: String,
    pub destination_city: String,
    pub origin_country: String,
    pub destination_country: String,
    pub weight: f64,
    pub dimensions: Option<String>,
    pub package_type: PackageType,
    pub service_type: ServiceType,
    pub status: ShipmentStatus,
    pub estimated_delivery: DateTime<Utc>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cost: Option<f64>,
    pub currency: String,
}

/// Creation payload as received from clients. Every field is optional on
/// the wire so a missing value can be reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewShipment {
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    pub origin_address: Option<String>,
    pub destination_address: Option<String>,
    pub origin_city: Option<String>,
    pub destination_city: Option<String>,
    pub origin_country: Option<String>,
    pub destination_country: Option<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub package_type: Option<String>,
    pub service_type: Option<String>,
    pub cost: Option<f64>,
    pub currency: Option<String>,
}

/// Public tracking view: the shipment with its ordered event history.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedShipment {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub tracking_events: Vec<TrackingEvent>,
}

pub mod analytics;
pub mod notification;
pub mod route;
pub mod shipment;
pub mod tracking;

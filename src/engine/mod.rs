pub mod accuracy;
pub mod analytics;
pub mod catalog;
pub mod clock;
pub mod events;
pub mod lifecycle;
pub mod prediction;
pub mod random;
pub mod reporting;
pub mod tracking_number;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::json;
use uuid::Uuid;

use crate::models::analytics::Attributes;
use crate::models::notification::{Notification, NotificationKind};
use crate::models::shipment::Shipment;

/// Per-user notification inbox.
pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, user_id: u64, notification: Notification);

    /// Newest first.
    fn list(&self, user_id: u64) -> Vec<Notification>;

    /// Returns false when the notification does not exist for this user.
    fn mark_read(&self, user_id: u64, id: Uuid, at: DateTime<Utc>) -> bool;

    /// Returns how many notifications changed.
    fn mark_all_read(&self, user_id: u64, at: DateTime<Utc>) -> usize;
}

#[derive(Default)]
pub struct InMemoryNotifications {
    inboxes: DashMap<u64, Vec<Notification>>,
}

impl InMemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationSink for InMemoryNotifications {
    fn enqueue(&self, user_id: u64, notification: Notification) {
        self.inboxes.entry(user_id).or_default().push(notification);
    }

    fn list(&self, user_id: u64) -> Vec<Notification> {
        let mut notifications = self
            .inboxes
            .get(&user_id)
            .map(|inbox| inbox.value().clone())
            .unwrap_or_default();
        // stable sort keeps enqueue order among equal timestamps, reversed below
        notifications.sort_by_key(|n| n.created_at);
        notifications.reverse();
        notifications
    }

    fn mark_read(&self, user_id: u64, id: Uuid, at: DateTime<Utc>) -> bool {
        let Some(mut inbox) = self.inboxes.get_mut(&user_id) else {
            return false;
        };

        match inbox.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                if !notification.read {
                    notification.read = true;
                    notification.read_at = Some(at);
                }
                true
            }
            None => false,
        }
    }

    fn mark_all_read(&self, user_id: u64, at: DateTime<Utc>) -> usize {
        let Some(mut inbox) = self.inboxes.get_mut(&user_id) else {
            return 0;
        };

        let mut changed = 0;
        for notification in inbox.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            notification.read_at = Some(at);
            changed += 1;
        }
        changed
    }
}

/// Builds the sender-facing notification for a shipment milestone.
pub fn shipment_notification(
    shipment: &Shipment,
    event_type: &str,
    at: DateTime<Utc>,
) -> Notification {
    let number = &shipment.tracking_number;
    let (title, message, kind) = match event_type {
        "created" => (
            "Shipment Created",
            format!("Your shipment {number} was created successfully"),
            NotificationKind::Success,
        ),
        "in_transit" => (
            "Shipment In Transit",
            format!("Your shipment {number} is in transit"),
            NotificationKind::Info,
        ),
        "out_for_delivery" => (
            "Out for Delivery",
            format!("Your shipment {number} is out for delivery"),
            NotificationKind::Info,
        ),
        "delivered" => (
            "Shipment Delivered",
            format!("Your shipment {number} has been delivered"),
            NotificationKind::Success,
        ),
        "delayed" => (
            "Shipment Delayed",
            format!("Your shipment {number} is delayed"),
            NotificationKind::Warning,
        ),
        "cancelled" => (
            "Shipment Cancelled",
            format!("Your shipment {number} has been cancelled"),
            NotificationKind::Error,
        ),
        _ => (
            "Shipment Update",
            format!("There is an update on shipment {number}"),
            NotificationKind::Info,
        ),
    };

    let mut metadata = Attributes::new();
    metadata.insert("shipment_id".into(), json!(shipment.id));
    metadata.insert("tracking_number".into(), json!(number));
    metadata.insert("event_type".into(), json!(event_type));

    Notification::new(shipment.sender_id, title, message, kind, metadata, at)
}

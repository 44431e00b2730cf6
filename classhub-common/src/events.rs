//! In-process event bus
//!
//! Committed notifications are broadcast here so connected clients can be
//! told about them over SSE. Delivery is lossy by nature: a slow or absent
//! subscriber never blocks or fails the write that produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::db::NotificationType;

/// Events broadcast to SSE subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClassHubEvent {
    /// A notification row was committed
    NotificationCreated {
        notification_id: String,
        kind: NotificationType,
        message: String,
        /// Users the notification is addressed to
        recipients: Vec<String>,
        timestamp: DateTime<Utc>,
    },
}

impl ClassHubEvent {
    /// SSE event name
    pub fn event_type(&self) -> &str {
        match self {
            ClassHubEvent::NotificationCreated { .. } => "NotificationCreated",
        }
    }

    /// Whether `user_id` should see this event
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        match self {
            ClassHubEvent::NotificationCreated { recipients, .. } => {
                recipients.iter().any(|r| r == user_id)
            }
        }
    }
}

/// Broadcast channel shared across handlers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClassHubEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClassHubEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the case where nobody is listening
    pub fn emit_lossy(&self, event: ClassHubEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(recipients: &[&str]) -> ClassHubEvent {
        ClassHubEvent::NotificationCreated {
            notification_id: "n1".to_string(),
            kind: NotificationType::Attendance,
            message: "hello".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_visibility_follows_recipients() {
        let event = created(&["alice", "bob"]);
        assert!(event.is_visible_to("alice"));
        assert!(event.is_visible_to("bob"));
        assert!(!event.is_visible_to("mallory"));
        assert_eq!(event.event_type(), "NotificationCreated");
    }

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(created(&["alice"]));

        let event = rx.recv().await.unwrap();
        assert!(event.is_visible_to("alice"));
    }

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        bus.emit_lossy(created(&["alice"]));
        assert_eq!(bus.capacity(), 4);
    }
}

//! Event system for arm and drawing-session notifications
//!
//! Provides:
//! - Event types for connection, calibration and drawing progress
//! - Event dispatcher for publishing events to subscribers

use crate::data::CornerName;
use tokio::sync::broadcast;

/// Drawing and arm event types
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingEvent {
    /// Link opened on the given port
    Connected(String),
    /// Link closed
    Disconnected,
    /// Homing cycle acknowledged
    Homed,
    /// A calibration corner was stored
    CornerSaved(CornerName),
    /// Both corners were cleared
    CalibrationReset,
    /// One blocking step of a multi-step routine finished
    StepCompleted(String),
    /// A command of the running session was executed
    Progress {
        /// Commands executed so far.
        current: usize,
        /// Commands in the session.
        total: usize,
    },
    /// The drawing session completed
    SessionFinished,
    /// The drawing session stopped with an error
    SessionFailed(String),
}

impl std::fmt::Display for DrawingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawingEvent::Connected(port) => write!(f, "Connected to {}", port),
            DrawingEvent::Disconnected => write!(f, "Disconnected"),
            DrawingEvent::Homed => write!(f, "Homed"),
            DrawingEvent::CornerSaved(name) => write!(f, "Saved {}", name),
            DrawingEvent::CalibrationReset => write!(f, "Calibration reset"),
            DrawingEvent::StepCompleted(msg) => write!(f, "{}", msg),
            DrawingEvent::Progress { current, total } => {
                write!(f, "Progress {}/{}", current, total)
            }
            DrawingEvent::SessionFinished => write!(f, "Drawing finished"),
            DrawingEvent::SessionFailed(msg) => write!(f, "Drawing failed: {}", msg),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for drawing events.
    tx: broadcast::Sender<DrawingEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 256)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<DrawingEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of subscribers reached; having none is not an error.
    pub fn publish(&self, event: DrawingEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!("No subscribers for event: {}", event);
                0
            }
        }
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let dispatcher = EventDispatcher::default();
        assert_eq!(dispatcher.publish(DrawingEvent::Homed), 0);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let dispatcher = EventDispatcher::new(8);
        let mut rx = dispatcher.subscribe();
        assert_eq!(dispatcher.subscriber_count(), 1);

        dispatcher.publish(DrawingEvent::StepCompleted("Moved to corner 1".into()));
        dispatcher.publish(DrawingEvent::Progress {
            current: 1,
            total: 3,
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            DrawingEvent::StepCompleted("Moved to corner 1".into())
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            DrawingEvent::Progress {
                current: 1,
                total: 3
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(
            DrawingEvent::CornerSaved(CornerName::Corner2).to_string(),
            "Saved corner2"
        );
        assert_eq!(
            DrawingEvent::Progress {
                current: 4,
                total: 10
            }
            .to_string(),
            "Progress 4/10"
        );
    }
}

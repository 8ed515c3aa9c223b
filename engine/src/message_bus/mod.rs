//! Message Bus for feedback and actuation events
//!
//! The MessageBus provides a pub/sub pattern so the session, the executor
//! and any observers (console, speech, a transport layer, tests) stay
//! decoupled. Channels are bounded and publishing never blocks: when a
//! subscriber falls behind, events for that subscriber are dropped. The
//! executor must never stall on a slow observer while the actuator moves.

use crate::executor::ExecutionOutcome;
use crate::graph::NodeId;
use sdk::types::ControllerInput;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};

/// Channel buffer size for bounded channels
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Event types that can be published on the message bus
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum EventType {
    /// User-facing response or error report
    Feedback,
    /// Text spoken by a `Say` node
    Speech,
    /// One actuator frame written by the executor
    Frame,
    /// Thumbstick axes returned to neutral after a motion
    AxesReleased,
    /// Traversal has started
    ExecutionStarted,
    /// Traversal has ended
    ExecutionFinished,
    /// Subscribe to all event types
    All,
}

/// Events that can be published on the message bus
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Feedback {
        text: String,
    },
    Speech {
        node_id: NodeId,
        text: String,
    },
    Frame {
        node_id: NodeId,
        input: ControllerInput,
    },
    AxesReleased {
        node_id: NodeId,
    },
    ExecutionStarted {
        entry: NodeId,
    },
    ExecutionFinished {
        steps: usize,
        outcome: ExecutionOutcome,
    },
}

impl Event {
    /// Get the event type for this event
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Feedback { .. } => EventType::Feedback,
            Event::Speech { .. } => EventType::Speech,
            Event::Frame { .. } => EventType::Frame,
            Event::AxesReleased { .. } => EventType::AxesReleased,
            Event::ExecutionStarted { .. } => EventType::ExecutionStarted,
            Event::ExecutionFinished { .. } => EventType::ExecutionFinished,
        }
    }
}

/// Message bus for pub/sub communication between components
pub struct MessageBus {
    /// Map of event types to lists of subscribers
    /// Each subscriber gets a bounded channel with CHANNEL_BUFFER_SIZE capacity
    channels: Mutex<HashMap<EventType, Vec<mpsc::Sender<Event>>>>,
}

impl MessageBus {
    /// Create a new MessageBus
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a specific event type, or `EventType::All`
    pub fn subscribe(&self, event_type: EventType) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut channels = self.channels.lock().expect("MessageBus lock poisoned");
        channels.entry(event_type).or_default().push(tx);
        rx
    }

    /// Publish an event to all subscribers
    ///
    /// The event goes to subscribers of its type and to `All` subscribers.
    /// Closed subscribers are pruned; full ones miss the event.
    pub fn publish(&self, event: Event) {
        let mut channels = self.channels.lock().expect("MessageBus lock poisoned");
        let event_type = event.event_type();

        for key in [event_type, EventType::All] {
            if let Some(subscribers) = channels.get_mut(&key) {
                subscribers.retain(|tx| match tx.try_send(event.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        trace!(?event_type, "Subscriber lagging, event dropped");
                        true
                    }
                    Err(TrySendError::Closed(_)) => false,
                });
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Log every non-feedback event on the bus through `tracing`
///
/// Frames go out at `trace`, the rest at `debug`. The task ends when the
/// bus is dropped and returns how many events it logged.
pub fn spawn_event_logger(bus: &MessageBus) -> tokio::task::JoinHandle<usize> {
    let mut rx = bus.subscribe(EventType::All);
    tokio::spawn(async move {
        let mut logged = 0;
        while let Some(event) = rx.recv().await {
            match &event {
                // Feedback sinks report these themselves
                Event::Feedback { .. } => continue,
                Event::Frame { node_id, input } => trace!(
                    node_id = %node_id,
                    left_x = input.left_thumbstick_x,
                    left_y = input.left_thumbstick_y,
                    right_x = input.right_thumbstick_x,
                    right_y = input.right_thumbstick_y,
                    y = input.y,
                    "Frame"
                ),
                Event::Speech { node_id, text } => {
                    debug!(node_id = %node_id, text = %text, "Speech")
                }
                Event::AxesReleased { node_id } => debug!(node_id = %node_id, "Axes released"),
                Event::ExecutionStarted { entry } => debug!(entry = %entry, "Execution started"),
                Event::ExecutionFinished { steps, outcome } => {
                    debug!(steps, outcome = ?outcome, "Execution finished")
                }
            }
            logged += 1;
        }
        logged
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_and_publish() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe(EventType::Feedback);

        bus.publish(Event::Feedback {
            text: "What should I do next?".to_string(),
        });

        let received = rx.recv().await.unwrap();
        assert_eq!(
            received,
            Event::Feedback {
                text: "What should I do next?".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_all_event_type() {
        let bus = MessageBus::new();
        let mut rx_all = bus.subscribe(EventType::All);
        let mut rx_specific = bus.subscribe(EventType::Speech);

        let event = Event::Speech {
            node_id: NodeId::from_index(3),
            text: "hello".to_string(),
        };
        bus.publish(event.clone());

        assert_eq!(rx_all.recv().await.unwrap(), event);
        assert_eq!(rx_specific.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_different_event_types() {
        let bus = MessageBus::new();
        let mut rx_frames = bus.subscribe(EventType::Frame);
        let mut rx_feedback = bus.subscribe(EventType::Feedback);

        bus.publish(Event::AxesReleased {
            node_id: NodeId::from_index(1),
        });
        bus.publish(Event::Feedback {
            text: "done".to_string(),
        });

        assert!(rx_frames.try_recv().is_err());
        assert!(matches!(
            rx_feedback.try_recv(),
            Ok(Event::Feedback { .. })
        ));
    }

    #[test]
    fn test_publish_never_blocks_on_full_channel() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe(EventType::Feedback);

        for i in 0..CHANNEL_BUFFER_SIZE + 10 {
            bus.publish(Event::Feedback {
                text: format!("message {}", i),
            });
        }

        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, CHANNEL_BUFFER_SIZE);
    }

    #[test]
    fn test_closed_subscribers_are_pruned() {
        let bus = MessageBus::new();
        let rx = bus.subscribe(EventType::Feedback);

        drop(rx);
        bus.publish(Event::Feedback {
            text: "anyone?".to_string(),
        });

        let channels = bus.channels.lock().unwrap();
        assert!(channels[&EventType::Feedback].is_empty());
    }

    #[tokio::test]
    async fn test_event_logger_skips_feedback() {
        let bus = MessageBus::new();
        let logger = spawn_event_logger(&bus);

        bus.publish(Event::Feedback {
            text: "Starting execution".to_string(),
        });
        bus.publish(Event::ExecutionStarted {
            entry: NodeId::from_index(1),
        });
        bus.publish(Event::AxesReleased {
            node_id: NodeId::from_index(1),
        });
        drop(bus);

        assert_eq!(logger.await.unwrap(), 2);
    }
}

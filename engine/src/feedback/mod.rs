//! User feedback
//!
//! Every response, error report and `Say` node ends up here. Delivery is
//! fire-and-forget: a sink must return immediately and never fail the
//! caller.

use crate::message_bus::{Event, MessageBus};
use std::sync::Arc;
use tracing::{info, warn};

/// Destination for user-facing messages
pub trait FeedbackSink: Send + Sync {
    fn notify(&self, text: &str);
}

/// Prints to stdout and optionally speaks through an external command
///
/// The speech command is split on whitespace and the message is passed as
/// its final argument, e.g. `say -v Junior` runs `say -v Junior "<text>"`.
#[derive(Debug, Clone, Default)]
pub struct ConsoleFeedback {
    speech_command: Option<Vec<String>>,
}

impl ConsoleFeedback {
    pub fn new(speech_command: Option<&str>) -> Self {
        let speech_command = speech_command
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());
        Self { speech_command }
    }

    fn speak(&self, text: &str) {
        let Some(parts) = &self.speech_command else {
            return;
        };
        // Needs a runtime to reap the child; without one, stay silent
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let mut command = tokio::process::Command::new(&parts[0]);
        command.args(&parts[1..]).arg(text);

        match command.spawn() {
            Ok(mut child) => {
                handle.spawn(async move {
                    if let Err(e) = child.wait().await {
                        warn!("Speech command failed: {}", e);
                    }
                });
            }
            Err(e) => warn!("Failed to start speech command {:?}: {}", parts[0], e),
        }
    }
}

impl FeedbackSink for ConsoleFeedback {
    fn notify(&self, text: &str) {
        info!(feedback = text, "Feedback");
        println!("{}", text);
        self.speak(text);
    }
}

/// Publishes every message as an `Event::Feedback` on the bus
#[derive(Clone)]
pub struct BusFeedback {
    bus: Arc<MessageBus>,
}

impl BusFeedback {
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self { bus }
    }
}

impl FeedbackSink for BusFeedback {
    fn notify(&self, text: &str) {
        self.bus.publish(Event::Feedback {
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_bus::EventType;

    #[test]
    fn test_speech_command_parsing() {
        let feedback = ConsoleFeedback::new(Some("say -v Junior"));
        assert_eq!(
            feedback.speech_command,
            Some(vec!["say".to_string(), "-v".to_string(), "Junior".to_string()])
        );
        assert_eq!(ConsoleFeedback::new(Some("   ")).speech_command, None);
        assert_eq!(ConsoleFeedback::new(None).speech_command, None);
    }

    #[test]
    fn test_bus_feedback_publishes() {
        let bus = Arc::new(MessageBus::new());
        let mut rx = bus.subscribe(EventType::Feedback);
        let sink = BusFeedback::new(Arc::clone(&bus));

        sink.notify("Ok. Waiting for next instruction.");

        assert_eq!(
            rx.try_recv().unwrap(),
            Event::Feedback {
                text: "Ok. Waiting for next instruction.".to_string()
            }
        );
    }
}

//! Actuation Codec
//!
//! Translates a motion node into timed controller frames. The gripper is a
//! single button press. A directional motion is discretized into
//! `round(travel / velocity)` frames, one per frame interval, each pushing
//! the sticks to `sign(axis) * scale * velocity`; the axes return to neutral
//! afterwards. Timing is deliberately coarse.

use crate::controller::{CancelToken, ControllerHandle};
use crate::graph::NodeId;
use crate::message_bus::{Event, MessageBus};
use sdk::errors::EngineError;
use sdk::types::{ControllerInput, MotionAction, MotionParams};
use std::time::Duration;
use tracing::{trace, warn};

/// Stick magnitude per unit of velocity
pub const DEFAULT_SCALE: f64 = 10000.0;

/// Thumbstick deflection held for every frame of a drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StickFrame {
    pub left_x: i32,
    pub left_y: i32,
    pub right_x: i32,
    pub right_y: i32,
}

impl StickFrame {
    fn apply(&self, input: &mut ControllerInput) {
        input.left_thumbstick_x = self.left_x;
        input.left_thumbstick_y = self.left_y;
        input.right_thumbstick_x = self.right_x;
        input.right_thumbstick_y = self.right_y;
    }
}

/// Controller output for one motion node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    /// Press the gripper button once
    Gripper,
    /// Hold `frame` for `steps` frame intervals, then release the sticks
    Drive { steps: u64, frame: StickFrame },
}

/// Sign with `0` for zero, unlike `f64::signum`
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct ActuationCodec {
    scale: f64,
    frame_interval: Duration,
}

impl ActuationCodec {
    pub fn new(scale: f64, frame_interval: Duration) -> Self {
        Self {
            scale,
            frame_interval,
        }
    }

    /// Work out the frames for a motion without touching the controller
    ///
    /// A non-positive or non-finite velocity yields no frames.
    pub fn encode(&self, action: MotionAction, params: &MotionParams) -> Actuation {
        if action == MotionAction::Gripper {
            return Actuation::Gripper;
        }

        let velocity = params.velocity;
        if !(velocity.is_finite() && velocity > 0.0) {
            warn!(velocity, "Motion with unusable velocity, skipping");
            return Actuation::Drive {
                steps: 0,
                frame: StickFrame::default(),
            };
        }

        let steps = (params.travel() / velocity).round() as u64;
        let magnitude = self.scale * velocity;
        // `as` saturates at the i32 bounds
        let frame = StickFrame {
            left_x: (sign(params.dx) * magnitude) as i32,
            left_y: (sign(params.dy) * magnitude) as i32,
            right_x: 0,
            right_y: (sign(params.dz) * magnitude) as i32,
        };

        Actuation::Drive { steps, frame }
    }

    /// Write the frames for `actuation` to the controller
    ///
    /// Returns the number of frames written. On cancellation the sticks are
    /// left in their last-set state and `EngineError::Cancelled` is returned.
    pub async fn perform(
        &self,
        node_id: NodeId,
        actuation: Actuation,
        controller: &ControllerHandle,
        bus: &MessageBus,
        cancel: &CancelToken,
    ) -> Result<usize, EngineError> {
        match actuation {
            Actuation::Gripper => {
                let input = controller.update(|input| input.y = 1);
                bus.publish(Event::Frame { node_id, input });
                Ok(1)
            }
            Actuation::Drive { steps, frame } => {
                let mut written = 0;
                for step in 0..steps {
                    if cancel.is_cancelled() {
                        return Err(EngineError::Cancelled);
                    }

                    let input = controller.update(|input| frame.apply(input));
                    bus.publish(Event::Frame { node_id, input });
                    written += 1;
                    trace!(node_id = %node_id, step = step + 1, steps, "Frame written");

                    if self.frame_interval.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::select! {
                            _ = tokio::time::sleep(self.frame_interval) => {}
                            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                        }
                    }
                }

                controller.update(|input| input.zero_axes());
                bus.publish(Event::AxesReleased { node_id });
                Ok(written)
            }
        }
    }
}

impl Default for ActuationCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE, Duration::from_secs(1))
    }
}

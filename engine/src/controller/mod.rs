//! Controller boundary
//!
//! State shared between the executor and whatever transport exposes the
//! robot to the outside world:
//!
//! - the controller snapshot, written by the executor and polled by the
//!   actuator side, whose buttons are cleared by every read
//! - the two landmark flags, written by the sensor side and read by the
//!   executor between nodes and inside `DoUntil` spins
//! - the cancellation token that interrupts a running traversal
//!
//! Every field has one writer. Flags are atomics; the snapshot sits behind a
//! mutex so a read-and-clear is a single step.

use sdk::types::ControllerInput;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Landmark flags reported by the sensor side
#[derive(Debug, Default)]
pub struct SensorFlags {
    face_landmark: AtomicBool,
    near_landmark: AtomicBool,
}

impl SensorFlags {
    pub fn face_landmark(&self) -> bool {
        self.face_landmark.load(Ordering::Acquire)
    }

    pub fn near_landmark(&self) -> bool {
        self.near_landmark.load(Ordering::Acquire)
    }

    pub fn set(&self, face_landmark: bool, near_landmark: bool) {
        self.face_landmark.store(face_landmark, Ordering::Release);
        self.near_landmark.store(near_landmark, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct ControllerShared {
    input: Mutex<ControllerInput>,
    sensors: SensorFlags,
}

/// Handle to the controller snapshot and sensor flags
///
/// Clones share the same state. This is the object a transport layer hands
/// to remote callers.
#[derive(Debug, Clone, Default)]
pub struct ControllerHandle {
    shared: Arc<ControllerShared>,
}

impl ControllerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the controller snapshot
    ///
    /// Returns the state as last written, then clears `A`, `B`, `X` and `Y`
    /// so each button press is observed exactly once. Thumbstick axes are
    /// left as they are.
    pub fn controller_input(&self) -> ControllerInput {
        let mut input = self.shared.input.lock().expect("Controller lock poisoned");
        let snapshot = *input;
        input.clear_buttons();
        snapshot
    }

    /// Current snapshot without the read-clears side effect
    pub fn peek(&self) -> ControllerInput {
        *self.shared.input.lock().expect("Controller lock poisoned")
    }

    /// Apply a change to the snapshot and return the resulting state
    pub fn update<F>(&self, change: F) -> ControllerInput
    where
        F: FnOnce(&mut ControllerInput),
    {
        let mut input = self.shared.input.lock().expect("Controller lock poisoned");
        change(&mut input);
        trace!(?input, "Controller updated");
        *input
    }

    /// Sensor report: a signal above zero raises the corresponding flag
    pub fn report_landmarks(&self, face_signal: f64, near_signal: f64) {
        let face = face_signal > 0.0;
        let near = near_signal > 0.0;
        self.shared.sensors.set(face, near);
        debug!(face_landmark = face, near_landmark = near, "Landmarks reported");
    }

    pub fn sensors(&self) -> &SensorFlags {
        &self.shared.sensors
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation for a running traversal
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Re-arm the token before a new traversal
    pub fn reset(&self) {
        self.state.cancelled.store(false, Ordering::Release);
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel is not missed
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_read_clears_buttons() {
        let controller = ControllerHandle::new();
        controller.update(|input| {
            input.y = 1;
            input.left_thumbstick_x = 10000;
        });

        let first = controller.controller_input();
        assert_eq!(first.y, 1);
        assert_eq!(first.left_thumbstick_x, 10000);

        let second = controller.controller_input();
        assert_eq!((second.a, second.b, second.x, second.y), (0, 0, 0, 0));
        assert_eq!(second.left_thumbstick_x, 10000);
    }

    #[test]
    fn test_peek_does_not_clear() {
        let controller = ControllerHandle::new();
        controller.update(|input| input.b = 1);
        assert_eq!(controller.peek().b, 1);
        assert_eq!(controller.peek().b, 1);
    }

    #[test]
    fn test_landmark_thresholds() {
        let controller = ControllerHandle::new();
        controller.report_landmarks(0.5, 0.0);
        assert!(controller.sensors().face_landmark());
        assert!(!controller.sensors().near_landmark());

        controller.report_landmarks(-1.0, 2.0);
        assert!(!controller.sensors().face_landmark());
        assert!(controller.sensors().near_landmark());
    }

    #[test]
    fn test_clones_share_state() {
        let controller = ControllerHandle::new();
        let remote = controller.clone();
        remote.report_landmarks(1.0, 1.0);
        assert!(controller.sensors().near_landmark());
    }

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter was not woken")
            .unwrap();
        assert!(token.is_cancelled());

        token.reset();
        assert!(!token.is_cancelled());
    }
}

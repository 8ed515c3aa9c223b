//! Bow SDK
//!
//! Shared vocabulary and error types for the Bow instruction engine.
//! This crate is used by the engine and by anything that talks to it
//! across a transport boundary (controller snapshots, saved plans).

/// Error types and handling
pub mod errors;

/// Action vocabulary and actuator snapshot types
pub mod types;

// Re-export commonly used types
pub use errors::{BowErrorExt, EngineError};
pub use types::{ActionKind, Axis, ControllerInput, MotionAction, MotionParams, SenseCondition};

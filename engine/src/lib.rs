//! Bow Engine Library
//!
//! This library provides the core functionality of the Bow instruction
//! interface. It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

/// Instruction classification and parameter extraction
pub mod compiler;

/// Instruction graph arena and builder
pub mod graph;

/// Saved plan snapshots and plan stores
pub mod store;

/// Controller snapshot, sensor flags and cancellation
pub mod controller;

/// Message bus for inter-component communication
pub mod message_bus;

/// User feedback sinks
pub mod feedback;

/// Graph traversal and actuation
pub mod executor;

/// Line-by-line instruction session
pub mod session;

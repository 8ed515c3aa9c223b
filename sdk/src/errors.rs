//! Error types and handling
//!
//! This module provides the error types used throughout the Bow engine.
//! All errors implement the `BowErrorExt` trait which provides a speakable
//! hint and indicates whether the session can carry on after the error.
//!
//! # Recovery Policy
//!
//! Instruction-level errors never end a session. They are reported to the
//! feedback sink, the offending instruction is discarded, and the graph is
//! left exactly as it was before the instruction arrived.

use thiserror::Error;

/// Trait for Bow error extensions
///
/// This trait provides additional context for errors, including a hint that
/// can be read aloud to the user and recoverability information.
pub trait BowErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is a short sentence suitable for speech output. It never
    /// contains file paths or raw parser state.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors abort the current instruction only. Non-recoverable
    /// errors abort startup (bad configuration, unusable data directory).
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Instruction**: text that cannot be turned into a graph node
/// - **Structure**: block closes with nothing open
/// - **Persistence**: saved plans that are missing, unreadable or malformed
/// - **Execution**: nothing recorded, or traversal interrupted
/// - **Configuration**: invalid or unreadable config.toml
///
/// A traversal that reaches a missing branch is not an error; the executor
/// treats it as the natural end of the program.
///
/// # Examples
///
/// ```
/// use sdk::errors::{BowErrorExt, EngineError};
///
/// let error = EngineError::UnbalancedBlock;
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Config("bad log level".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Instruction errors
    #[error("Malformed instruction: {0}")]
    MalformedInstruction(String),

    // Structure errors
    #[error("Block end without a matching open block")]
    UnbalancedBlock,

    // Persistence errors
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    // Execution errors
    #[error("Nothing to execute: the instruction graph is empty")]
    EmptyGraph,

    #[error("Execution cancelled")]
    Cancelled,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BowErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::MalformedInstruction(_) => {
                "I did not understand that instruction. Please give a direction and a distance"
            }
            Self::UnbalancedBlock => "There is no open loop or condition to end",
            Self::PersistenceFailure(_) => "I could not save or load that plan",
            Self::EmptyGraph => "There are no instructions to execute yet",
            Self::Cancelled => "Execution was interrupted",
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Io(_))
    }
}

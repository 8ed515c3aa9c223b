//! Instruction Compiler
//!
//! Turns free-text instruction lines into graph operations: the classifier
//! picks a command by keyword precedence, the parameter extractor derives a
//! motion vector from the numbers in the line.

pub mod classifier;
pub mod params;

pub use classifier::{classify, Instruction};
pub use params::extract_params;

//! Parameter Extractor
//!
//! Derives the `(dx, dy, dz, velocity)` vector of a motion instruction from
//! the numeric literals in its text, read left to right. The first literal
//! is the distance along the action's axis. When the text mentions
//! `velocity`, the second literal replaces the default velocity of 1.

use regex::Regex;
use sdk::errors::EngineError;
use sdk::types::{MotionAction, MotionParams};
use std::sync::OnceLock;

/// Optionally signed integer or decimal literal
static NUMBER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn number_pattern() -> &'static Regex {
    NUMBER_PATTERN
        .get_or_init(|| Regex::new(r"[-+]?\d+\.?\d*").expect("Invalid number pattern"))
}

/// Every numeric literal in `text`, left to right
pub fn numeric_literals(text: &str) -> Vec<f64> {
    number_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Extract motion parameters for `action` from its instruction text
///
/// The gripper takes no numbers and always gets the default vector.
///
/// # Errors
///
/// `MalformedInstruction` when a directional motion has no distance, or when
/// `velocity` is mentioned without a second literal.
pub fn extract_params(action: MotionAction, text: &str) -> Result<MotionParams, EngineError> {
    let mut params = MotionParams::default();

    let Some((axis, sign)) = action.axis() else {
        return Ok(params);
    };

    let values = numeric_literals(text);
    let distance = values.first().copied().ok_or_else(|| {
        EngineError::MalformedInstruction(format!("'{}' needs a distance for {}", text, action))
    })?;
    params = params.with_axis(axis, sign * distance);

    if text.contains("velocity") {
        params.velocity = values.get(1).copied().ok_or_else(|| {
            EngineError::MalformedInstruction(format!("'{}' mentions velocity without a value", text))
        })?;
    }

    Ok(params)
}

//! Action vocabulary and actuator snapshot types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a node in the instruction graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Entry sentinel; never produced by an instruction
    Root,
    /// Perform a motion once
    Do,
    /// Repeat a motion until the near-landmark flag is raised
    DoUntil,
    /// Loop header tested before the body
    While,
    /// Loop header tested after the body
    DoWhile,
    /// Conditional header with a synthesized merge point
    If,
    /// Speak a text payload
    Say,
}

impl ActionKind {
    /// Stable name used in logs, feedback and renderings
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Do => "Do",
            Self::DoUntil => "DoUntil",
            Self::While => "While",
            Self::DoWhile => "DoWhile",
            Self::If => "If",
            Self::Say => "Say",
        }
    }

    /// Whether this kind carries a motion primitive
    pub fn is_motion(&self) -> bool {
        matches!(self, Self::Do | Self::DoUntil)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spatial axis a directional motion moves along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Motion primitive understood by the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionAction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    Gripper,
}

impl MotionAction {
    /// Keywords tested against motion text, first match wins.
    pub const KEYWORDS: [(&'static str, MotionAction); 7] = [
        ("forward", MotionAction::Forward),
        ("backward", MotionAction::Backward),
        ("right", MotionAction::Right),
        ("left", MotionAction::Left),
        ("up", MotionAction::Up),
        ("down", MotionAction::Down),
        ("gripper", MotionAction::Gripper),
    ];

    /// Infer the motion primitive named in a line of text
    ///
    /// Matching is case-sensitive substring containment, so "pick up" is `Up`
    /// and "move forward" wins over any later keyword in the same line.
    pub fn from_text(text: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map(|(_, action)| *action)
    }

    /// Axis and sign a directional motion drives, `None` for the gripper
    pub fn axis(&self) -> Option<(Axis, f64)> {
        match self {
            Self::Right => Some((Axis::X, 1.0)),
            Self::Left => Some((Axis::X, -1.0)),
            Self::Forward => Some((Axis::Y, 1.0)),
            Self::Backward => Some((Axis::Y, -1.0)),
            Self::Up => Some((Axis::Z, 1.0)),
            Self::Down => Some((Axis::Z, -1.0)),
            Self::Gripper => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "Forward",
            Self::Backward => "Backward",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Gripper => "Gripper",
        }
    }
}

impl fmt::Display for MotionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Motion vector `(dx, dy, dz, velocity)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub velocity: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            velocity: 1.0,
        }
    }
}

impl MotionParams {
    pub fn new(dx: f64, dy: f64, dz: f64, velocity: f64) -> Self {
        Self {
            dx,
            dy,
            dz,
            velocity,
        }
    }

    /// Set one axis component, leaving the others untouched
    pub fn with_axis(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => self.dx = value,
            Axis::Y => self.dy = value,
            Axis::Z => self.dz = value,
        }
        self
    }

    /// Total distance covered, summed over the three axes
    pub fn travel(&self) -> f64 {
        self.dx.abs() + self.dy.abs() + self.dz.abs()
    }
}

impl fmt::Display for MotionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.dx, self.dy, self.dz, self.velocity
        )
    }
}

/// Sensing condition attached to loop, conditional and until nodes
///
/// Condition linking is not implemented yet: every condition is `Unlinked`
/// and evaluates to `false`. The executor does not consult it at all and
/// branches on the landmark flags instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SenseCondition {
    #[default]
    Unlinked,
}

impl SenseCondition {
    /// Link the condition described by an instruction line
    pub fn link(_instruction: &str) -> Self {
        Self::Unlinked
    }

    pub fn evaluate(&self) -> bool {
        match self {
            Self::Unlinked => false,
        }
    }
}

/// Xbox-style controller snapshot exposed to the actuator side
///
/// `a`, `b`, `x` and `y` are edge-triggered buttons: the reader clears them.
/// The four thumbstick axes are levels and persist until the executor
/// writes them again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerInput {
    #[serde(rename = "A")]
    pub a: i32,
    #[serde(rename = "B")]
    pub b: i32,
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
    pub left_thumbstick_x: i32,
    pub left_thumbstick_y: i32,
    pub right_thumbstick_x: i32,
    pub right_thumbstick_y: i32,
}

impl ControllerInput {
    pub fn clear_buttons(&mut self) {
        self.a = 0;
        self.b = 0;
        self.x = 0;
        self.y = 0;
    }

    pub fn zero_axes(&mut self) {
        self.left_thumbstick_x = 0;
        self.left_thumbstick_y = 0;
        self.right_thumbstick_x = 0;
        self.right_thumbstick_y = 0;
    }

    pub fn axes_are_neutral(&self) -> bool {
        self.left_thumbstick_x == 0
            && self.left_thumbstick_y == 0
            && self.right_thumbstick_x == 0
            && self.right_thumbstick_y == 0
    }
}

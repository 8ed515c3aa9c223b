//! Instruction Classifier
//!
//! Maps one line of text to exactly one [`Instruction`] by testing a fixed,
//! ordered list of keywords for substring containment. The first keyword
//! found wins, so "if you see a wall while moving" is a `While` block because
//! `while` is tested before `if`. Matching is case-sensitive and does not
//! tokenize: "stopwatch" is a `stop`.
//!
//! Precedence: `stop`, `clear`, `save`, `load`, `execute`, `say`,
//! `end while`/`end loop`, `end if`, `do while`, `while`, `if`, `until`,
//! and anything else is a motion.

use sdk::types::{ActionKind, MotionAction, SenseCondition};

/// A classified instruction line
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Stop,
    Clear,
    /// Save the recorded program; `name` is the first token after `save`
    Save { name: Option<String> },
    /// Graft a saved program at the cursor
    Load { name: Option<String> },
    Execute,
    Say { text: String },
    /// `end while` or `end loop`
    EndLoop,
    EndIf,
    /// `do while`, `while` or `if`
    Open {
        kind: ActionKind,
        sense: SenseCondition,
    },
    /// `Do` or `DoUntil` with the motion keyword found in the line, if any
    Motion {
        kind: ActionKind,
        action: Option<MotionAction>,
    },
}

impl Instruction {
    /// Node kind this instruction produces, if it produces a node
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Self::Say { .. } => Some(ActionKind::Say),
            Self::Open { kind, .. } | Self::Motion { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Classify one instruction line
pub fn classify(line: &str) -> Instruction {
    if line.contains("stop") {
        Instruction::Stop
    } else if line.contains("clear") {
        Instruction::Clear
    } else if line.contains("save") {
        Instruction::Save {
            name: keyword_argument(line, "save"),
        }
    } else if line.contains("load") {
        Instruction::Load {
            name: keyword_argument(line, "load"),
        }
    } else if line.contains("execute") {
        Instruction::Execute
    } else if line.contains("say") {
        Instruction::Say {
            text: say_text(line),
        }
    } else if line.contains("end while") || line.contains("end loop") {
        Instruction::EndLoop
    } else if line.contains("end if") {
        Instruction::EndIf
    } else if line.contains("do while") {
        open(ActionKind::DoWhile, line)
    } else if line.contains("while") {
        open(ActionKind::While, line)
    } else if line.contains("if") {
        open(ActionKind::If, line)
    } else if line.contains("until") {
        Instruction::Motion {
            kind: ActionKind::DoUntil,
            action: MotionAction::from_text(line),
        }
    } else {
        Instruction::Motion {
            kind: ActionKind::Do,
            action: MotionAction::from_text(line),
        }
    }
}

fn open(kind: ActionKind, line: &str) -> Instruction {
    Instruction::Open {
        kind,
        sense: SenseCondition::link(line),
    }
}

/// First whitespace-delimited token after the first occurrence of `keyword`
///
/// If the keyword is embedded in a longer word ("saveas plan"), the rest of
/// that word is skipped.
fn keyword_argument(line: &str, keyword: &str) -> Option<String> {
    let start = line.find(keyword)? + keyword.len();
    let rest = &line[start..];
    let rest = match rest.find(char::is_whitespace) {
        Some(0) => rest,
        Some(boundary) => &rest[boundary..],
        None => return None,
    };
    rest.split_whitespace().next().map(str::to_string)
}

/// Everything after the first `say` keyword, minus the separating whitespace
fn say_text(line: &str) -> String {
    line.find("say")
        .map(|start| line[start + "say".len()..].trim_start().to_string())
        .unwrap_or_default()
}

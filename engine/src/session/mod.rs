//! Instruction session
//!
//! One line in, one spoken response out. The session owns the builder and
//! routes each classified instruction to the builder, the plan store or the
//! executor. A failed instruction leaves the graph untouched and is reported
//! with its hint followed by the prompt.

use crate::compiler::{classify, extract_params, Instruction};
use crate::controller::{CancelToken, ControllerHandle};
use crate::executor::{ExecutionOutcome, Executor};
use crate::feedback::FeedbackSink;
use crate::graph::{Graph, GraphBuilder, NodeSpec};
use crate::store::PlanStore;
use sdk::errors::{BowErrorExt, EngineError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Line that ends a session
pub const SHUTDOWN: &str = "shutdown";

pub const GREETING: &str =
    "Hello. I am Bow with Navigational Instruction Interface. What can I help you with?";

pub const FAREWELL: &str = "I am exiting now. Thank you and have a great day!";

/// Whether the session continues after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Shutdown,
}

pub struct Session {
    builder: GraphBuilder,
    store: Arc<dyn PlanStore>,
    executor: Executor,
    feedback: Arc<dyn FeedbackSink>,
    cancel: CancelToken,
    prompt: String,
}

impl Session {
    pub fn new(
        store: Arc<dyn PlanStore>,
        executor: Executor,
        feedback: Arc<dyn FeedbackSink>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            builder: GraphBuilder::new(),
            store,
            executor,
            feedback,
            cancel: CancelToken::new(),
            prompt: prompt.into(),
        }
    }

    pub fn builder(&self) -> &GraphBuilder {
        &self.builder
    }

    pub fn graph(&self) -> &Graph {
        self.builder.graph()
    }

    pub fn controller(&self) -> &ControllerHandle {
        self.executor.controller()
    }

    /// Token that interrupts the running execution; clones share state
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn greet(&self) {
        self.feedback.notify(GREETING);
    }

    /// Handle one line from the instruction source
    ///
    /// Reports the response, or the error hint and prompt, to the feedback
    /// sink. Blank lines are ignored.
    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line == SHUTDOWN {
            return LineOutcome::Shutdown;
        }
        if line.is_empty() {
            return LineOutcome::Continue;
        }

        match self.process(line).await {
            Ok(response) => self.feedback.notify(&response),
            Err(e) => {
                warn!(instruction = line, error = %e, "Instruction failed");
                self.feedback
                    .notify(&format!("{}. {}", e.user_hint(), self.prompt));
            }
        }
        LineOutcome::Continue
    }

    /// Apply one instruction and return the response to report
    ///
    /// # Errors
    ///
    /// Any `EngineError` from classification, building, persistence or
    /// execution. The builder is unchanged when an error is returned.
    pub async fn process(&mut self, line: &str) -> Result<String, EngineError> {
        let instruction = classify(line);
        debug!(instruction = line, classified = ?instruction, "Classified instruction");

        match instruction {
            Instruction::Stop => Ok("Ok. Waiting for next instruction.".to_string()),
            Instruction::Clear => {
                self.builder.clear();
                info!("Cleared all instructions");
                Ok("Cleared all commands. How can I help you today?".to_string())
            }
            Instruction::Save { name } => {
                let name = require_name(name, "save")?;
                let plan = self.builder.snapshot_program()?;
                self.store.save(&name, &plan)?;
                Ok(format!("Saved in {}. {}", name, self.prompt))
            }
            Instruction::Load { name } => {
                let name = require_name(name, "load")?;
                let plan = self.store.load(&name)?;
                self.builder.graft(&plan)?;
                Ok(format!("Loaded {} at current node. {}", name, self.prompt))
            }
            Instruction::Execute => self.execute().await,
            Instruction::Say { text } => {
                self.builder.append(NodeSpec::say(text));
                Ok(format!("Ok, I will say that. {}", self.prompt))
            }
            Instruction::EndLoop | Instruction::EndIf => {
                // Closes the innermost block regardless of the keyword used
                let kind = self.builder.close_block()?;
                Ok(format!("{} Ended. {}", kind, self.prompt))
            }
            Instruction::Open { kind, sense } => {
                self.builder.open_block(kind, sense)?;
                Ok(format!("What should I do in this {} condition?", kind))
            }
            Instruction::Motion { kind, action } => {
                let action = action.ok_or_else(|| {
                    EngineError::MalformedInstruction(format!("'{}' names no motion", line))
                })?;
                let params = extract_params(action, line)?;
                self.builder.append(NodeSpec::motion(kind, action, params));
                Ok(self.prompt.clone())
            }
        }
    }

    async fn execute(&mut self) -> Result<String, EngineError> {
        if self.builder.graph().first().is_none() {
            return Err(EngineError::EmptyGraph);
        }

        self.cancel.reset();
        self.feedback.notify("Starting execution");
        let report = self
            .executor
            .execute(self.builder.graph(), &self.cancel)
            .await?;

        Ok(match report.outcome {
            ExecutionOutcome::Completed => format!("Execution complete. {}", self.prompt),
            ExecutionOutcome::Cancelled => format!("Execution cancelled. {}", self.prompt),
            ExecutionOutcome::StepLimit => format!(
                "Execution stopped after {} steps. {}",
                report.steps, self.prompt
            ),
        })
    }

    /// End the session: render the graph, signal the actuator side with
    /// `B = 1` and say goodbye. Returns the rendering.
    pub fn farewell(&self) -> String {
        let rendering = self.graph().render(self.graph().root());
        self.controller().update(|input| input.b = 1);
        info!(nodes = self.graph().len(), "Session ended");
        self.feedback.notify(FAREWELL);
        rendering
    }
}

fn require_name(name: Option<String>, keyword: &str) -> Result<String, EngineError> {
    name.ok_or_else(|| EngineError::MalformedInstruction(format!("{} needs a plan name", keyword)))
}

//! Executor
//!
//! Walks the instruction graph from `root.children[0]`, one node at a time,
//! driving the controller through the [`ActuationCodec`]. Branch headers
//! pick `children[0]` when the face-landmark flag is up and `children[1]`
//! otherwise. The header's stored `SenseCondition` is NOT consulted: both
//! loops and conditionals branch on the global face-landmark flag only.
//!
//! A missing child in the chosen direction ends the traversal normally.
//! Cancellation halts between nodes, between frames and inside `DoUntil`
//! spins; the graph is never modified.

pub mod actuation;

pub use actuation::{Actuation, ActuationCodec, StickFrame, DEFAULT_SCALE};

use crate::config::Config;
use crate::controller::{CancelToken, ControllerHandle};
use crate::feedback::FeedbackSink;
use crate::graph::{Graph, Node, NodeId};
use crate::message_bus::{Event, MessageBus};
use sdk::errors::EngineError;
use sdk::types::ActionKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a traversal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Reached a node with no next child
    Completed,
    /// Stopped by the cancel token
    Cancelled,
    /// Visited `max_steps` nodes
    StepLimit,
}

/// Summary of one traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Nodes visited
    pub steps: usize,
    /// Controller frames written
    pub frames: usize,
    pub outcome: ExecutionOutcome,
}

/// Executor tuning, normally taken from the `[actuation]` and `[executor]`
/// config sections
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    pub scale: f64,
    pub frame_interval: Duration,
    /// Pause between `DoUntil` repetitions; zero only yields
    pub until_poll: Duration,
    /// Node visit bound per traversal; zero is unlimited
    pub max_steps: usize,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            frame_interval: Duration::from_secs(1),
            until_poll: Duration::ZERO,
            max_steps: 0,
        }
    }
}

impl ExecutorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scale: config.actuation.scale,
            frame_interval: Duration::from_millis(config.actuation.frame_interval_ms),
            until_poll: Duration::from_millis(config.executor.until_poll_ms),
            max_steps: config.executor.max_steps,
        }
    }
}

pub struct Executor {
    controller: ControllerHandle,
    bus: Arc<MessageBus>,
    feedback: Arc<dyn FeedbackSink>,
    codec: ActuationCodec,
    settings: ExecutorSettings,
}

impl Executor {
    pub fn new(
        controller: ControllerHandle,
        bus: Arc<MessageBus>,
        feedback: Arc<dyn FeedbackSink>,
        settings: ExecutorSettings,
    ) -> Self {
        let codec = ActuationCodec::new(settings.scale, settings.frame_interval);
        Self {
            controller,
            bus,
            feedback,
            codec,
            settings,
        }
    }

    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Traverse `graph` from its first recorded node
    ///
    /// # Errors
    ///
    /// `EmptyGraph` when nothing has been recorded. Cancellation and the step
    /// limit are reported through [`ExecutionOutcome`], not as errors.
    pub async fn execute(
        &self,
        graph: &Graph,
        cancel: &CancelToken,
    ) -> Result<ExecutionReport, EngineError> {
        let entry = graph.first().ok_or(EngineError::EmptyGraph)?;

        info!(entry = %entry, nodes = graph.len(), "Starting execution");
        self.bus.publish(Event::ExecutionStarted { entry });

        let mut report = ExecutionReport {
            steps: 0,
            frames: 0,
            outcome: ExecutionOutcome::Completed,
        };

        let result = self.walk(graph, entry, cancel, &mut report).await;
        report.outcome = match result {
            Ok(outcome) => outcome,
            Err(EngineError::Cancelled) => ExecutionOutcome::Cancelled,
            Err(e) => return Err(e),
        };

        info!(
            steps = report.steps,
            frames = report.frames,
            outcome = ?report.outcome,
            "Execution finished"
        );
        self.bus.publish(Event::ExecutionFinished {
            steps: report.steps,
            outcome: report.outcome,
        });

        Ok(report)
    }

    async fn walk(
        &self,
        graph: &Graph,
        entry: NodeId,
        cancel: &CancelToken,
        report: &mut ExecutionReport,
    ) -> Result<ExecutionOutcome, EngineError> {
        let mut current = Some(entry);

        while let Some(id) = current {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if self.settings.max_steps > 0 && report.steps >= self.settings.max_steps {
                warn!(max_steps = self.settings.max_steps, "Step limit reached, halting");
                return Ok(ExecutionOutcome::StepLimit);
            }

            let node = &graph[id];
            report.steps += 1;
            debug!(node_id = %id, kind = %node.kind(), "Visiting node");

            let frames = report.frames;
            current = self.step(node, cancel, report).await?;

            // Headers, Say nodes and placeholders never await on their own
            if report.frames == frames {
                tokio::task::yield_now().await;
            }
        }

        Ok(ExecutionOutcome::Completed)
    }

    /// Run one node and pick the next one
    async fn step(
        &self,
        node: &Node,
        cancel: &CancelToken,
        report: &mut ExecutionReport,
    ) -> Result<Option<NodeId>, EngineError> {
        let branch = match node.kind() {
            ActionKind::Root => 0,
            ActionKind::Do => {
                report.frames += self.actuate(node, cancel).await?;
                0
            }
            ActionKind::DoUntil => {
                self.spin_until_near(node, cancel, report).await?;
                0
            }
            ActionKind::While | ActionKind::DoWhile | ActionKind::If => {
                // Stored sense condition is ignored; the face flag decides
                if self.controller.sensors().face_landmark() {
                    0
                } else {
                    1
                }
            }
            ActionKind::Say => {
                let text = node.say().unwrap_or_default();
                self.feedback.notify(text);
                self.bus.publish(Event::Speech {
                    node_id: node.id(),
                    text: text.to_string(),
                });
                0
            }
        };

        let next = node.child(branch);
        if next.is_none() {
            debug!(node_id = %node.id(), branch, "No next node, traversal ends");
        }
        Ok(next)
    }

    /// Repeat the node's motion until the near-landmark flag is raised
    async fn spin_until_near(
        &self,
        node: &Node,
        cancel: &CancelToken,
        report: &mut ExecutionReport,
    ) -> Result<(), EngineError> {
        let mut repetitions = 0usize;

        while !self.controller.sensors().near_landmark() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            report.frames += self.actuate(node, cancel).await?;
            repetitions += 1;

            if self.settings.until_poll.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.until_poll) => {}
                    _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                }
            }
        }

        debug!(node_id = %node.id(), repetitions, "Near landmark reached");
        Ok(())
    }

    async fn actuate(&self, node: &Node, cancel: &CancelToken) -> Result<usize, EngineError> {
        let Some(action) = node.action() else {
            return Ok(0);
        };
        let actuation = self.codec.encode(action, node.params());
        debug!(node_id = %node.id(), action = %action, params = %node.params(), "Actuating");
        self.codec
            .perform(node.id(), actuation, &self.controller, &self.bus, cancel)
            .await
    }
}

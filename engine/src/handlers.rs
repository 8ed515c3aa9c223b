//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - session: Interactive instruction session on stdin
//! - run: Feed a script file through a session
//! - show: Print a saved plan

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::controller::{CancelToken, ControllerHandle};
use crate::executor::{Executor, ExecutorSettings};
use crate::feedback::{ConsoleFeedback, FeedbackSink};
use crate::graph::GraphBuilder;
use crate::message_bus::{spawn_event_logger, MessageBus};
use crate::session::{LineOutcome, Session};
use crate::store::{FilePlanStore, PlanStore};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Wire a session to the configured plan store, console feedback and a
/// fresh controller
///
/// Bus events are logged through `tracing`. Must be called inside a Tokio
/// runtime.
pub fn build_session(config: &Config) -> Session {
    let bus = Arc::new(MessageBus::new());
    spawn_event_logger(&bus);
    let feedback: Arc<dyn FeedbackSink> = Arc::new(ConsoleFeedback::new(
        config.feedback.speech_command.as_deref(),
    ));
    let store: Arc<dyn PlanStore> = Arc::new(FilePlanStore::new(config.plans_dir()));
    let executor = Executor::new(
        ControllerHandle::new(),
        bus,
        Arc::clone(&feedback),
        ExecutorSettings::from_config(config),
    );

    Session::new(store, executor, feedback, config.feedback.prompt.clone())
}

/// Cancel the running execution on every Ctrl-C
fn spawn_interrupt_watcher(cancel: CancelToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling execution");
            cancel.cancel();
        }
    })
}

fn print_summary(
    session: &Session,
    rendering: &str,
    lines: usize,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            print!("{}", rendering);
        }
        OutputFormat::Json => {
            let output = json!({
                "lines": lines,
                "nodes": session.graph().len(),
                "open_blocks": session.builder().open_blocks().len(),
                "graph": rendering,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Run an interactive session on stdin
///
/// Ends on `shutdown` or end of input. Ctrl-C interrupts a running
/// execution and returns to the prompt.
pub async fn handle_session(config: &Config, format: OutputFormat) -> Result<()> {
    let mut session = build_session(config);
    let watcher = spawn_interrupt_watcher(session.cancel_token());

    println!("Enter 'shutdown' to exit, else enter desired navigational commands...");
    session.greet();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        count += 1;
        if session.handle_line(&line).await == LineOutcome::Shutdown {
            break;
        }
    }

    watcher.abort();
    let rendering = session.farewell();
    print_summary(&session, &rendering, count, format)
}

/// Compile and run every instruction in a script file
///
/// Blank lines and lines starting with `#` are skipped. A `shutdown` line
/// ends the script early.
pub async fn handle_run_script(file: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let script = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read script {:?}", file))?;

    let mut session = build_session(config);
    let watcher = spawn_interrupt_watcher(session.cancel_token());

    let mut count = 0;
    for line in script.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        count += 1;
        tracing::debug!(line = count, instruction = line, "Script instruction");
        if session.handle_line(line).await == LineOutcome::Shutdown {
            break;
        }
    }

    watcher.abort();
    let rendering = session.farewell();
    print_summary(&session, &rendering, count, format)
}

/// Print a saved plan without executing it
pub async fn handle_show(name: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let store = FilePlanStore::new(config.plans_dir());
    let plan = store
        .load(name)
        .with_context(|| format!("Failed to load plan '{}'", name))?;

    match format {
        OutputFormat::Text => {
            let mut builder = GraphBuilder::new();
            let entry = builder.graft(&plan)?;
            println!("Plan '{}' ({} nodes):", name, plan.len());
            print!("{}", builder.graph().render(entry));
        }
        OutputFormat::Json => {
            let output = json!({
                "name": name,
                "nodes": plan.len(),
                "plan": plan,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

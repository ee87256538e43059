// WHY: drive a scripted editing session through the live event loop
// Steps mutate the shared workspace the way a user would; timing comes from real timers

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::aggregator::DEBOUNCE_WINDOW;
use crate::document::{DocumentId, Position, Range};
use crate::engine::{Command, EngineEvent, EventSender};
use crate::host::Selection;
use crate::suppression::SUPPRESSION_GRACE;
use crate::workspace::SharedWorkspace;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplayScript {
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse replay script")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay script {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid replay script {}", path.display()))
    }
}

/// One scripted user action; positions are 0-based
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayStep {
    Insert { line: usize, character: usize, text: String },
    Edit { range: Range, text: String },
    Cursor { line: usize, character: usize },
    Select { range: Range },
    Wait { ms: u64 },
    Command { name: Command },
    Close,
}

/// Plays a script against one document of a shared workspace
pub struct ReplayDriver {
    workspace: SharedWorkspace,
    document: DocumentId,
    events: EventSender,
}

impl ReplayDriver {
    pub fn new(workspace: SharedWorkspace, document: DocumentId, events: EventSender) -> Self {
        Self {
            workspace,
            document,
            events,
        }
    }

    /// Play every step, let pending work settle, then stop the engine
    ///
    /// The engine is stopped even when a step fails.
    pub async fn play(&self, script: &ReplayScript) -> Result<()> {
        info!(document = %self.document, steps = script.steps.len(), "Replay started");
        let result = self.play_steps(script).await;
        if result.is_ok() {
            sleep(DEBOUNCE_WINDOW + SUPPRESSION_GRACE).await;
        }
        self.send(EngineEvent::Shutdown);
        info!(document = %self.document, ok = result.is_ok(), "Replay finished");
        result
    }

    async fn play_steps(&self, script: &ReplayScript) -> Result<()> {
        for (index, step) in script.steps.iter().enumerate() {
            debug!(step = index, ?step, "Replaying step");
            self.apply_step(step)
                .await
                .with_context(|| format!("Replay step {index} failed"))?;
            // let the engine drain what the step produced
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    async fn apply_step(&self, step: &ReplayStep) -> Result<()> {
        match step {
            ReplayStep::Insert { line, character, text } => {
                self.workspace
                    .borrow_mut()
                    .insert(&self.document, Position::new(*line, *character), text)?;
            }
            ReplayStep::Edit { range, text } => {
                self.workspace.borrow_mut().user_edit(&self.document, *range, text)?;
            }
            ReplayStep::Cursor { line, character } => {
                self.workspace
                    .borrow_mut()
                    .set_selection(Selection::cursor(Position::new(*line, *character)))?;
            }
            ReplayStep::Select { range } => {
                self.workspace
                    .borrow_mut()
                    .set_selection(Selection::new(range.start, range.end))?;
            }
            ReplayStep::Wait { ms } => sleep(Duration::from_millis(*ms)).await,
            ReplayStep::Command { name } => self.send(EngineEvent::Invoke(*name)),
            ReplayStep::Close => self.workspace.borrow_mut().close(&self.document)?,
        }
        Ok(())
    }

    fn send(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            debug!("Engine already stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_parses_every_op() {
        let script = ReplayScript::from_json(
            r#"{"steps": [
                {"op": "insert", "line": 0, "character": 0, "text": "A.\nB."},
                {"op": "edit", "range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 1}}, "text": "Z"},
                {"op": "cursor", "line": 1, "character": 2},
                {"op": "select", "range": {"start": {"line": 0, "character": 0}, "end": {"line": 1, "character": 0}}},
                {"op": "wait", "ms": 600},
                {"op": "command", "name": "toggle_auto_format"},
                {"op": "close"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 7);
        assert_eq!(
            script.steps[0],
            ReplayStep::Insert {
                line: 0,
                character: 0,
                text: "A.\nB.".to_string()
            }
        );
        assert_eq!(
            script.steps[5],
            ReplayStep::Command {
                name: Command::ToggleAutoFormat
            }
        );
        assert_eq!(script.steps[6], ReplayStep::Close);
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let err = ReplayScript::from_json(r#"{"steps": [{"op": "teleport"}]}"#).unwrap_err();
        assert!(err.to_string().contains("replay script"));
    }
}

// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use ospl::{
    event_channel, DocumentId, Engine, EventReceiver, EventSender, Formatter, MemorySettingsStore, Notification,
    ReplayDriver, Settings, SharedWorkspace, Workspace, WorkspaceHost,
};

/// Test fixture helper for creating temporary directories with prose files
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Create a text file with given content
    pub fn create_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    pub fn read_file<P: AsRef<Path>>(&self, relative_path: P) -> String {
        fs::read_to_string(self.root_path.join(relative_path)).expect("Failed to read test file")
    }
}

/// Deterministic detector: a sentence ends at `.`, `!` or `?` followed by a space
///
/// No abbreviation or quote handling, so expectations never depend on heuristics.
pub fn punctuation_detector(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && matches!(chars.peek(), Some((_, ' '))) {
            sentences.push(text[start..=offset].to_string());
            start = offset + 2;
        }
    }
    if start < text.len() {
        sentences.push(text[start..].to_string());
    }
    sentences
}

pub fn deterministic_formatter() -> Formatter {
    Formatter::new(Box::new(punctuation_detector)).expect("Failed to build formatter")
}

/// A workspace with one focused document and an engine wired to it
pub struct Session {
    pub workspace: SharedWorkspace,
    pub engine: Engine<WorkspaceHost, MemorySettingsStore>,
    pub receiver: EventReceiver,
    pub events: EventSender,
    pub document: DocumentId,
}

impl Session {
    pub async fn open(text: &str) -> Self {
        Self::open_with(text, Settings::default()).await
    }

    pub async fn open_with(text: &str, settings: Settings) -> Self {
        let (events, receiver) = event_channel();
        let workspace = SharedWorkspace::new(Workspace::new(events.clone()));
        let document = DocumentId::new("file:///notes.md");
        {
            let mut workspace = workspace.borrow_mut();
            workspace.open(document.clone(), text);
            workspace.focus(&document).expect("Failed to focus document");
        }

        let engine = Engine::start(
            WorkspaceHost::new(workspace.clone()),
            MemorySettingsStore::new(settings),
            deterministic_formatter(),
        )
        .await
        .expect("Failed to start engine");

        Self {
            workspace,
            engine,
            receiver,
            events,
            document,
        }
    }

    pub fn driver(&self) -> ReplayDriver {
        ReplayDriver::new(self.workspace.clone(), self.document.clone(), self.events.clone())
    }
}

pub fn text_of(workspace: &SharedWorkspace, document: &DocumentId) -> String {
    workspace.borrow().text(document).expect("Document should be open")
}

pub fn notifications_of(workspace: &SharedWorkspace) -> Vec<Notification> {
    workspace.borrow().notifications().to_vec()
}

pub fn accepted_edits(workspace: &SharedWorkspace) -> usize {
    workspace
        .borrow()
        .applied_edits()
        .iter()
        .filter(|edit| edit.accepted)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_detector() {
        assert_eq!(
            punctuation_detector("One. Two! Three? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
        assert_eq!(punctuation_detector("e.g. splits"), vec!["e.g.", "splits"]);
        assert!(punctuation_detector("").is_empty());
    }
}

// WHY: everything the engine needs from an editor host, and nothing more
// Buffers, selection, atomic edits and the notification sink stay on the host side

use std::fmt;
use std::future::Future;

use crate::document::{Document, DocumentId, Position, Range};

/// Selection as the host reports it: `anchor` is where it started, `active` holds the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    /// Collapsed selection (a bare cursor)
    pub fn cursor(at: Position) -> Self {
        Self { anchor: at, active: at }
    }

    pub fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    pub fn range(&self) -> Range {
        Range::new(self.anchor, self.active)
    }

    pub fn cursor_line(&self) -> usize {
        self.active.line
    }
}

/// The focused editor: which document it shows and its selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub document: DocumentId,
    pub selection: Selection,
}

/// User-facing message; fire-and-forget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info(String),
    Error(String),
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Notification::Info(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification::Error(message.into())
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Info(message) => write!(f, "info: {message}"),
            Notification::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Editor host capabilities consumed by the engine
pub trait Host {
    /// Snapshot of an open document, `None` once it is closed
    fn document(&self, id: &DocumentId) -> Option<Document>;

    /// The focused editor, if any
    fn active_editor(&self) -> Option<EditorState>;

    /// Atomically replace `range` in `id` with `text`; resolves to `false` if the host refused
    fn apply_edit(&mut self, id: &DocumentId, range: Range, text: &str) -> impl Future<Output = bool>;

    fn notify(&mut self, notification: Notification);
}

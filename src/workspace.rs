// WHY: an in-memory editor host for the CLI and the test-suite
// Every edit, user or engine, is echoed back to the engine as a change notification

use anyhow::{anyhow, Result};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::document::{ChangeEvent, Document, DocumentId, Position, Range};
use crate::engine::{EngineEvent, EventSender};
use crate::host::{EditorState, Host, Notification, Selection};

/// An edit the engine asked the host to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    pub document: DocumentId,
    pub range: Range,
    pub text: String,
    pub accepted: bool,
}

/// Open documents, the focused editor and everything the engine reported
pub struct Workspace {
    documents: BTreeMap<DocumentId, Document>,
    active: Option<EditorState>,
    notifications: Vec<Notification>,
    applied_edits: Vec<AppliedEdit>,
    reject_edits: bool,
    events: EventSender,
}

impl Workspace {
    /// Change notifications are delivered to `events`
    pub fn new(events: EventSender) -> Self {
        Self {
            documents: BTreeMap::new(),
            active: None,
            notifications: Vec::new(),
            applied_edits: Vec::new(),
            reject_edits: false,
            events,
        }
    }

    pub fn open(&mut self, id: DocumentId, text: &str) {
        debug!(document = %id, bytes = text.len(), "Document opened");
        self.documents.insert(id, Document::from_text(text));
    }

    /// Close `id`; the engine is told so it can drop pending work
    pub fn close(&mut self, id: &DocumentId) -> Result<()> {
        self.documents
            .remove(id)
            .ok_or_else(|| anyhow!("Document {id} is not open"))?;
        if self.active.as_ref().is_some_and(|editor| &editor.document == id) {
            self.active = None;
        }
        self.send(EngineEvent::DocumentClosed(id.clone()));
        Ok(())
    }

    /// Show `id` in the focused editor with the cursor at the start
    pub fn focus(&mut self, id: &DocumentId) -> Result<()> {
        self.require(id)?;
        self.active = Some(EditorState {
            document: id.clone(),
            selection: Selection::cursor(Position::default()),
        });
        Ok(())
    }

    /// Replace the selection of the focused editor
    pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
        let editor = self.active.as_mut().ok_or_else(|| anyhow!("No focused editor"))?;
        let document = self
            .documents
            .get(&editor.document)
            .ok_or_else(|| anyhow!("Focused document {} is not open", editor.document))?;
        editor.selection = Selection::new(document.clamp(selection.anchor), document.clamp(selection.active));
        Ok(())
    }

    /// A user edit: replace `range` with `text`, move the cursor after it, notify the engine
    pub fn user_edit(&mut self, id: &DocumentId, range: Range, text: &str) -> Result<ChangeEvent> {
        let document = self
            .documents
            .get_mut(id)
            .ok_or_else(|| anyhow!("Document {id} is not open"))?;
        let change = document.replace(range, text);

        if let Some(editor) = self.active.as_mut().filter(|editor| &editor.document == id) {
            editor.selection = Selection::cursor(change.end_position());
        }
        self.send(EngineEvent::DocumentChanged {
            document: id.clone(),
            changes: vec![change.clone()],
        });
        Ok(change)
    }

    pub fn insert(&mut self, id: &DocumentId, at: Position, text: &str) -> Result<ChangeEvent> {
        self.user_edit(id, Range::new(at, at), text)
    }

    /// Apply an engine edit; refused while `reject_edits` is set or when `id` is gone
    pub fn apply(&mut self, id: &DocumentId, range: Range, text: &str) -> bool {
        let change = if self.reject_edits {
            None
        } else {
            self.documents.get_mut(id).map(|document| document.replace(range, text))
        };
        self.applied_edits.push(AppliedEdit {
            document: id.clone(),
            range,
            text: text.to_string(),
            accepted: change.is_some(),
        });

        let Some(change) = change else {
            warn!(document = %id, "Edit refused");
            return false;
        };
        if let Some(editor) = self.active.as_mut().filter(|editor| &editor.document == id) {
            editor.selection = Selection::new(
                remap_position(editor.selection.anchor, &change),
                remap_position(editor.selection.active, &change),
            );
        }
        self.send(EngineEvent::DocumentChanged {
            document: id.clone(),
            changes: vec![change],
        });
        true
    }

    pub fn set_reject_edits(&mut self, reject: bool) {
        self.reject_edits = reject;
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn text(&self, id: &DocumentId) -> Option<String> {
        self.documents.get(id).map(Document::text)
    }

    pub fn active_editor(&self) -> Option<&EditorState> {
        self.active.as_ref()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn applied_edits(&self) -> &[AppliedEdit] {
        &self.applied_edits
    }

    /// Another handle on the engine channel this workspace reports to
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    fn require(&self, id: &DocumentId) -> Result<&Document> {
        self.documents
            .get(id)
            .ok_or_else(|| anyhow!("Document {id} is not open"))
    }

    fn send(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            debug!("Engine stopped, change notification dropped");
        }
    }
}

/// Workspace handle shared by the engine's host and whoever drives the session
#[derive(Clone)]
pub struct SharedWorkspace(Rc<RefCell<Workspace>>);

impl SharedWorkspace {
    pub fn new(workspace: Workspace) -> Self {
        Self(Rc::new(RefCell::new(workspace)))
    }

    pub fn borrow(&self) -> Ref<'_, Workspace> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Workspace> {
        self.0.borrow_mut()
    }
}

/// `Host` implementation over a shared workspace
#[derive(Clone)]
pub struct WorkspaceHost {
    workspace: SharedWorkspace,
}

impl WorkspaceHost {
    pub fn new(workspace: SharedWorkspace) -> Self {
        Self { workspace }
    }
}

impl Host for WorkspaceHost {
    fn document(&self, id: &DocumentId) -> Option<Document> {
        self.workspace.borrow().document(id).cloned()
    }

    fn active_editor(&self) -> Option<EditorState> {
        self.workspace.borrow().active_editor().cloned()
    }

    async fn apply_edit(&mut self, id: &DocumentId, range: Range, text: &str) -> bool {
        // Edits resolve asynchronously in a real editor
        tokio::task::yield_now().await;
        self.workspace.borrow_mut().apply(id, range, text)
    }

    fn notify(&mut self, notification: Notification) {
        match &notification {
            Notification::Info(message) => info!(message = %message, "Notification"),
            Notification::Error(message) => warn!(message = %message, "Error notification"),
        }
        self.workspace.borrow_mut().notifications.push(notification);
    }
}

/// Where `position` lands after `change`; positions inside the replaced range move to its end
fn remap_position(position: Position, change: &ChangeEvent) -> Position {
    let Range { start, end } = change.range;
    if position <= start {
        return position;
    }
    let new_end = change.end_position();
    if position < end {
        return new_end;
    }
    if position.line == end.line {
        Position::new(new_end.line, new_end.character + (position.character - end.character))
    } else {
        Position::new(position.line + new_end.line - end.line, position.character)
    }
}

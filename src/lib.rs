pub mod aggregator;
pub mod document;
pub mod engine;
pub mod formatter;
pub mod host;
pub mod idempotence;
pub mod paragraph;
pub mod replay;
pub mod segmenter;
pub mod sentence_detector;
pub mod settings;
pub mod suppression;
pub mod workspace;

// Re-export the text model and the formatter for embedders
pub use document::{ChangeEvent, Document, DocumentId, LineEnding, Position, Range, TextBuffer};
pub use formatter::{FormatOutcome, FormatTarget, Formatter, IdempotencyPolicy};
pub use sentence_detector::{DetectorOptions, SentenceDetect, SentenceDetectorDialog};

// Re-export the event-driven engine and its host seam
pub use engine::{event_channel, Command, Engine, EngineEvent, EventReceiver, EventSender};
pub use host::{EditorState, Host, Notification, Selection};
pub use settings::{JsonSettingsStore, MemorySettingsStore, Settings, SettingsStore};

// Re-export the reference host and scripted sessions
pub use replay::{ReplayDriver, ReplayScript, ReplayStep};
pub use workspace::{AppliedEdit, SharedWorkspace, Workspace, WorkspaceHost};

// WHY: the single event loop that owns all mutable engine state
// Change events, commands and debounce timers are handled one at a time, to completion

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use crate::aggregator::{ChangeEventAggregator, FormatTrigger, LineInterval};
use crate::document::{ChangeEvent, DocumentId};
use crate::formatter::{FormatOutcome, FormatTarget, Formatter, IdempotencyPolicy};
use crate::host::{Host, Notification};
use crate::paragraph::paste_range;
use crate::settings::{Settings, SettingsStore};
use crate::suppression::SuppressionGate;

pub const HELLO_MESSAGE: &str = "Hello World from ospl!";
pub const FORMATTED_MESSAGE: &str = "Formatted text to one sentence per line.";
pub const FORMATTED_PASTE_MESSAGE: &str = "Formatted pasted text to one sentence per line.";
pub const FORMAT_FAILED_MESSAGE: &str = "Failed to format text.";
pub const NO_ACTIVE_EDITOR_MESSAGE: &str = "No active editor.";

/// Named actions the host can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Hello,
    Format,
    ToggleAutoFormat,
}

impl Command {
    /// Identifier under which the host registers the command
    pub fn id(&self) -> &'static str {
        match self {
            Command::Hello => "one-sentence-per-line.helloWorld",
            Command::Format => "one-sentence-per-line.format",
            Command::ToggleAutoFormat => "one-sentence-per-line.toggleAutoFormat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// One host-level edit operation on a document
    DocumentChanged {
        document: DocumentId,
        changes: Vec<ChangeEvent>,
    },
    DocumentClosed(DocumentId),
    Invoke(Command),
    /// Stop the event loop; pending timers are dropped
    Shutdown,
}

pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub struct Engine<H: Host, S: SettingsStore> {
    host: H,
    settings_store: S,
    settings: Settings,
    formatter: Formatter,
    aggregator: ChangeEventAggregator,
    gate: SuppressionGate,
    /// Set while an automatic cursor-paragraph pass is applying its edit
    automatic_in_flight: bool,
}

impl<H: Host, S: SettingsStore> Engine<H, S> {
    /// Build an engine with settings loaded from `settings_store`
    pub async fn start(host: H, settings_store: S, formatter: Formatter) -> Result<Self> {
        let settings = settings_store.load().await?;
        info!(auto_format = settings.auto_format, "Engine started");
        Ok(Self {
            host,
            settings_store,
            settings,
            formatter,
            aggregator: ChangeEventAggregator::default(),
            gate: SuppressionGate::default(),
            automatic_in_flight: false,
        })
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn settings_store(&self) -> &S {
        &self.settings_store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn aggregator(&self) -> &ChangeEventAggregator {
        &self.aggregator
    }

    pub fn suppression(&self) -> &SuppressionGate {
        &self.gate
    }

    /// Process events until `Shutdown` or until every sender is gone
    pub async fn run(&mut self, mut events: EventReceiver) {
        info!("Engine event loop running");
        loop {
            let deadline = self.aggregator.next_deadline();
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(EngineEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
                () = wait_for(deadline) => self.fire_due(Instant::now()).await,
            }
        }
        info!("Engine event loop stopped");
    }

    pub async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::DocumentChanged { document, changes } => self.observe_changes(&document, &changes),
            EngineEvent::DocumentClosed(document) => {
                debug!(document = %document, "Document closed");
                self.aggregator.close(&document);
                self.gate.forget(&document);
            }
            EngineEvent::Invoke(command) => self.invoke(command).await,
            EngineEvent::Shutdown => trace!("Shutdown is handled by the event loop"),
        }
    }

    fn observe_changes(&mut self, document: &DocumentId, changes: &[ChangeEvent]) {
        let now = Instant::now();
        if self.gate.is_suppressed(document, now) {
            debug!(document = %document, changes = changes.len(), "Discarding change events of own edit");
            return;
        }
        if !self.settings.auto_format {
            trace!(document = %document, "Auto-format disabled, ignoring changes");
            return;
        }
        self.aggregator.observe(document, changes, now);
    }

    /// Dispatch every debounce timer due at `now`
    pub async fn fire_due(&mut self, now: Instant) {
        for (document, trigger) in self.aggregator.take_due(now) {
            if !self.settings.auto_format {
                debug!(document = %document, "Auto-format disabled, dropping pending format");
                continue;
            }
            match trigger {
                FormatTrigger::Paste(interval) => self.format_paste(document, interval).await,
                FormatTrigger::Incremental => self.format_cursor_paragraph(document).await,
            }
        }
    }

    pub async fn invoke(&mut self, command: Command) {
        debug!(command = command.id(), "Command invoked");
        match command {
            Command::Hello => self.host.notify(Notification::info(HELLO_MESSAGE)),
            Command::Format => self.format_manual().await,
            Command::ToggleAutoFormat => self.toggle_auto_format().await,
        }
    }

    async fn format_manual(&mut self) {
        let outcome = self
            .formatter
            .format(
                &mut self.host,
                &mut self.gate,
                FormatTarget::SelectionOrParagraph,
                IdempotencyPolicy::AlwaysResegment,
            )
            .await;
        match outcome {
            FormatOutcome::NoActiveEditor | FormatOutcome::DocumentUnavailable => {
                self.host.notify(Notification::info(NO_ACTIVE_EDITOR_MESSAGE));
            }
            FormatOutcome::Applied { .. } => self.host.notify(Notification::info(FORMATTED_MESSAGE)),
            FormatOutcome::Failed => self.host.notify(Notification::error(FORMAT_FAILED_MESSAGE)),
            FormatOutcome::Unchanged | FormatOutcome::Busy => {}
        }
    }

    async fn format_paste(&mut self, document: DocumentId, interval: LineInterval) {
        let Some(snapshot) = self.host.document(&document) else {
            debug!(document = %document, "Pasted-into document is gone, skipping");
            return;
        };
        let range = paste_range(&snapshot, interval.start, interval.end);
        debug!(document = %document, start = interval.start, end = interval.end, ?range, "Formatting pasted lines");

        let outcome = self
            .formatter
            .format(
                &mut self.host,
                &mut self.gate,
                FormatTarget::Explicit { document, range },
                IdempotencyPolicy::AlwaysResegment,
            )
            .await;
        match outcome {
            FormatOutcome::Applied { .. } => self.host.notify(Notification::info(FORMATTED_PASTE_MESSAGE)),
            FormatOutcome::Failed => self.host.notify(Notification::error(FORMAT_FAILED_MESSAGE)),
            _ => {}
        }
    }

    async fn format_cursor_paragraph(&mut self, document: DocumentId) {
        // `run` awaits each apply, so per-document serialization comes from the gate's edit token
        if self.automatic_in_flight {
            debug!(document = %document, "Automatic format already in flight, skipping");
            return;
        }

        self.automatic_in_flight = true;
        let outcome = self
            .formatter
            .format(
                &mut self.host,
                &mut self.gate,
                FormatTarget::CursorParagraph {
                    document: document.clone(),
                },
                IdempotencyPolicy::SkipIfAlreadyFormatted,
            )
            .await;
        self.automatic_in_flight = false;

        match outcome {
            FormatOutcome::Failed => self.host.notify(Notification::error(FORMAT_FAILED_MESSAGE)),
            FormatOutcome::NoActiveEditor => {
                debug!(document = %document, "Document not in the active editor, skipping");
            }
            _ => {}
        }
    }

    async fn toggle_auto_format(&mut self) {
        let updated = Settings {
            auto_format: !self.settings.auto_format,
        };
        match self.settings_store.save(&updated).await {
            Ok(()) => {
                self.settings = updated;
                info!(auto_format = updated.auto_format, "Auto-format toggled");
                let state = if updated.auto_format { "enabled" } else { "disabled" };
                self.host
                    .notify(Notification::info(format!("Auto-format is now {state}.")));
            }
            Err(e) => {
                warn!(error = %e, auto_format = self.settings.auto_format, "Failed to persist auto-format setting");
                self.host
                    .notify(Notification::error(format!("Failed to update configuration: {e:#}")));
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

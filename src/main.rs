use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ospl::document::TextBuffer;
use ospl::settings::DEFAULT_SETTINGS_FILE;
use ospl::{
    event_channel, Command, DocumentId, Engine, EventReceiver, Formatter, JsonSettingsStore, Position, ReplayDriver,
    ReplayScript, Selection, SharedWorkspace, Workspace, WorkspaceHost,
};

#[derive(Parser, Debug)]
#[command(name = "ospl")]
#[command(about = "Reformat prose to one sentence per line")]
#[command(version)]
struct Cli {
    /// Settings file holding `autoFormat`
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the demonstration notification
    Hello,

    /// Format the paragraph at a line, a line span, or the whole file
    Format {
        path: PathBuf,

        /// Put the cursor on this line (1-based) and format its paragraph
        #[arg(long, conflicts_with = "select")]
        line: Option<usize>,

        /// Select lines A:B (1-based, inclusive) and format the paragraphs they touch
        #[arg(long)]
        select: Option<LineSpan>,

        /// Rewrite the file instead of printing to stdout
        #[arg(long)]
        in_place: bool,
    },

    /// Flip and persist the auto-format setting
    ToggleAutoFormat,

    /// Run a scripted editing session through the auto-format engine
    Replay {
        path: PathBuf,

        /// JSON script of editing steps
        #[arg(long)]
        script: PathBuf,

        /// Rewrite the file instead of printing to stdout
        #[arg(long)]
        in_place: bool,
    },
}

/// Inclusive 1-based line span `A:B`
#[derive(Debug, Clone, Copy)]
struct LineSpan {
    first: usize,
    last: usize,
}

impl FromStr for LineSpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, last) = s.split_once(':').ok_or("expected A:B")?;
        let first: usize = first.trim().parse().map_err(|e| format!("bad start line: {e}"))?;
        let last: usize = last.trim().parse().map_err(|e| format!("bad end line: {e}"))?;
        if first == 0 || last < first {
            return Err(format!("invalid line span {first}:{last}"));
        }
        Ok(Self { first, last })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries formatted text, so logs go to stderr
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(?cli, "Parsed CLI arguments");

    match cli.command {
        Commands::Hello => run_command(&cli.config, Command::Hello).await,
        Commands::ToggleAutoFormat => run_command(&cli.config, Command::ToggleAutoFormat).await,
        Commands::Format {
            path,
            line,
            select,
            in_place,
        } => run_format(&cli.config, &path, line, select, in_place).await,
        Commands::Replay {
            path,
            script,
            in_place,
        } => run_replay(&cli.config, &path, &script, in_place).await,
    }
}

/// Workspace plus the engine wired to it
async fn session(
    config: &Path,
) -> Result<(SharedWorkspace, Engine<WorkspaceHost, JsonSettingsStore>, EventReceiver)> {
    let (events, receiver) = event_channel();
    let workspace = SharedWorkspace::new(Workspace::new(events));
    let engine = Engine::start(
        WorkspaceHost::new(workspace.clone()),
        JsonSettingsStore::new(config),
        Formatter::with_default_detector()?,
    )
    .await?;
    Ok((workspace, engine, receiver))
}

async fn run_command(config: &Path, command: Command) -> Result<()> {
    let (workspace, mut engine, _receiver) = session(config).await?;
    engine.invoke(command).await;
    print_notifications(&workspace);
    Ok(())
}

async fn run_format(
    config: &Path,
    path: &Path,
    line: Option<usize>,
    select: Option<LineSpan>,
    in_place: bool,
) -> Result<()> {
    let (workspace, mut engine, _receiver) = session(config).await?;
    let id = open_file(&workspace, path).await?;

    {
        let mut workspace = workspace.borrow_mut();
        let document = workspace
            .document(&id)
            .context("Opened document disappeared")?
            .clone();
        let last = document.line_count().saturating_sub(1);
        let selection = match (line, select) {
            (Some(0), _) => bail!("--line is 1-based"),
            (Some(line), _) => Selection::cursor(Position::new(line - 1, 0)),
            (None, Some(span)) => Selection::new(
                Position::new(span.first - 1, 0),
                document.line_end((span.last - 1).min(last)),
            ),
            (None, None) => Selection::new(Position::default(), document.line_end(last)),
        };
        workspace.set_selection(selection)?;
    }

    engine.invoke(Command::Format).await;
    print_notifications(&workspace);
    write_result(&workspace, &id, path, in_place).await
}

async fn run_replay(config: &Path, path: &Path, script: &Path, in_place: bool) -> Result<()> {
    let script = ReplayScript::load(script).await?;
    let (workspace, mut engine, receiver) = session(config).await?;
    let id = open_file(&workspace, path).await?;

    let events = workspace.borrow().events();
    let driver = ReplayDriver::new(workspace.clone(), id.clone(), events);
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played?;

    print_notifications(&workspace);
    write_result(&workspace, &id, path, in_place).await
}

async fn open_file(workspace: &SharedWorkspace, path: &Path) -> Result<DocumentId> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let id = DocumentId::new(path.display().to_string());

    let mut workspace = workspace.borrow_mut();
    workspace.open(id.clone(), &text);
    workspace.focus(&id)?;
    Ok(id)
}

async fn write_result(workspace: &SharedWorkspace, id: &DocumentId, path: &Path, in_place: bool) -> Result<()> {
    // a replay may have closed the document
    let Some(text) = workspace.borrow().text(id) else {
        info!(document = %id, "Document closed during session, nothing to write");
        return Ok(());
    };

    if in_place {
        tokio::fs::write(path, &text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "File rewritten");
    } else {
        // the document keeps its own trailing newline, if any
        print!("{text}");
    }
    Ok(())
}

fn print_notifications(workspace: &SharedWorkspace) {
    for notification in workspace.borrow().notifications() {
        eprintln!("{notification}");
    }
}

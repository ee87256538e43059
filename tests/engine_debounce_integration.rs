use std::time::Duration;
use tokio::time::sleep;

use ospl::engine::{FORMATTED_MESSAGE, FORMATTED_PASTE_MESSAGE, FORMAT_FAILED_MESSAGE};
use ospl::{Command, DocumentId, EngineEvent, Notification, Position, ReplayScript, ReplayStep, Settings};

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::{accepted_edits, notifications_of, text_of, Session};

fn insert(line: usize, text: &str) -> ReplayStep {
    ReplayStep::Insert {
        line,
        character: 0,
        text: text.to_string(),
    }
}

fn wait(ms: u64) -> ReplayStep {
    ReplayStep::Wait { ms }
}

/// Three edits on lines 4, 5 and 6 within the debounce window
#[tokio::test(start_paused = true)]
async fn test_burst_dispatches_one_paste_format() {
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = Session::open("Title.\n\nIntro. Two.\n\n").await;
    let driver = ospl::ReplayDriver::new(workspace.clone(), document.clone(), workspace.borrow().events());

    let script = ReplayScript {
        steps: vec![
            insert(4, "Alpha one. Alpha two.\n"),
            wait(200),
            insert(5, "Beta one.\n"),
            wait(200),
            ReplayStep::Insert {
                line: 6,
                character: 0,
                text: "Gamma. Done.".to_string(),
            },
        ],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    assert_eq!(
        text_of(&workspace, &document),
        "Title.\n\nIntro. Two.\n\nAlpha one.\nAlpha two.\nBeta one.\nGamma.\nDone."
    );

    let edits = workspace.borrow().applied_edits().to_vec();
    assert_eq!(edits.len(), 1, "exactly one format action");
    assert_eq!(edits[0].range.start, Position::new(4, 0));
    assert_eq!(edits[0].range.end, Position::new(6, "Gamma. Done.".len()));
    assert_eq!(notifications_of(&workspace), vec![Notification::info(FORMATTED_PASTE_MESSAGE)]);
}

#[tokio::test(start_paused = true)]
async fn test_paste_absorbs_following_paragraph() {
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = Session::open("\n\nTail one. Tail two.").await;
    let driver = ospl::ReplayDriver::new(workspace.clone(), document.clone(), workspace.borrow().events());

    let script = ReplayScript {
        steps: vec![insert(0, "Pasted one.\nPasted two.")],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    assert_eq!(
        text_of(&workspace, &document),
        "Pasted one.\nPasted two.\n\nTail one.\nTail two."
    );
}

#[tokio::test(start_paused = true)]
async fn test_paste_ending_in_newline_keeps_it() {
    let session = Session::open("Intro.").await;
    let driver = session.driver();
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = session;

    let script = ReplayScript {
        steps: vec![ReplayStep::Insert {
            line: 0,
            character: 6,
            text: "\n\nPasted one. Pasted two.\n".to_string(),
        }],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    assert_eq!(
        text_of(&workspace, &document),
        "Intro.\n\nPasted one.\nPasted two.\n"
    );
    assert_eq!(notifications_of(&workspace), vec![Notification::info(FORMATTED_PASTE_MESSAGE)]);
}

#[tokio::test(start_paused = true)]
async fn test_paste_of_blank_lines_keeps_them() {
    let session = Session::open("One. Two.").await;
    let driver = session.driver();
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = session;

    let script = ReplayScript {
        steps: vec![insert(0, "\n\n")],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    // the pasted lines sit above the paragraph, which is formatted with them intact
    assert_eq!(text_of(&workspace, &document), "\n\nOne.\nTwo.");
    assert_eq!(accepted_edits(&workspace), 1);
}

#[tokio::test(start_paused = true)]
async fn test_typing_formats_cursor_paragraph_once_settled() {
    let session = Session::open("Keep. This.\n\nFirst one. Second one").await;
    let driver = session.driver();
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = session;

    let script = ReplayScript {
        steps: vec![
            ReplayStep::Cursor {
                line: 2,
                character: 21,
            },
            ReplayStep::Insert {
                line: 2,
                character: 21,
                text: ".".to_string(),
            },
        ],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    // only the cursor paragraph is touched; the automatic path stays silent
    assert_eq!(text_of(&workspace, &document), "Keep. This.\n\nFirst one.\nSecond one.");
    assert!(notifications_of(&workspace).is_empty());
    assert_eq!(accepted_edits(&workspace), 1);
}

/// An already formatted paragraph is not rewritten
#[tokio::test(start_paused = true)]
async fn test_typing_in_formatted_paragraph_requests_no_edit() {
    let session = Session::open("First line.\nSecond line").await;
    let driver = session.driver();
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = session;

    let script = ReplayScript {
        steps: vec![ReplayStep::Insert {
            line: 1,
            character: 11,
            text: "!".to_string(),
        }],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    assert_eq!(text_of(&workspace, &document), "First line.\nSecond line!");
    assert!(workspace.borrow().applied_edits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_own_edit_does_not_retrigger() {
    let session = Session::open("One. Two.").await;
    let driver = session.driver();
    let Session {
        workspace,
        mut engine,
        receiver,
        ..
    } = session;

    let script = ReplayScript {
        steps: vec![
            ReplayStep::Command { name: Command::Format },
            // well past debounce and grace: a re-triggered pass would have run by now
            wait(2_000),
        ],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    assert_eq!(workspace.borrow().applied_edits().len(), 1);
    assert_eq!(notifications_of(&workspace), vec![Notification::info(FORMATTED_MESSAGE)]);
    assert!(!engine.aggregator().is_pending(&DocumentId::new("file:///notes.md")));
}

/// An edit to one document never mutes genuine edits to another
#[tokio::test(start_paused = true)]
async fn test_suppression_is_per_document() {
    let Session {
        workspace,
        mut engine,
        receiver,
        events,
        document: first,
    } = Session::open("Alpha. Beta.").await;
    let second = DocumentId::new("file:///other.md");
    workspace.borrow_mut().open(second.clone(), "Gamma. Delta");

    let user = async {
        events.send(EngineEvent::Invoke(Command::Format)).unwrap();
        // the manual edit lands; `first` is now inside its grace window
        sleep(Duration::from_millis(10)).await;
        assert_eq!(text_of(&workspace, &first), "Alpha.\nBeta.");

        {
            let mut workspace = workspace.borrow_mut();
            workspace.focus(&second).unwrap();
            workspace.insert(&second, Position::new(0, 12), ".").unwrap();
        }
        sleep(Duration::from_millis(1_000)).await;
        events.send(EngineEvent::Shutdown).unwrap();
    };
    tokio::join!(engine.run(receiver), user);

    assert_eq!(text_of(&workspace, &second), "Gamma.\nDelta.");
    assert_eq!(accepted_edits(&workspace), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_apply_reports_and_recovers() {
    let Session {
        workspace,
        mut engine,
        receiver,
        events,
        document,
    } = Session::open("").await;
    workspace.borrow_mut().set_reject_edits(true);

    let user = async {
        workspace
            .borrow_mut()
            .insert(&document, Position::default(), "Pasted one. Pasted two.\nMore.")
            .unwrap();
        sleep(Duration::from_millis(700)).await;

        workspace.borrow_mut().set_reject_edits(false);
        workspace
            .borrow_mut()
            .insert(&document, Position::new(1, 5), " Again.\nAnd again.")
            .unwrap();
        sleep(Duration::from_millis(700)).await;
        events.send(EngineEvent::Shutdown).unwrap();
    };
    tokio::join!(engine.run(receiver), user);

    assert_eq!(
        notifications_of(&workspace),
        vec![
            Notification::error(FORMAT_FAILED_MESSAGE),
            Notification::info(FORMATTED_PASTE_MESSAGE),
        ]
    );
    // the refused first paste stays as typed; the second one is formatted
    assert_eq!(
        text_of(&workspace, &document),
        "Pasted one. Pasted two.\nMore.\nAgain.\nAnd again."
    );
}

#[tokio::test(start_paused = true)]
async fn test_disabled_auto_format_ignores_edits_but_not_commands() {
    let session = Session::open_with("Start.", Settings { auto_format: false }).await;
    let driver = session.driver();
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = session;

    let script = ReplayScript {
        steps: vec![
            insert(0, "Pasted one. Pasted two.\n"),
            wait(1_000),
            ReplayStep::Cursor { line: 0, character: 0 },
            ReplayStep::Command { name: Command::Format },
        ],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    assert_eq!(workspace.borrow().applied_edits().len(), 1, "only the manual format");
    assert_eq!(text_of(&workspace, &document), "Pasted one.\nPasted two.\nStart.");
}

#[tokio::test(start_paused = true)]
async fn test_close_drops_pending_format() {
    let session = Session::open("").await;
    let driver = session.driver();
    let Session {
        workspace,
        mut engine,
        receiver,
        document,
        ..
    } = session;

    let script = ReplayScript {
        steps: vec![insert(0, "One. Two.\nThree."), wait(100), ReplayStep::Close],
    };
    let ((), played) = tokio::join!(engine.run(receiver), driver.play(&script));
    played.unwrap();

    assert!(workspace.borrow().applied_edits().is_empty());
    assert!(workspace.borrow().text(&document).is_none());
    assert!(!engine.aggregator().is_pending(&document));
}

//! Test doubles for the terminal and for collaborators
//!
//! `ScriptedConsole` replays queued key presses and records every terminal
//! acquire/release, `MockRunner` records every command and replays canned
//! results. Together with ratatui's `TestBackend` they drive the whole
//! navigation flow without a terminal or any network tool installed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

use crate::event::{Console, Event};
use crate::process::{CommandSpec, Exit, Mode, ProcessResult, Runner};
use crate::tui::Screen;

pub const TEST_WIDTH: u16 = 80;
pub const TEST_HEIGHT: u16 = 24;

/// Shared record of console transitions, readable after the console has
/// been moved into a screen.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog(Arc<Mutex<Vec<&'static str>>>);

impl ConsoleLog {
    fn push(&self, entry: &'static str) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn transitions(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

pub struct ScriptedConsole {
    events: VecDeque<Event>,
    log: ConsoleLog,
}

impl ScriptedConsole {
    pub fn new<I: IntoIterator<Item = KeyCode>>(keys: I) -> Self {
        Self::from_events(
            keys.into_iter()
                .map(|code| KeyEvent::new(code, KeyModifiers::NONE)),
        )
    }

    pub fn from_events<I: IntoIterator<Item = KeyEvent>>(keys: I) -> Self {
        Self {
            events: keys.into_iter().map(Event::Key).collect(),
            log: ConsoleLog::default(),
        }
    }

    pub fn empty() -> Self {
        Self::from_events(Vec::new())
    }

    pub fn with_resize_first(mut self) -> Self {
        self.events.push_front(Event::Resize);
        self
    }

    pub fn log(&self) -> ConsoleLog {
        self.log.clone()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    fn enter(&mut self) -> Result<()> {
        self.log.push("enter");
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        self.log.push("leave");
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<Event>> {
        Ok(self.events.pop_front())
    }
}

/// Records `(command, mode)` pairs and answers with queued results.
/// Once the queue is empty every command succeeds without output.
#[derive(Default)]
pub struct MockRunner {
    calls: Arc<Mutex<Vec<(CommandSpec, Mode)>>>,
    results: VecDeque<ProcessResult>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, result: ProcessResult) -> Self {
        self.results.push_back(result);
        self
    }

    pub fn respond_lines(self, lines: &[&str]) -> Self {
        self.respond(ProcessResult::new(
            Exit::Success,
            lines.iter().map(|line| line.to_string()).collect(),
        ))
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<(CommandSpec, Mode)>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Runner for MockRunner {
    async fn run(&mut self, command: &CommandSpec, mode: Mode) -> ProcessResult {
        self.calls.lock().unwrap().push((command.clone(), mode));
        self.results
            .pop_front()
            .unwrap_or_else(|| ProcessResult::from_exit(Exit::Success))
    }
}

pub fn headless_screen(console: ScriptedConsole) -> Screen<TestBackend> {
    let terminal = Terminal::new(TestBackend::new(TEST_WIDTH, TEST_HEIGHT)).unwrap();
    Screen::new(terminal, Box::new(console))
}

/// Buffer contents as text, one line per row.
pub fn buffer_text(buffer: &Buffer) -> String {
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width.max(1))
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Program and arguments of every recorded call, joined with spaces.
pub fn recorded(calls: &Arc<Mutex<Vec<(CommandSpec, Mode)>>>) -> Vec<String> {
    calls
        .lock()
        .unwrap()
        .iter()
        .map(|(command, _)| command.to_string())
        .collect()
}

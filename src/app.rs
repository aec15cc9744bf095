use std::sync::Arc;

use anyhow::Result;
use log::{debug, info};
use ratatui::backend::Backend;

use crate::config::Config;
use crate::dialog;
use crate::handler::handle_key_events;
use crate::menu::{Menu, MenuKind};
use crate::process::{CommandSpec, Exit, Mode, ProcessResult, Runner};
use crate::tui::Screen;
use crate::ui::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    MainMenu,
    WifiMenu,
    BluetoothMenu,
    /// An action handler is running.
    Busy,
}

/// What the navigation stack does once an action handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Stay,
    Push(MenuKind),
    Pop,
    Exit,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub kind: MenuKind,
    pub menu: Menu,
}

impl Level {
    fn new(kind: MenuKind) -> Self {
        Self {
            kind,
            menu: kind.menu(),
        }
    }
}

/// Active menu levels, the last one is on screen. The main menu at the
/// bottom is never popped.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    levels: Vec<Level>,
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self {
            levels: vec![Level::new(MenuKind::Main)],
        }
    }
}

impl NavigationStack {
    pub fn push(&mut self, kind: MenuKind) {
        self.levels.push(Level::new(kind));
    }

    /// Returns false when only the root is left.
    pub fn pop(&mut self) -> bool {
        if self.levels.len() > 1 {
            self.levels.pop();
            true
        } else {
            false
        }
    }

    pub fn top(&self) -> &Level {
        // the root is never popped
        &self.levels[self.levels.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut Level {
        let last = self.levels.len() - 1;
        &mut self.levels[last]
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

pub struct App<B: Backend> {
    pub running: bool,
    pub screen: Screen<B>,
    pub runner: Box<dyn Runner>,
    pub config: Arc<Config>,
    pub stack: NavigationStack,
    busy: bool,
}

impl<B: Backend> App<B> {
    pub fn new(screen: Screen<B>, runner: Box<dyn Runner>, config: Arc<Config>) -> Self {
        Self {
            running: true,
            screen,
            runner,
            config,
            stack: NavigationStack::default(),
            busy: false,
        }
    }

    pub fn state(&self) -> State {
        if self.busy {
            return State::Busy;
        }
        match self.stack.top().kind {
            MenuKind::Main => State::MainMenu,
            MenuKind::Wifi => State::WifiMenu,
            MenuKind::Bluetooth => State::BluetoothMenu,
        }
    }

    /// Runs `handler` with the application in [`State::Busy`].
    pub(crate) async fn while_busy<T>(&mut self, handler: impl AsyncFnOnce(&mut Self) -> T) -> T {
        self.busy = true;
        let output = handler(self).await;
        self.busy = false;
        output
    }

    /// Runs the navigation loop until the operator quits, then restores the
    /// terminal.
    pub async fn run(&mut self) -> Result<()> {
        self.screen.init()?;
        info!("netman started");

        let mut result = Ok(());
        while self.running {
            result = self.step().await;
            if result.is_err() {
                break;
            }
        }

        self.screen.teardown()?;
        info!("netman stopped");
        result
    }

    /// Draws the current menu and handles one key press.
    pub async fn step(&mut self) -> Result<()> {
        self.render()?;

        match self.screen.next_key().await? {
            Some(key) => handle_key_events(key, self).await,
            None => {
                debug!("input closed");
                self.quit();
                Ok(())
            }
        }
    }

    pub fn render(&mut self) -> Result<()> {
        let top = self.stack.top();
        let layer = match top.kind {
            MenuKind::Main => Layer::Home(top.menu.clone()),
            MenuKind::Wifi | MenuKind::Bluetooth => Layer::Menu(top.menu.clone()),
        };
        self.screen.show(layer)
    }

    pub fn apply(&mut self, flow: Flow) {
        match flow {
            Flow::Stay => {}
            Flow::Push(kind) => {
                debug!("entering {kind:?} menu");
                self.stack.push(kind);
            }
            Flow::Pop => self.back(),
            Flow::Exit => self.quit(),
        }
    }

    /// Leaves the current menu, quitting from the root.
    pub fn back(&mut self) {
        if self.stack.pop() {
            debug!("back to {:?} menu", self.stack.top().kind);
        } else {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Captures the sanitized output of `command`. A command that could not
    /// be started is reported to the operator and yields `None`.
    pub async fn capture(&mut self, command: &CommandSpec) -> Result<Option<Vec<String>>> {
        let mode = Mode::Capture {
            limit: self.config.capture_limit,
        };
        let result = self.runner.run(command, mode).await;

        if let Exit::NotLaunched(reason) = &result.exit {
            let message = format!("Failed to execute command.\n{reason}");
            dialog::acknowledge(&mut self.screen, "Error", &message).await?;
            return Ok(None);
        }
        Ok(Some(result.lines))
    }

    /// Runs `command` to completion with its output discarded.
    pub async fn run_quiet(&mut self, command: &CommandSpec) -> ProcessResult {
        self.runner.run(command, Mode::Quiet).await
    }
}

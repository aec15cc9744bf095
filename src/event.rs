use std::io;

use anyhow::{Result, bail};
use async_trait::async_trait;
use crossterm::{
    cursor,
    event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize,
}

/// What a key means to a menu or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Next,
    Previous,
    Activate,
    Back,
    /// Digit shortcut, zero based.
    Jump(usize),
    Quit,
    Ignore,
}

pub fn nav_key(key: KeyEvent) -> Nav {
    match key.code {
        KeyCode::Char('c' | 'C') if key.modifiers.contains(KeyModifiers::CONTROL) => Nav::Quit,
        KeyCode::Char('j') | KeyCode::Down => Nav::Next,
        KeyCode::Char('k') | KeyCode::Up => Nav::Previous,
        KeyCode::Enter => Nav::Activate,
        KeyCode::Char('q') | KeyCode::Esc => Nav::Back,
        KeyCode::Char(c @ '1'..='9') => Nav::Jump(c as usize - '1' as usize),
        _ => Nav::Ignore,
    }
}

/// Owner of the real terminal mode and of the input stream.
#[async_trait]
pub trait Console: Send {
    /// Raw input, no echo, alternate screen, hidden cursor.
    fn enter(&mut self) -> Result<()>;

    /// Gives the terminal back in its cooked state.
    fn leave(&mut self) -> Result<()>;

    /// Next key press or resize. `None` once input is closed.
    async fn next_event(&mut self) -> Result<Option<Event>>;
}

#[derive(Default)]
pub struct CrosstermConsole {
    events: Option<EventStream>,
}

impl CrosstermConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Console for CrosstermConsole {
    fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        self.events = Some(EventStream::new());
        debug!("terminal acquired");
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        // the stream reads stdin in the background, drop it before a child needs it
        self.events = None;
        execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()?;
        debug!("terminal released");
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<Event>> {
        let Some(events) = self.events.as_mut() else {
            bail!("input requested while the terminal is released");
        };

        while let Some(event) = events.next().await {
            match event? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    return Ok(Some(Event::Key(key)));
                }
                CrosstermEvent::Resize(_, _) => return Ok(Some(Event::Resize)),
                _ => {}
            }
        }

        Ok(None)
    }
}

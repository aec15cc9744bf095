use std::io::{self, Stdout};
use std::ops::{Deref, DerefMut};

use anyhow::{Result, anyhow, bail};
use crossterm::event::KeyEvent;
use log::{debug, error};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::event::{Console, CrosstermConsole, Event};
use crate::ui::{self, Layer, Overlay};

pub type Tui = Screen<CrosstermBackend<Stdout>>;

/// The process wide terminal surface.
///
/// It retains what is on screen (a base layer plus at most one overlay) so
/// that closing an overlay, resizing or resuming after a suspension repaints
/// exactly what was visible before.
pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    console: Box<dyn Console>,
    base: Option<Layer>,
    overlay: Option<Overlay>,
    active: bool,
    suspended: usize,
}

impl Tui {
    pub fn stdout() -> Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Screen::new(terminal, Box::new(CrosstermConsole::new())))
    }
}

impl<B: Backend> Screen<B> {
    pub fn new(terminal: Terminal<B>, console: Box<dyn Console>) -> Self {
        Self {
            terminal,
            console,
            base: None,
            overlay: None,
            active: false,
            suspended: 0,
        }
    }

    pub fn init(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        self.console.enter()?;
        self.active = true;
        self.clear()
    }

    /// Restores the terminal. Safe to call any number of times.
    pub fn teardown(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.suspended > 0 {
            // the console was already released by the outermost suspension
            return Ok(());
        }
        self.console.leave()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended > 0
    }

    pub fn base(&self) -> Option<&Layer> {
        self.base.as_ref()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    /// Replaces the base layer and drops any overlay.
    pub fn show(&mut self, layer: Layer) -> Result<()> {
        self.base = Some(layer);
        self.overlay = None;
        self.repaint()
    }

    pub fn show_overlay(&mut self, overlay: Overlay) -> Result<()> {
        self.overlay = Some(overlay);
        self.repaint()
    }

    pub fn close_overlay(&mut self) -> Result<()> {
        self.overlay = None;
        self.repaint()
    }

    pub fn repaint(&mut self) -> Result<()> {
        if self.suspended > 0 {
            bail!("render requested while the screen is suspended");
        }

        let base = self.base.as_ref();
        let overlay = self.overlay.as_ref();
        self.terminal
            .draw(|frame| ui::render(frame, base, overlay))
            .map_err(|e| anyhow!("failed to draw the screen: {e}"))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.terminal
            .clear()
            .map_err(|e| anyhow!("failed to clear the screen: {e}"))
    }

    /// Waits for the next key press, repainting on resize.
    /// `None` means input is closed.
    pub async fn next_key(&mut self) -> Result<Option<KeyEvent>> {
        loop {
            match self.console.next_event().await? {
                Some(Event::Key(key)) => return Ok(Some(key)),
                Some(Event::Resize) => self.repaint()?,
                None => return Ok(None),
            }
        }
    }

    /// Hands the bare terminal over until the returned guard is resumed or
    /// dropped. Suspensions nest, only the outermost one touches the terminal.
    pub fn suspend(&mut self) -> Result<Suspension<'_, B>> {
        if self.suspended == 0 && self.active {
            self.console.leave()?;
            debug!("screen suspended");
        }
        self.suspended += 1;
        Ok(Suspension {
            screen: self,
            resumed: false,
        })
    }

    fn resume(&mut self) -> Result<()> {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended > 0 || !self.active {
            return Ok(());
        }

        self.console.enter()?;
        // force a full repaint, the previous frame is gone from the terminal
        self.clear()?;
        debug!("screen resumed");
        self.repaint()
    }
}

impl<B: Backend> Drop for Screen<B> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            error!("failed to restore the terminal: {e}");
        }
    }
}

/// A suspended screen. Resumes on drop if `resume` was not called.
pub struct Suspension<'a, B: Backend> {
    screen: &'a mut Screen<B>,
    resumed: bool,
}

impl<B: Backend> Suspension<'_, B> {
    pub fn resume(mut self) -> Result<()> {
        self.resumed = true;
        self.screen.resume()
    }
}

impl<B: Backend> Deref for Suspension<'_, B> {
    type Target = Screen<B>;

    fn deref(&self) -> &Self::Target {
        &*self.screen
    }
}

impl<B: Backend> DerefMut for Suspension<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.screen
    }
}

impl<B: Backend> Drop for Suspension<'_, B> {
    fn drop(&mut self) {
        if !self.resumed
            && let Err(e) = self.screen.resume()
        {
            error!("failed to resume the screen: {e}");
        }
    }
}

/// Restores the terminal before the default panic message is printed.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        let _ = crossterm::execute!(io::stdout(), crossterm::cursor::Show);
        original_hook(panic_info);
    }));
}

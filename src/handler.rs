use anyhow::Result;
use crossterm::event::KeyEvent;
use log::debug;
use ratatui::backend::Backend;

use crate::app::{App, Flow};
use crate::bluetooth;
use crate::dialog;
use crate::event::{Nav, nav_key};
use crate::menu::{BluetoothAction, MainAction, MenuKind, WifiAction, action_at};
use crate::wifi;

pub const HELP: &str =
    "Navigate with j/k or arrows. Enter to select. q/ESC to go back. Run with sudo!";

pub async fn handle_key_events<B: Backend>(key_event: KeyEvent, app: &mut App<B>) -> Result<()> {
    match nav_key(key_event) {
        Nav::Next => app.stack.top_mut().menu.next(),

        Nav::Previous => app.stack.top_mut().menu.previous(),

        Nav::Activate => activate(app).await?,

        Nav::Jump(index) => {
            if app.stack.top_mut().menu.select(index) {
                activate(app).await?;
            }
        }

        Nav::Back => app.back(),

        Nav::Quit => app.quit(),

        Nav::Ignore => {}
    }
    Ok(())
}

/// Runs the action under the highlight of the current menu. The highlight is
/// left where it was.
async fn activate<B: Backend>(app: &mut App<B>) -> Result<()> {
    let level = app.stack.top();
    let (kind, index) = (level.kind, level.menu.highlight());
    debug!("activating item {index} of the {kind:?} menu");

    let flow = app
        .while_busy(async |app| match kind {
            MenuKind::Main => match action_at::<MainAction>(index) {
                Some(action) => main_menu(action, app).await,
                None => Ok(Flow::Stay),
            },
            MenuKind::Wifi => match action_at::<WifiAction>(index) {
                Some(action) => wifi::handle(action, app).await,
                None => Ok(Flow::Stay),
            },
            MenuKind::Bluetooth => match action_at::<BluetoothAction>(index) {
                Some(action) => bluetooth::handle(action, app).await,
                None => Ok(Flow::Stay),
            },
        })
        .await;

    app.apply(flow?);
    Ok(())
}

async fn main_menu<B: Backend>(action: MainAction, app: &mut App<B>) -> Result<Flow> {
    let flow = match action {
        MainAction::Wifi => Flow::Push(MenuKind::Wifi),
        MainAction::Bluetooth => Flow::Push(MenuKind::Bluetooth),
        MainAction::Help => {
            dialog::acknowledge(&mut app.screen, "Help", HELP).await?;
            Flow::Stay
        }
        MainAction::Exit => Flow::Exit,
    };
    Ok(flow)
}

//! Modal overlays that block the navigation loop until the operator answers.
//!
//! Every function leaves the screen showing exactly the base layer it found,
//! the overlay it opened is closed before returning.

use std::time::{Duration, Instant};

use anyhow::Result;
use log::debug;
use ratatui::backend::Backend;
use tokio::time::MissedTickBehavior;

use crate::event::{Nav, nav_key};
use crate::menu::Menu;
use crate::process::{CommandSpec, Exit, Mode, POLL_INTERVAL, ProcessResult, Runner};
use crate::tui::Screen;
use crate::ui::{Overlay, Popup, Progress};

/// Shows `message` and waits for a single key press.
pub async fn acknowledge<B: Backend>(screen: &mut Screen<B>, title: &str, message: &str) -> Result<()> {
    screen.show_overlay(Overlay::Popup(Popup::acknowledge(title, message)))?;
    // any key, including a closed input, dismisses the popup
    let _ = screen.next_key().await?;
    screen.close_overlay()
}

/// Lets the operator pick one of `items`. Returns the index in `items`, or
/// `None` when the list was cancelled.
///
/// An empty list never becomes navigable: a "No items found." popup is shown
/// and the selection is cancelled right away.
pub async fn select_from_list<B: Backend>(
    screen: &mut Screen<B>,
    title: &str,
    items: Vec<String>,
) -> Result<Option<usize>> {
    if items.is_empty() {
        acknowledge(screen, title, "No items found.").await?;
        return Ok(None);
    }

    let mut list = Menu::new(title, items);
    let choice = loop {
        screen.show_overlay(Overlay::List(list.clone()))?;

        let Some(key) = screen.next_key().await? else {
            break None;
        };
        match nav_key(key) {
            Nav::Next => list.next(),
            Nav::Previous => list.previous(),
            Nav::Activate => break Some(list.highlight()),
            Nav::Back | Nav::Quit => break None,
            Nav::Jump(_) | Nav::Ignore => {}
        }
    };

    debug!("list `{title}` answered with {choice:?}");
    screen.close_overlay()?;
    Ok(choice)
}

/// Asks for a line of text through the external prompt tool.
///
/// `Some("")` is an empty answer, `None` means the operator cancelled the
/// prompt or the tool could not be started.
pub async fn prompt_text<B: Backend>(
    screen: &mut Screen<B>,
    runner: &mut dyn Runner,
    tool: &str,
    title: &str,
    label: &str,
    masked: bool,
) -> Result<Option<String>> {
    let kind = if masked { "--passwordbox" } else { "--inputbox" };
    let command =
        CommandSpec::new(tool).args(["--stdout", "--title", title, kind, label, "10", "60"]);

    let suspended = screen.suspend()?;
    let result = runner.run(&command, Mode::Prompt).await;
    suspended.resume()?;

    match result.exit {
        Exit::Success => Ok(Some(result.lines.into_iter().next().unwrap_or_default())),
        Exit::NotLaunched(reason) => {
            acknowledge(screen, "Error", &format!("Failed to execute command.\n{reason}")).await?;
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Runs `command` in animated mode while a progress overlay is repainted at
/// the poll cadence. The child is killed once `timeout` has elapsed.
pub async fn wait_with_progress<B: Backend>(
    screen: &mut Screen<B>,
    runner: &mut dyn Runner,
    title: &str,
    message: &str,
    command: &CommandSpec,
    timeout: Duration,
) -> Result<ProcessResult> {
    let started = Instant::now();
    let mut progress = Progress {
        title: title.to_string(),
        message: message.to_string(),
        tick: 0,
        elapsed: Duration::ZERO,
        timeout,
    };

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut run = runner.run(command, Mode::Animated { timeout });
    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            _ = ticker.tick() => {
                progress.elapsed = started.elapsed().min(timeout);
                screen.show_overlay(Overlay::Progress(progress.clone()))?;
                progress.tick = progress.tick.wrapping_add(1);
            }
        }
    };

    screen.close_overlay()?;
    Ok(result)
}

/// Gives the bare terminal to `command` until it exits and the operator
/// pressed Enter.
pub async fn run_interactive<B: Backend>(
    screen: &mut Screen<B>,
    runner: &mut dyn Runner,
    command: &CommandSpec,
) -> Result<ProcessResult> {
    let suspended = screen.suspend()?;
    let result = runner.run(command, Mode::Interactive).await;
    suspended.resume()?;
    Ok(result)
}

/// Turns the outcome of a state changing command into a popup.
pub async fn report<B: Backend>(
    screen: &mut Screen<B>,
    result: &ProcessResult,
    title: &str,
    success: &str,
    failure: &str,
) -> Result<()> {
    match &result.exit {
        Exit::Success => acknowledge(screen, title, success).await,
        Exit::NotLaunched(reason) => {
            acknowledge(screen, "Error", &format!("Failed to execute command.\n{reason}")).await
        }
        exit => {
            let mut message = format!("{failure} ({exit})");
            if !result.lines.is_empty() {
                message.push('\n');
                message.push_str(&result.text());
            }
            acknowledge(screen, "Failure", &message).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuKind;
    use crate::test_utils::{MockRunner, ScriptedConsole, buffer_text, headless_screen, recorded};
    use crate::ui::Layer;
    use async_trait::async_trait;
    use crossterm::event::KeyCode;
    use ratatui::backend::TestBackend;

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn screen_on_wifi_menu(console: ScriptedConsole) -> Screen<TestBackend> {
        let mut screen = headless_screen(console);
        screen.init().unwrap();
        screen.show(Layer::Menu(MenuKind::Wifi.menu())).unwrap();
        screen
    }

    #[tokio::test]
    async fn list_returns_original_index() {
        let console = ScriptedConsole::new([KeyCode::Char('j'), KeyCode::Down, KeyCode::Enter]);
        let mut screen = screen_on_wifi_menu(console);
        let before = screen.backend().buffer().clone();

        let choice = select_from_list(&mut screen, "Networks", items(&["a", "b", "c", "d"]))
            .await
            .unwrap();

        assert_eq!(choice, Some(2));
        assert!(screen.overlay().is_none());
        assert_eq!(screen.backend().buffer(), &before);
    }

    #[tokio::test]
    async fn list_highlight_is_clamped() {
        let console = ScriptedConsole::new([
            KeyCode::Up,
            KeyCode::Char('k'),
            KeyCode::Char('j'),
            KeyCode::Char('j'),
            KeyCode::Char('j'),
            KeyCode::Enter,
        ]);
        let mut screen = screen_on_wifi_menu(console);

        let choice = select_from_list(&mut screen, "Devices", items(&["x", "y"]))
            .await
            .unwrap();
        assert_eq!(choice, Some(1));
    }

    #[tokio::test]
    async fn list_cancel_and_closed_input() {
        let mut screen = screen_on_wifi_menu(ScriptedConsole::new([KeyCode::Esc]));
        let choice = select_from_list(&mut screen, "Action", items(&["Pair", "Connect"]))
            .await
            .unwrap();
        assert_eq!(choice, None);

        // digits do not jump inside a list, input then runs dry
        let mut screen = screen_on_wifi_menu(ScriptedConsole::new([KeyCode::Char('2')]));
        let choice = select_from_list(&mut screen, "Action", items(&["Pair", "Connect"]))
            .await
            .unwrap();
        assert_eq!(choice, None);
    }

    #[tokio::test]
    async fn empty_list_short_circuits() {
        let console = ScriptedConsole::new([KeyCode::Enter, KeyCode::Enter]);
        let mut screen = screen_on_wifi_menu(console);

        let choice = select_from_list(&mut screen, "Forget a Network", Vec::new())
            .await
            .unwrap();

        assert_eq!(choice, None);
        assert!(screen.overlay().is_none());
        // only the acknowledgement consumed a key
        assert!(screen.next_key().await.unwrap().is_some());
        assert!(screen.next_key().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn acknowledge_shows_message_until_key() {
        let mut screen = screen_on_wifi_menu(ScriptedConsole::new([KeyCode::Char('x')]));
        screen
            .show_overlay(Overlay::Popup(Popup::acknowledge("Wi-Fi", "Disconnected from network.")))
            .unwrap();
        assert!(buffer_text(screen.backend().buffer()).contains("Disconnected from network."));

        acknowledge(&mut screen, "Wi-Fi", "Disconnected from network.")
            .await
            .unwrap();
        assert!(!buffer_text(screen.backend().buffer()).contains("Disconnected"));
    }

    #[tokio::test]
    async fn prompt_suspends_and_returns_answer() {
        let console = ScriptedConsole::empty();
        let log = console.log();
        let mut screen = screen_on_wifi_menu(console);
        let mut runner = MockRunner::new().respond_lines(&["hunter22"]);
        let calls = runner.calls();

        let answer = prompt_text(&mut screen, &mut runner, "dialog", "Password", "home", true)
            .await
            .unwrap();

        assert_eq!(answer.as_deref(), Some("hunter22"));
        assert_eq!(log.transitions(), ["enter", "leave", "enter"]);
        assert_eq!(
            recorded(&calls),
            ["dialog --stdout --title Password --passwordbox home 10 60"]
        );
        assert_eq!(calls.lock().unwrap()[0].1, Mode::Prompt);
    }

    #[tokio::test]
    async fn prompt_distinguishes_empty_from_cancel() {
        let mut screen = screen_on_wifi_menu(ScriptedConsole::empty());

        let mut runner = MockRunner::new().respond(ProcessResult::from_exit(Exit::Success));
        let empty = prompt_text(&mut screen, &mut runner, "dialog", "SSID", "name", false)
            .await
            .unwrap();
        assert_eq!(empty.as_deref(), Some(""));

        let mut runner = MockRunner::new().respond(ProcessResult::from_exit(Exit::Failed(Some(1))));
        let cancelled = prompt_text(&mut screen, &mut runner, "dialog", "SSID", "name", false)
            .await
            .unwrap();
        assert_eq!(cancelled, None);
    }

    #[tokio::test]
    async fn prompt_reports_missing_tool() {
        let mut screen = screen_on_wifi_menu(ScriptedConsole::new([KeyCode::Enter]));
        let mut runner = MockRunner::new().respond(ProcessResult::from_exit(Exit::NotLaunched(
            "dialog: not found".to_string(),
        )));

        let answer = prompt_text(&mut screen, &mut runner, "dialog", "SSID", "name", false)
            .await
            .unwrap();

        assert_eq!(answer, None);
        assert!(screen.overlay().is_none());
    }

    struct SlowRunner(Duration);

    #[async_trait]
    impl Runner for SlowRunner {
        async fn run(&mut self, _command: &CommandSpec, _mode: Mode) -> ProcessResult {
            tokio::time::sleep(self.0).await;
            ProcessResult::from_exit(Exit::Success)
        }
    }

    #[tokio::test]
    async fn progress_overlay_is_closed_after_wait() {
        let mut screen = screen_on_wifi_menu(ScriptedConsole::empty());
        let before = screen.backend().buffer().clone();
        let mut runner = SlowRunner(Duration::from_millis(350));

        let result = wait_with_progress(
            &mut screen,
            &mut runner,
            "Scanning...",
            "Scanning for Wi-Fi networks...",
            &CommandSpec::new("iwctl"),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(result.success());
        assert!(screen.overlay().is_none());
        assert_eq!(screen.backend().buffer(), &before);
    }

    #[tokio::test]
    async fn interactive_run_is_bracketed_by_suspension() {
        let console = ScriptedConsole::empty();
        let log = console.log();
        let mut screen = screen_on_wifi_menu(console);
        let mut runner = MockRunner::new();
        let calls = runner.calls();

        let command = CommandSpec::new("bluetoothctl").args(["pair", "AA:BB:CC:DD:EE:FF"]);
        run_interactive(&mut screen, &mut runner, &command).await.unwrap();

        assert_eq!(log.transitions(), ["enter", "leave", "enter"]);
        assert_eq!(calls.lock().unwrap()[0].1, Mode::Interactive);
    }

    #[tokio::test]
    async fn failure_report_includes_output() {
        let mut screen = screen_on_wifi_menu(ScriptedConsole::new([KeyCode::Enter]));
        let result = ProcessResult::new(Exit::Failed(Some(1)), vec!["Operation failed".into()]);

        report(&mut screen, &result, "Success", "Connected successfully.", "Failed to connect.")
            .await
            .unwrap();

        assert!(screen.overlay().is_none());
    }
}

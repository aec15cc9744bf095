use anyhow::Result;
use log::info;
use ratatui::backend::Backend;

use crate::app::{App, Flow};
use crate::config::Config;
use crate::dialog;
use crate::menu::WifiAction;
use crate::process::CommandSpec;
use crate::rfkill::{self, Radio};

/// A row of `iwctl station <iface> get-networks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub security: String,
    pub signal: String,
    pub is_connected: bool,
}

impl Network {
    /// iwctl pads its columns with at least two spaces and marks the
    /// connected network with a leading `>`.
    pub fn from_row(row: &str) -> Option<Self> {
        let row = row.trim();
        let (is_connected, row) = match row.strip_prefix('>') {
            Some(rest) => (true, rest),
            None => (false, row),
        };

        let mut columns = columns(row).into_iter();
        let name = columns.next()?.to_string();
        Some(Self {
            name,
            security: columns.next().unwrap_or_default().to_string(),
            signal: columns.next().unwrap_or_default().to_string(),
            is_connected,
        })
    }

    pub fn is_open(&self) -> bool {
        self.security == "open"
    }

    pub fn row(&self) -> String {
        let marker = if self.is_connected { "> " } else { "" };
        format!(
            "{:<25} {:<15} {}",
            format!("{marker}{}", self.name),
            self.security,
            self.signal
        )
    }
}

/// Name column of a row of `iwctl known-networks list`.
pub fn known_network_name(row: &str) -> Option<String> {
    columns(row).first().map(|name| name.to_string())
}

/// Splits on runs of two or more spaces so single spaces inside an SSID
/// survive.
fn columns(row: &str) -> Vec<&str> {
    row.trim()
        .split("  ")
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .collect()
}

fn station(config: &Config) -> CommandSpec {
    CommandSpec::new(&config.tools.iwctl).args(["station", config.wifi_interface.as_str()])
}

pub async fn handle<B: Backend>(action: WifiAction, app: &mut App<B>) -> Result<Flow> {
    match action {
        WifiAction::Scan => scan(app).await?,
        WifiAction::Connect => connect(app).await?,
        WifiAction::Status => status(app).await?,
        WifiAction::Disconnect => disconnect(app).await?,
        WifiAction::Forget => forget(app).await?,
        WifiAction::Radio => rfkill::toggle(app, Radio::Wifi).await?,
        WifiAction::Back => return Ok(Flow::Pop),
    }
    Ok(Flow::Stay)
}

async fn scan<B: Backend>(app: &mut App<B>) -> Result<()> {
    let command = station(&app.config).arg("scan");
    let timeout = app.config.scan_timeout();

    let result = dialog::wait_with_progress(
        &mut app.screen,
        app.runner.as_mut(),
        "Scanning...",
        "Scanning for Wi-Fi networks...",
        &command,
        timeout,
    )
    .await?;

    dialog::report(
        &mut app.screen,
        &result,
        "Scan Complete",
        "Network scan finished.",
        "Network scan failed.",
    )
    .await
}

async fn connect<B: Backend>(app: &mut App<B>) -> Result<()> {
    let command = station(&app.config).arg("get-networks");
    let Some(lines) = app.capture(&command).await? else {
        return Ok(());
    };

    let networks: Vec<Network> = lines.iter().filter_map(|line| Network::from_row(line)).collect();
    let rows = networks.iter().map(Network::row).collect();
    let Some(index) = dialog::select_from_list(
        &mut app.screen,
        "Available Wi-Fi Networks (SSID | Security | Signal)",
        rows,
    )
    .await?
    else {
        return Ok(());
    };
    let network = &networks[index];

    let passphrase = if network.is_open() {
        String::new()
    } else {
        let tool = app.config.tools.dialog.clone();
        let answer = dialog::prompt_text(
            &mut app.screen,
            app.runner.as_mut(),
            &tool,
            "Password Required (leave blank for open networks)",
            &network.name,
            true,
        )
        .await?;

        match answer {
            Some(passphrase) => passphrase,
            None => {
                info!("connection to {} cancelled", network.name);
                return Ok(());
            }
        }
    };

    let mut command = station(&app.config).args(["connect", network.name.as_str()]);
    if !passphrase.is_empty() {
        command = command.arg("--passphrase").secret_arg(passphrase);
    }

    let result = app.run_quiet(&command).await;
    dialog::report(
        &mut app.screen,
        &result,
        "Success",
        "Connected successfully.",
        "Failed to connect.",
    )
    .await
}

async fn status<B: Backend>(app: &mut App<B>) -> Result<()> {
    let command = station(&app.config).arg("show");
    let Some(lines) = app.capture(&command).await? else {
        return Ok(());
    };

    let text = if lines.is_empty() {
        "Not connected or device not found.".to_string()
    } else {
        lines.join("\n")
    };
    dialog::acknowledge(&mut app.screen, "Wi-Fi Status", &text).await
}

async fn disconnect<B: Backend>(app: &mut App<B>) -> Result<()> {
    let command = station(&app.config).arg("disconnect");
    let result = app.run_quiet(&command).await;
    dialog::report(
        &mut app.screen,
        &result,
        "Wi-Fi",
        "Disconnected from network.",
        "Failed to disconnect.",
    )
    .await
}

async fn forget<B: Backend>(app: &mut App<B>) -> Result<()> {
    let command = CommandSpec::new(&app.config.tools.iwctl).args(["known-networks", "list"]);
    let Some(lines) = app.capture(&command).await? else {
        return Ok(());
    };

    let names: Vec<String> = lines.iter().filter_map(|line| known_network_name(line)).collect();
    let Some(index) =
        dialog::select_from_list(&mut app.screen, "Forget a Network", names.clone()).await?
    else {
        return Ok(());
    };

    let command = CommandSpec::new(&app.config.tools.iwctl).args([
        "known-networks",
        names[index].as_str(),
        "forget",
    ]);
    let result = app.run_quiet(&command).await;
    dialog::report(
        &mut app.screen,
        &result,
        "Success",
        "Network forgotten.",
        "Could not forget network.",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Exit, Mode, ProcessResult};
    use crate::test_utils::{MockRunner, ScriptedConsole, headless_screen, recorded};
    use crossterm::event::KeyCode;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn app(keys: Vec<KeyCode>, runner: MockRunner) -> App<TestBackend> {
        let mut app = App::new(
            headless_screen(ScriptedConsole::new(keys)),
            Box::new(runner),
            Arc::new(Config::default()),
        );
        app.screen.init().unwrap();
        app.stack.push(crate::menu::MenuKind::Wifi);
        app.render().unwrap();
        app
    }

    #[test]
    fn network_rows() {
        let connected = Network::from_row("  > home net          psk          ****").unwrap();
        assert_eq!(connected.name, "home net");
        assert_eq!(connected.security, "psk");
        assert_eq!(connected.signal, "****");
        assert!(connected.is_connected);

        let open = Network::from_row("    Cafe-Guest        open         **").unwrap();
        assert!(open.is_open());
        assert!(!open.is_connected);
        assert_eq!(open.row(), format!("{:<25} {:<15} **", "Cafe-Guest", "open"));

        assert_eq!(Network::from_row("   "), None);
    }

    #[test]
    fn known_network_names() {
        assert_eq!(
            known_network_name("  home net       psk      Oct  5, 10:00 AM").as_deref(),
            Some("home net")
        );
        assert_eq!(known_network_name(""), None);
    }

    #[tokio::test]
    async fn connect_passes_passphrase_as_secret() {
        let runner = MockRunner::new()
            .respond_lines(&["  home-net   psk   ****", "  cafe   open   **"])
            .respond_lines(&["hunter22"]);
        let calls = runner.calls();
        let mut app = app(vec![KeyCode::Enter, KeyCode::Enter], runner);

        handle(WifiAction::Connect, &mut app).await.unwrap();

        assert_eq!(
            recorded(&calls),
            [
                "iwctl station wlan0 get-networks",
                "dialog --stdout --title Password Required (leave blank for open networks) --passwordbox home-net 10 60",
                "iwctl station wlan0 connect home-net --passphrase ****",
            ]
        );
        let calls = calls.lock().unwrap();
        assert_eq!(calls[2].0.args.last().map(String::as_str), Some("hunter22"));
        assert_eq!(calls[2].1, Mode::Quiet);
    }

    #[tokio::test]
    async fn open_network_connects_without_prompt() {
        let runner = MockRunner::new().respond_lines(&["  home-net   psk   ****", "  cafe   open   **"]);
        let calls = runner.calls();
        let mut app = app(vec![KeyCode::Char('j'), KeyCode::Enter, KeyCode::Enter], runner);

        handle(WifiAction::Connect, &mut app).await.unwrap();

        assert_eq!(
            recorded(&calls),
            ["iwctl station wlan0 get-networks", "iwctl station wlan0 connect cafe"]
        );
    }

    #[tokio::test]
    async fn blank_passphrase_connects_without_one() {
        let runner = MockRunner::new()
            .respond_lines(&["  home-net   psk   ****"])
            .respond(ProcessResult::from_exit(Exit::Success));
        let calls = runner.calls();
        let mut app = app(vec![KeyCode::Enter, KeyCode::Enter], runner);

        handle(WifiAction::Connect, &mut app).await.unwrap();

        assert_eq!(
            recorded(&calls).last().map(String::as_str),
            Some("iwctl station wlan0 connect home-net")
        );
    }

    #[tokio::test]
    async fn cancelled_prompt_aborts_connect() {
        let runner = MockRunner::new()
            .respond_lines(&["  home-net   psk   ****"])
            .respond(ProcessResult::from_exit(Exit::Failed(Some(1))));
        let calls = runner.calls();
        let mut app = app(vec![KeyCode::Enter], runner);

        let flow = handle(WifiAction::Connect, &mut app).await.unwrap();

        assert_eq!(flow, Flow::Stay);
        assert_eq!(recorded(&calls).len(), 2);
    }

    #[tokio::test]
    async fn forget_uses_the_selected_name() {
        let runner = MockRunner::new().respond_lines(&[
            "  home net     psk     Oct 5, 10:00 AM",
            "  office       8021x   Sep 1, 09:00 AM",
        ]);
        let calls = runner.calls();
        let mut app = app(vec![KeyCode::Char('j'), KeyCode::Enter, KeyCode::Enter], runner);

        handle(WifiAction::Forget, &mut app).await.unwrap();

        assert_eq!(
            recorded(&calls),
            ["iwctl known-networks list", "iwctl known-networks office forget"]
        );
    }

    #[tokio::test]
    async fn status_and_disconnect() {
        let runner = MockRunner::new().respond_lines(&[]);
        let calls = runner.calls();
        let mut app = app(vec![KeyCode::Enter, KeyCode::Enter], runner);

        handle(WifiAction::Status, &mut app).await.unwrap();
        handle(WifiAction::Disconnect, &mut app).await.unwrap();

        assert_eq!(
            recorded(&calls),
            ["iwctl station wlan0 show", "iwctl station wlan0 disconnect"]
        );
    }

    #[tokio::test]
    async fn back_pops() {
        let mut app = app(Vec::new(), MockRunner::new());
        assert_eq!(handle(WifiAction::Back, &mut app).await.unwrap(), Flow::Pop);
    }
}

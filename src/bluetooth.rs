use anyhow::Result;
use log::info;
use ratatui::backend::Backend;

use crate::app::{App, Flow};
use crate::config::Config;
use crate::dialog;
use crate::menu::BluetoothAction;
use crate::process::{CommandSpec, Exit};
use crate::rfkill::{self, Radio};

const DEVICE_ACTIONS: [&str; 3] = ["Pair", "Connect", "Cancel"];

/// A `Device <mac> <name>` line of `bluetoothctl devices`, without the
/// prefix and with whitespace collapsed.
pub fn device_row(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("Device ")?;
    let row = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    (!row.is_empty()).then_some(row)
}

pub fn mac(row: &str) -> Option<&str> {
    row.split_whitespace().next()
}

pub fn is_powered(lines: &[String]) -> bool {
    lines.iter().any(|line| line.contains("Powered: yes"))
}

fn bluetoothctl(config: &Config) -> CommandSpec {
    CommandSpec::new(&config.tools.bluetoothctl)
}

pub async fn handle<B: Backend>(action: BluetoothAction, app: &mut App<B>) -> Result<Flow> {
    match action {
        BluetoothAction::Power => power(app).await?,
        BluetoothAction::Scan => scan(app).await?,
        BluetoothAction::Connect => connect(app).await?,
        BluetoothAction::Disconnect => disconnect(app).await?,
        BluetoothAction::Radio => rfkill::toggle(app, Radio::Bluetooth).await?,
        BluetoothAction::Back => return Ok(Flow::Pop),
    }
    Ok(Flow::Stay)
}

async fn power<B: Backend>(app: &mut App<B>) -> Result<()> {
    let query = bluetoothctl(&app.config).arg("show");
    let Some(lines) = app.capture(&query).await? else {
        return Ok(());
    };

    let (state, done) = if is_powered(&lines) {
        ("off", "Powered OFF.")
    } else {
        ("on", "Powered ON.")
    };
    let command = bluetoothctl(&app.config).args(["power", state]);
    let result = app.run_quiet(&command).await;

    dialog::report(
        &mut app.screen,
        &result,
        "Bluetooth",
        done,
        "Could not change the power state.",
    )
    .await
}

async fn scan<B: Backend>(app: &mut App<B>) -> Result<()> {
    let seconds = app.config.bluetooth_scan_secs;
    let command = bluetoothctl(&app.config).args([
        "--timeout".to_string(),
        seconds.to_string(),
        "scan".to_string(),
        "on".to_string(),
    ]);
    let timeout = app.config.bluetooth_scan_timeout();

    let result = dialog::wait_with_progress(
        &mut app.screen,
        app.runner.as_mut(),
        "Scanning...",
        &format!("Scanning for devices for {seconds}s..."),
        &command,
        timeout,
    )
    .await?;

    dialog::report(
        &mut app.screen,
        &result,
        "Scan Complete",
        "Device scan finished.",
        "Device scan failed.",
    )
    .await
}

/// Lists `bluetoothctl devices [filter]` and lets the operator pick one.
/// Returns the MAC address of the chosen device.
async fn pick_device<B: Backend>(
    app: &mut App<B>,
    filter: Option<&str>,
    title: &str,
) -> Result<Option<String>> {
    let mut command = bluetoothctl(&app.config).arg("devices");
    if let Some(filter) = filter {
        command = command.arg(filter);
    }
    let Some(lines) = app.capture(&command).await? else {
        return Ok(None);
    };

    let rows: Vec<String> = lines.iter().filter_map(|line| device_row(line)).collect();
    let Some(index) = dialog::select_from_list(&mut app.screen, title, rows.clone()).await? else {
        return Ok(None);
    };

    Ok(mac(&rows[index]).map(str::to_string))
}

async fn connect<B: Backend>(app: &mut App<B>) -> Result<()> {
    let Some(mac) = pick_device(app, None, "Available Bluetooth Devices").await? else {
        return Ok(());
    };

    let actions = DEVICE_ACTIONS.iter().map(|action| action.to_string()).collect();
    let verb = match dialog::select_from_list(&mut app.screen, "Action", actions).await? {
        Some(0) => "pair",
        Some(1) => "connect",
        _ => {
            info!("no action taken on {mac}");
            return Ok(());
        }
    };

    let command = bluetoothctl(&app.config).args([verb, mac.as_str()]);
    let result = dialog::run_interactive(&mut app.screen, app.runner.as_mut(), &command).await?;

    if let Exit::NotLaunched(reason) = &result.exit {
        let message = format!("Failed to execute command.\n{reason}");
        return dialog::acknowledge(&mut app.screen, "Error", &message).await;
    }
    dialog::acknowledge(
        &mut app.screen,
        "Info",
        "Action attempted. Check device status.",
    )
    .await
}

async fn disconnect<B: Backend>(app: &mut App<B>) -> Result<()> {
    let Some(mac) = pick_device(app, Some("Connected"), "Disconnect a Device").await? else {
        return Ok(());
    };

    let command = bluetoothctl(&app.config).args(["disconnect", mac.as_str()]);
    let result = app.run_quiet(&command).await;
    dialog::report(
        &mut app.screen,
        &result,
        "Bluetooth",
        "Disconnect command sent.",
        "Disconnect failed.",
    )
    .await
}

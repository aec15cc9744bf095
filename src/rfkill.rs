use anyhow::Result;
use ratatui::backend::Backend;
use strum::Display;

use crate::app::App;
use crate::dialog;
use crate::process::CommandSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Radio {
    #[strum(to_string = "Wi-Fi")]
    Wifi,
    Bluetooth,
}

impl Radio {
    /// Device type understood by `rfkill`.
    pub fn kind(self) -> &'static str {
        match self {
            Radio::Wifi => "wlan",
            Radio::Bluetooth => "bluetooth",
        }
    }
}

pub fn is_soft_blocked(lines: &[String]) -> bool {
    lines.iter().any(|line| line.contains("Soft blocked: yes"))
}

/// Unblocks a soft blocked radio, blocks it otherwise.
pub async fn toggle<B: Backend>(app: &mut App<B>, radio: Radio) -> Result<()> {
    let rfkill = app.config.tools.rfkill.clone();
    let query = CommandSpec::new(&rfkill).args(["list", radio.kind()]);
    let Some(lines) = app.capture(&query).await? else {
        return Ok(());
    };

    let title = radio.to_string();
    if lines.is_empty() {
        return dialog::acknowledge(&mut app.screen, &title, "No radio device found.").await;
    }

    let (verb, done) = if is_soft_blocked(&lines) {
        ("unblock", "Radio ON.")
    } else {
        ("block", "Radio OFF.")
    };
    let command = CommandSpec::new(&rfkill).args([verb, radio.kind()]);
    let result = app.run_quiet(&command).await;

    dialog::report(
        &mut app.screen,
        &result,
        &title,
        done,
        "Could not change the radio state.",
    )
    .await
}

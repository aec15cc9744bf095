use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use netman::app::App;
use netman::cli::cli;
use netman::config::Config;
use netman::privilege;
use netman::process::{self, SystemRunner};
use netman::tui::{Tui, install_panic_hook};
use tokio::signal::unix::{SignalKind, signal};

fn main() -> ExitCode {
    cli().get_matches();

    if let Err(e) = privilege::ensure_root() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(run());
    process::shutdown(runtime);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Arc::new(Config::new()?);
    init_logging(&config)?;
    install_panic_hook();

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    let mut app = App::new(Tui::stdout()?, Box::new(SystemRunner), config);
    let result = tokio::select! {
        result = app.run() => result,
        _ = terminate.recv() => {
            info!("terminated");
            Ok(())
        }
        _ = hangup.recv() => {
            info!("terminal hung up");
            Ok(())
        }
    };

    app.screen.teardown()?;
    result
}

/// The screen owns the terminal, so logs only go to a file and only when
/// one is asked for.
fn init_logging(config: &Config) -> Result<()> {
    let path = std::env::var_os("NETMAN_LOG")
        .map(PathBuf::from)
        .or_else(|| config.log_file.clone());
    let Some(path) = path else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Can not open the log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

use clap::{Command, crate_version};

pub fn cli() -> Command {
    Command::new("netman")
        .about("Vim-style terminal menu for managing Wi-Fi and Bluetooth")
        .version(crate_version!())
}

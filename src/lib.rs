pub mod app;

pub mod event;

pub mod ui;

pub mod tui;

pub mod handler;

pub mod config;

pub mod cli;

pub mod menu;

pub mod process;

pub mod sanitize;

pub mod dialog;

pub mod wifi;

pub mod bluetooth;

pub mod rfkill;

pub mod privilege;

#[cfg(test)]
pub mod test_utils;

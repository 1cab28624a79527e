#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

mod app;
mod clipboard;
mod config;
mod error;
#[cfg_attr(not(windows), allow(dead_code))]
mod notification;
mod platform;
mod tray;
#[cfg_attr(not(windows), allow(dead_code))]
mod wide;

use std::process::exit;

use log::info;

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(Some(env_logger::TimestampPrecision::Seconds))
        .init();

    let config = config::Config::default();
    info!("Starting {}", config.app_name);

    let mut platform = platform::NativePlatform::new(&config);
    exit(app::run(&mut platform, config));
}

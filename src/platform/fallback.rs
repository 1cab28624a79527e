//! Backend for platforms without a shell tray or clipboard listener.
//!
//! A polling thread feeds `ClipboardUpdate` events into a channel drained on
//! the main thread. Notifications go to the log. There is no tray menu, so the
//! process runs until it is killed.

use std::sync::mpsc::{self, Receiver, Sender};

use log::{error, info, warn};

use crate::app::{App, Effect, Event, Platform};
use crate::clipboard::{self, ArboardSource, ClipboardSource};
use crate::config::Config;
use crate::error::StartupError;
use crate::tray::{MenuItem, TrayIcon};

pub struct PollingPlatform {
    config: Config,
    events: Option<(Sender<Event>, Receiver<Event>)>,
    source: Option<ArboardSource>,
}

impl PollingPlatform {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            events: None,
            source: None,
        }
    }
}

/// Drain events into `app` until it quits. The channel only closes when the
/// monitor thread died, which is a failure.
fn pump(app: &mut App, events: Receiver<Event>, source: &mut impl ClipboardSource) -> i32 {
    for event in events {
        for effect in app.handle(event, source) {
            match effect {
                Effect::ShowBalloon(balloon) => info!("{}: {}", balloon.title, balloon.body),
                Effect::ShowPopup(popup) => info!("{}", popup.text),
                Effect::ShowMenu | Effect::DestroyMainWindow => {}
                Effect::Quit(code) => return code,
            }
        }
    }
    error!("Clipboard monitor stopped");
    1
}

impl Platform for PollingPlatform {
    fn register_window_classes(&mut self) -> Result<(), StartupError> {
        Ok(())
    }

    fn create_main_window(&mut self) -> Result<(), StartupError> {
        self.events = Some(mpsc::channel());
        Ok(())
    }

    fn install_tray(&mut self, icon: &TrayIcon, _menu: &[MenuItem]) {
        warn!("No system tray on this platform, \"{}\" runs without an icon", icon.tooltip);
    }

    fn add_clipboard_listener(&mut self) -> Result<(), StartupError> {
        let source = ArboardSource::new().map_err(|e| {
            error!("Failed to open clipboard: {e}");
            StartupError::ClipboardListener { os_error: 0 }
        })?;
        self.source = Some(source);

        if let Some((tx, _)) = &self.events {
            clipboard::start_monitor(tx.clone(), self.config.poll_interval());
        }
        Ok(())
    }

    fn show_error(&mut self, err: &StartupError) {
        eprintln!("{}: {err}", self.config.app_name);
    }

    fn run_loop(&mut self, mut app: App) -> i32 {
        let (Some((tx, rx)), Some(source)) = (self.events.take(), self.source.as_mut()) else {
            return 1;
        };
        // The monitor thread holds its own sender.
        drop(tx);

        pump(&mut app, rx, source)
    }

    fn teardown(&mut self) {
        self.events = None;
        self.source = None;
    }
}

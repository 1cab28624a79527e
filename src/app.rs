use log::{debug, error, info};

use crate::clipboard::{self, ClipboardSource};
use crate::config::Config;
use crate::error::StartupError;
use crate::notification::Popup;
use crate::tray::{self, Balloon, MenuAction, MenuItem, TrayIcon, TrayMessage};

/// Everything the event loop can hand to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ClipboardUpdate,
    Tray(TrayMessage),
    Command(u16),
    /// The main window is being destroyed.
    Destroy,
}

/// Work the platform carries out on behalf of the application once the
/// handler has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowBalloon(Balloon),
    ShowPopup(Popup),
    /// Show the tray context menu at the cursor.
    ShowMenu,
    DestroyMainWindow,
    Quit(i32),
}

/// Process-wide application state, owned by the event loop.
pub struct App {
    config: Config,
    tray: TrayIcon,
}

impl App {
    pub fn new(config: Config) -> Self {
        let tray = TrayIcon::new(&config);
        Self { config, tray }
    }

    pub fn tray(&self) -> &TrayIcon {
        &self.tray
    }

    pub fn handle(&mut self, event: Event, clipboard: &mut impl ClipboardSource) -> Vec<Effect> {
        match event {
            Event::ClipboardUpdate => {
                if !clipboard::should_notify(clipboard) {
                    return Vec::new();
                }
                let balloon = self.tray.notify(Balloon::copied(&self.config));
                let popup = Popup::new(self.config.balloon_body.clone(), &self.config);
                debug!("Clipboard changed, notifying");
                vec![Effect::ShowBalloon(balloon), Effect::ShowPopup(popup)]
            }
            Event::Tray(TrayMessage::RightButtonUp) => vec![Effect::ShowMenu],
            Event::Tray(TrayMessage::Other(_)) => Vec::new(),
            Event::Command(id) => match MenuAction::from_id(id) {
                Some(MenuAction::Exit) => {
                    info!("Exit requested from tray menu");
                    vec![Effect::DestroyMainWindow]
                }
                None => Vec::new(),
            },
            Event::Destroy => vec![Effect::Quit(0)],
        }
    }
}

/// The OS services the application runs on top of.
pub trait Platform {
    fn register_window_classes(&mut self) -> Result<(), StartupError>;
    fn create_main_window(&mut self) -> Result<(), StartupError>;
    fn install_tray(&mut self, icon: &TrayIcon, menu: &[MenuItem]);
    fn add_clipboard_listener(&mut self) -> Result<(), StartupError>;
    /// Blocking error dialog.
    fn show_error(&mut self, err: &StartupError);
    /// Pump events into `app` until it quits. Returns the exit status.
    fn run_loop(&mut self, app: App) -> i32;
    /// Best-effort release of whatever was set up; must tolerate a partial
    /// startup.
    fn teardown(&mut self);
}

fn start(platform: &mut impl Platform, app: &App) -> Result<(), StartupError> {
    platform.register_window_classes()?;
    platform.create_main_window()?;
    platform.install_tray(app.tray(), &tray::menu_items());
    platform.add_clipboard_listener()?;
    Ok(())
}

/// Start up, run the event loop, and return the process exit status.
pub fn run(platform: &mut impl Platform, config: Config) -> i32 {
    let app = App::new(config);

    if let Err(err) = start(platform, &app) {
        error!("{err} (os error {})", err.os_error());
        platform.show_error(&err);
        platform.teardown();
        return err.exit_code();
    }

    info!("Watching clipboard");
    let code = platform.run_loop(app);
    platform.teardown();
    info!("Exiting with status {code}");
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::tests::FakeClipboard;
    use crate::clipboard::ClipboardProbe;

    fn app() -> App {
        App::new(Config::default())
    }

    #[test]
    fn test_clipboard_text_shows_one_balloon() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        let effects = app.handle(Event::ClipboardUpdate, &mut clip);

        let balloons: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::ShowBalloon(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(balloons.len(), 1);
        assert_eq!(balloons[0].title, "Clipboard Monitor");
        assert_eq!(balloons[0].body, "Content copied to clipboard");
        assert_eq!(app.tray().balloon.as_ref(), Some(balloons[0]));
    }

    #[test]
    fn test_clipboard_text_shows_one_popup() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        let effects = app.handle(Event::ClipboardUpdate, &mut clip);

        let popups: Vec<_> = effects
            .iter()
            .filter(|e| matches!(e, Effect::ShowPopup(_)))
            .collect();
        assert_eq!(popups.len(), 1);
        if let Effect::ShowPopup(popup) = popups[0] {
            assert_eq!(popup.text, "Content copied to clipboard");
            assert_eq!((popup.width, popup.height), (300, 80));
        }
    }

    #[test]
    fn test_busy_clipboard_produces_nothing() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Busy);
        assert!(app.handle(Event::ClipboardUpdate, &mut clip).is_empty());
        assert!(app.tray().balloon.is_none());
        assert_eq!(clip.probes, 1);
    }

    #[test]
    fn test_no_text_produces_nothing() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::NoText);
        assert!(app.handle(Event::ClipboardUpdate, &mut clip).is_empty());
    }

    #[test]
    fn test_each_update_notifies_once() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        for _ in 0..3 {
            let effects = app.handle(Event::ClipboardUpdate, &mut clip);
            let count = effects
                .iter()
                .filter(|e| matches!(e, Effect::ShowBalloon(_)))
                .count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_right_click_shows_menu() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        let effects = app.handle(Event::Tray(TrayMessage::RightButtonUp), &mut clip);
        assert_eq!(effects, vec![Effect::ShowMenu]);
        assert_eq!(clip.probes, 0);
    }

    #[test]
    fn test_other_tray_messages_are_ignored() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        // WM_MOUSEMOVE, WM_LBUTTONUP
        for msg in [0x0200, 0x0202] {
            assert!(app.handle(Event::Tray(TrayMessage::Other(msg)), &mut clip).is_empty());
        }
    }

    #[test]
    fn test_exit_command_destroys_main_window() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        let effects = app.handle(Event::Command(tray::ID_TRAY_EXIT), &mut clip);
        assert_eq!(effects, vec![Effect::DestroyMainWindow]);
    }

    #[test]
    fn test_unknown_command_is_ignored() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        assert!(app.handle(Event::Command(7), &mut clip).is_empty());
    }

    #[test]
    fn test_destroy_quits_with_zero() {
        let mut app = app();
        let mut clip = FakeClipboard::new(ClipboardProbe::Text);
        assert_eq!(app.handle(Event::Destroy, &mut clip), vec![Effect::Quit(0)]);
    }

    /// Records the startup sequence and replays scripted events in `run_loop`.
    struct FakePlatform {
        calls: Vec<&'static str>,
        fail_at: Option<&'static str>,
        events: Vec<Event>,
        effects: Vec<Effect>,
        menu_labels: Vec<String>,
        tray_present: bool,
    }

    impl FakePlatform {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                fail_at: None,
                events: Vec::new(),
                effects: Vec::new(),
                menu_labels: Vec::new(),
                tray_present: false,
            }
        }

        fn failing_at(step: &'static str) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::new()
            }
        }

        fn step(&mut self, name: &'static str, err: StartupError) -> Result<(), StartupError> {
            self.calls.push(name);
            if self.fail_at == Some(name) {
                Err(err)
            } else {
                Ok(())
            }
        }
    }

    impl Platform for FakePlatform {
        fn register_window_classes(&mut self) -> Result<(), StartupError> {
            self.step("register", StartupError::RegisterClass { os_error: 0 })
        }

        fn create_main_window(&mut self) -> Result<(), StartupError> {
            self.step("create", StartupError::CreateWindow { os_error: 0 })
        }

        fn install_tray(&mut self, icon: &TrayIcon, menu: &[MenuItem]) {
            self.calls.push("tray");
            assert_eq!(icon.tooltip, "Clipboard Monitor");
            self.menu_labels = menu.iter().map(|m| m.label.clone()).collect();
            self.tray_present = true;
        }

        fn add_clipboard_listener(&mut self) -> Result<(), StartupError> {
            self.step("listener", StartupError::ClipboardListener { os_error: 0 })
        }

        fn show_error(&mut self, _err: &StartupError) {
            self.calls.push("dialog");
        }

        fn run_loop(&mut self, mut app: App) -> i32 {
            self.calls.push("loop");
            let mut clip = FakeClipboard::new(ClipboardProbe::Text);
            let mut queue: std::collections::VecDeque<Event> = self.events.drain(..).collect();
            while let Some(event) = queue.pop_front() {
                for effect in app.handle(event, &mut clip) {
                    match effect {
                        Effect::DestroyMainWindow => queue.push_back(Event::Destroy),
                        Effect::Quit(code) => {
                            self.effects.push(Effect::Quit(code));
                            return code;
                        }
                        other => self.effects.push(other),
                    }
                }
            }
            -1
        }

        fn teardown(&mut self) {
            self.calls.push("teardown");
            self.tray_present = false;
        }
    }

    #[test]
    fn test_startup_order() {
        let mut platform = FakePlatform::new();
        platform.events = vec![Event::Command(tray::ID_TRAY_EXIT)];
        let code = run(&mut platform, Config::default());
        assert_eq!(code, 0);
        assert_eq!(
            platform.calls,
            vec!["register", "create", "tray", "listener", "loop", "teardown"]
        );
        assert_eq!(platform.menu_labels, vec!["Exit".to_string()]);
    }

    #[test]
    fn test_register_failure_stops_before_listener() {
        let mut platform = FakePlatform::failing_at("register");
        let code = run(&mut platform, Config::default());
        assert_eq!(code, 1);
        assert_eq!(platform.calls, vec!["register", "dialog", "teardown"]);
    }

    #[test]
    fn test_create_failure_stops_before_listener() {
        let mut platform = FakePlatform::failing_at("create");
        let code = run(&mut platform, Config::default());
        assert_eq!(code, 1);
        assert!(!platform.calls.contains(&"listener"));
        assert!(platform.calls.contains(&"dialog"));
    }

    #[test]
    fn test_listener_failure_reports_and_cleans_up() {
        let mut platform = FakePlatform::failing_at("listener");
        let code = run(&mut platform, Config::default());
        assert_eq!(code, 1);
        assert_eq!(
            platform.calls,
            vec!["register", "create", "tray", "listener", "dialog", "teardown"]
        );
        assert!(!platform.calls.contains(&"loop"));
        assert!(!platform.tray_present);
    }

    #[test]
    fn test_copy_then_exit_scenario() {
        let mut platform = FakePlatform::new();
        platform.events = vec![
            Event::ClipboardUpdate,
            Event::Tray(TrayMessage::RightButtonUp),
            Event::Command(tray::ID_TRAY_EXIT),
        ];
        let code = run(&mut platform, Config::default());
        assert_eq!(code, 0);
        assert!(matches!(platform.effects[0], Effect::ShowBalloon(_)));
        assert!(matches!(platform.effects[1], Effect::ShowPopup(_)));
        assert_eq!(platform.effects[2], Effect::ShowMenu);
        assert_eq!(platform.effects[3], Effect::Quit(0));
        assert!(!platform.tray_present);
    }
}

use crate::config::Config;

/// Command id of the "Exit" menu entry.
pub const ID_TRAY_EXIT: u16 = 1001;

/// Identifier of our single icon within the notification area.
pub const TRAY_ICON_ID: u32 = 1;

/// Actions that can be triggered from the tray context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Exit,
}

impl MenuAction {
    pub fn id(self) -> u16 {
        match self {
            MenuAction::Exit => ID_TRAY_EXIT,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            ID_TRAY_EXIT => Some(MenuAction::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: MenuAction,
}

/// The context menu shown on right-click. Always exactly one entry.
pub fn menu_items() -> Vec<MenuItem> {
    vec![MenuItem {
        label: "Exit".into(),
        action: MenuAction::Exit,
    }]
}

/// Interactions with the tray icon reported through its callback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMessage {
    RightButtonUp,
    Other(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balloon {
    pub title: String,
    pub body: String,
}

impl Balloon {
    pub fn copied(config: &Config) -> Self {
        Self {
            title: config.balloon_title.clone(),
            body: config.balloon_body.clone(),
        }
    }
}

/// Portable description of the tray icon. The platform backend turns this
/// into the OS structure whenever the icon is added or modified.
#[derive(Debug, Clone)]
pub struct TrayIcon {
    pub id: u32,
    pub tooltip: String,
    /// Mirror of the last balloon shown. Backends display the `Balloon`
    /// returned by [`TrayIcon::notify`] rather than reading this field.
    #[allow(dead_code)]
    pub balloon: Option<Balloon>,
}

impl TrayIcon {
    pub fn new(config: &Config) -> Self {
        Self {
            id: TRAY_ICON_ID,
            tooltip: config.tooltip.clone(),
            balloon: None,
        }
    }

    /// Replace the current balloon and return the one to display.
    pub fn notify(&mut self, balloon: Balloon) -> Balloon {
        self.balloon = Some(balloon.clone());
        balloon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_has_single_exit_item() {
        let items = menu_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Exit");
        assert_eq!(items[0].action, MenuAction::Exit);
        assert_eq!(items[0].action.id(), 1001);
    }

    #[test]
    fn test_menu_action_from_id() {
        assert_eq!(MenuAction::from_id(1001), Some(MenuAction::Exit));
        assert_eq!(MenuAction::from_id(1000), None);
        assert_eq!(MenuAction::from_id(0), None);
    }

    #[test]
    fn test_new_icon_has_tooltip_and_no_balloon() {
        let icon = TrayIcon::new(&Config::default());
        assert_eq!(icon.id, TRAY_ICON_ID);
        assert_eq!(icon.tooltip, "Clipboard Monitor");
        assert!(icon.balloon.is_none());
    }

    #[test]
    fn test_notify_updates_descriptor_in_place() {
        let config = Config::default();
        let mut icon = TrayIcon::new(&config);
        let shown = icon.notify(Balloon::copied(&config));
        assert_eq!(shown.title, "Clipboard Monitor");
        assert_eq!(shown.body, "Content copied to clipboard");
        assert_eq!(icon.balloon, Some(shown));
    }
}

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub tooltip: String,
    pub balloon_title: String,
    pub balloon_body: String,
    pub popup_width: i32,
    pub popup_height: i32,
    /// Gap between the popup and the work-area edges.
    pub popup_margin: i32,
    pub popup_padding: i32,
    pub popup_timeout_ms: u64,
    pub popup_opacity: u8,
    pub font_height: i32,
    pub font_face: String,
    pub sound_alias: String,
    /// Only used by the polling backend on platforms without clipboard listeners.
    #[cfg_attr(windows, allow(dead_code))]
    pub poll_interval_ms: u64,
}

impl Config {
    pub fn popup_timeout(&self) -> Duration {
        Duration::from_millis(self.popup_timeout_ms)
    }

    #[cfg_attr(windows, allow(dead_code))]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Clipboard Monitor".into(),
            tooltip: "Clipboard Monitor".into(),
            balloon_title: "Clipboard Monitor".into(),
            balloon_body: "Content copied to clipboard".into(),
            popup_width: 300,
            popup_height: 80,
            popup_margin: 20,
            popup_padding: 10,
            popup_timeout_ms: 2000,
            popup_opacity: 240,
            font_height: 16,
            font_face: "Segoe UI".into(),
            sound_alias: "SystemNotification".into(),
            poll_interval_ms: 500,
        }
    }
}

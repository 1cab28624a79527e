use std::time::Duration;

use crate::config::Config;

/// Timer id used by every notification window for its countdown.
pub const SURFACE_TIMER_ID: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// A request to show a transient popup with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub text: String,
    pub width: i32,
    pub height: i32,
    pub margin: i32,
}

impl Popup {
    pub fn new(text: impl Into<String>, config: &Config) -> Self {
        Self {
            text: text.into(),
            width: config.popup_width,
            height: config.popup_height,
            margin: config.popup_margin,
        }
    }

    /// Window bounds pinned to the bottom-right corner of `work_area`.
    pub fn bounds(&self, work_area: Rect) -> Rect {
        let left = work_area.right - self.width - self.margin;
        let top = work_area.bottom - self.height - self.margin;
        Rect {
            left,
            top,
            right: left + self.width,
            bottom: top + self.height,
        }
    }
}

/// Rectangle the caption is drawn into: the client area minus the padding on
/// the top-left edges. Text is word-wrapped inside it.
pub fn text_rect(client: Rect, padding: i32) -> Rect {
    Rect {
        left: client.left + padding,
        top: client.top + padding,
        ..client
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Visible,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Created,
    Paint,
    Timer(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAction {
    StartTimer { id: usize, after: Duration },
    Paint,
    /// Kill the countdown and tear the window down.
    Destroy { timer_id: usize },
    Ignore,
}

/// Lifecycle of one notification window. The only way out of `Visible` is the
/// countdown firing.
#[derive(Debug)]
pub struct Surface {
    state: SurfaceState,
    timeout: Duration,
}

impl Surface {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: SurfaceState::Visible,
            timeout,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn on_event(&mut self, event: SurfaceEvent) -> SurfaceAction {
        if self.state == SurfaceState::Destroyed {
            return SurfaceAction::Ignore;
        }
        match event {
            SurfaceEvent::Created => SurfaceAction::StartTimer {
                id: SURFACE_TIMER_ID,
                after: self.timeout,
            },
            SurfaceEvent::Paint => SurfaceAction::Paint,
            SurfaceEvent::Timer(SURFACE_TIMER_ID) => {
                self.state = SurfaceState::Destroyed;
                SurfaceAction::Destroy {
                    timer_id: SURFACE_TIMER_ID,
                }
            }
            SurfaceEvent::Timer(_) => SurfaceAction::Ignore,
        }
    }
}

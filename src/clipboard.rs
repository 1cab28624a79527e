/// Outcome of looking at the clipboard after a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardProbe {
    /// Another process holds the clipboard open.
    Busy,
    NoText,
    Text,
}

/// Read-only access to the clipboard. Implementations open the clipboard once,
/// check for Unicode text, and release it before returning.
pub trait ClipboardSource {
    fn probe(&mut self) -> ClipboardProbe;
}

/// Decide whether a clipboard-update event should produce a notification.
/// A clipboard we cannot open is dropped without retrying.
pub fn should_notify(source: &mut impl ClipboardSource) -> bool {
    matches!(source.probe(), ClipboardProbe::Text)
}

#[cfg(not(windows))]
pub use polling::{start_monitor, ArboardSource};

/// Clipboard change detection for platforms without a listener API.
#[cfg(not(windows))]
mod polling {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::sync::mpsc::Sender;
    use std::thread;
    use std::time::Duration;

    use arboard::Clipboard;

    use super::{ClipboardProbe, ClipboardSource};
    use crate::app::Event;

    pub struct ArboardSource {
        clipboard: Clipboard,
    }

    impl ArboardSource {
        pub fn new() -> Result<Self, arboard::Error> {
            Ok(Self {
                clipboard: Clipboard::new()?,
            })
        }
    }

    impl ClipboardSource for ArboardSource {
        fn probe(&mut self) -> ClipboardProbe {
            match self.clipboard.get_text() {
                Ok(text) if !text.is_empty() => ClipboardProbe::Text,
                Ok(_) | Err(arboard::Error::ContentNotAvailable) => ClipboardProbe::NoText,
                Err(_) => ClipboardProbe::Busy,
            }
        }
    }

    fn fingerprint(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    /// Poll the clipboard in a background thread and post `ClipboardUpdate`
    /// whenever the text changes. Only a hash of the last text is kept.
    /// The thread exits once the receiving side is gone.
    pub fn start_monitor(events: Sender<Event>, poll_interval: Duration) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let mut clipboard = match Clipboard::new() {
                Ok(c) => c,
                Err(e) => {
                    log::error!("Failed to initialize clipboard: {e}");
                    return;
                }
            };

            let mut last = clipboard.get_text().ok().map(|t| fingerprint(&t));

            loop {
                thread::sleep(poll_interval);

                let current = match clipboard.get_text() {
                    Ok(t) if !t.is_empty() => fingerprint(&t),
                    _ => continue,
                };

                if last != Some(current) {
                    last = Some(current);
                    if events.send(Event::ClipboardUpdate).is_err() {
                        break;
                    }
                }
            }
        })
    }
}

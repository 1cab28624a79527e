#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::Win32Platform as NativePlatform;

#[cfg(not(windows))]
mod fallback;
#[cfg(not(windows))]
pub use self::fallback::PollingPlatform as NativePlatform;

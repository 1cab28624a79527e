use thiserror::Error;

/// Fatal conditions that abort startup. The `Display` text is what the user
/// sees in the error dialog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("Failed to register window class!")]
    RegisterClass { os_error: u32 },
    #[error("Failed to create window!")]
    CreateWindow { os_error: u32 },
    #[error("Failed to add clipboard listener!")]
    ClipboardListener { os_error: u32 },
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn os_error(&self) -> u32 {
        match self {
            Self::RegisterClass { os_error }
            | Self::CreateWindow { os_error }
            | Self::ClipboardListener { os_error } => *os_error,
        }
    }
}

//! Terminal backends for rtprompt.
//!
//! Provides console implementations behind the `rtprompt-core` traits:
//! - UnixConsoleInput / UnixConsoleOutput (POSIX termios and VT sequences)
//! - MockConsoleInput / MockConsoleOutput for tests
//!
//! plus a file-backed `log` sink enabled through `RTPROMPT_DEBUG`.

use std::sync::Arc;

// Re-export core types and traits
pub use rtprompt_core::{
    ClearType, Color, ConsoleError, ConsoleInput, ConsoleOutput, ConsoleResult, KeyEvent,
    KeyParser, KeySink, RawModeGuard, TextStyle,
};

/// Create both console input and output for the current platform
pub fn create_console_io() -> ConsoleResult<(Arc<dyn ConsoleInput>, Box<dyn ConsoleOutput>)> {
    let input = create_console_input()?;
    let output = create_console_output()?;
    Ok((input, output))
}

/// Create console input for the current platform
pub fn create_console_input() -> ConsoleResult<Arc<dyn ConsoleInput>> {
    #[cfg(unix)]
    {
        let input = unix::UnixConsoleInput::new()?;
        Ok(Arc::new(input))
    }

    #[cfg(not(unix))]
    {
        Err(ConsoleError::UnsupportedFeature {
            feature: "console input".to_string(),
            platform: std::env::consts::OS.to_string(),
        })
    }
}

/// Create console output for the current platform
pub fn create_console_output() -> ConsoleResult<Box<dyn ConsoleOutput>> {
    #[cfg(unix)]
    {
        Ok(Box::new(unix::UnixConsoleOutput::new()))
    }

    #[cfg(not(unix))]
    {
        Err(ConsoleError::UnsupportedFeature {
            feature: "console output".to_string(),
            platform: std::env::consts::OS.to_string(),
        })
    }
}

/// Create mock console I/O for testing
pub fn create_mock_console_io() -> (Arc<mock::MockConsoleInput>, mock::MockConsoleOutput) {
    (
        Arc::new(mock::MockConsoleInput::new()),
        mock::MockConsoleOutput::new(),
    )
}

/// Describe the backend the factory functions pick on this platform.
pub fn platform_info() -> String {
    #[cfg(unix)]
    {
        format!(
            "Unix platform using VT100-compatible console I/O (OS: {})",
            std::env::consts::OS
        )
    }

    #[cfg(not(unix))]
    {
        format!("Unsupported platform: {}", std::env::consts::OS)
    }
}

// Platform-specific modules
#[cfg(unix)]
mod unix;

pub mod debug;
pub mod mock;

#[cfg(unix)]
pub use unix::{UnixConsoleInput, UnixConsoleOutput};

//! Error types for console backends and prompt sessions.

use thiserror::Error;

/// Console operation errors
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The terminal could not be switched into or out of raw mode
    #[error("Terminal mode error: {0}")]
    TerminalMode(String),

    #[error("Key reader is already running")]
    AlreadyRunning,

    #[error("Key reader is not running")]
    NotRunning,

    #[error("Feature '{feature}' not supported on platform '{platform}'")]
    UnsupportedFeature { feature: String, platform: String },
}

/// Result type for console operations
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors that end a prompt session.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Raw mode could not be entered. Nothing has been rendered.
    #[error("failed to enter raw mode: {0}")]
    TerminalMode(#[source] ConsoleError),

    #[error("console error: {0}")]
    Console(#[from] ConsoleError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Every event producer hung up before the session ended
    #[error("key input disconnected")]
    Disconnected,
}

pub type PromptResult<T> = Result<T, PromptError>;

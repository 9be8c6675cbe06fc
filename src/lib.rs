//! # rtprompt: Realtime Terminal Prompt
//!
//! rtprompt draws a single-line prompt that feels like a shell prompt while a
//! callback you supply recomputes text shown beneath it on every keystroke.
//! It never takes over the screen: the region below the input line is
//! repainted in place, and everything is erased again when the prompt ends.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rtprompt::prelude::*;
//!
//! let chosen = std::sync::Arc::new(std::sync::Mutex::new(None));
//! let sink = chosen.clone();
//!
//! let matcher = ClosestMatch::new()
//!     .candidate("[#1516] Panic when frying eggs", "")
//!     .candidate("[#1617] Frying eggs when panicking", "")
//!     .show_instructions(true)
//!     .on_select(move |title| *sink.lock().unwrap() = Some(title));
//!
//! let outcome = Prompt::builder()
//!     .with_prefix("Summary: ")
//!     .with_matcher(matcher)
//!     .build()
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! ```
//!
//! ## Architecture
//!
//! - **Engine** (`rtprompt-core`): key parsing, LineBuffer, KeyRouter, Renderer,
//!   the callback pipeline, the session loop and the ClosestMatch matcher
//! - **Platform I/O** (`rtprompt-io`): termios backend, mocks, file logging
//! - **High-level API** (`rtprompt`): [`Prompt`] - this crate

// Re-export the engine
pub use rtprompt_core::{
    closest_match::{ClosestMatch, MatchCallback, DEFAULT_INSTRUCTIONS},
    config::{PromptConfig, DEFAULT_PADDING, MAX_PADDING},
    console::{ClearType, Color, ConsoleInput, ConsoleOutput, RawModeGuard, TextStyle},
    error::{ConsoleError, ConsoleResult, PromptError, PromptResult},
    key_router::{EditAction, KeyRouter},
    pipeline::Callback,
    session::{Outcome, Session},
    Key, KeyEvent, KeyParser, LineBuffer, Renderer,
};

// Re-export I/O implementations from rtprompt-io
pub use rtprompt_io::{create_console_io, debug, mock};

pub mod prelude;
pub mod prompt;

pub use prompt::{Prompt, PromptBuilder, PromptHandle};

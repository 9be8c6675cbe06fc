//! Realtime Prompt Core Library
//!
//! This crate provides the platform-independent engine behind a single-line,
//! non-full-screen terminal prompt whose auxiliary output is recomputed as the
//! user types. It covers parsing raw terminal bytes into key events, line
//! editing, escape-sequence rendering, running the caller's callback off the
//! input path while discarding stale results, and the session loop that ties
//! them together. Terminal backends live in `rtprompt-io`.

pub mod key;
pub mod key_parser;
pub mod sequence_matcher;

// Editing and rendering
pub mod console;
pub mod key_router;
pub mod line_buffer;
pub mod renderer;
pub mod unicode;

// Session
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;

// Matcher collaborator
pub mod closest_match;
pub mod similarity;

// Re-export commonly used types for convenience
pub use closest_match::{ClosestMatch, MatchCallback};
pub use config::PromptConfig;
pub use console::{
    ClearType, Color, ConsoleInput, ConsoleOutput, KeySink, RawModeGuard, TextStyle,
};
pub use error::{ConsoleError, ConsoleResult, PromptError, PromptResult};
pub use key::{Key, KeyEvent};
pub use key_parser::{KeyParser, ParserState};
pub use key_router::{Command, EditAction, KeyRouter};
pub use line_buffer::LineBuffer;
pub use pipeline::{Callback, CallbackPipeline, CallbackResult, PipelineState, Stamp};
pub use renderer::Renderer;
pub use sequence_matcher::{LongestMatchResult, MatchResult, SequenceMatcher};
pub use session::{Outcome, Session, SessionEvent};
pub use unicode::{byte_index_from_rune_index, display_width, rune_count, rune_slice};

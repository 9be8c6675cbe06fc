//! Convenient re-exports for common use cases
//!
//! ```rust
//! use rtprompt::prelude::*;
//!
//! let prompt = Prompt::builder().with_prefix("$ ").build().unwrap();
//! assert_eq!(prompt.config().prefix, "$ ");
//! ```

pub use crate::{
    // Prompt system
    Callback,
    ClosestMatch,
    Color,
    // Key handling
    EditAction,
    Key,
    KeyRouter,
    Outcome,
    Prompt,
    PromptBuilder,
    PromptConfig,
    PromptError,
    PromptHandle,
    PromptResult,
    TextStyle,
};

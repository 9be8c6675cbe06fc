//! High-level prompt interface with builder pattern
//!
//! [`Prompt`] wires a [`Session`] to the native terminal backend. Use
//! [`Prompt::run`] to block until the prompt ends, or [`Prompt::spawn`] to run
//! it on its own thread and collect the outcome later.
//!
//! # Examples
//!
//! ```
//! use rtprompt::prelude::*;
//!
//! let prompt = Prompt::builder()
//!     .with_prefix("> ")
//!     .with_padding(1)
//!     .with_callback(|text: &str, _tab: bool, _enter: bool| format!("{} chars", text.len()))
//!     .build()
//!     .expect("Failed to create prompt");
//! assert_eq!(prompt.config().padding, 1);
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::debug;
use rtprompt_core::pipeline::empty_callback;
use rtprompt_core::{
    Callback, ClosestMatch, ConsoleInput, ConsoleOutput, EditAction, Key, KeyRouter, Outcome,
    PromptConfig, PromptResult, Session,
};

/// A configured prompt, ready to run once.
pub struct Prompt {
    config: PromptConfig,
    callback: Box<dyn Callback>,
    router: KeyRouter,
}

impl Prompt {
    pub fn builder() -> PromptBuilder {
        PromptBuilder::new()
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Run on the controlling terminal until Enter, Escape or Ctrl-C.
    pub fn run(self) -> PromptResult<Outcome> {
        if let Some(path) = rtprompt_io::debug::init() {
            debug!("logging to {path}");
        }
        let (input, output) = rtprompt_io::create_console_io()?;
        self.run_with(input, output)
    }

    /// Run against explicit console backends.
    pub fn run_with(
        self,
        input: Arc<dyn ConsoleInput>,
        output: Box<dyn ConsoleOutput>,
    ) -> PromptResult<Outcome> {
        Session::new(self.config, input, output)
            .with_callback(self.callback)
            .with_router(self.router)
            .run()
    }

    /// Run on a background thread.
    pub fn spawn(self) -> PromptHandle {
        PromptHandle {
            thread: thread::spawn(move || self.run()),
        }
    }
}

/// Handle to a prompt started with [`Prompt::spawn`].
pub struct PromptHandle {
    thread: JoinHandle<PromptResult<Outcome>>,
}

impl PromptHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the prompt ends. A panic on the prompt thread is resumed here.
    pub fn wait(self) -> PromptResult<Outcome> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Builder for [`Prompt`].
pub struct PromptBuilder {
    config: PromptConfig,
    callback: Option<Box<dyn Callback>>,
    router: KeyRouter,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            config: PromptConfig::default(),
            callback: None,
            router: KeyRouter::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Blank rows between the input line and callback output
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.config.padding = padding;
        self
    }

    /// Show the buffer text and cursor below the prompt after every key
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn with_config(mut self, config: PromptConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_callback<C>(mut self, callback: C) -> Self
    where
        C: Callback + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Use a [`ClosestMatch`] selection list as the callback.
    pub fn with_matcher(self, matcher: ClosestMatch) -> Self {
        self.with_callback(matcher.callback())
    }

    pub fn with_key_binding(mut self, key: Key, action: EditAction) -> Self {
        self.router.bind(key, action);
        self
    }

    pub fn with_alt_binding(mut self, letter: char, action: EditAction) -> Self {
        self.router.bind_alt(letter, action);
        self
    }

    pub fn build(self) -> PromptResult<Prompt> {
        self.config.validate()?;
        Ok(Prompt {
            config: self.config,
            callback: self.callback.unwrap_or_else(empty_callback),
            router: self.router,
        })
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

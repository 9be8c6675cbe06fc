//! Session loop tying input, editing, the callback pipeline and rendering
//! together.
//!
//! A [`Session`] owns the terminal for the duration of one prompt. Keys from
//! the reader thread and results from the callback worker are funnelled into a
//! single channel so that only the session thread ever writes to the console.
//!
//! Enter gives queued invocations a short grace period to drain so a
//! selection made with Tab is in place, then runs the final callback outside
//! the worker queue. The loop keeps reading keys meanwhile, so the interrupt
//! key still ends a session whose callback has hung.

use crate::config::{PromptConfig, DIAGNOSTIC_PADDING};
use crate::console::{ConsoleInput, ConsoleOutput, RawModeGuard};
use crate::error::{ConsoleError, PromptError, PromptResult};
use crate::key::KeyEvent;
use crate::key_router::{Command, EditAction, KeyRouter};
use crate::line_buffer::LineBuffer;
use crate::pipeline::{
    empty_callback, Callback, CallbackPipeline, CallbackResult, PipelineState,
};
use crate::renderer::Renderer;
use log::{debug, trace, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest Enter waits for queued invocations before submitting anyway.
pub const SETTLE_TIMEOUT: Duration = Duration::from_millis(250);

const SETTLE_POLL: Duration = Duration::from_millis(5);

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Enter was pressed; holds the final input text
    Submitted(String),
    /// Escape was pressed
    Cancelled,
    /// The interrupt key was pressed and the re-raised signal did not end the
    /// process
    Interrupted,
}

/// Everything the session thread reacts to.
#[derive(Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    ReadFailed(ConsoleError),
    Output(CallbackResult),
    /// The Enter invocation returned
    Finished(String),
}

/// One interactive prompt.
pub struct Session {
    config: PromptConfig,
    input: Arc<dyn ConsoleInput>,
    output: Box<dyn ConsoleOutput>,
    callback: Box<dyn Callback>,
    router: KeyRouter,
}

impl Session {
    pub fn new(
        config: PromptConfig,
        input: Arc<dyn ConsoleInput>,
        output: Box<dyn ConsoleOutput>,
    ) -> Self {
        Self {
            config,
            input,
            output,
            callback: empty_callback(),
            router: KeyRouter::new(),
        }
    }

    pub fn with_callback(mut self, callback: Box<dyn Callback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn with_router(mut self, router: KeyRouter) -> Self {
        self.router = router;
        self
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Run the prompt until it is submitted, cancelled or interrupted.
    ///
    /// Fails with [`PromptError::TerminalMode`] before anything is drawn when
    /// the terminal cannot be switched to raw mode.
    pub fn run(self) -> PromptResult<Outcome> {
        self.config.validate()?;
        let Session {
            config,
            input,
            output,
            callback,
            router,
        } = self;

        let guard = input.enable_raw_mode().map_err(PromptError::TerminalMode)?;
        debug!("raw mode enabled ({})", guard.platform_info());

        let mut renderer = Renderer::new(output, config.prefix.as_str(), config.padding);
        renderer.begin()?;

        let (events, queue) = mpsc::channel();
        let results = events.clone();
        let pipeline = CallbackPipeline::start(
            callback,
            Box::new(move |result| {
                let _ = results.send(SessionEvent::Output(result));
            }),
        );
        pipeline.issue("", false, false);

        let finished = events.clone();
        input.start_reader(Box::new(move |read| {
            let event = match read {
                Ok(key) => SessionEvent::Key(key),
                Err(e) => SessionEvent::ReadFailed(e),
            };
            let _ = events.send(event);
        }))?;

        let mut running = Running {
            debug: config.debug,
            input,
            router,
            buffer: LineBuffer::new(),
            renderer,
            pipeline,
            events: finished,
            submit: None,
            guard: Some(guard),
        };
        running.event_loop(queue)
    }
}

/// Enter was pressed and the final callback is pending.
struct PendingSubmit {
    text: String,
    deadline: Instant,
    started: bool,
}

/// Resources held while the prompt is live.
struct Running {
    debug: bool,
    input: Arc<dyn ConsoleInput>,
    router: KeyRouter,
    buffer: LineBuffer,
    renderer: Renderer,
    pipeline: CallbackPipeline,
    events: Sender<SessionEvent>,
    submit: Option<PendingSubmit>,
    guard: Option<RawModeGuard>,
}

impl Running {
    fn event_loop(&mut self, queue: Receiver<SessionEvent>) -> PromptResult<Outcome> {
        loop {
            let event = if self.settling() {
                match queue.recv_timeout(SETTLE_POLL) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                match queue.recv() {
                    Ok(event) => Some(event),
                    Err(_) => break,
                }
            };

            if let Some(event) = event {
                let outcome = if self.submit.is_some() {
                    self.handle_submitting(event)?
                } else {
                    self.handle_event(event)?
                };
                if let Some(outcome) = outcome {
                    return Ok(outcome);
                }
            }
            self.start_submit_if_settled();
        }

        self.teardown()?;
        Err(PromptError::Disconnected)
    }

    fn handle_event(&mut self, event: SessionEvent) -> PromptResult<Option<Outcome>> {
        match event {
            SessionEvent::Key(key) => return self.handle_key(&key),
            SessionEvent::Output(result) => {
                if let Some(output) = self.pipeline.accept(result) {
                    self.renderer.repaint(&output)?;
                    self.renderer.flush()?;
                }
            }
            SessionEvent::ReadFailed(e) => {
                warn!("key read failed: {e}");
                if !self.input.is_running() {
                    self.teardown()?;
                    return Err(PromptError::Disconnected);
                }
                self.renderer.paint(&format!("error: {e}"), DIAGNOSTIC_PADDING)?;
                self.renderer.flush()?;
            }
            SessionEvent::Finished(_) => {}
        }
        Ok(None)
    }

    /// After Enter only the interrupt key and the Enter result matter.
    fn handle_submitting(&mut self, event: SessionEvent) -> PromptResult<Option<Outcome>> {
        match event {
            SessionEvent::Key(key)
                if self.router.action_for(&key) == Some(EditAction::Interrupt) =>
            {
                self.interrupt().map(Some)
            }
            SessionEvent::Finished(_) => {
                let text = self.submit.take().map(|pending| pending.text).unwrap_or_default();
                self.teardown()?;
                Ok(Some(Outcome::Submitted(text)))
            }
            other => {
                trace!("ignoring {other:?} while submitting");
                Ok(None)
            }
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> PromptResult<Option<Outcome>> {
        let routed = self.router.route(key, &mut self.buffer);

        match routed.command {
            Command::Continue => {}
            Command::Submit => {
                let text = self.buffer.text().to_string();
                debug!("submitting {text:?}");
                self.submit = Some(PendingSubmit {
                    text,
                    deadline: Instant::now() + SETTLE_TIMEOUT,
                    started: false,
                });
                return Ok(None);
            }
            Command::Cancel => {
                debug!("cancelled");
                self.teardown()?;
                return Ok(Some(Outcome::Cancelled));
            }
            Command::Interrupt => return self.interrupt().map(Some),
        }

        self.renderer
            .update_line(self.buffer.text(), self.buffer.cursor())?;

        if self.debug {
            let dump = format!("text={}\npos={}\n", self.buffer.text(), self.buffer.cursor());
            self.renderer.paint(&dump, DIAGNOSTIC_PADDING)?;
        }

        self.renderer.flush()?;

        if routed.needs_callback() {
            let stamp = self
                .pipeline
                .issue(self.buffer.text(), routed.tab, false);
            trace!("issued callback {}", stamp.as_nanos());
        }
        Ok(None)
    }

    /// Whether Enter is still waiting for queued invocations.
    fn settling(&self) -> bool {
        self.submit.as_ref().is_some_and(|pending| !pending.started)
    }

    /// Run the Enter invocation once the worker is idle or the grace period
    /// is over.
    fn start_submit_if_settled(&mut self) {
        let Some(pending) = self.submit.as_mut() else {
            return;
        };
        if pending.started {
            return;
        }
        let idle = self.pipeline.state() == PipelineState::Idle;
        if !idle && Instant::now() < pending.deadline {
            return;
        }
        if !idle {
            debug!("callback still busy after {SETTLE_TIMEOUT:?}, submitting anyway");
        }

        pending.started = true;
        let events = self.events.clone();
        self.pipeline.submit(&pending.text, move |output| {
            let _ = events.send(SessionEvent::Finished(output));
        });
    }

    fn interrupt(&mut self) -> PromptResult<Outcome> {
        debug!("interrupted");
        self.teardown()?;
        self.input.raise_interrupt();
        Ok(Outcome::Interrupted)
    }

    /// Release the terminal. Safe to call more than once.
    fn teardown(&mut self) -> PromptResult<()> {
        let Some(guard) = self.guard.take() else {
            return Ok(());
        };
        if let Err(e) = self.input.stop_reader() {
            debug!("stopping key reader: {e}");
        }
        self.pipeline.shutdown();
        guard.restore();
        self.renderer.erase()?;
        debug!("session torn down");
        Ok(())
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        if self.guard.is_some() {
            let _ = self.input.stop_reader();
        }
    }
}

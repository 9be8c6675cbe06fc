//! Mock console implementations for testing

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rtprompt_core::{Key, KeyEvent, KeyParser};

use crate::{ConsoleError, ConsoleInput, ConsoleOutput, ConsoleResult, KeySink, RawModeGuard};

/// Scripted console input.
///
/// Queued events are delivered in order on a reader thread once the session
/// starts reading. When the script runs out the reader stops and reports
/// end of input, the same way a closed stdin would.
pub struct MockConsoleInput {
    input_queue: Arc<Mutex<VecDeque<ConsoleResult<KeyEvent>>>>,
    running: Arc<AtomicBool>,
    key_delay: Mutex<Option<Duration>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    fail_raw_mode: AtomicBool,
    raw_mode_enters: AtomicUsize,
    raw_mode_restores: Arc<AtomicUsize>,
    interrupts: AtomicUsize,
}

impl Default for MockConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConsoleInput {
    pub fn new() -> Self {
        Self {
            input_queue: Arc::new(Mutex::new(VecDeque::new())),
            running: Arc::new(AtomicBool::new(false)),
            key_delay: Mutex::new(None),
            reader: Mutex::new(None),
            fail_raw_mode: AtomicBool::new(false),
            raw_mode_enters: AtomicUsize::new(0),
            raw_mode_restores: Arc::new(AtomicUsize::new(0)),
            interrupts: AtomicUsize::new(0),
        }
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<ConsoleResult<KeyEvent>>> {
        self.input_queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a key event for testing
    pub fn queue_key_event(&self, event: KeyEvent) {
        self.queue().push_back(Ok(event));
    }

    /// Queue a named key without a rune
    pub fn queue_key(&self, key: Key) {
        self.queue_key_event(KeyEvent::simple(key, Vec::new()));
    }

    /// Queue text input as a sequence of character key events
    pub fn queue_text_input(&self, text: &str) {
        let mut queue = self.queue();
        for ch in text.chars() {
            queue.push_back(Ok(KeyEvent::char(ch)));
        }
    }

    /// Queue the events a terminal would produce for `bytes`.
    pub fn queue_bytes(&self, bytes: &[u8]) {
        let mut parser = KeyParser::new();
        let mut events = parser.feed(bytes);
        events.extend(parser.flush());
        self.queue().extend(events.into_iter().map(Ok));
    }

    /// Queue a read failure
    pub fn queue_error(&self, error: ConsoleError) {
        self.queue().push_back(Err(error));
    }

    /// Get the number of queued events
    pub fn queued_event_count(&self) -> usize {
        self.queue().len()
    }

    /// Pause between delivered events
    pub fn set_key_delay(&self, delay: Duration) {
        *self.key_delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    /// Make the next `enable_raw_mode` calls fail
    pub fn fail_raw_mode(&self) {
        self.fail_raw_mode.store(true, Ordering::SeqCst);
    }

    pub fn raw_mode_enters(&self) -> usize {
        self.raw_mode_enters.load(Ordering::SeqCst)
    }

    pub fn raw_mode_restores(&self) -> usize {
        self.raw_mode_restores.load(Ordering::SeqCst)
    }

    pub fn interrupts_raised(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }
}

impl ConsoleInput for MockConsoleInput {
    fn enable_raw_mode(&self) -> ConsoleResult<RawModeGuard> {
        if self.fail_raw_mode.load(Ordering::SeqCst) {
            return Err(ConsoleError::TerminalMode("mock terminal refused raw mode".to_string()));
        }
        self.raw_mode_enters.fetch_add(1, Ordering::SeqCst);
        let restores = Arc::clone(&self.raw_mode_restores);
        Ok(RawModeGuard::new(
            move || {
                restores.fetch_add(1, Ordering::SeqCst);
            },
            "Mock".to_string(),
        ))
    }

    fn start_reader(&self, mut sink: KeySink) -> ConsoleResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ConsoleError::AlreadyRunning);
        }
        let queue = Arc::clone(&self.input_queue);
        let running = Arc::clone(&self.running);
        let delay = *self.key_delay.lock().unwrap_or_else(PoisonError::into_inner);

        let handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                match next {
                    Some(item) => sink(item),
                    None => {
                        running.store(false, Ordering::SeqCst);
                        sink(Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()));
                        break;
                    }
                }
                if let Some(delay) = delay {
                    thread::sleep(delay);
                }
            }
        });
        *self.reader.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    fn stop_reader(&self) -> ConsoleResult<()> {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        let handle = self.reader.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        if was_running {
            Ok(())
        } else {
            Err(ConsoleError::NotRunning)
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn raise_interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock console output that records every byte written.
///
/// Clones share the same recording, so a test can keep one handle while the
/// session owns another.
#[derive(Clone, Default)]
pub struct MockConsoleOutput {
    output_buffer: Arc<Mutex<Vec<u8>>>,
    flushes: Arc<AtomicUsize>,
}

impl MockConsoleOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get captured output for testing
    pub fn output(&self) -> Vec<u8> {
        self.output_buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Get output as string for testing
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output()).to_string()
    }

    /// Clear captured output
    pub fn clear_output(&self) {
        self.output_buffer.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl ConsoleOutput for MockConsoleOutput {
    fn write_raw(&self, bytes: &[u8]) -> ConsoleResult<()> {
        self.output_buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&self) -> ConsoleResult<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

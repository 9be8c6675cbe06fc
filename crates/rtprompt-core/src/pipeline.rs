//! Asynchronous callback execution with latest-wins result filtering.
//!
//! Each qualifying keystroke issues an [`Invocation`] stamped with a strictly
//! increasing [`Stamp`]. A single worker thread takes invocations in issue
//! order. A text invocation is skipped when a newer text invocation is already
//! queued, so a slow callback never builds up a backlog. Tab invocations always
//! run: they move the selection of stateful callbacks within the list the last
//! text invocation produced. Results come back tagged with the stamp they were
//! produced for, and [`CallbackPipeline::accept`] lets through only those that
//! are not older than the most recently issued stamp.
//!
//! The Enter invocation bypasses the queue: [`CallbackPipeline::submit`] runs
//! it on its own thread, so a callback stuck on an earlier invocation cannot
//! hold it back.

use log::{debug, trace};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    mpsc::{self, Sender},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Produces the auxiliary output for the current input.
///
/// Called with `(text, tab_pressed, enter_pressed)`. The returned string is
/// painted below the prompt; failures should be encoded in that string. The
/// Enter invocation may run while an earlier one is still in progress, so
/// implementations must tolerate concurrent calls.
pub trait Callback: Send + Sync {
    fn call(&self, text: &str, tab: bool, enter: bool) -> String;
}

impl<F> Callback for F
where
    F: Fn(&str, bool, bool) -> String + Send + Sync,
{
    fn call(&self, text: &str, tab: bool, enter: bool) -> String {
        self(text, tab, enter)
    }
}

/// Callback used when none is configured.
pub fn empty_callback() -> Box<dyn Callback> {
    Box::new(|_: &str, _: bool, _: bool| String::new())
}

/// Issue time of an invocation, in nanoseconds since the pipeline epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp(u64);

impl Stamp {
    pub fn as_nanos(&self) -> u64 {
        self.0
    }
}

/// One request to run the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub text: String,
    pub tab: bool,
    pub enter: bool,
    pub issued_at: Stamp,
}

/// Callback output tagged with the invocation it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResult {
    pub produced_for: Stamp,
    pub output: String,
}

/// Receives results from the worker thread.
pub type ResultSink = Box<dyn FnMut(CallbackResult) + Send>;

/// Shared "most recently issued" marker.
///
/// Issuing is lock-free and strictly monotonic: two issues in the same
/// nanosecond still get distinct, ordered stamps.
#[derive(Debug, Clone)]
pub struct LatestWins {
    epoch: Instant,
    latest: Arc<AtomicU64>,
}

impl LatestWins {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Take a new stamp and record it as the latest.
    pub fn issue(&self) -> Stamp {
        let now = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let next = |latest: u64| now.max(latest.saturating_add(1));
        // fetch_update only fails when the closure returns None
        let previous = match self
            .latest
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |latest| Some(next(latest)))
        {
            Ok(previous) | Err(previous) => previous,
        };
        Stamp(next(previous))
    }

    pub fn latest(&self) -> Stamp {
        Stamp(self.latest.load(Ordering::Acquire))
    }

    /// Whether a result produced for `stamp` may still be shown.
    pub fn is_current(&self, stamp: Stamp) -> bool {
        stamp >= self.latest()
    }
}

impl Default for LatestWins {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the worker has invocations outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Computing,
}

/// Runs the callback off the key-reading path.
pub struct CallbackPipeline {
    latest: LatestWins,
    callback: Arc<dyn Callback>,
    /// Stamp of the newest queued invocation with `tab == false`
    latest_edit: Arc<AtomicU64>,
    jobs: Option<Sender<Invocation>>,
    worker: Option<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl CallbackPipeline {
    /// Start the worker thread. Results of queued invocations are handed to
    /// `sink` in completion order, stale or not.
    pub fn start(callback: Box<dyn Callback>, mut sink: ResultSink) -> Self {
        let callback: Arc<dyn Callback> = Arc::from(callback);
        let latest = LatestWins::new();
        let (jobs, queue) = mpsc::channel::<Invocation>();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let latest_edit = Arc::new(AtomicU64::new(0));

        let worker_callback = Arc::clone(&callback);
        let worker_edit = Arc::clone(&latest_edit);
        let worker_in_flight = Arc::clone(&in_flight);
        let worker = thread::spawn(move || {
            for invocation in queue {
                let newer_edit = worker_edit.load(Ordering::Acquire) > invocation.issued_at.0;
                if !invocation.tab && newer_edit {
                    trace!(
                        "skipping superseded invocation {}",
                        invocation.issued_at.as_nanos()
                    );
                    worker_in_flight.fetch_sub(1, Ordering::AcqRel);
                    continue;
                }

                let output = worker_callback.call(&invocation.text, invocation.tab, invocation.enter);
                worker_in_flight.fetch_sub(1, Ordering::AcqRel);
                sink(CallbackResult {
                    produced_for: invocation.issued_at,
                    output,
                });
            }
            debug!("callback worker exiting");
        });

        Self {
            latest,
            callback,
            latest_edit,
            jobs: Some(jobs),
            worker: Some(worker),
            in_flight,
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.in_flight.load(Ordering::Acquire) == 0 {
            PipelineState::Idle
        } else {
            PipelineState::Computing
        }
    }

    pub fn latest(&self) -> Stamp {
        self.latest.latest()
    }

    /// Queue an invocation. Everything issued before it becomes stale
    /// immediately, before the callback runs.
    pub fn issue(&self, text: &str, tab: bool, enter: bool) -> Stamp {
        let invocation = self.stamp(text, tab, enter);
        let stamp = invocation.issued_at;
        let Some(jobs) = &self.jobs else {
            return stamp;
        };
        if !tab {
            self.latest_edit.fetch_max(stamp.0, Ordering::AcqRel);
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        if jobs.send(invocation).is_err() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
        }
        stamp
    }

    /// Run the Enter invocation on its own thread, outside the job queue.
    ///
    /// `done` receives the callback output. Nothing is sent to the result
    /// sink, and results of every invocation issued earlier become stale.
    pub fn submit<F>(&self, text: &str, done: F) -> Stamp
    where
        F: FnOnce(String) + Send + 'static,
    {
        let invocation = self.stamp(text, false, true);
        let stamp = invocation.issued_at;
        let callback = Arc::clone(&self.callback);
        thread::spawn(move || {
            done(callback.call(&invocation.text, invocation.tab, invocation.enter));
        });
        stamp
    }

    /// Filter a finished result: its output if still current, `None` if stale.
    pub fn accept(&self, result: CallbackResult) -> Option<String> {
        if self.latest.is_current(result.produced_for) {
            Some(result.output)
        } else {
            trace!(
                "dropping stale callback result for {} (latest {})",
                result.produced_for.as_nanos(),
                self.latest().as_nanos()
            );
            None
        }
    }

    /// Close the queue and let the worker finish on its own.
    ///
    /// The worker is detached rather than joined so a callback that never
    /// returns cannot hold up the caller.
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if self.worker.take().is_some() {
            debug!("callback pipeline shut down");
        }
    }

    fn stamp(&self, text: &str, tab: bool, enter: bool) -> Invocation {
        Invocation {
            text: text.to_string(),
            tab,
            enter,
            issued_at: self.latest.issue(),
        }
    }
}

impl Drop for CallbackPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;
    use std::sync::Mutex;
    use std::time::Duration;

    fn collecting(callback: Box<dyn Callback>) -> (CallbackPipeline, Receiver<CallbackResult>) {
        let (tx, rx) = mpsc::channel();
        let sink = Mutex::new(tx);
        let pipeline = CallbackPipeline::start(
            callback,
            Box::new(move |result| {
                let _ = sink.lock().unwrap().send(result);
            }),
        );
        (pipeline, rx)
    }

    #[test]
    fn test_stamps_are_strictly_increasing() {
        let latest = LatestWins::new();
        let mut previous = latest.issue();
        for _ in 0..1000 {
            let next = latest.issue();
            assert!(next > previous);
            assert_eq!(latest.latest(), next);
            previous = next;
        }
    }

    #[test]
    fn test_is_current() {
        let latest = LatestWins::new();
        let a = latest.issue();
        assert!(latest.is_current(a));

        let b = latest.issue();
        assert!(!latest.is_current(a));
        assert!(latest.is_current(b));
    }

    #[test]
    fn test_concurrent_issue_is_monotonic() {
        let latest = LatestWins::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let latest = latest.clone();
                thread::spawn(move || (0..500).map(|_| latest.issue()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<Stamp> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(latest.latest(), *all.last().unwrap());
    }

    /// A callback that parks on "gate" until released, reporting when it
    /// has started.
    fn gated(
        record: Arc<Mutex<Vec<(String, bool, bool)>>>,
    ) -> (Box<dyn Callback>, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let started = Mutex::new(started_tx);
        let release = Mutex::new(release_rx);
        let callback = move |text: &str, tab: bool, enter: bool| {
            if text == "gate" {
                let _ = started.lock().unwrap().send(());
                let _ = release.lock().unwrap().recv();
            }
            record.lock().unwrap().push((text.to_string(), tab, enter));
            format!("out:{text}")
        };
        (Box::new(callback), started_rx, release_tx)
    }

    #[test]
    fn test_slow_earlier_result_is_discarded() {
        let (pipeline, results) = collecting(Box::new(|text: &str, _: bool, _: bool| {
            if text == "a" {
                thread::sleep(Duration::from_millis(100));
            }
            format!("out:{text}")
        }));

        let a = pipeline.issue("a", false, false);
        thread::sleep(Duration::from_millis(50));
        let b = pipeline.issue("ab", false, false);
        assert!(b > a);

        let mut rendered = Vec::new();
        for _ in 0..2 {
            let result = results.recv_timeout(Duration::from_secs(5)).unwrap();
            if let Some(output) = pipeline.accept(result) {
                rendered.push(output);
            }
        }
        assert_eq!(rendered, vec!["out:ab".to_string()]);
    }

    #[test]
    fn test_superseded_invocations_are_skipped() {
        let runs = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&runs);
        let (pipeline, results) = collecting(Box::new(move |text: &str, _: bool, _: bool| {
            count.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            text.to_string()
        }));

        let started = Instant::now();
        let typed = "abcdefghij";
        for end in 1..=typed.len() {
            pipeline.issue(&typed[..end], false, false);
        }

        let rendered = loop {
            let result = results.recv_timeout(Duration::from_secs(5)).unwrap();
            if let Some(output) = pipeline.accept(result) {
                break output;
            }
        };

        assert_eq!(rendered, typed);
        // at most the first invocation ran before the latest
        assert!(runs.load(Ordering::SeqCst) <= 2);
        assert!(started.elapsed() < Duration::from_millis(600));
    }

    #[test]
    fn test_tab_invocations_are_never_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (callback, started, release) = gated(Arc::clone(&seen));
        let (pipeline, results) = collecting(callback);

        pipeline.issue("gate", false, false);
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        pipeline.issue("p", false, false);
        pipeline.issue("p", true, false);
        pipeline.issue("p", true, false);
        pipeline.issue("q", false, false);
        release.send(()).unwrap();

        for _ in 0..4 {
            results.recv_timeout(Duration::from_secs(5)).unwrap();
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("gate".to_string(), false, false),
                ("p".to_string(), true, false),
                ("p".to_string(), true, false),
                ("q".to_string(), false, false),
            ]
        );
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_submit_does_not_wait_for_busy_worker() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (callback, started, release) = gated(Arc::clone(&seen));
        let (pipeline, _results) = collecting(callback);

        pipeline.issue("gate", false, false);
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        pipeline.issue("ab", false, false);

        let (done_tx, done_rx) = mpsc::channel();
        pipeline.submit("ab", move |output| {
            let _ = done_tx.send(output);
        });

        let output = done_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(output, "out:ab");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("ab".to_string(), false, true)]
        );
        assert_eq!(pipeline.state(), PipelineState::Computing);
        release.send(()).unwrap();
    }

    #[test]
    fn test_submit_makes_pending_results_stale() {
        let (pipeline, results) = collecting(Box::new(|text: &str, _: bool, _: bool| {
            text.to_string()
        }));

        pipeline.issue("typed", false, false);
        let (done_tx, done_rx) = mpsc::channel();
        let stamp = pipeline.submit("typed", move |output| {
            let _ = done_tx.send(output);
        });

        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), "typed");
        assert_eq!(pipeline.latest(), stamp);
        thread::sleep(Duration::from_millis(50));
        assert!(results.try_iter().all(|result| pipeline.accept(result).is_none()));
    }

    #[test]
    fn test_text_before_tab_is_not_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (callback, started, release) = gated(Arc::clone(&seen));
        let (pipeline, results) = collecting(callback);

        pipeline.issue("gate", false, false);
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        pipeline.issue("pa", false, false);
        pipeline.issue("pan", false, false);
        let tab = pipeline.issue("pan", true, false);
        release.send(()).unwrap();

        let mut last = None;
        for _ in 0..3 {
            last = Some(results.recv_timeout(Duration::from_secs(5)).unwrap());
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("gate".to_string(), false, false),
                ("pan".to_string(), false, false),
                ("pan".to_string(), true, false),
            ]
        );
        let last = last.unwrap();
        assert_eq!(last.produced_for, tab);
        assert_eq!(pipeline.accept(last).as_deref(), Some("out:pan"));
    }

    #[test]
    fn test_shutdown_does_not_wait_for_hung_callback() {
        let (mut pipeline, _results) = collecting(Box::new(|_: &str, _: bool, _: bool| {
            thread::sleep(Duration::from_secs(30));
            String::new()
        }));

        pipeline.issue("x", false, false);
        let started = Instant::now();
        pipeline.shutdown();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_state_transitions() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate = Mutex::new(gate_rx);
        let (pipeline, results) = collecting(Box::new(move |_: &str, _: bool, _: bool| {
            let _ = gate.lock().unwrap().recv();
            String::new()
        }));

        assert_eq!(pipeline.state(), PipelineState::Idle);
        pipeline.issue("x", false, false);
        assert_eq!(pipeline.state(), PipelineState::Computing);

        gate_tx.send(()).unwrap();
        results.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_empty_callback() {
        let callback = empty_callback();
        assert_eq!(callback.call("anything", true, true), "");
    }
}

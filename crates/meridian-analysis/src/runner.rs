use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use tracing::debug;

use crate::cache::AnalysisSnapshot;
use crate::coordinator::AnalysisCoordinator;

struct Job {
    paths: Vec<PathBuf>,
    state: Arc<HandleState>,
}

struct HandleState {
    slot: Mutex<Option<Arc<AnalysisSnapshot>>>,
    done: Condvar,
    cancelled: AtomicBool,
}

impl HandleState {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
            cancelled: AtomicBool::new(false),
        }
    }

    fn finish(&self, snapshot: Arc<AnalysisSnapshot>) {
        *self.slot.lock().unwrap() = Some(snapshot);
        self.done.notify_all();
    }
}

/// Handle to a submitted background analysis
///
/// Cancellation is cooperative: it releases this handle's interest in the
/// outcome but never stops the underlying computation, which still runs to
/// completion and populates the cache for future callers.
pub struct AnalysisHandle {
    state: Arc<HandleState>,
}

impl AnalysisHandle {
    /// Non-blocking check for the result
    pub fn poll(&self) -> Option<Arc<AnalysisSnapshot>> {
        self.state.slot.lock().unwrap().clone()
    }

    /// Block until the analysis finishes or the handle is cancelled
    ///
    /// Returns `None` only if cancelled before completion.
    pub fn wait(&self) -> Option<Arc<AnalysisSnapshot>> {
        let mut slot = self.state.slot.lock().unwrap();
        while slot.is_none() && !self.state.cancelled.load(Ordering::SeqCst) {
            slot = self.state.done.wait(slot).unwrap();
        }
        slot.clone()
    }

    /// Stop waiting for the result
    pub fn cancel(&self) {
        let _slot = self.state.slot.lock().unwrap();
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.done.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.state.slot.lock().unwrap().is_some()
    }
}

struct Outstanding {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Outstanding {
    fn new() -> Self {
        Self {
            count: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    fn increment(&self) {
        *self.count.lock().unwrap() += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock().unwrap();
        *count -= 1;
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_for_drain(&self) {
        let mut count = self.count.lock().unwrap();
        while *count > 0 {
            count = self.drained.wait(count).unwrap();
        }
    }
}

/// Runs coordinator computations on a background worker pool
///
/// Keeps multi-file and whole-project analysis off the caller's thread; the
/// returned handle can be polled, awaited, or cancelled. Dropping the runner
/// shuts the pool down after in-progress jobs finish.
pub struct AnalysisRunner {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    outstanding: Arc<Outstanding>,
}

impl AnalysisRunner {
    pub fn new(coordinator: Arc<AnalysisCoordinator>, worker_threads: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let outstanding = Arc::new(Outstanding::new());

        let workers = (0..worker_threads.max(1))
            .map(|i| {
                let receiver: Receiver<Job> = receiver.clone();
                let coordinator = coordinator.clone();
                let outstanding = outstanding.clone();
                std::thread::Builder::new()
                    .name(format!("meridian-analysis-{i}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            // Runs to completion even if the handle was
                            // cancelled: the cache still gets populated
                            let snapshot = coordinator.analyze(&job.paths);
                            job.state.finish(snapshot);
                            outstanding.decrement();
                        }
                    })
                    .expect("Failed to spawn analysis worker")
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            outstanding,
        }
    }

    /// Queue an analysis and return a cancellable handle to its result
    pub fn submit(&self, paths: Vec<PathBuf>) -> AnalysisHandle {
        let state = Arc::new(HandleState::new());
        self.outstanding.increment();

        let job = Job {
            paths,
            state: state.clone(),
        };
        if let Some(sender) = &self.sender {
            if sender.send(job).is_err() {
                // Pool already shut down; nothing will finish this handle
                self.outstanding.decrement();
                debug!("analysis submitted after runner shutdown");
            }
        }

        AnalysisHandle { state }
    }

    /// Block until every outstanding submission has finished
    ///
    /// Teardown-only operation, not part of the per-request flow.
    pub fn join(&self) {
        self.outstanding.wait_for_drain();
    }
}

impl Drop for AnalysisRunner {
    fn drop(&mut self) {
        // Closing the channel stops the workers once the queue drains
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

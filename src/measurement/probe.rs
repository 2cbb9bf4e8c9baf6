//! Probe execution: how a candidate gets timed against the oracle.
//!
//! Two executors share the [`Prober`] interface:
//!
//! - [`InlineProber`] calls the oracle on the current thread. A timeout can
//!   only be detected after the call returns.
//! - [`IsolatedProber`] calls the oracle on one dedicated worker thread and
//!   waits at most the timeout for the answer, so a hung oracle cannot hang
//!   the engine. The latency is measured on the worker, around the oracle
//!   call alone; channel hand-off is outside the timed region.
//!
//! Neither executor ever has two probes in flight at once.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::oracle::Oracle;
use crate::types::LatencySample;

use super::timer::Timer;

/// Times single oracle probes.
pub trait Prober<S> {
    /// Probe `candidate` once and return the latency sample.
    fn probe(&mut self, candidate: &[S]) -> LatencySample;

    /// Forward to the oracle's full-secret check.
    fn validate(&self, candidate: &[S]) -> Option<bool>;

    /// Clock used for measurements.
    fn timer(&self) -> &Timer;

    /// Number of hung probes whose worker had to be abandoned.
    fn abandoned_probes(&self) -> usize {
        0
    }
}

/// Probes on the caller's thread.
#[derive(Debug)]
pub struct InlineProber<'o, O> {
    oracle: &'o O,
    timer: Timer,
    timeout: Option<Duration>,
}

impl<'o, O> InlineProber<'o, O> {
    /// Probe `oracle` directly; samples longer than `timeout` are marked timed out.
    pub fn new(oracle: &'o O, timer: Timer, timeout: Option<Duration>) -> Self {
        Self {
            oracle,
            timer,
            timeout,
        }
    }
}

impl<'o, S, O> Prober<S> for InlineProber<'o, O>
where
    O: Oracle<S>,
{
    #[inline]
    fn probe(&mut self, candidate: &[S]) -> LatencySample {
        let (_, elapsed) = self.timer.measure(|| self.oracle.probe(candidate));
        LatencySample::classify(elapsed, self.timeout)
    }

    fn validate(&self, candidate: &[S]) -> Option<bool> {
        self.oracle.validate(candidate)
    }

    fn timer(&self) -> &Timer {
        &self.timer
    }
}

struct Worker<S> {
    requests: Sender<Vec<S>>,
    responses: Receiver<Duration>,
    handle: JoinHandle<()>,
}

impl<S: Send + 'static> Worker<S> {
    fn spawn<O>(oracle: Arc<O>, timer: Timer, id: usize) -> std::io::Result<Self>
    where
        O: Oracle<S> + Send + Sync + 'static,
    {
        let (requests, request_rx) = mpsc::channel::<Vec<S>>();
        let (response_tx, responses) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name(format!("timing-probe-{}", id))
            .spawn(move || {
                for candidate in request_rx {
                    let (_, elapsed) = timer.measure(|| oracle.probe(&candidate));
                    if response_tx.send(elapsed).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests,
            responses,
            handle,
        })
    }
}

/// Probes on a dedicated worker thread with a hard per-probe time limit.
///
/// When a probe exceeds the limit its worker is abandoned (it exits on its
/// own once the oracle call returns) and a fresh worker serves the next probe.
/// If no worker can be spawned the probe runs on the caller's thread.
pub struct IsolatedProber<S, O> {
    oracle: Arc<O>,
    timer: Timer,
    timeout: Option<Duration>,
    worker: Option<Worker<S>>,
    spawned: usize,
    abandoned: usize,
}

impl<S, O> std::fmt::Debug for IsolatedProber<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolatedProber")
            .field("timeout", &self.timeout)
            .field("spawned", &self.spawned)
            .field("abandoned", &self.abandoned)
            .finish()
    }
}

impl<S, O> IsolatedProber<S, O>
where
    S: Clone + Send + 'static,
    O: Oracle<S> + Send + Sync + 'static,
{
    /// Probe `oracle` on a worker thread, waiting at most `timeout` per probe
    /// (forever if `None`).
    pub fn new(oracle: Arc<O>, timer: Timer, timeout: Option<Duration>) -> Self {
        Self {
            oracle,
            timer,
            timeout,
            worker: None,
            spawned: 0,
            abandoned: 0,
        }
    }

    /// Measure on the caller's thread when no worker can serve the probe.
    fn probe_on_caller(&self, candidate: &[S]) -> LatencySample {
        let (_, elapsed) = self.timer.measure(|| self.oracle.probe(candidate));
        LatencySample::classify(elapsed, self.timeout)
    }

    fn abandon_worker(&mut self) {
        // Dropping the sender lets the hung worker exit after its current call.
        self.worker = None;
        self.abandoned += 1;
        tracing::warn!(
            abandoned = self.abandoned,
            "oracle probe exceeded {:?}; abandoning worker thread",
            self.timeout
        );
    }
}

impl<S, O> Prober<S> for IsolatedProber<S, O>
where
    S: Clone + Send + 'static,
    O: Oracle<S> + Send + Sync + 'static,
{
    fn probe(&mut self, candidate: &[S]) -> LatencySample {
        if self.worker.is_none() {
            match Worker::spawn(Arc::clone(&self.oracle), self.timer, self.spawned) {
                Ok(worker) => {
                    self.spawned += 1;
                    self.worker = Some(worker);
                }
                Err(err) => {
                    tracing::warn!(
                        "failed to spawn probe worker, probing on the caller's thread: {}",
                        err
                    );
                    return self.probe_on_caller(candidate);
                }
            }
        }
        let Some(worker) = self.worker.as_ref() else {
            return self.probe_on_caller(candidate);
        };

        if worker.requests.send(candidate.to_vec()).is_err() {
            // Worker is gone; it can only have exited by panicking.
            self.reraise_worker_panic();
            return self.probe_on_caller(candidate);
        }

        let response = match self.timeout {
            Some(limit) => worker
                .responses
                .recv_timeout(limit)
                .map_err(|err| (err, Some(limit))),
            None => worker
                .responses
                .recv()
                .map_err(|_| (RecvTimeoutError::Disconnected, None)),
        };

        match response {
            Ok(elapsed) => LatencySample::classify(elapsed, self.timeout),
            Err((RecvTimeoutError::Timeout, Some(limit))) => {
                self.abandon_worker();
                LatencySample::TimedOut { limit }
            }
            Err(_) => {
                self.reraise_worker_panic();
                self.probe_on_caller(candidate)
            }
        }
    }

    fn validate(&self, candidate: &[S]) -> Option<bool> {
        self.oracle.validate(candidate)
    }

    fn timer(&self) -> &Timer {
        &self.timer
    }

    fn abandoned_probes(&self) -> usize {
        self.abandoned
    }
}

impl<S, O> IsolatedProber<S, O> {
    /// Propagate an oracle panic from the worker to the caller, as an inline
    /// call would.
    fn reraise_worker_panic(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(worker.requests);
            if let Err(payload) = worker.handle.join() {
                std::panic::resume_unwind(payload);
            }
        }
    }
}

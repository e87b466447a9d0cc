//! Running a trajectory off the calling thread.
//!
//! [`spawn_worker`] moves a [`TrajectoryManager`] onto a named OS thread.
//! The thread sleeps on a control channel until the manager's next deadline,
//! so [`WorkerHandle::stop`] wakes it immediately, cancels its timers and
//! joins.
//!
//! The thread owns the buffer exclusively; the only thing that crosses the
//! thread boundary is an `Arc<Snapshot>`, which is immutable. Publishes land
//! in a single-slot mailbox that each publish overwrites, so a handle that is
//! not being read holds at most one snapshot and one pending wake-up.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LorenzConfig;
use crate::error::{NumericFault, WorkerError};
use crate::lorenz::LorenzParams;
use crate::manager::{Status, TrajectoryManager};
use crate::snapshot::Snapshot;

/// Start message for a worker: seed, parameters and update cadence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkerRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
    pub dt: f64,
    pub steps: usize,
    /// Milliseconds between update ticks.
    #[serde(alias = "updateInterval")]
    pub update_interval: u64,
}

impl WorkerRequest {
    /// Request describing `config`.
    pub fn from_config(config: &LorenzConfig) -> Self {
        let p = &config.params;
        Self {
            x: config.seed.x,
            y: config.seed.y,
            z: config.seed.z,
            sigma: p.sigma,
            rho: p.rho,
            beta: p.beta,
            dt: p.dt,
            steps: p.steps_per_tick,
            update_interval: config.update_interval_ms,
        }
    }

    /// Overlay this request onto `base`, keeping its capacity, publish
    /// cadence and camera settings.
    pub fn apply(&self, base: &LorenzConfig) -> LorenzConfig {
        LorenzConfig {
            params: LorenzParams {
                sigma: self.sigma,
                rho: self.rho,
                beta: self.beta,
                dt: self.dt,
                steps_per_tick: self.steps,
            },
            seed: DVec3::new(self.x, self.y, self.z),
            update_interval_ms: self.update_interval,
            ..base.clone()
        }
    }
}

/// Message handed back from a worker.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerEvent {
    /// The newest published window.
    Snapshot(Arc<Snapshot>),
    /// Integration overflowed; the worker has exited.
    Faulted(NumericFault),
}

/// State shared between a worker thread and its handle.
#[derive(Debug, Default)]
struct Mailbox {
    latest: Mutex<Arc<Snapshot>>,
    fault: Mutex<Option<NumericFault>>,
}

impl Mailbox {
    fn post(&self, snapshot: &Arc<Snapshot>) {
        *lock(&self.latest) = Arc::clone(snapshot);
    }

    fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&lock(&self.latest))
    }

    fn fail(&self, fault: NumericFault) {
        *lock(&self.fault) = Some(fault);
    }

    fn fault(&self) -> Option<NumericFault> {
        *lock(&self.fault)
    }
}

// Every write stores a complete value, so a poisoned slot is still readable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner's side of a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    control: mpsc::Sender<()>,
    wake: Receiver<()>,
    mailbox: Arc<Mailbox>,
    thread: Option<JoinHandle<()>>,
    fault_reported: bool,
}

impl WorkerHandle {
    /// Wait at most `timeout` for the worker to publish or fault.
    ///
    /// Publishes that happened while nobody was waiting are coalesced into
    /// one [`WorkerEvent::Snapshot`] carrying the newest window. A fault is
    /// reported once, before the handle reports [`WorkerError::Disconnected`].
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<WorkerEvent>, WorkerError> {
        let woke = match self.wake.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                return match self.unreported_fault() {
                    Some(fault) => Ok(Some(WorkerEvent::Faulted(fault))),
                    None => Err(WorkerError::Disconnected),
                };
            }
        };

        if let Some(fault) = self.unreported_fault() {
            return Ok(Some(WorkerEvent::Faulted(fault)));
        }
        Ok(woke.then(|| WorkerEvent::Snapshot(self.mailbox.latest())))
    }

    /// Newest snapshot published so far.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.mailbox.latest()
    }

    /// Fault reported by the worker, if it has faulted.
    pub fn fault(&self) -> Option<NumericFault> {
        self.mailbox.fault()
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Cancel the worker's timers and join its thread.
    pub fn stop(mut self) -> Result<(), WorkerError> {
        self.shutdown()
    }

    fn unreported_fault(&mut self) -> Option<NumericFault> {
        if self.fault_reported {
            return None;
        }
        let fault = self.mailbox.fault();
        self.fault_reported = fault.is_some();
        fault
    }

    fn shutdown(&mut self) -> Result<(), WorkerError> {
        // The worker may already be gone after a fault; that is fine.
        let _ = self.control.send(());
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| WorkerError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("trajectory worker shutdown failed: {e}");
        }
    }
}

/// Start a trajectory run described by `request` on a new thread.
///
/// `base` supplies everything the request does not carry.
pub fn spawn_worker(
    request: WorkerRequest,
    base: &LorenzConfig,
) -> Result<WorkerHandle, WorkerError> {
    let config = request.apply(base);
    let mailbox = Arc::new(Mailbox::default());
    // One pending wake-up is enough; the mailbox always holds the newest copy.
    let (wake_tx, wake) = mpsc::sync_channel(1);

    let slot = Arc::clone(&mailbox);
    let publish_wake = wake_tx.clone();
    let manager = TrajectoryManager::new(config)?.with_subscriber(move |snapshot| {
        slot.post(snapshot);
        let _ = publish_wake.try_send(());
    });

    let (control, control_rx) = mpsc::channel();
    let shared = Arc::clone(&mailbox);
    let thread = thread::Builder::new()
        .name("lorenz-worker".into())
        .spawn(move || run(manager, control_rx, &shared, wake_tx))
        .map_err(WorkerError::Spawn)?;

    Ok(WorkerHandle {
        control,
        wake,
        mailbox,
        thread: Some(thread),
        fault_reported: false,
    })
}

fn run(
    mut manager: TrajectoryManager,
    control: Receiver<()>,
    mailbox: &Mailbox,
    wake: SyncSender<()>,
) {
    manager.start(Instant::now());
    info!("trajectory worker running");

    while let Some(deadline) = manager.next_deadline() {
        let wait = deadline.saturating_duration_since(Instant::now());
        match control.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {
                manager.poll(Instant::now());
            }
            // Explicit stop, or the handle is gone.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if let Status::Faulted(fault) = manager.status() {
        mailbox.fail(fault);
        let _ = wake.try_send(());
    }
    manager.stop();
    debug!(ticks = manager.ticks(), "trajectory worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> LorenzConfig {
        LorenzConfig {
            update_interval_ms: 2,
            publish_interval_ms: 4,
            ..LorenzConfig::default()
        }
    }

    #[test]
    fn test_request_json_accepts_camel_case() {
        let json = r#"{"x":0.1,"y":0,"z":0,"sigma":10,"rho":28,"beta":2.6666666666666665,
                       "dt":0.01,"steps":10,"updateInterval":100}"#;
        let req: WorkerRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req, WorkerRequest::from_config(&LorenzConfig::default()));
    }

    #[test]
    fn test_request_apply_keeps_base() {
        let base = LorenzConfig {
            capacity: 77,
            ..LorenzConfig::default()
        };
        let mut req = WorkerRequest::from_config(&base);
        req.dt = 0.002;
        let config = req.apply(&base);
        assert_eq!(config.capacity, 77);
        assert_eq!(config.params.dt, 0.002);
    }

    #[test]
    fn test_worker_streams_snapshots() {
        let config = fast_config();
        let mut worker = spawn_worker(WorkerRequest::from_config(&config), &config).unwrap();

        let mut got = None;
        for _ in 0..500 {
            let event = worker.recv_timeout(Duration::from_millis(10)).unwrap();
            if let Some(WorkerEvent::Snapshot(s)) = event {
                if !s.is_empty() {
                    got = Some(s);
                    break;
                }
            }
        }
        let snapshot = got.expect("worker published nothing");
        assert_eq!(snapshot.len() % 10, 0);
        assert!(snapshot.points().iter().all(|p| p.is_finite()));
        assert!(!worker.is_finished());

        worker.stop().unwrap();
    }

    #[test]
    fn test_worker_reports_fault() {
        let config = fast_config();
        let mut req = WorkerRequest::from_config(&config);
        req.dt = 1000.0;
        let mut worker = spawn_worker(req, &config).unwrap();

        let mut fault = None;
        for _ in 0..500 {
            match worker.recv_timeout(Duration::from_millis(10)) {
                Ok(Some(WorkerEvent::Faulted(f))) => {
                    fault = Some(f);
                    break;
                }
                Ok(_) => {}
                Err(WorkerError::Disconnected) => break,
                Err(e) => panic!("{e}"),
            }
        }
        let fault = fault.expect("fault not reported");
        assert!(fault.last_valid.is_finite());
        assert_eq!(worker.fault(), Some(fault));
        worker.stop().unwrap();
    }

    #[test]
    fn test_unread_handle_holds_one_snapshot() {
        let config = LorenzConfig {
            update_interval_ms: 1,
            publish_interval_ms: 1,
            ..LorenzConfig::default()
        };
        let worker = spawn_worker(WorkerRequest::from_config(&config), &config).unwrap();

        thread::sleep(Duration::from_millis(300));

        let mut pending = 0;
        while worker.wake.try_recv().is_ok() {
            pending += 1;
        }
        assert!(pending <= 1, "{pending} wake-ups queued");

        let latest = worker.latest();
        assert!(latest.sequence > 1);
        assert!(!latest.is_empty());
        worker.stop().unwrap();
    }

    #[test]
    fn test_invalid_request_rejected() {
        let config = LorenzConfig::default();
        let mut req = WorkerRequest::from_config(&config);
        req.steps = 0;
        assert!(matches!(spawn_worker(req, &config), Err(WorkerError::Config(_))));
    }
}

//! Trajectory buffer manager.
//!
//! [`TrajectoryManager`] owns the simulation state, the rolling
//! [`TrajectoryBuffer`] and the latest published [`Snapshot`]. It is driven by
//! two recurring timers on its own [`Scheduler`]:
//!
//! - **update** (fast): generate `steps_per_tick` points from the current
//!   state, append them, evict overflow, reseed from the newest point.
//! - **publish** (slow): copy the buffer into a fresh `Arc<Snapshot>`, swap it
//!   into the single-slot `latest` and push it to every subscriber.
//!
//! Both run to completion inside [`poll`](TrajectoryManager::poll), so a
//! publish can never see a half-applied update.
//!
//! # Example
//!
//! ```
//! use lorenz_trail::prelude::*;
//! use std::time::{Duration, Instant};
//!
//! let mut manager = TrajectoryManager::new(LorenzConfig::default())?;
//! let t0 = Instant::now();
//! manager.start(t0);
//!
//! for i in 1..=10 {
//!     manager.poll(t0 + Duration::from_millis(100 * i));
//! }
//! assert_eq!(manager.ticks(), 10);
//! assert_eq!(manager.latest().len(), 100);
//!
//! manager.stop();
//! assert_eq!(manager.status(), Status::Stopped);
//! # Ok::<(), lorenz_trail::ConfigError>(())
//! ```

use std::sync::Arc;
use std::time::Instant;

use glam::DVec3;
use tracing::{debug, error, info, trace, warn};

use crate::buffer::TrajectoryBuffer;
use crate::config::LorenzConfig;
use crate::error::{ConfigError, NumericFault};
use crate::lorenz::{generate, Point};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::snapshot::Snapshot;

/// Callback receiving each newly published snapshot.
pub type Subscriber = Box<dyn FnMut(&Arc<Snapshot>) + Send>;

/// Lifecycle of a manager.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Status {
    /// Created, timers not registered yet.
    Idle,
    /// Timers registered and firing.
    Running,
    /// Integration overflowed. Terminal; the last snapshot stays available.
    Faulted(NumericFault),
    /// Torn down by [`TrajectoryManager::stop`]. Terminal.
    Stopped,
}

impl Status {
    /// Whether no further state mutation can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Faulted(_) | Status::Stopped)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    Update,
    Publish,
}

/// Owns one trajectory run: state, window, published snapshot and timers.
pub struct TrajectoryManager {
    config: LorenzConfig,
    /// Current integration state; always the newest buffered point once running.
    state: Point,
    buffer: TrajectoryBuffer,
    latest: Arc<Snapshot>,
    status: Status,
    scheduler: Scheduler<Task>,
    timers: Vec<TimerHandle>,
    subscribers: Vec<Subscriber>,
    ticks: u64,
    publications: u64,
}

impl TrajectoryManager {
    /// Create an idle manager. Fails if `config` does not validate.
    pub fn new(config: LorenzConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: config.seed,
            buffer: TrajectoryBuffer::new(config.capacity),
            latest: Arc::new(Snapshot::empty()),
            status: Status::Idle,
            scheduler: Scheduler::new(),
            timers: Vec::new(),
            subscribers: Vec::new(),
            ticks: 0,
            publications: 0,
            config,
        })
    }

    /// Add a snapshot subscriber, builder style.
    pub fn with_subscriber<F>(mut self, subscriber: F) -> Self
    where
        F: FnMut(&Arc<Snapshot>) + Send + 'static,
    {
        self.subscribe(subscriber);
        self
    }

    /// Register a callback invoked with every published snapshot.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&Arc<Snapshot>) + Send + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Register the update and publish timers. Only valid from `Idle`.
    ///
    /// Returns `false` (and changes nothing) in any other state.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.status != Status::Idle {
            warn!(status = ?self.status, "start ignored: manager is not idle");
            return false;
        }

        let update = self
            .scheduler
            .every(Task::Update, self.config.update_interval(), now);
        let publish = self
            .scheduler
            .every(Task::Publish, self.config.publish_interval(), now);
        self.timers = vec![update, publish];
        self.status = Status::Running;

        info!(
            seed = %self.state,
            capacity = self.config.capacity,
            update_ms = self.config.update_interval_ms,
            publish_ms = self.config.publish_interval_ms,
            "trajectory started"
        );
        true
    }

    /// Run every timer due at `now`. Returns how many fired.
    ///
    /// Does nothing unless the manager is `Running`.
    pub fn poll(&mut self, now: Instant) -> usize {
        if self.status != Status::Running {
            return 0;
        }

        let mut fired = 0;
        for task in self.scheduler.poll(now) {
            fired += 1;
            match task {
                Task::Update => {
                    if self.update().is_err() {
                        break;
                    }
                }
                Task::Publish => {
                    self.publish();
                }
            }
        }
        fired
    }

    /// Run one update tick immediately, outside the timer cadence.
    ///
    /// Returns the number of points appended. Allowed while `Idle` or
    /// `Running`; a stopped manager appends nothing and a faulted one returns
    /// its fault again.
    pub fn update(&mut self) -> Result<usize, NumericFault> {
        match self.status {
            Status::Faulted(fault) => return Err(fault),
            Status::Stopped => return Ok(0),
            Status::Idle | Status::Running => {}
        }

        let params = self.config.params;
        let run = generate(self.state, &params, params.steps_per_tick);
        let produced = run.points.len();

        let evicted = self.buffer.extend(&run.points);
        if let Some(last) = run.last() {
            self.state = last;
        }
        self.ticks += 1;

        if let Some(fault) = run.fault {
            self.enter_fault(fault);
            return Err(fault);
        }

        trace!(
            tick = self.ticks,
            produced,
            evicted,
            len = self.buffer.len(),
            "update tick"
        );
        Ok(produced)
    }

    /// Publish the current buffer immediately, outside the timer cadence.
    ///
    /// In a terminal state this returns the last published snapshot unchanged.
    pub fn publish(&mut self) -> Arc<Snapshot> {
        if self.status.is_terminal() {
            return Arc::clone(&self.latest);
        }
        self.publish_now()
    }

    /// Cancel both timers and enter `Stopped`.
    ///
    /// A manager that already faulted keeps its `Faulted` status.
    pub fn stop(&mut self) {
        self.cancel_timers();
        match self.status {
            Status::Stopped | Status::Faulted(_) => {}
            Status::Idle | Status::Running => {
                self.status = Status::Stopped;
                info!(
                    ticks = self.ticks,
                    publications = self.publications,
                    "trajectory stopped"
                );
            }
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> &LorenzConfig {
        &self.config
    }

    /// State the next update tick will integrate from.
    pub fn state(&self) -> Point {
        self.state
    }

    pub fn buffer(&self) -> &TrajectoryBuffer {
        &self.buffer
    }

    /// Center of mass of the window, the default look-at target.
    pub fn center(&self) -> DVec3 {
        self.buffer.center()
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.latest)
    }

    /// Update ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Snapshots published so far.
    pub fn publications(&self) -> u64 {
        self.publications
    }

    /// When the next timer is due, if the manager is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.status != Status::Running {
            return None;
        }
        self.scheduler.next_deadline()
    }

    /// Live timer count. Zero once stopped or faulted.
    pub fn active_timers(&self) -> usize {
        self.scheduler.active()
    }

    fn publish_now(&mut self) -> Arc<Snapshot> {
        self.publications += 1;
        let snapshot = Arc::new(Snapshot::new(
            self.publications,
            self.ticks,
            self.buffer.center(),
            self.buffer.to_vec(),
        ));
        self.latest = Arc::clone(&snapshot);

        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }

        debug!(
            sequence = snapshot.sequence,
            tick = snapshot.tick,
            len = snapshot.len(),
            "snapshot published"
        );
        snapshot
    }

    fn enter_fault(&mut self, fault: NumericFault) {
        error!(
            step = fault.step,
            last_valid = %fault.last_valid,
            tick = self.ticks,
            "{fault}"
        );
        self.cancel_timers();
        // Hand the final, fully finite window to consumers before going quiet.
        self.publish_now();
        self.status = Status::Faulted(fault);
    }

    fn cancel_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.cancel();
        }
        self.scheduler.cancel_all();
    }
}

impl std::fmt::Debug for TrajectoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrajectoryManager")
            .field("status", &self.status)
            .field("state", &self.state)
            .field("len", &self.buffer.len())
            .field("ticks", &self.ticks)
            .field("publications", &self.publications)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

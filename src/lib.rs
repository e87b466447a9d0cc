//! # lorenz-trail
//!
//! Lorenz attractor trajectories with a rolling, publishable point window.
//!
//! lorenz-trail produces the data behind an animated attractor view: it
//! integrates the Lorenz system in small fixed-step batches, keeps the most
//! recent points in a bounded window and periodically publishes immutable
//! snapshots for a renderer. The renderer itself is not part of this crate;
//! it receives point slices, colors, opacities and a camera each frame.
//!
//! ## Quick Start
//!
//! ```
//! use lorenz_trail::prelude::*;
//! use std::time::{Duration, Instant};
//!
//! let mut manager = TrajectoryManager::new(LorenzConfig::default())?
//!     .with_subscriber(|snapshot| println!("{} points", snapshot.len()));
//!
//! let t0 = Instant::now();
//! manager.start(t0);
//! manager.poll(t0 + Duration::from_millis(200));
//!
//! let mut view = ViewState::default();
//! view.start_following(Segment::Green);
//! let snapshot = manager.latest();
//! let frame = view.frame(&snapshot);
//! assert!(!frame.axes_visible);
//!
//! manager.stop();
//! # Ok::<(), lorenz_trail::ConfigError>(())
//! ```
//!
//! ## Core Concepts
//!
//! ### Generation
//!
//! [`lorenz::generate`] Euler-integrates a fixed number of steps from a seed
//! and returns the visited points. It halts on the first non-finite
//! coordinate and reports a [`NumericFault`] instead of handing out garbage.
//!
//! ### Windowing
//!
//! [`TrajectoryBuffer`] appends each batch and evicts the oldest points once
//! it exceeds its capacity (5000 by default). It also keeps the center of
//! mass used as the default look-at target.
//!
//! ### Scheduling
//!
//! [`TrajectoryManager`] runs an update timer (every 100ms by default) and a
//! slower publish timer (every 200ms) on a cooperative [`Scheduler`]. Every
//! timer registration returns a [`TimerHandle`]; stopping the manager
//! cancels both. To run on a separate thread use [`worker::spawn_worker`].
//!
//! ### Viewing
//!
//! Published [`Snapshot`]s split into three [`Segment`]s (blue, red, green).
//! [`ViewState`] turns a snapshot into a [`RenderFrame`] with per-segment
//! opacity, a camera that can orbit the head of a followed segment, and an
//! axis visibility flag.
//!
//! ## Feature Overview
//!
//! | Concern | Types |
//! |---------|-------|
//! | Integration | [`LorenzParams`], [`lorenz::generate`], [`Generation`] |
//! | Window | [`TrajectoryBuffer`], [`Snapshot`], [`Segment`] |
//! | Timers | [`Scheduler`], [`TimerHandle`] |
//! | Run control | [`TrajectoryManager`], [`Status`], [`WorkerHandle`] |
//! | Camera | [`ViewState`], [`OrbitCamera`], [`ViewPreset`], [`CameraDirective`] |
//! | Configuration | [`LorenzConfig`], [`CameraConfig`] |

pub mod buffer;
pub mod camera;
pub mod config;
mod error;
pub mod lorenz;
pub mod manager;
pub mod scheduler;
pub mod snapshot;
pub mod view;
pub mod worker;

pub use buffer::TrajectoryBuffer;
pub use camera::{orbit_position, CameraDirective, OrbitCamera, ViewPreset};
pub use config::{CameraConfig, LorenzConfig};
pub use error::{ConfigError, NumericFault, WorkerError};
pub use glam::DVec3;
pub use lorenz::{Generation, LorenzParams, Point};
pub use manager::{Status, Subscriber, TrajectoryManager};
pub use scheduler::{Scheduler, TimerHandle};
pub use snapshot::{Segment, Snapshot};
pub use view::{AxisGuide, RenderFrame, SegmentView, ViewState};
pub use worker::{spawn_worker, WorkerEvent, WorkerHandle, WorkerRequest};

/// Convenient re-exports for common usage.
///
/// ```
/// use lorenz_trail::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::TrajectoryBuffer;
    pub use crate::camera::{CameraDirective, ViewPreset};
    pub use crate::config::{CameraConfig, LorenzConfig};
    pub use crate::error::NumericFault;
    pub use crate::lorenz::{generate, LorenzParams, Point};
    pub use crate::manager::{Status, TrajectoryManager};
    pub use crate::snapshot::{Segment, Snapshot};
    pub use crate::view::{RenderFrame, ViewState};
    pub use crate::worker::{spawn_worker, WorkerEvent, WorkerRequest};
    pub use crate::DVec3;
}

//! Lorenz system integration.
//!
//! The attractor is defined by three coupled differential equations:
//!
//! ```text
//! dx/dt = σ(y - x)
//! dy/dt = x(ρ - z) - y
//! dz/dt = xy - βz
//! ```
//!
//! With the classic parameters σ=10, ρ=28, β=8/3 the system is chaotic:
//! nearby trajectories diverge exponentially while staying bounded on the
//! butterfly-shaped attractor. Divergence is expected and never clamped. The
//! only abnormal outcome is overflow to a non-finite value, which
//! [`generate`] reports as a [`NumericFault`].
//!
//! # Example
//!
//! ```
//! use lorenz_trail::lorenz::{generate, LorenzParams};
//! use glam::DVec3;
//!
//! let params = LorenzParams::classic();
//! let run = generate(DVec3::new(0.1, 0.0, 0.0), &params, 10);
//! assert_eq!(run.points.len(), 10);
//! assert!(run.fault.is_none());
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::NumericFault;

/// One sample of the trajectory, `(x, y, z)` in phase space.
pub type Point = DVec3;

/// Seed used when nothing else is configured.
pub const DEFAULT_SEED: Point = DVec3::new(0.1, 0.0, 0.0);

/// Integration parameters, fixed for the lifetime of a run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LorenzParams {
    /// Prandtl number σ.
    pub sigma: f64,
    /// Rayleigh number ρ.
    pub rho: f64,
    /// Geometric factor β.
    pub beta: f64,
    /// Euler step size.
    pub dt: f64,
    /// Integration steps per generator call.
    pub steps_per_tick: usize,
}

impl LorenzParams {
    /// The classic chaotic parameter set: σ=10, ρ=28, β=8/3, dt=0.01, 10 steps per tick.
    pub fn classic() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
            dt: 0.01,
            steps_per_tick: 10,
        }
    }

    /// Set the Euler step size.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set how many integration steps one generator call performs.
    pub fn with_steps_per_tick(mut self, steps: usize) -> Self {
        self.steps_per_tick = steps;
        self
    }

    /// Time derivative of the system at `p`.
    #[inline]
    pub fn derivative(&self, p: Point) -> DVec3 {
        DVec3::new(
            self.sigma * (p.y - p.x),
            p.x * (self.rho - p.z) - p.y,
            p.x * p.y - self.beta * p.z,
        )
    }

    /// Advance `p` by one Euler step.
    ///
    /// The delta is `derivative * dt`, added to the previous value.
    #[inline]
    pub fn euler_step(&self, p: Point) -> Point {
        p + self.derivative(p) * self.dt
    }
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self::classic()
    }
}

/// Output of one [`generate`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
    /// Visited points, in temporal order. Every point is finite.
    pub points: Vec<Point>,
    /// Set when integration stopped early on a non-finite value.
    pub fault: Option<NumericFault>,
}

impl Generation {
    /// Last point produced, if any.
    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Convert into a `Result`, discarding the partial points on fault.
    pub fn into_result(self) -> Result<Vec<Point>, NumericFault> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(self.points),
        }
    }
}

/// Euler-integrate `steps` steps from `start`.
///
/// Each iteration pushes the *updated* state, so `start` itself is never part
/// of the output. Integration halts on the first non-finite coordinate; that
/// point is not pushed and the returned fault records the step index and the
/// state the failing step started from (`start` when the very first step
/// fails).
pub fn generate(start: Point, params: &LorenzParams, steps: usize) -> Generation {
    let mut points = Vec::with_capacity(steps);
    let mut p = start;

    for step in 0..steps {
        let next = params.euler_step(p);
        if !next.is_finite() {
            return Generation {
                points,
                fault: Some(NumericFault {
                    step,
                    last_valid: p,
                }),
            };
        }
        points.push(next);
        p = next;
    }

    Generation {
        points,
        fault: None,
    }
}

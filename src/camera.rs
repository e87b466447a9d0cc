//! Camera placement for viewing and following the trajectory.
//!
//! Nothing here renders. These types compute the position and look-at
//! target the external 3D engine should use each frame.

use glam::{DMat4, DVec3};

/// Where the camera is and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraDirective {
    /// Camera position in world space.
    pub position: DVec3,
    /// Point the camera looks at.
    pub target: DVec3,
}

impl CameraDirective {
    /// Calculate the view matrix for rendering.
    ///
    /// Up is +Y, except when looking straight along the y axis (the top
    /// preset), where -Z is used instead.
    pub fn view_matrix(&self) -> DMat4 {
        let forward = (self.target - self.position).normalize_or_zero();
        let up = if forward.dot(DVec3::Y).abs() > 0.999 {
            DVec3::NEG_Z
        } else {
            DVec3::Y
        };
        DMat4::look_at_rh(self.position, self.target, up)
    }

    /// Distance between camera and target.
    pub fn distance(&self) -> f64 {
        self.position.distance(self.target)
    }
}

impl Default for CameraDirective {
    fn default() -> Self {
        ViewPreset::Standard.directive(DVec3::ZERO)
    }
}

/// Fixed viewpoints, each looking at a supplied center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewPreset {
    /// Looking down the z axis.
    Standard,
    /// Looking down the x axis.
    Side,
    /// Looking down the y axis.
    Top,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 3] = [ViewPreset::Standard, ViewPreset::Side, ViewPreset::Top];

    /// Camera position of this preset.
    pub fn position(self) -> DVec3 {
        match self {
            ViewPreset::Standard => DVec3::new(0.0, 0.0, 100.0),
            ViewPreset::Side => DVec3::new(100.0, 0.0, 0.0),
            ViewPreset::Top => DVec3::new(0.0, 100.0, 0.0),
        }
    }

    /// Directive for this preset looking at `center`.
    pub fn directive(self, center: DVec3) -> CameraDirective {
        CameraDirective {
            position: self.position(),
            target: center,
        }
    }
}

/// Camera position on a horizontal circle of `radius` around `target`.
///
/// Pure; the angle wraps through `sin`/`cos` periodicity.
pub fn orbit_position(target: DVec3, angle: f64, radius: f64) -> DVec3 {
    target + DVec3::new(radius * angle.sin(), 0.0, radius * angle.cos())
}

/// Orbit camera that circles a moving target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    /// Current orbit angle in radians. Grows monotonically.
    pub angle: f64,
    /// Distance from the target.
    pub radius: f64,
    /// Angle advance per frame in radians.
    pub step: f64,
}

impl OrbitCamera {
    pub fn new(radius: f64, step: f64) -> Self {
        Self {
            angle: 0.0,
            radius,
            step,
        }
    }

    /// Directive for `target` at the current angle, without advancing.
    pub fn directive(&self, target: DVec3) -> CameraDirective {
        CameraDirective {
            position: orbit_position(target, self.angle, self.radius),
            target,
        }
    }

    /// Directive for this frame, then advance the angle by one step.
    pub fn advance(&mut self, target: DVec3) -> CameraDirective {
        let directive = self.directive(target);
        self.angle += self.step;
        directive
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(60.0, 0.01)
    }
}

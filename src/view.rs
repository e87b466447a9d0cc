//! Per-frame view state handed to the external renderer.
//!
//! [`ViewState`] tracks which camera mode is active (a fixed
//! [`ViewPreset`] or following one [`Segment`]) and turns the latest
//! [`Snapshot`] into a [`RenderFrame`] once per rendered frame:
//!
//! - three colored segments, each with an opacity (non-followed segments
//!   are dimmed while following),
//! - the camera position and look-at target,
//! - whether the axes are shown (hidden while following).

use glam::{DVec3, Vec3};

use crate::camera::{CameraDirective, OrbitCamera, ViewPreset};
use crate::config::CameraConfig;
use crate::lorenz::Point;
use crate::snapshot::{to_vertices, Segment, Snapshot};

/// Axis lines and label placement of the reference scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisGuide {
    /// Each axis runs from `-half_length` to `+half_length`.
    pub half_length: f64,
    /// Distance of the `X`/`-X` etc. labels from the origin.
    pub label_offset: f64,
    /// Axis color (RGB, 0.0-1.0).
    pub color: Vec3,
}

impl Default for AxisGuide {
    fn default() -> Self {
        Self {
            half_length: 900.0,
            label_offset: 950.0,
            color: Vec3::splat(0x2d as f32 / 255.0),
        }
    }
}

impl AxisGuide {
    /// Label text and position for each axis end.
    pub fn labels(&self) -> [(&'static str, DVec3); 6] {
        let d = self.label_offset;
        [
            ("X", DVec3::new(d, 0.0, 0.0)),
            ("-X", DVec3::new(-d, 0.0, 0.0)),
            ("Y", DVec3::new(0.0, d, 0.0)),
            ("-Y", DVec3::new(0.0, -d, 0.0)),
            ("Z", DVec3::new(0.0, 0.0, d)),
            ("-Z", DVec3::new(0.0, 0.0, -d)),
        ]
    }
}

/// One colored stretch of the trajectory, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentView<'a> {
    pub segment: Segment,
    pub points: &'a [Point],
    pub color: Vec3,
    pub opacity: f32,
}

impl SegmentView<'_> {
    /// Single-precision vertices for upload.
    pub fn vertices(&self) -> Vec<[f32; 3]> {
        to_vertices(self.points)
    }

    /// Vertices as raw bytes, tightly packed `[f32; 3]`.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.vertices()).to_vec()
    }
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame<'a> {
    /// Blue, red, green, oldest first.
    pub segments: [SegmentView<'a>; 3],
    pub camera: CameraDirective,
    pub axes_visible: bool,
}

/// Camera mode and styling across frames.
#[derive(Clone, Debug)]
pub struct ViewState {
    camera: CameraDirective,
    following: Option<Segment>,
    orbit: OrbitCamera,
    dimmed_opacity: f32,
    axes: AxisGuide,
}

impl ViewState {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            camera: CameraDirective::default(),
            following: None,
            orbit: OrbitCamera::new(config.orbit_radius, config.orbit_step),
            dimmed_opacity: config.dimmed_opacity,
            axes: AxisGuide::default(),
        }
    }

    /// Jump to a fixed viewpoint looking at `center`, leaving follow mode.
    pub fn switch_camera(&mut self, preset: ViewPreset, center: DVec3) {
        self.following = None;
        self.camera = preset.directive(center);
    }

    /// Start orbiting the head of `segment`.
    pub fn start_following(&mut self, segment: Segment) {
        self.following = Some(segment);
    }

    /// Segment currently followed, if any.
    pub fn following(&self) -> Option<Segment> {
        self.following
    }

    pub fn camera(&self) -> CameraDirective {
        self.camera
    }

    pub fn orbit(&self) -> &OrbitCamera {
        &self.orbit
    }

    pub fn axes(&self) -> &AxisGuide {
        &self.axes
    }

    pub fn axes_visible(&self) -> bool {
        self.following.is_none()
    }

    /// Opacity of `segment` under the current follow mode.
    pub fn opacity(&self, segment: Segment) -> f32 {
        match self.following {
            Some(followed) if followed != segment => self.dimmed_opacity,
            _ => 1.0,
        }
    }

    /// Build this frame's output from `snapshot`.
    ///
    /// While following, the camera orbits the newest point of the followed
    /// segment and the orbit angle advances by one step. If that segment is
    /// still empty the previous camera is kept and the angle does not move.
    pub fn frame<'a>(&mut self, snapshot: &'a Snapshot) -> RenderFrame<'a> {
        if let Some(segment) = self.following {
            if let Some(target) = snapshot.segment_head(segment) {
                self.camera = self.orbit.advance(target);
            }
        }

        RenderFrame {
            segments: Segment::ALL.map(|segment| SegmentView {
                segment,
                points: snapshot.segment(segment),
                color: segment.color(),
                opacity: self.opacity(segment),
            }),
            camera: self.camera,
            axes_visible: self.axes_visible(),
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::orbit_position;

    fn snapshot(n: usize) -> Snapshot {
        let points = (0..n).map(|i| DVec3::new(i as f64, 1.0, 2.0)).collect();
        Snapshot::new(1, 1, DVec3::new(5.0, 5.0, 5.0), points)
    }

    #[test]
    fn test_default_frame() {
        let snap = snapshot(9);
        let mut view = ViewState::default();
        let frame = view.frame(&snap);

        assert!(frame.axes_visible);
        assert_eq!(frame.camera, CameraDirective::default());
        for (sv, segment) in frame.segments.iter().zip(Segment::ALL) {
            assert_eq!(sv.segment, segment);
            assert_eq!(sv.opacity, 1.0);
            assert_eq!(sv.points.len(), 3);
        }
    }

    #[test]
    fn test_follow_orbits_segment_head() {
        let snap = snapshot(9);
        let config = CameraConfig::default();
        let mut view = ViewState::new(&config);
        view.start_following(Segment::Red);

        let frame = view.frame(&snap);
        let head = DVec3::new(5.0, 1.0, 2.0);
        assert_eq!(frame.camera.target, head);
        assert_eq!(frame.camera.position, orbit_position(head, 0.0, config.orbit_radius));
        assert!(!frame.axes_visible);
        assert_eq!(frame.segments[0].opacity, config.dimmed_opacity);
        assert_eq!(frame.segments[1].opacity, 1.0);
        assert_eq!(frame.segments[2].opacity, config.dimmed_opacity);

        let next = view.frame(&snap);
        let orbited = orbit_position(head, config.orbit_step, config.orbit_radius);
        assert_eq!(next.camera.position, orbited);
    }

    #[test]
    fn test_follow_empty_segment_keeps_camera() {
        let snap = snapshot(2);
        let mut view = ViewState::default();
        view.start_following(Segment::Blue);

        let frame = view.frame(&snap);
        assert_eq!(frame.camera, CameraDirective::default());
        assert_eq!(view.orbit().angle, 0.0);
        assert!(!frame.axes_visible);
    }

    #[test]
    fn test_switch_camera_stops_following() {
        let snap = snapshot(9);
        let mut view = ViewState::default();
        view.start_following(Segment::Green);
        view.frame(&snap);

        view.switch_camera(ViewPreset::Top, snap.center);
        assert_eq!(view.following(), None);
        let frame = view.frame(&snap);
        assert!(frame.axes_visible);
        assert_eq!(frame.camera.position, DVec3::new(0.0, 100.0, 0.0));
        assert_eq!(frame.camera.target, snap.center);
    }

    #[test]
    fn test_vertex_bytes() {
        let snap = snapshot(3);
        let mut view = ViewState::default();
        let frame = view.frame(&snap);
        let green = &frame.segments[2];
        assert_eq!(green.vertex_bytes().len(), green.points.len() * 12);
    }

    #[test]
    fn test_axis_labels() {
        let axes = AxisGuide::default();
        let labels = axes.labels();
        assert_eq!(labels[0], ("X", DVec3::new(950.0, 0.0, 0.0)));
        assert_eq!(labels[5].0, "-Z");
    }
}

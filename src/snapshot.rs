//! Immutable published copies of the trajectory window.
//!
//! A [`Snapshot`] is taken on the slow publish cadence and shared with
//! consumers through an `Arc`, so readers never observe the buffer while it is
//! being appended to or truncated. For display the snapshot is split by index
//! into three contiguous [`Segment`]s.

use std::ops::Range;

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::lorenz::Point;

/// One of the three temporal thirds of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// Oldest third.
    Blue,
    /// Middle third.
    Red,
    /// Newest third, including the remainder.
    Green,
}

impl Segment {
    /// All segments, oldest first.
    pub const ALL: [Segment; 3] = [Segment::Blue, Segment::Red, Segment::Green];

    /// Position in [`Segment::ALL`].
    pub fn index(self) -> usize {
        match self {
            Segment::Blue => 0,
            Segment::Red => 1,
            Segment::Green => 2,
        }
    }

    /// Segment from its 1-based number (1 = blue, 2 = red, 3 = green).
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Segment::Blue),
            2 => Some(Segment::Red),
            3 => Some(Segment::Green),
            _ => None,
        }
    }

    /// Display color (RGB, 0.0-1.0).
    pub fn color(self) -> Vec3 {
        match self {
            Segment::Blue => Vec3::new(0.0, 0.0, 1.0),
            Segment::Red => Vec3::new(1.0, 0.0, 0.0),
            Segment::Green => Vec3::new(0.0, 0.5, 0.0),
        }
    }
}

/// Point-in-time copy of the trajectory buffer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Publication number, starting at 1 (0 for the empty initial snapshot).
    pub sequence: u64,
    /// Update ticks that had run when this copy was taken.
    pub tick: u64,
    /// Center of mass of the buffer when the copy was taken.
    pub center: DVec3,
    points: Vec<Point>,
}

impl Snapshot {
    pub(crate) fn new(sequence: u64, tick: u64, center: DVec3, points: Vec<Point>) -> Self {
        Self {
            sequence,
            tick,
            center,
            points,
        }
    }

    /// Empty snapshot published before the first publish tick.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Raw `f64` coordinates, `x, y, z` per point, tightly packed.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index range of `segment`.
    ///
    /// Blue and red each hold `len / 3` points; green holds the rest.
    pub fn segment_range(&self, segment: Segment) -> Range<usize> {
        let third = self.points.len() / 3;
        match segment {
            Segment::Blue => 0..third,
            Segment::Red => third..2 * third,
            Segment::Green => 2 * third..self.points.len(),
        }
    }

    /// Points belonging to `segment`.
    pub fn segment(&self, segment: Segment) -> &[Point] {
        &self.points[self.segment_range(segment)]
    }

    /// The three segments, oldest first. Concatenated they equal [`points`](Self::points).
    pub fn segments(&self) -> [&[Point]; 3] {
        Segment::ALL.map(|s| self.segment(s))
    }

    /// Newest point of `segment`, the follow target for that segment.
    pub fn segment_head(&self, segment: Segment) -> Option<Point> {
        self.segment(segment).last().copied()
    }
}

/// Convert points to single-precision vertices for GPU upload.
pub fn to_vertices(points: &[Point]) -> Vec<[f32; 3]> {
    points.iter().map(|p| p.as_vec3().to_array()).collect()
}

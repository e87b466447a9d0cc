//! Bounded rolling window over the trajectory.

use std::collections::VecDeque;

use glam::DVec3;

use crate::lorenz::Point;

/// Capacity used by the reference visualization.
pub const DEFAULT_CAPACITY: usize = 5000;

/// Ordered, bounded history of trajectory points.
///
/// Insertion order is temporal order. Appending past `capacity` evicts the
/// oldest points first, so after every [`extend`](Self::extend) the buffer
/// holds exactly the most recent `min(total, capacity)` points with no gaps.
///
/// The buffer also tracks the arithmetic mean of its points, refreshed each
/// time an append evicts something. Before the first eviction the center
/// stays at the origin.
#[derive(Clone, Debug)]
pub struct TrajectoryBuffer {
    points: VecDeque<Point>,
    capacity: usize,
    center: DVec3,
    /// Points dropped since creation.
    evicted: u64,
}

impl TrajectoryBuffer {
    /// Create an empty buffer holding at most `capacity` points.
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            center: DVec3::ZERO,
            evicted: 0,
        }
    }

    /// Append `points` in order, then drop the oldest overflow.
    ///
    /// Returns how many points were evicted by this call.
    pub fn extend(&mut self, points: &[Point]) -> usize {
        self.points.extend(points.iter().copied());

        let overflow = self.points.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.points.drain(..overflow);
            self.evicted += overflow as u64;
            self.center = self.mean();
        }
        overflow
    }

    /// Maximum number of retained points.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent point.
    #[inline]
    pub fn last(&self) -> Option<Point> {
        self.points.back().copied()
    }

    /// Total points evicted over the buffer's lifetime.
    #[inline]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Center of mass as of the last eviction.
    #[inline]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Point> + '_ {
        self.points.iter()
    }

    /// Copy the contents out, oldest first.
    pub fn to_vec(&self) -> Vec<Point> {
        self.points.iter().copied().collect()
    }

    /// Arithmetic mean of the current contents (origin when empty).
    pub fn mean(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        let sum = self.points.iter().fold(DVec3::ZERO, |acc, p| acc + *p);
        sum / self.points.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(range: std::ops::Range<usize>) -> Vec<Point> {
        range.map(|i| DVec3::splat(i as f64)).collect()
    }

    #[test]
    fn test_extend_under_capacity() {
        let mut buf = TrajectoryBuffer::new(10);
        assert_eq!(buf.extend(&pts(0..4)), 0);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.last(), Some(DVec3::splat(3.0)));
        // No eviction yet, center untouched.
        assert_eq!(buf.center(), DVec3::ZERO);
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut buf = TrajectoryBuffer::new(5);
        buf.extend(&pts(0..4));
        let evicted = buf.extend(&pts(4..8));

        assert_eq!(evicted, 3);
        assert_eq!(buf.evicted(), 3);
        assert_eq!(buf.to_vec(), pts(3..8));
    }

    #[test]
    fn test_single_extend_larger_than_capacity() {
        let mut buf = TrajectoryBuffer::new(3);
        buf.extend(&pts(0..10));
        assert_eq!(buf.to_vec(), pts(7..10));
    }

    #[test]
    fn test_center_recomputed_on_eviction() {
        let mut buf = TrajectoryBuffer::new(3);
        buf.extend(&pts(0..3));
        assert_eq!(buf.center(), DVec3::ZERO);

        buf.extend(&pts(3..4));
        // Holds 1, 2, 3.
        assert_eq!(buf.center(), DVec3::splat(2.0));
    }

    #[test]
    fn test_mean_empty() {
        let buf = TrajectoryBuffer::new(3);
        assert_eq!(buf.mean(), DVec3::ZERO);
        assert!(buf.is_empty());
    }
}

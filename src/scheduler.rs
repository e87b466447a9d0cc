//! Recurring best-effort timers for a cooperative event loop.
//!
//! A [`Scheduler`] does not sleep or spawn anything. The owner asks it which
//! timers are due at a given [`Instant`] and dispatches them itself, then
//! waits until [`Scheduler::next_deadline`]. Every registration returns a
//! [`TimerHandle`]; cancelling the handle is the only way to stop a timer.
//!
//! ```
//! use lorenz_trail::scheduler::Scheduler;
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut scheduler = Scheduler::new();
//! let handle = scheduler.every("update", Duration::from_millis(100), start);
//!
//! assert!(scheduler.poll(start).is_empty());
//! assert_eq!(scheduler.poll(start + Duration::from_millis(100)), vec!["update"]);
//!
//! handle.cancel();
//! assert!(scheduler.poll(start + Duration::from_secs(10)).is_empty());
//! assert_eq!(scheduler.active(), 0);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation token for one recurring timer.
///
/// Cloning shares the token. Dropping a handle does *not* cancel the timer.
#[derive(Clone, Debug)]
pub struct TimerHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    /// Stop the timer. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Scheduler-unique timer id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug)]
struct Timer<K> {
    key: K,
    interval: Duration,
    next_due: Instant,
    handle: TimerHandle,
}

/// Set of recurring timers identified by caller-chosen keys.
#[derive(Debug)]
pub struct Scheduler<K> {
    timers: Vec<Timer<K>>,
    next_id: u64,
}

impl<K: Copy> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    /// Register `key` to fire every `interval`, first at `now + interval`.
    ///
    /// A zero interval is treated as 1ms so a timer can never starve the loop.
    pub fn every(&mut self, key: K, interval: Duration, now: Instant) -> TimerHandle {
        let interval = interval.max(Duration::from_millis(1));
        let handle = TimerHandle {
            id: self.next_id,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        self.next_id += 1;

        self.timers.push(Timer {
            key,
            interval,
            next_due: now + interval,
            handle: handle.clone(),
        });
        handle
    }

    /// Keys of all timers due at `now`, earliest deadline first.
    ///
    /// Each timer fires at most once per call. A timer that fell more than one
    /// period behind skips the missed periods instead of firing in a burst.
    pub fn poll(&mut self, now: Instant) -> Vec<K> {
        self.timers.retain(|t| !t.handle.is_cancelled());

        let mut due: Vec<(Instant, K)> = Vec::new();
        for timer in &mut self.timers {
            if timer.next_due > now {
                continue;
            }
            due.push((timer.next_due, timer.key));

            timer.next_due += timer.interval;
            if timer.next_due <= now {
                timer.next_due = now + timer.interval;
            }
        }

        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Earliest deadline among live timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers
            .iter()
            .filter(|t| !t.handle.is_cancelled())
            .map(|t| t.next_due)
            .min()
    }

    /// Number of timers that have not been cancelled.
    pub fn active(&self) -> usize {
        self.timers.iter().filter(|t| !t.handle.is_cancelled()).count()
    }

    /// Cancel every registered timer.
    pub fn cancel_all(&mut self) {
        for timer in self.timers.drain(..) {
            timer.handle.cancel();
        }
    }
}

impl<K: Copy> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_two_cadences() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every('u', ms(100), t0);
        s.every('p', ms(200), t0);

        assert_eq!(s.poll(t0 + ms(99)), Vec::<char>::new());
        assert_eq!(s.poll(t0 + ms(100)), vec!['u']);
        assert_eq!(s.poll(t0 + ms(200)), vec!['u', 'p']);
        assert_eq!(s.next_deadline(), Some(t0 + ms(300)));
    }

    #[test]
    fn test_deadline_order() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every('a', ms(150), t0);
        s.every('b', ms(100), t0);

        // Both late; 'b' was due first.
        assert_eq!(s.poll(t0 + ms(160)), vec!['b', 'a']);
    }

    #[test]
    fn test_missed_periods_skipped() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every(1, ms(100), t0);

        assert_eq!(s.poll(t0 + ms(1000)), vec![1]);
        assert_eq!(s.next_deadline(), Some(t0 + ms(1100)));
        assert!(s.poll(t0 + ms(1050)).is_empty());
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        let a = s.every('a', ms(10), t0);
        let b = s.every('b', ms(10), t0);
        assert_ne!(a.id(), b.id());
        assert_eq!(s.active(), 2);

        a.cancel();
        a.cancel();
        assert!(a.is_cancelled());
        assert_eq!(s.active(), 1);
        assert_eq!(s.poll(t0 + ms(10)), vec!['b']);

        s.cancel_all();
        assert!(b.is_cancelled());
        assert_eq!(s.active(), 0);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_zero_interval_clamped() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every((), Duration::ZERO, t0);
        assert!(s.poll(t0).is_empty());
        assert_eq!(s.poll(t0 + ms(1)).len(), 1);
    }
}

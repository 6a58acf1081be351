//! Clock abstraction and a small deadline queue for UI-loop timers

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used by tests and headless runs.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Handle for a scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    deadline: Instant,
    payload: T,
}

/// Deadline-ordered timer queue.
///
/// Timers with equal deadlines fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Instant, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline,
            payload,
        });
        id
    }

    /// Cancel a timer, returning its payload if it had not fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos).payload)
    }

    /// Remove and return the earliest timer due at `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.id.0))
            .map(|(pos, _)| pos)?;
        Some(self.entries.remove(pos).payload)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut timers = TimerQueue::new();

        timers.schedule(start + Duration::from_millis(30), "late");
        timers.schedule(start + Duration::from_millis(10), "early");
        timers.schedule(start + Duration::from_millis(10), "early-second");

        assert_eq!(timers.pop_due(start), None);

        clock.advance(Duration::from_millis(30));
        assert_eq!(timers.pop_due(clock.now()), Some("early"));
        assert_eq!(timers.pop_due(clock.now()), Some("early-second"));
        assert_eq!(timers.pop_due(clock.now()), Some("late"));
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let clock = ManualClock::new();
        let mut timers = TimerQueue::new();
        let id = timers.schedule(clock.now(), 1);

        assert_eq!(timers.cancel(id), Some(1));
        assert_eq!(timers.cancel(id), None);
        assert_eq!(timers.pop_due(clock.now()), None);
    }

    #[test]
    fn next_deadline_is_earliest() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut timers = TimerQueue::new();
        assert_eq!(timers.next_deadline(), None);

        timers.schedule(start + Duration::from_millis(500), ());
        timers.schedule(start + Duration::from_millis(300), ());
        assert_eq!(
            timers.next_deadline(),
            Some(start + Duration::from_millis(300))
        );
    }
}

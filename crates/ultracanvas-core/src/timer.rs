//! One-shot and repeating timers for the UI loop.
//!
//! Deadlines are expressed against a [`Clock`](crate::Clock) reading, so the
//! same manager works with real and simulated time. The application loop asks
//! [`TimerManager::time_until_next`] for its poll timeout and then calls
//! [`TimerManager::process_expired`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    OneShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

#[derive(Debug)]
struct TimerData {
    next_fire: Duration,
    interval: Duration,
    kind: TimerKind,
}

/// An entry in the timer queue (min-heap by fire time, FIFO on ties).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Duration,
    sequence: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time && self.sequence == other.sequence
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .fire_time
            .cmp(&self.fire_time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Manages all timers for the application.
#[derive(Debug, Default)]
pub struct TimerManager {
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<TimerQueueEntry>,
    sequence: u64,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a one-shot timer firing `duration` after `now`.
    pub fn start_one_shot(&mut self, now: Duration, duration: Duration) -> TimerId {
        self.insert(now + duration, duration, TimerKind::OneShot)
    }

    /// Start a repeating timer. The first fire occurs one `interval` after `now`.
    pub fn start_repeating(&mut self, now: Duration, interval: Duration) -> Result<TimerId> {
        if interval.is_zero() {
            return Err(TimerError::ZeroInterval.into());
        }
        Ok(self.insert(now + interval, interval, TimerKind::Repeating))
    }

    fn insert(&mut self, next_fire: Duration, interval: Duration, kind: TimerKind) -> TimerId {
        let id = self.timers.insert(TimerData {
            next_fire,
            interval,
            kind,
        });
        self.enqueue(id, next_fire);
        tracing::trace!(target: targets::TIMER, ?id, ?kind, ?next_fire, "timer started");
        id
    }

    fn enqueue(&mut self, id: TimerId, fire_time: Duration) {
        self.sequence += 1;
        self.queue.push(TimerQueueEntry {
            id,
            fire_time,
            sequence: self.sequence,
        });
    }

    /// Stop and remove a timer.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        match self.timers.remove(id) {
            Some(_) => Ok(()),
            None => Err(TimerError::InvalidTimerId.into()),
        }
    }

    /// Check if a timer is currently active.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Duration from `now` until the next timer fires, if any.
    pub fn time_until_next(&mut self, now: Duration) -> Option<Duration> {
        self.drop_stale_entries();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_sub(now))
    }

    fn drop_stale_entries(&mut self) {
        while let Some(entry) = self.queue.peek() {
            let live = self
                .timers
                .get(entry.id)
                .is_some_and(|t| t.next_fire == entry.fire_time);
            if live {
                break;
            }
            self.queue.pop();
        }
    }

    /// Pop every timer whose deadline is at or before `now`.
    ///
    /// Returns the fired IDs in deadline order. Repeating timers are
    /// rescheduled relative to `now`, so a stalled loop fires them once
    /// rather than replaying every missed interval.
    pub fn process_expired(&mut self, now: Duration) -> Vec<TimerId> {
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            let Some(timer) = self.timers.get_mut(entry.id) else {
                continue;
            };
            if timer.next_fire != entry.fire_time {
                continue;
            }

            tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
            fired.push(entry.id);

            match timer.kind {
                TimerKind::OneShot => {
                    self.timers.remove(entry.id);
                }
                TimerKind::Repeating => {
                    timer.next_fire = now + timer.interval;
                    let next = timer.next_fire;
                    self.enqueue(entry.id, next);
                }
            }
        }

        fired
    }

    /// Get the number of active timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut timers = TimerManager::new();
        let id = timers.start_one_shot(ms(0), ms(100));

        assert!(timers.process_expired(ms(99)).is_empty());
        assert_eq!(timers.process_expired(ms(100)), vec![id]);
        assert!(!timers.is_active(id));
        assert!(timers.process_expired(ms(500)).is_empty());
    }

    #[test]
    fn test_repeating_reschedules() {
        let mut timers = TimerManager::new();
        let id = timers.start_repeating(ms(0), ms(50)).unwrap();

        assert_eq!(timers.process_expired(ms(50)), vec![id]);
        assert_eq!(timers.time_until_next(ms(60)), Some(ms(40)));
        assert_eq!(timers.process_expired(ms(100)), vec![id]);
        assert!(timers.is_active(id));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut timers = TimerManager::new();
        assert!(timers.start_repeating(ms(0), Duration::ZERO).is_err());
    }

    #[test]
    fn test_stop_removes_timer() {
        let mut timers = TimerManager::new();
        let id = timers.start_one_shot(ms(0), ms(10));
        timers.stop(id).unwrap();

        assert!(timers.stop(id).is_err());
        assert_eq!(timers.time_until_next(ms(0)), None);
        assert!(timers.process_expired(ms(20)).is_empty());
    }

    #[test]
    fn test_fire_order_follows_deadline() {
        let mut timers = TimerManager::new();
        let late = timers.start_one_shot(ms(0), ms(30));
        let early = timers.start_one_shot(ms(0), ms(10));
        let tie = timers.start_one_shot(ms(0), ms(10));

        assert_eq!(timers.process_expired(ms(40)), vec![early, tie, late]);
        assert_eq!(timers.active_count(), 0);
    }
}

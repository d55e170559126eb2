//! Deterministic timer queue.
//!
//! Stands in for the host's "run once after N ms" / "run every N ms"
//! primitives. Nothing here runs on its own: the owner polls with the
//! current time and applies each fired entry itself.
//!
//! ## Ordering
//!
//! Entries fire in order of due time, ties broken by the order in which
//! they were scheduled. A periodic entry is rescheduled at exactly
//! `due + period`, so a late poll catches up without drift.
//!
//! ## Cancellation
//!
//! [`TimerQueue::cancel_all`] drops every pending entry and bumps the
//! queue generation. A [`Fired`] value obtained before the bump is stale
//! and [`TimerQueue::is_current`] reports it as such.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<K> {
    id: TimerId,
    key: K,
    period_ms: Option<u64>,
    generation: u64,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<K> {
    pub id: TimerId,
    pub key: K,
    /// The instant the timer was scheduled to fire at, not when it was polled.
    pub due_ms: u64,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    entries: BTreeMap<(u64, u64), Entry<K>>,
    next_seq: u64,
    next_id: u64,
    generation: u64,
}

impl<K: Clone> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
            next_id: 0,
            generation: 0,
        }
    }

    /// Schedule `key` to fire once, `after_ms` after `now_ms`.
    pub fn once(&mut self, now_ms: u64, after_ms: u64, key: K) -> TimerId {
        self.insert(now_ms.saturating_add(after_ms), None, key)
    }

    /// Schedule `key` to fire every `period_ms`, first at `now_ms + period_ms`.
    ///
    /// A zero period is treated as one millisecond so the queue can never
    /// spin on a single instant.
    pub fn every(&mut self, now_ms: u64, period_ms: u64, key: K) -> TimerId {
        let period = period_ms.max(1);
        self.insert(now_ms.saturating_add(period), Some(period), key)
    }

    /// Cancel one entry. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let slot = self
            .entries
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(slot, _)| *slot);
        match slot {
            Some(slot) => {
                self.entries.remove(&slot);
                true
            }
            None => false,
        }
    }

    /// Drop every pending entry and start a new generation.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    /// Pop the earliest entry due at or before `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<Fired<K>> {
        let (&(due_ms, _), _) = self.entries.first_key_value()?;
        if due_ms > now_ms {
            return None;
        }
        let (_, entry) = self.entries.pop_first()?;
        if let Some(period) = entry.period_ms {
            let seq = self.bump_seq();
            self.entries.insert(
                (due_ms.saturating_add(period), seq),
                Entry {
                    id: entry.id,
                    key: entry.key.clone(),
                    period_ms: entry.period_ms,
                    generation: entry.generation,
                },
            );
        }
        tracing::trace!(id = entry.id.0, due_ms, "timer fired");
        Some(Fired {
            id: entry.id,
            key: entry.key,
            due_ms,
            generation: entry.generation,
        })
    }

    /// Whether a fired entry belongs to the current generation.
    pub fn is_current(&self, fired: &Fired<K>) -> bool {
        fired.generation == self.generation
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.values().any(|entry| entry.id == id)
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.keys().next().map(|&(due, _)| due)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, due_ms: u64, period_ms: Option<u64>, key: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.entries.insert(
            (due_ms, seq),
            Entry {
                id,
                key,
                period_ms,
                generation: self.generation,
            },
        );
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<K: Clone> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<&'static str>, now: u64) -> Vec<(&'static str, u64)> {
        let mut out = Vec::new();
        while let Some(fired) = queue.poll(now) {
            out.push((fired.key, fired.due_ms));
        }
        out
    }

    #[test]
    fn once_fires_at_due_time_only() {
        let mut q = TimerQueue::new();
        q.once(0, 100, "a");
        assert!(q.poll(99).is_none());
        let fired = q.poll(100).unwrap();
        assert_eq!(fired.key, "a");
        assert_eq!(fired.due_ms, 100);
        assert!(q.is_empty());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.once(0, 50, "first");
        q.once(0, 50, "second");
        q.once(0, 10, "earliest");
        assert_eq!(
            drain(&mut q, 50),
            vec![("earliest", 10), ("first", 50), ("second", 50)]
        );
    }

    #[test]
    fn periodic_catches_up_without_drift() {
        let mut q = TimerQueue::new();
        q.every(0, 1_000, "tick");
        let fired = drain(&mut q, 3_500);
        assert_eq!(fired, vec![("tick", 1_000), ("tick", 2_000), ("tick", 3_000)]);
        assert_eq!(q.next_due(), Some(4_000));
    }

    #[test]
    fn periodic_cancelled_from_its_own_fire_stops() {
        let mut q = TimerQueue::new();
        let id = q.every(0, 100, "tick");
        let fired = q.poll(100).unwrap();
        assert_eq!(fired.id, id);
        assert!(q.cancel(id));
        assert!(q.poll(10_000).is_none());
    }

    #[test]
    fn cancel_all_marks_outstanding_fires_stale() {
        let mut q = TimerQueue::new();
        q.once(0, 10, "a");
        q.once(0, 20, "b");
        let fired = q.poll(10).unwrap();
        assert!(q.is_current(&fired));

        q.cancel_all();
        assert!(!q.is_current(&fired));
        assert!(q.poll(1_000).is_none());
        assert_eq!(q.generation(), 1);
    }

    #[test]
    fn cancel_unknown_returns_false() {
        let mut q: TimerQueue<&str> = TimerQueue::new();
        let id = q.once(0, 10, "a");
        assert!(q.is_pending(id));
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(!q.is_pending(id));
    }

    #[test]
    fn zero_period_does_not_spin() {
        let mut q = TimerQueue::new();
        q.every(0, 0, "x");
        assert_eq!(drain(&mut q, 3).len(), 3);
    }
}

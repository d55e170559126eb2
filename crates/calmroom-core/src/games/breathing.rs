//! Breathing cycle controller.
//!
//! Round-robin over a fixed list of named phases for as long as the
//! controller is active:
//!
//! ```text
//! Breathe In (4s) -> Hold (7s) -> Breathe Out (8s) -> Breathe In ...
//! ```
//!
//! Every return to the first phase counts one completed cycle.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, MonotonicClock};
use crate::controller::Controller;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::random::new_session_id;
use crate::timer::TimerQueue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub label: String,
    pub duration_ms: u64,
}

impl Phase {
    pub fn new(label: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            label: label.into(),
            duration_ms,
        }
    }

    /// The 4-7-8 technique.
    pub fn four_seven_eight() -> Vec<Phase> {
        vec![
            Phase::new("Breathe In", 4_000),
            Phase::new("Hold", 7_000),
            Phase::new("Breathe Out", 8_000),
        ]
    }
}

/// Breathing settings as stored in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingSettings {
    #[serde(default = "Phase::four_seven_eight")]
    pub phases: Vec<Phase>,
}

impl Default for BreathingSettings {
    fn default() -> Self {
        Self {
            phases: Phase::four_seven_eight(),
        }
    }
}

impl BreathingSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.phases.is_empty() {
            return Err(ValidationError::EmptyCollection("breathing.phases".into()));
        }
        if let Some(phase) = self.phases.iter().find(|p| p.duration_ms == 0) {
            return Err(ValidationError::invalid(
                "breathing.phases",
                format!("phase '{}' must last longer than 0 ms", phase.label),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreathingTimer {
    PhaseElapsed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingSnapshot {
    pub session_id: Uuid,
    pub active: bool,
    pub phase_index: usize,
    pub phase_label: String,
    pub cycles_completed: u32,
    /// Time left in the current phase; zero when stopped.
    pub phase_remaining_ms: u64,
}

pub struct BreathingCycle<C: Clock = MonotonicClock> {
    phases: Vec<Phase>,
    clock: C,
    timers: TimerQueue<BreathingTimer>,
    session_id: Uuid,
    phase_index: usize,
    active: bool,
    cycles_completed: u32,
}

impl<C: Clock> BreathingCycle<C> {
    pub fn new(settings: &BreathingSettings, clock: C) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            phases: settings.phases.clone(),
            clock,
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            phase_index: 0,
            active: false,
            cycles_completed: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn current_phase(&self) -> &Phase {
        &self.phases[self.phase_index]
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin at the first phase. Ignored while already active.
    pub fn start(&mut self) -> Vec<Event> {
        if self.active {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.timers.cancel_all();
        self.session_id = new_session_id();
        self.active = true;
        self.phase_index = 0;
        self.cycles_completed = 0;

        let phase = &self.phases[0];
        self.timers
            .once(now, phase.duration_ms, BreathingTimer::PhaseElapsed);
        tracing::debug!(session = %self.session_id, "breathing started");
        vec![Event::BreathingStarted {
            session_id: self.session_id,
            phase_label: phase.label.clone(),
            duration_ms: phase.duration_ms,
            at: Utc::now(),
        }]
    }

    /// Stop the cycle, keeping the last phase and cycle count for display.
    pub fn stop(&mut self) -> Vec<Event> {
        if !self.active {
            return Vec::new();
        }
        self.active = false;
        self.timers.cancel_all();
        tracing::debug!(
            session = %self.session_id,
            cycles = self.cycles_completed,
            "breathing stopped"
        );
        vec![Event::BreathingStopped {
            session_id: self.session_id,
            phase_index: self.phase_index,
            cycles_completed: self.cycles_completed,
            at: Utc::now(),
        }]
    }

    /// `start()` when stopped, `stop()` when running.
    pub fn toggle(&mut self) -> Vec<Event> {
        if self.active {
            self.stop()
        } else {
            self.start()
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_phase_elapsed(&mut self, due_ms: u64, events: &mut Vec<Event>) {
        let next = (self.phase_index + 1) % self.phases.len();
        self.phase_index = next;
        let phase = &self.phases[next];
        self.timers
            .once(due_ms, phase.duration_ms, BreathingTimer::PhaseElapsed);
        events.push(Event::PhaseChanged {
            session_id: self.session_id,
            phase_index: next,
            phase_label: phase.label.clone(),
            duration_ms: phase.duration_ms,
            at: Utc::now(),
        });
        if next == 0 {
            self.cycles_completed += 1;
            events.push(Event::CycleCompleted {
                session_id: self.session_id,
                cycles_completed: self.cycles_completed,
                at: Utc::now(),
            });
        }
    }
}

impl BreathingCycle<MonotonicClock> {
    pub fn with_defaults() -> Self {
        Self {
            phases: Phase::four_seven_eight(),
            clock: MonotonicClock::new(),
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            phase_index: 0,
            active: false,
            cycles_completed: 0,
        }
    }
}

impl<C: Clock> Controller for BreathingCycle<C> {
    type Snapshot = BreathingSnapshot;

    fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.timers.poll(now) {
            if !self.active || !self.timers.is_current(&fired) {
                continue;
            }
            match fired.key {
                BreathingTimer::PhaseElapsed => self.on_phase_elapsed(fired.due_ms, &mut events),
            }
        }
        events
    }

    fn snapshot(&self) -> BreathingSnapshot {
        let phase_remaining_ms = if self.active {
            self.timers
                .next_due()
                .map(|due| due.saturating_sub(self.clock.now_ms()))
                .unwrap_or(0)
        } else {
            0
        };
        BreathingSnapshot {
            session_id: self.session_id,
            active: self.active,
            phase_index: self.phase_index,
            phase_label: self.current_phase().label.clone(),
            cycles_completed: self.cycles_completed,
            phase_remaining_ms,
        }
    }

    fn teardown(&mut self) {
        self.active = false;
        self.timers.cancel_all();
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn breathing() -> (BreathingCycle<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let cycle = BreathingCycle::new(&BreathingSettings::default(), clock.clone()).unwrap();
        (cycle, clock)
    }

    #[test]
    fn start_enters_first_phase() {
        let (mut cycle, _clock) = breathing();
        let events = cycle.start();
        assert_eq!(events.len(), 1);
        assert!(cycle.is_active());
        assert_eq!(cycle.current_phase().label, "Breathe In");
        assert_eq!(cycle.snapshot().phase_remaining_ms, 4_000);
    }

    #[test]
    fn phases_advance_on_their_own_durations() {
        let (mut cycle, clock) = breathing();
        cycle.start();

        clock.set(3_999);
        assert!(cycle.tick().is_empty());
        assert_eq!(cycle.phase_index(), 0);

        clock.set(4_000);
        cycle.tick();
        assert_eq!(cycle.current_phase().label, "Hold");

        clock.set(11_000);
        cycle.tick();
        assert_eq!(cycle.current_phase().label, "Breathe Out");
        assert_eq!(cycle.cycles_completed(), 0);

        clock.set(19_000);
        let events = cycle.tick();
        assert_eq!(cycle.phase_index(), 0);
        assert_eq!(cycle.cycles_completed(), 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::CycleCompleted { cycles_completed: 1, .. })));
    }

    #[test]
    fn late_tick_catches_up_every_phase() {
        let (mut cycle, clock) = breathing();
        cycle.start();
        clock.set(19_000 * 3 + 4_000);
        cycle.tick();
        assert_eq!(cycle.cycles_completed(), 3);
        assert_eq!(cycle.current_phase().label, "Hold");
    }

    #[test]
    fn stop_retains_display_state_and_freezes() {
        let (mut cycle, clock) = breathing();
        cycle.start();
        clock.set(19_000 + 4_000);
        cycle.tick();
        assert!(!cycle.stop().is_empty());

        clock.set(100_000);
        assert!(cycle.tick().is_empty());
        assert_eq!(cycle.cycles_completed(), 1);
        assert_eq!(cycle.phase_index(), 1);
        assert!(!cycle.snapshot().active);
    }

    #[test]
    fn start_while_active_is_ignored() {
        let (mut cycle, clock) = breathing();
        cycle.start();
        clock.set(5_000);
        cycle.tick();
        assert!(cycle.start().is_empty());
        assert_eq!(cycle.phase_index(), 1);
    }

    #[test]
    fn restart_resets_counters() {
        let (mut cycle, clock) = breathing();
        cycle.start();
        clock.set(40_000);
        cycle.tick();
        cycle.stop();
        cycle.start();
        assert_eq!(cycle.phase_index(), 0);
        assert_eq!(cycle.cycles_completed(), 0);
        clock.set(43_999);
        cycle.tick();
        assert_eq!(cycle.phase_index(), 0);
    }

    #[test]
    fn rejects_empty_or_zero_phases() {
        let clock = ManualClock::new();
        let empty = BreathingSettings { phases: vec![] };
        assert!(BreathingCycle::new(&empty, clock.clone()).is_err());

        let zero = BreathingSettings {
            phases: vec![Phase::new("In", 0)],
        };
        assert!(BreathingCycle::new(&zero, clock).is_err());
    }

    #[test]
    fn single_phase_completes_a_cycle_each_time() {
        let clock = ManualClock::new();
        let settings = BreathingSettings {
            phases: vec![Phase::new("Box", 1_000)],
        };
        let mut cycle = BreathingCycle::new(&settings, clock.clone()).unwrap();
        cycle.start();
        clock.set(3_000);
        cycle.tick();
        assert_eq!(cycle.cycles_completed(), 3);
    }
}

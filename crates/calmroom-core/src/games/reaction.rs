//! Reaction timer controller.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start/tap--> Waiting --trigger--> Ready --tap--> Result --tap--> Waiting
//!                        |
//!                        +--tap (too early)--> Idle
//! ```
//!
//! A sample is only recorded on the `Ready -> Result` edge. The trigger's
//! timestamp is the instant it was scheduled for, so a host that ticks
//! late does not inflate the measured latency.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, MonotonicClock};
use crate::controller::Controller;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::random::{entropy_rng, new_session_id, GameRng};
use crate::timer::TimerQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionState {
    Idle,
    Waiting,
    Ready,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSample {
    pub delay_ms: u64,
    pub reaction_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSettings {
    /// Inclusive lower bound of the random delay.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Exclusive upper bound of the random delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_min_delay_ms() -> u64 {
    1_500
}
fn default_max_delay_ms() -> u64 {
    5_000
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl ReactionSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_delay_ms <= self.min_delay_ms {
            return Err(ValidationError::invalid(
                "reaction.max_delay_ms",
                format!(
                    "must be greater than min_delay_ms ({} <= {})",
                    self.max_delay_ms, self.min_delay_ms
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerTimer {
    Fire,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSnapshot {
    pub session_id: Uuid,
    pub state: ReactionState,
    pub last_reaction_ms: Option<u64>,
    pub best_ms: Option<u64>,
    pub average_ms: Option<u64>,
    pub samples: Vec<ReactionSample>,
    pub early_taps: u32,
}

pub struct ReactionTimer<C: Clock = MonotonicClock> {
    settings: ReactionSettings,
    clock: C,
    rng: GameRng,
    timers: TimerQueue<TriggerTimer>,
    session_id: Uuid,
    state: ReactionState,
    pending_delay_ms: u64,
    triggered_at_ms: Option<u64>,
    samples: Vec<ReactionSample>,
    best_ms: Option<u64>,
    last_reaction_ms: Option<u64>,
    early_taps: u32,
}

impl<C: Clock> ReactionTimer<C> {
    pub fn new(settings: &ReactionSettings, clock: C, rng: GameRng) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: settings.clone(),
            clock,
            rng,
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            state: ReactionState::Idle,
            pending_delay_ms: 0,
            triggered_at_ms: None,
            samples: Vec::new(),
            best_ms: None,
            last_reaction_ms: None,
            early_taps: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ReactionState {
        self.state
    }

    pub fn samples(&self) -> &[ReactionSample] {
        &self.samples
    }

    pub fn best_ms(&self) -> Option<u64> {
        self.best_ms
    }

    pub fn last_reaction_ms(&self) -> Option<u64> {
        self.last_reaction_ms
    }

    /// Rounded mean of every recorded reaction.
    pub fn average_ms(&self) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as u64;
        let sum: u64 = self.samples.iter().map(|s| s.reaction_ms).sum();
        Some((sum + n / 2) / n)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a round. Only honoured from `Idle` or `Result`.
    pub fn start(&mut self) -> Vec<Event> {
        let mut events = self.drain_due();
        if matches!(self.state, ReactionState::Idle | ReactionState::Result) {
            events.push(self.begin_round());
        }
        events
    }

    /// The single user intent: its meaning depends on the current state.
    pub fn tap(&mut self) -> Vec<Event> {
        let mut events = self.drain_due();
        match self.state {
            ReactionState::Idle | ReactionState::Result => events.push(self.begin_round()),
            ReactionState::Waiting => {
                self.timers.cancel_all();
                self.state = ReactionState::Idle;
                self.early_taps += 1;
                tracing::debug!(session = %self.session_id, "reaction tap too early");
                events.push(Event::ReactionTooEarly {
                    session_id: self.session_id,
                    at: Utc::now(),
                });
            }
            ReactionState::Ready => events.push(self.record()),
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_round(&mut self) -> Event {
        let now = self.clock.now_ms();
        let delay = self
            .rng
            .gen_range(self.settings.min_delay_ms..self.settings.max_delay_ms);
        self.timers.cancel_all();
        self.timers.once(now, delay, TriggerTimer::Fire);
        self.pending_delay_ms = delay;
        self.triggered_at_ms = None;
        self.state = ReactionState::Waiting;
        tracing::debug!(session = %self.session_id, delay_ms = delay, "reaction round armed");
        Event::ReactionWaiting {
            session_id: self.session_id,
            delay_ms: delay,
            at: Utc::now(),
        }
    }

    fn record(&mut self) -> Event {
        let now = self.clock.now_ms();
        let triggered = self.triggered_at_ms.unwrap_or(now);
        let sample = ReactionSample {
            delay_ms: self.pending_delay_ms,
            reaction_ms: now.saturating_sub(triggered),
        };
        self.samples.push(sample);
        let best = self
            .best_ms
            .map_or(sample.reaction_ms, |b| b.min(sample.reaction_ms));
        self.best_ms = Some(best);
        self.last_reaction_ms = Some(sample.reaction_ms);
        self.state = ReactionState::Result;
        tracing::debug!(
            session = %self.session_id,
            reaction_ms = sample.reaction_ms,
            best_ms = best,
            "reaction recorded"
        );
        Event::ReactionRecorded {
            session_id: self.session_id,
            sample,
            best_ms: best,
            average_ms: self.average_ms().unwrap_or(sample.reaction_ms),
            at: Utc::now(),
        }
    }

    fn drain_due(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.timers.poll(now) {
            if !self.timers.is_current(&fired) || self.state != ReactionState::Waiting {
                continue;
            }
            match fired.key {
                TriggerTimer::Fire => {
                    self.triggered_at_ms = Some(fired.due_ms);
                    self.state = ReactionState::Ready;
                    events.push(Event::ReactionReady {
                        session_id: self.session_id,
                        at: Utc::now(),
                    });
                }
            }
        }
        events
    }
}

impl ReactionTimer<MonotonicClock> {
    pub fn with_defaults() -> Self {
        Self {
            settings: ReactionSettings::default(),
            clock: MonotonicClock::new(),
            rng: entropy_rng(),
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            state: ReactionState::Idle,
            pending_delay_ms: 0,
            triggered_at_ms: None,
            samples: Vec::new(),
            best_ms: None,
            last_reaction_ms: None,
            early_taps: 0,
        }
    }
}

impl<C: Clock> Controller for ReactionTimer<C> {
    type Snapshot = ReactionSnapshot;

    fn tick(&mut self) -> Vec<Event> {
        self.drain_due()
    }

    fn snapshot(&self) -> ReactionSnapshot {
        ReactionSnapshot {
            session_id: self.session_id,
            state: self.state,
            last_reaction_ms: self.last_reaction_ms,
            best_ms: self.best_ms,
            average_ms: self.average_ms(),
            samples: self.samples.clone(),
            early_taps: self.early_taps,
        }
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        if self.state != ReactionState::Result {
            self.state = ReactionState::Idle;
        }
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due()
    }
}

//! Pattern memory controller.
//!
//! The controller plays back a sequence of tile highlights, then checks the
//! player's replay one tap at a time. The first wrong tap ends the game;
//! reproducing the whole sequence grows it by one tile and plays it again.
//!
//! ## Playback timeline
//!
//! For a sequence of length `n`, relative to the start of playback:
//!
//! ```text
//! i * step_ms                  highlight tile i
//! i * step_ms + highlight_ms   clear highlight
//! n * step_ms                  playback finished, taps accepted
//! ```
//!
//! Playback is preceded by a lead-in delay. Taps are rejected from the
//! moment playback is scheduled, lead-in included. Starting a playback
//! cancels every timer still pending from the previous one.

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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSettings {
    #[serde(default = "default_tile_count")]
    pub tile_count: usize,
    /// Lead-in before the first playback of a game.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    /// Lead-in before replaying a grown sequence.
    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    /// How long a tapped tile stays lit.
    #[serde(default = "default_tap_flash_ms")]
    pub tap_flash_ms: u64,
}

fn default_tile_count() -> usize {
    4
}
fn default_start_delay_ms() -> u64 {
    500
}
fn default_advance_delay_ms() -> u64 {
    800
}
fn default_highlight_ms() -> u64 {
    400
}
fn default_step_ms() -> u64 {
    600
}
fn default_tap_flash_ms() -> u64 {
    200
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            tile_count: default_tile_count(),
            start_delay_ms: default_start_delay_ms(),
            advance_delay_ms: default_advance_delay_ms(),
            highlight_ms: default_highlight_ms(),
            step_ms: default_step_ms(),
            tap_flash_ms: default_tap_flash_ms(),
        }
    }
}

impl PatternSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tile_count == 0 {
            return Err(ValidationError::invalid("pattern.tile_count", "must be at least 1"));
        }
        if self.step_ms == 0 {
            return Err(ValidationError::invalid("pattern.step_ms", "must be greater than 0"));
        }
        if self.highlight_ms >= self.step_ms {
            return Err(ValidationError::invalid(
                "pattern.highlight_ms",
                "must be shorter than step_ms so consecutive highlights are distinguishable",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternTimer {
    BeginPlayback,
    Highlight(usize),
    Unhighlight,
    PlaybackDone,
    FlashOff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub session_id: Uuid,
    pub tile_count: usize,
    pub level: u32,
    pub sequence_len: usize,
    pub input_len: usize,
    pub showing_pattern: bool,
    pub active_tile: Option<usize>,
    pub game_over: bool,
    pub high_score: u32,
}

pub struct PatternMemory<C: Clock = MonotonicClock> {
    settings: PatternSettings,
    clock: C,
    rng: GameRng,
    timers: TimerQueue<PatternTimer>,
    session_id: Uuid,
    sequence: Vec<usize>,
    player_input: Vec<usize>,
    level: u32,
    showing_pattern: bool,
    active_tile: Option<usize>,
    game_over: bool,
    high_score: u32,
}

impl<C: Clock> PatternMemory<C> {
    pub fn new(settings: &PatternSettings, clock: C, rng: GameRng) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(settings.clone(), clock, rng))
    }

    fn build(settings: PatternSettings, clock: C, rng: GameRng) -> Self {
        Self {
            settings,
            clock,
            rng,
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            sequence: Vec::new(),
            player_input: Vec::new(),
            level: 0,
            showing_pattern: false,
            active_tile: None,
            game_over: false,
            high_score: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn player_input(&self) -> &[usize] {
        &self.player_input
    }

    pub fn is_showing_pattern(&self) -> bool {
        self.showing_pattern
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn active_tile(&self) -> Option<usize> {
        self.active_tile
    }

    /// A round is underway: started and not yet lost.
    pub fn in_progress(&self) -> bool {
        self.level > 0 && !self.game_over
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a fresh game at level 1. Ignored while a game is in progress.
    pub fn start(&mut self) -> Vec<Event> {
        let mut events = self.drain_due();
        if self.in_progress() {
            return events;
        }
        let now = self.clock.now_ms();
        self.timers.cancel_all();
        self.session_id = new_session_id();
        self.game_over = false;
        self.level = 1;
        self.player_input.clear();
        self.active_tile = None;
        self.sequence = vec![self.random_tile()];
        self.schedule_playback(now, self.settings.start_delay_ms);
        tracing::debug!(session = %self.session_id, "pattern game started");
        events.push(Event::PatternStarted {
            session_id: self.session_id,
            at: Utc::now(),
        });
        events
    }

    /// Player taps a tile. Ignored during playback, after game over,
    /// before the first start, and for tiles outside the board.
    pub fn tap(&mut self, tile: usize) -> Vec<Event> {
        let mut events = self.drain_due();
        if self.showing_pattern
            || self.game_over
            || self.level == 0
            || tile >= self.settings.tile_count
        {
            return events;
        }
        let now = self.clock.now_ms();
        self.player_input.push(tile);
        self.active_tile = Some(tile);
        self.timers
            .once(now, self.settings.tap_flash_ms, PatternTimer::FlashOff);

        let position = self.player_input.len() - 1;
        let expected = self.sequence[position];
        if tile != expected {
            self.game_over = true;
            self.high_score = self.high_score.max(self.level);
            tracing::debug!(
                session = %self.session_id,
                level = self.level,
                expected,
                tile,
                "pattern mismatch"
            );
            events.push(Event::PatternGameOver {
                session_id: self.session_id,
                level: self.level,
                expected,
                tapped: tile,
                high_score: self.high_score,
                at: Utc::now(),
            });
            return events;
        }

        events.push(Event::TileAccepted {
            session_id: self.session_id,
            tile,
            position,
            at: Utc::now(),
        });

        if self.player_input.len() == self.sequence.len() {
            self.level += 1;
            self.player_input.clear();
            let next = self.random_tile();
            self.sequence.push(next);
            self.schedule_playback(now, self.settings.advance_delay_ms);
            tracing::debug!(session = %self.session_id, level = self.level, "pattern level advanced");
            events.push(Event::LevelAdvanced {
                session_id: self.session_id,
                level: self.level,
                at: Utc::now(),
            });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn random_tile(&mut self) -> usize {
        self.rng.gen_range(0..self.settings.tile_count)
    }

    fn schedule_playback(&mut self, now: u64, lead_in_ms: u64) {
        self.showing_pattern = true;
        self.timers.once(now, lead_in_ms, PatternTimer::BeginPlayback);
    }

    fn begin_playback(&mut self, due_ms: u64, events: &mut Vec<Event>) {
        self.timers.cancel_all();
        self.active_tile = None;
        let step = self.settings.step_ms;
        let highlight = self.settings.highlight_ms;
        for (i, &tile) in self.sequence.iter().enumerate() {
            let offset = i as u64 * step;
            self.timers.once(due_ms, offset, PatternTimer::Highlight(tile));
            self.timers
                .once(due_ms, offset + highlight, PatternTimer::Unhighlight);
        }
        self.timers.once(
            due_ms,
            self.sequence.len() as u64 * step,
            PatternTimer::PlaybackDone,
        );
        events.push(Event::PatternPlaybackStarted {
            session_id: self.session_id,
            level: self.level,
            length: self.sequence.len(),
            at: Utc::now(),
        });
    }

    fn drain_due(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.timers.poll(now) {
            if !self.timers.is_current(&fired) {
                continue;
            }
            match fired.key {
                PatternTimer::BeginPlayback => self.begin_playback(fired.due_ms, &mut events),
                PatternTimer::Highlight(tile) => {
                    self.active_tile = Some(tile);
                    events.push(Event::TileHighlighted {
                        session_id: self.session_id,
                        tile: Some(tile),
                        at: Utc::now(),
                    });
                }
                PatternTimer::Unhighlight => {
                    self.active_tile = None;
                    events.push(Event::TileHighlighted {
                        session_id: self.session_id,
                        tile: None,
                        at: Utc::now(),
                    });
                }
                PatternTimer::PlaybackDone => {
                    self.showing_pattern = false;
                    events.push(Event::PatternPlaybackFinished {
                        session_id: self.session_id,
                        level: self.level,
                        at: Utc::now(),
                    });
                }
                PatternTimer::FlashOff => self.active_tile = None,
            }
        }
        events
    }
}

impl PatternMemory<MonotonicClock> {
    pub fn with_defaults() -> Self {
        Self::build(PatternSettings::default(), MonotonicClock::new(), entropy_rng())
    }
}

impl<C: Clock> Controller for PatternMemory<C> {
    type Snapshot = PatternSnapshot;

    fn tick(&mut self) -> Vec<Event> {
        self.drain_due()
    }

    fn snapshot(&self) -> PatternSnapshot {
        PatternSnapshot {
            session_id: self.session_id,
            tile_count: self.settings.tile_count,
            level: self.level,
            sequence_len: self.sequence.len(),
            input_len: self.player_input.len(),
            showing_pattern: self.showing_pattern,
            active_tile: self.active_tile,
            game_over: self.game_over,
            high_score: self.high_score,
        }
    }

    /// Abandon the round. The high score survives and `start()` works again.
    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.level = 0;
        self.sequence.clear();
        self.player_input.clear();
        self.showing_pattern = false;
        self.active_tile = None;
        self.game_over = false;
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due()
    }
}

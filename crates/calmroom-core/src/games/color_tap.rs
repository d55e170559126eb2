//! Color tap: hit the named colour as often as possible before time runs out.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, MonotonicClock};
use crate::controller::Controller;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::random::{entropy_rng, new_session_id, shuffled, GameRng};
use crate::timer::TimerQueue;

pub const COLORS: [&str; 4] = ["Sage", "Coral", "Sky", "Lavender"];

const SECOND_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTapSettings {
    #[serde(default = "default_round_secs")]
    pub round_secs: u64,
}

fn default_round_secs() -> u64 {
    15
}

impl Default for ColorTapSettings {
    fn default() -> Self {
        Self {
            round_secs: default_round_secs(),
        }
    }
}

impl ColorTapSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.round_secs == 0 {
            return Err(ValidationError::invalid("color_tap.round_secs", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorTimer {
    Second,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTapSnapshot {
    pub session_id: Uuid,
    pub playing: bool,
    pub target: String,
    /// Colour names in the order the buttons are laid out.
    pub options: Vec<String>,
    pub score: u32,
    pub secs_left: u64,
    pub high_score: u32,
}

pub struct ColorTap<C: Clock = MonotonicClock> {
    settings: ColorTapSettings,
    clock: C,
    rng: GameRng,
    timers: TimerQueue<ColorTimer>,
    session_id: Uuid,
    target: usize,
    options: Vec<usize>,
    score: u32,
    secs_left: u64,
    playing: bool,
    high_score: u32,
}

impl<C: Clock> ColorTap<C> {
    pub fn new(settings: &ColorTapSettings, clock: C, rng: GameRng) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: settings.clone(),
            clock,
            rng,
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            target: 0,
            options: (0..COLORS.len()).collect(),
            score: 0,
            secs_left: settings.round_secs,
            playing: false,
            high_score: 0,
        })
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn options(&self) -> &[usize] {
        &self.options
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn secs_left(&self) -> u64 {
        self.secs_left
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Begin a timed game. Ignored while one is running.
    pub fn start(&mut self) -> Vec<Event> {
        let mut events = self.drain_due();
        if self.playing {
            return events;
        }
        let now = self.clock.now_ms();
        self.timers.cancel_all();
        self.session_id = new_session_id();
        self.score = 0;
        self.secs_left = self.settings.round_secs;
        self.playing = true;
        self.timers.every(now, SECOND_MS, ColorTimer::Second);
        events.push(self.new_round());
        events
    }

    /// Tap the colour at `color` (an index into [`COLORS`]).
    pub fn tap(&mut self, color: usize) -> Vec<Event> {
        let mut events = self.drain_due();
        if !self.playing || color >= COLORS.len() {
            return events;
        }
        let correct = color == self.target;
        if correct {
            self.score += 1;
        } else {
            self.score = self.score.saturating_sub(1);
        }
        events.push(Event::ColorTapped {
            session_id: self.session_id,
            correct,
            score: self.score,
            at: Utc::now(),
        });
        if correct {
            events.push(self.new_round());
        }
        events
    }

    fn new_round(&mut self) -> Event {
        self.target = self.rng.gen_range(0..COLORS.len());
        let indices: Vec<usize> = (0..COLORS.len()).collect();
        self.options = shuffled(&indices, &mut self.rng);
        Event::ColorRoundStarted {
            session_id: self.session_id,
            target: COLORS[self.target].to_string(),
            options: self.options.iter().map(|&i| COLORS[i].to_string()).collect(),
            at: Utc::now(),
        }
    }

    fn drain_due(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.timers.poll(now) {
            if !self.timers.is_current(&fired) || !self.playing {
                continue;
            }
            match fired.key {
                ColorTimer::Second => {
                    self.secs_left = self.secs_left.saturating_sub(1);
                    events.push(Event::ColorTimeLeft {
                        session_id: self.session_id,
                        secs_left: self.secs_left,
                        at: Utc::now(),
                    });
                    if self.secs_left == 0 {
                        self.timers.cancel_all();
                        self.playing = false;
                        self.high_score = self.high_score.max(self.score);
                        tracing::debug!(
                            session = %self.session_id,
                            score = self.score,
                            "color tap finished"
                        );
                        events.push(Event::ColorTapFinished {
                            session_id: self.session_id,
                            score: self.score,
                            high_score: self.high_score,
                            at: Utc::now(),
                        });
                    }
                }
            }
        }
        events
    }
}

impl ColorTap<MonotonicClock> {
    pub fn with_defaults() -> Self {
        let settings = ColorTapSettings::default();
        Self {
            secs_left: settings.round_secs,
            settings,
            clock: MonotonicClock::new(),
            rng: entropy_rng(),
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            target: 0,
            options: (0..COLORS.len()).collect(),
            score: 0,
            playing: false,
            high_score: 0,
        }
    }
}

impl<C: Clock> Controller for ColorTap<C> {
    type Snapshot = ColorTapSnapshot;

    fn tick(&mut self) -> Vec<Event> {
        self.drain_due()
    }

    fn snapshot(&self) -> ColorTapSnapshot {
        ColorTapSnapshot {
            session_id: self.session_id,
            playing: self.playing,
            target: COLORS[self.target].to_string(),
            options: self.options.iter().map(|&i| COLORS[i].to_string()).collect(),
            score: self.score,
            secs_left: self.secs_left,
            high_score: self.high_score,
        }
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.playing = false;
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::random::seeded_rng;

    fn game() -> (ColorTap<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let game =
            ColorTap::new(&ColorTapSettings::default(), clock.clone(), seeded_rng(8)).unwrap();
        (game, clock)
    }

    #[test]
    fn options_are_a_permutation_of_colors() {
        let (mut game, _clock) = game();
        game.start();
        let mut options = game.options().to_vec();
        options.sort_unstable();
        assert_eq!(options, vec![0, 1, 2, 3]);
    }

    #[test]
    fn correct_and_wrong_taps_adjust_score() {
        let (mut game, _clock) = game();
        game.start();
        game.tap(game.target());
        game.tap(game.target());
        assert_eq!(game.score(), 2);

        let wrong = (game.target() + 1) % COLORS.len();
        game.tap(wrong);
        assert_eq!(game.score(), 1);
        game.tap((game.target() + 1) % COLORS.len());
        game.tap((game.target() + 1) % COLORS.len());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn game_ends_when_time_runs_out() {
        let (mut game, clock) = game();
        game.start();
        game.tap(game.target());
        clock.set(14_999);
        game.tick();
        assert!(game.is_playing());
        assert_eq!(game.secs_left(), 1);

        clock.set(15_000);
        let events = game.tick();
        assert!(!game.is_playing());
        assert_eq!(game.high_score(), 1);
        assert!(matches!(
            events.last(),
            Some(Event::ColorTapFinished { score: 1, high_score: 1, .. })
        ));

        assert!(game.tap(game.target()).is_empty());
        clock.set(30_000);
        assert!(game.tick().is_empty());
    }

    #[test]
    fn high_score_survives_a_worse_game() {
        let (mut game, clock) = game();
        game.start();
        for _ in 0..3 {
            game.tap(game.target());
        }
        clock.set(15_000);
        game.tick();
        game.start();
        assert_eq!(game.score(), 0);
        clock.set(30_000);
        game.tick();
        assert_eq!(game.high_score(), 3);
    }

    #[test]
    fn taps_before_start_are_ignored() {
        let (mut game, _clock) = game();
        assert!(game.tap(0).is_empty());
        assert_eq!(game.score(), 0);
    }
}

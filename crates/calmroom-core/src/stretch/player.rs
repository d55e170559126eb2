//! Guided stretch player.
//!
//! Two independent periodic processes run while a stretch plays:
//!
//! - **step advance**, every `total_secs * 1000 / steps` ms. Moves to the next
//!   instruction; on reaching the last one it stops itself and clears
//!   `is_playing`.
//! - **countdown**, every second. Decrements `remaining_secs` and stops at 0.
//!   It keeps running after the steps finish and never touches `is_playing`.
//!
//! Both are torn down on `reset`, on selecting another stretch and on
//! [`Controller::teardown`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{Stretch, StretchCatalog};
use crate::clock::{Clock, MonotonicClock};
use crate::controller::Controller;
use crate::error::Result;
use crate::events::Event;
use crate::random::new_session_id;
use crate::timer::{TimerId, TimerQueue};

const COUNTDOWN_PERIOD_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StretchTimer {
    AdvanceStep,
    Countdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StretchSnapshot {
    pub session_id: Uuid,
    pub name: Option<String>,
    pub current_step_index: usize,
    pub current_instruction: Option<String>,
    pub step_count: usize,
    pub is_playing: bool,
    pub is_counting_down: bool,
    pub remaining_secs: u64,
    /// Last step reached and no longer playing.
    pub finished: bool,
}

pub struct StretchPlayer<C: Clock = MonotonicClock> {
    catalog: StretchCatalog,
    clock: C,
    timers: TimerQueue<StretchTimer>,
    session_id: Uuid,
    stretch: Option<Stretch>,
    catalog_index: Option<usize>,
    current_step_index: usize,
    is_playing: bool,
    remaining_secs: u64,
    step_timer: Option<TimerId>,
    countdown_timer: Option<TimerId>,
}

impl<C: Clock> StretchPlayer<C> {
    pub fn new(catalog: StretchCatalog, clock: C) -> Self {
        Self {
            catalog,
            clock,
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            stretch: None,
            catalog_index: None,
            current_step_index: 0,
            is_playing: false,
            remaining_secs: 0,
            step_timer: None,
            countdown_timer: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn catalog(&self) -> &StretchCatalog {
        &self.catalog
    }

    pub fn stretch(&self) -> Option<&Stretch> {
        self.stretch.as_ref()
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn current_instruction(&self) -> Option<&str> {
        self.stretch
            .as_ref()
            .and_then(|s| s.steps.get(self.current_step_index))
            .map(String::as_str)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_counting_down(&self) -> bool {
        self.countdown_timer
            .is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_finished(&self) -> bool {
        match &self.stretch {
            Some(s) => !self.is_playing && self.current_step_index >= s.last_step_index(),
            None => false,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Select a stretch outside the catalog.
    pub fn select(&mut self, stretch: Stretch) -> Result<Vec<Event>> {
        stretch.validate()?;
        Ok(vec![self.load(stretch, None)])
    }

    /// Select the catalog entry at `index`.
    pub fn select_index(&mut self, index: usize) -> Result<Vec<Event>> {
        let stretch = self.catalog.get(index)?.clone();
        Ok(vec![self.load(stretch, Some(index))])
    }

    /// Move on to the following catalog entry once the current one is done.
    pub fn next_stretch(&mut self) -> Vec<Event> {
        if !self.is_finished() {
            return Vec::new();
        }
        let Some(next) = self.catalog_index.map(|i| i + 1) else {
            return Vec::new();
        };
        self.select_index(next).unwrap_or_default()
    }

    /// Return to the list: tear down and forget the selection.
    pub fn deselect(&mut self) {
        self.stop_processes();
        self.stretch = None;
        self.catalog_index = None;
        self.current_step_index = 0;
        self.is_playing = false;
        self.remaining_secs = 0;
    }

    /// (Re)start the selected stretch from its first step.
    /// Ignored without a selection or while already playing.
    pub fn play(&mut self) -> Vec<Event> {
        let Some(stretch) = self.stretch.as_ref() else {
            return Vec::new();
        };
        if self.is_playing {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let interval = stretch.step_interval_ms();
        let total_secs = stretch.total_secs;
        let name = stretch.name.clone();

        self.stop_processes();
        self.session_id = new_session_id();
        self.current_step_index = 0;
        self.is_playing = true;
        self.remaining_secs = total_secs;
        self.step_timer = Some(self.timers.every(now, interval, StretchTimer::AdvanceStep));
        self.countdown_timer = Some(
            self.timers
                .every(now, COUNTDOWN_PERIOD_MS, StretchTimer::Countdown),
        );
        tracing::debug!(session = %self.session_id, %name, interval_ms = interval, "stretch started");
        vec![Event::StretchStarted {
            session_id: self.session_id,
            name,
            step_interval_ms: interval,
            total_secs,
            at: Utc::now(),
        }]
    }

    /// Stop both processes and rewind. Calling it twice equals calling it once.
    pub fn reset(&mut self) -> Vec<Event> {
        self.stop_processes();
        self.current_step_index = 0;
        self.is_playing = false;
        self.remaining_secs = self.stretch.as_ref().map_or(0, |s| s.total_secs);
        vec![Event::StretchReset {
            session_id: self.session_id,
            at: Utc::now(),
        }]
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn load(&mut self, stretch: Stretch, catalog_index: Option<usize>) -> Event {
        self.stop_processes();
        self.current_step_index = 0;
        self.is_playing = false;
        self.remaining_secs = stretch.total_secs;
        let event = Event::StretchSelected {
            name: stretch.name.clone(),
            steps: stretch.steps.len(),
            total_secs: stretch.total_secs,
            at: Utc::now(),
        };
        tracing::debug!(name = %stretch.name, "stretch selected");
        self.stretch = Some(stretch);
        self.catalog_index = catalog_index;
        event
    }

    fn stop_processes(&mut self) {
        self.timers.cancel_all();
        self.step_timer = None;
        self.countdown_timer = None;
    }

    fn on_advance_step(&mut self, events: &mut Vec<Event>) {
        let Some(stretch) = self.stretch.as_ref() else {
            return;
        };
        let last = stretch.last_step_index();
        if self.current_step_index < last {
            self.current_step_index += 1;
            events.push(Event::StretchStepAdvanced {
                session_id: self.session_id,
                step_index: self.current_step_index,
                instruction: stretch.steps[self.current_step_index].clone(),
                at: Utc::now(),
            });
        }
        if self.current_step_index >= last {
            if let Some(id) = self.step_timer.take() {
                self.timers.cancel(id);
            }
            self.is_playing = false;
            events.push(Event::StretchStepsFinished {
                session_id: self.session_id,
                at: Utc::now(),
            });
        }
    }

    fn on_countdown(&mut self, events: &mut Vec<Event>) {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        events.push(Event::StretchCountdown {
            session_id: self.session_id,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        });
        if self.remaining_secs == 0 {
            if let Some(id) = self.countdown_timer.take() {
                self.timers.cancel(id);
            }
        }
    }
}

impl StretchPlayer<MonotonicClock> {
    pub fn with_defaults() -> Self {
        Self::new(StretchCatalog::builtin(), MonotonicClock::new())
    }
}

impl<C: Clock> Controller for StretchPlayer<C> {
    type Snapshot = StretchSnapshot;

    fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.timers.poll(now) {
            if !self.timers.is_current(&fired) {
                continue;
            }
            match fired.key {
                StretchTimer::AdvanceStep => self.on_advance_step(&mut events),
                StretchTimer::Countdown => self.on_countdown(&mut events),
            }
        }
        events
    }

    fn snapshot(&self) -> StretchSnapshot {
        StretchSnapshot {
            session_id: self.session_id,
            name: self.stretch.as_ref().map(|s| s.name.clone()),
            current_step_index: self.current_step_index,
            current_instruction: self.current_instruction().map(str::to_string),
            step_count: self.stretch.as_ref().map_or(0, |s| s.steps.len()),
            is_playing: self.is_playing,
            is_counting_down: self.is_counting_down(),
            remaining_secs: self.remaining_secs,
            finished: self.is_finished(),
        }
    }

    fn teardown(&mut self) {
        self.stop_processes();
        self.is_playing = false;
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn player() -> (StretchPlayer<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (StretchPlayer::new(StretchCatalog::builtin(), clock.clone()), clock)
    }

    fn twenty_second_stretch() -> Stretch {
        Stretch::new("Twist", 20, &["one", "two", "three", "four", "five"])
    }

    #[test]
    fn select_resets_position() {
        let (mut p, _clock) = player();
        p.select_index(2).unwrap();
        assert_eq!(p.stretch().unwrap().name, "Seated Spinal Twist");
        assert_eq!(p.current_step_index(), 0);
        assert!(!p.is_playing());
        assert_eq!(p.remaining_secs(), 20);
    }

    #[test]
    fn play_without_selection_is_ignored() {
        let (mut p, _clock) = player();
        assert!(p.play().is_empty());
        assert!(!p.is_playing());
    }

    #[test]
    fn steps_advance_on_computed_cadence() {
        let (mut p, clock) = player();
        p.select(twenty_second_stretch()).unwrap();
        p.play();

        clock.set(3_999);
        p.tick();
        assert_eq!(p.current_step_index(), 0);
        assert_eq!(p.remaining_secs(), 17);

        clock.set(4_000);
        p.tick();
        assert_eq!(p.current_step_index(), 1);
        assert_eq!(p.current_instruction(), Some("two"));

        clock.set(15_999);
        p.tick();
        assert_eq!(p.current_step_index(), 3);
        assert!(p.is_playing());

        clock.set(16_000);
        p.tick();
        assert_eq!(p.current_step_index(), 4);
        assert!(!p.is_playing());
        assert!(p.is_counting_down());
        assert_eq!(p.remaining_secs(), 4);

        clock.set(20_000);
        p.tick();
        assert_eq!(p.remaining_secs(), 0);
        assert!(!p.is_counting_down());
        assert!(p.snapshot().finished);

        clock.set(60_000);
        assert!(p.tick().is_empty());
        assert_eq!(p.current_step_index(), 4);
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut p, clock) = player();
        p.select(twenty_second_stretch()).unwrap();
        p.play();
        clock.set(9_000);
        p.tick();

        p.reset();
        let once = p.snapshot();
        p.reset();
        let twice = p.snapshot();
        assert_eq!(once, twice);
        assert_eq!(twice.remaining_secs, 20);
        assert_eq!(twice.current_step_index, 0);
        assert!(!twice.is_playing);

        clock.set(30_000);
        assert!(p.tick().is_empty());
    }

    #[test]
    fn switching_stretch_tears_down_timers() {
        let (mut p, clock) = player();
        p.select_index(0).unwrap();
        p.play();
        clock.set(2_000);
        p.tick();
        p.select_index(1).unwrap();
        clock.set(50_000);
        assert!(p.tick().is_empty());
        assert_eq!(p.current_step_index(), 0);
        assert_eq!(p.remaining_secs(), 10);
    }

    #[test]
    fn replay_after_finish_restarts_countdown() {
        let (mut p, clock) = player();
        p.select(twenty_second_stretch()).unwrap();
        p.play();
        clock.set(17_000);
        p.tick();
        assert!(!p.is_playing());

        p.play();
        assert!(p.is_playing());
        assert_eq!(p.current_step_index(), 0);
        assert_eq!(p.remaining_secs(), 20);
        clock.set(18_000);
        p.tick();
        assert_eq!(p.remaining_secs(), 19);
    }

    #[test]
    fn next_stretch_only_after_finishing() {
        let (mut p, clock) = player();
        p.select_index(1).unwrap();
        assert!(p.next_stretch().is_empty());

        p.play();
        clock.set(10_000);
        p.tick();
        assert!(p.is_finished());
        p.next_stretch();
        assert_eq!(p.stretch().unwrap().name, "Seated Spinal Twist");
    }

    #[test]
    fn next_stretch_stops_at_catalog_end() {
        let (mut p, clock) = player();
        p.select_index(5).unwrap();
        p.play();
        clock.set(15_000);
        p.tick();
        assert!(p.next_stretch().is_empty());
        assert_eq!(p.stretch().unwrap().name, "Chest Opener");
    }

    #[test]
    fn single_step_stretch_stops_on_first_advance() {
        let (mut p, clock) = player();
        p.select(Stretch::new("Pause", 3, &["Just breathe."])).unwrap();
        p.play();
        clock.set(3_000);
        p.tick();
        assert!(!p.is_playing());
        assert_eq!(p.current_step_index(), 0);
        assert_eq!(p.remaining_secs(), 0);
    }

    #[test]
    fn deselect_clears_session() {
        let (mut p, clock) = player();
        p.select_index(0).unwrap();
        p.play();
        p.deselect();
        clock.set(20_000);
        assert!(p.tick().is_empty());
        assert!(p.stretch().is_none());
        assert_eq!(p.snapshot().name, None);
    }
}

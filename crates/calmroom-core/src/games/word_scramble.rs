//! Word scramble: unscramble calm words, with an optional hint.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, MonotonicClock};
use crate::controller::Controller;
use crate::error::Result;
use crate::events::Event;
use crate::random::{entropy_rng, new_session_id, shuffled, GameRng};
use crate::timer::{TimerId, TimerQueue};

pub const WORDS: [(&str, &str); 10] = [
    ("PEACEFUL", "Calm and tranquil"),
    ("BREATHE", "In and out slowly"),
    ("HARMONY", "Balance and agreement"),
    ("SERENE", "Untroubled and calm"),
    ("MINDFUL", "Present and aware"),
    ("GRATITUDE", "Feeling of thankfulness"),
    ("BALANCE", "Equilibrium in life"),
    ("WELLNESS", "State of good health"),
    ("COURAGE", "Bravery in tough times"),
    ("PATIENCE", "Waiting without frustration"),
];

const SCRAMBLE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Correct,
    Wrong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrambleSettings {
    /// Pause on a correct answer before the next word.
    #[serde(default = "default_correct_delay_ms")]
    pub correct_delay_ms: u64,
    #[serde(default = "default_wrong_delay_ms")]
    pub wrong_delay_ms: u64,
}

fn default_correct_delay_ms() -> u64 {
    1_000
}
fn default_wrong_delay_ms() -> u64 {
    800
}

impl Default for ScrambleSettings {
    fn default() -> Self {
        Self {
            correct_delay_ms: default_correct_delay_ms(),
            wrong_delay_ms: default_wrong_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrambleTimer {
    NextWord,
    ClearFeedback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrambleSnapshot {
    pub session_id: Uuid,
    pub index: usize,
    pub scrambled: String,
    pub hint: Option<String>,
    pub score: u32,
    pub feedback: Option<Feedback>,
}

pub struct WordScramble<C: Clock = MonotonicClock> {
    settings: ScrambleSettings,
    clock: C,
    rng: GameRng,
    timers: TimerQueue<ScrambleTimer>,
    session_id: Uuid,
    index: usize,
    scrambled: String,
    show_hint: bool,
    score: u32,
    feedback: Option<Feedback>,
    feedback_timer: Option<TimerId>,
}

impl<C: Clock> WordScramble<C> {
    pub fn new(settings: &ScrambleSettings, clock: C, rng: GameRng) -> Result<Self> {
        let mut game = Self {
            settings: settings.clone(),
            clock,
            rng,
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            index: 0,
            scrambled: String::new(),
            show_hint: false,
            score: 0,
            feedback: None,
            feedback_timer: None,
        };
        game.scrambled = game.scramble(WORDS[0].0);
        Ok(game)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn word(&self) -> &'static str {
        WORDS[self.index].0
    }

    pub fn scrambled(&self) -> &str {
        &self.scrambled
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    /// Check a guess. Case and surrounding whitespace are ignored; an empty
    /// guess, or one made while a correct answer is being celebrated, does
    /// nothing.
    pub fn check(&mut self, guess: &str) -> Vec<Event> {
        let mut events = self.drain_due();
        let guess = guess.trim();
        if guess.is_empty() || self.feedback == Some(Feedback::Correct) {
            return events;
        }
        let now = self.clock.now_ms();
        if let Some(id) = self.feedback_timer.take() {
            self.timers.cancel(id);
        }
        let feedback = if guess.to_uppercase() == self.word() {
            self.score += 1;
            self.feedback_timer = Some(self.timers.once(
                now,
                self.settings.correct_delay_ms,
                ScrambleTimer::NextWord,
            ));
            Feedback::Correct
        } else {
            self.feedback_timer = Some(self.timers.once(
                now,
                self.settings.wrong_delay_ms,
                ScrambleTimer::ClearFeedback,
            ));
            Feedback::Wrong
        };
        self.feedback = Some(feedback);
        tracing::debug!(session = %self.session_id, ?feedback, "scramble guess checked");
        events.push(Event::ScrambleGuessChecked {
            session_id: self.session_id,
            feedback,
            score: self.score,
            at: Utc::now(),
        });
        events
    }

    pub fn show_hint(&mut self) -> Vec<Event> {
        if self.show_hint {
            return Vec::new();
        }
        self.show_hint = true;
        vec![Event::ScrambleHintShown {
            session_id: self.session_id,
            hint: WORDS[self.index].1.to_string(),
            at: Utc::now(),
        }]
    }

    /// Move to the next word straight away.
    pub fn skip(&mut self) -> Vec<Event> {
        self.timers.cancel_all();
        self.feedback_timer = None;
        vec![self.next_word()]
    }

    fn next_word(&mut self) -> Event {
        self.index = (self.index + 1) % WORDS.len();
        self.scrambled = self.scramble(WORDS[self.index].0);
        self.show_hint = false;
        self.feedback = None;
        Event::ScrambleWordShown {
            session_id: self.session_id,
            index: self.index,
            scrambled: self.scrambled.clone(),
            at: Utc::now(),
        }
    }

    /// Shuffle the letters, retrying a few times if the shuffle happens to
    /// reproduce the word.
    fn scramble(&mut self, word: &str) -> String {
        let letters: Vec<char> = word.chars().collect();
        let mut out = String::new();
        for _ in 0..SCRAMBLE_ATTEMPTS {
            out = shuffled(&letters, &mut self.rng).into_iter().collect();
            if out != word {
                break;
            }
        }
        out
    }

    fn drain_due(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.timers.poll(now) {
            if !self.timers.is_current(&fired) {
                continue;
            }
            self.feedback_timer = None;
            match fired.key {
                ScrambleTimer::NextWord => events.push(self.next_word()),
                ScrambleTimer::ClearFeedback => {
                    self.feedback = None;
                    events.push(Event::ScrambleFeedbackCleared {
                        session_id: self.session_id,
                        at: Utc::now(),
                    });
                }
            }
        }
        events
    }
}

impl WordScramble<MonotonicClock> {
    pub fn with_defaults() -> Self {
        let mut game = Self {
            settings: ScrambleSettings::default(),
            clock: MonotonicClock::new(),
            rng: entropy_rng(),
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            index: 0,
            scrambled: String::new(),
            show_hint: false,
            score: 0,
            feedback: None,
            feedback_timer: None,
        };
        game.scrambled = game.scramble(WORDS[0].0);
        game
    }
}

impl<C: Clock> Controller for WordScramble<C> {
    type Snapshot = ScrambleSnapshot;

    fn tick(&mut self) -> Vec<Event> {
        self.drain_due()
    }

    fn snapshot(&self) -> ScrambleSnapshot {
        ScrambleSnapshot {
            session_id: self.session_id,
            index: self.index,
            scrambled: self.scrambled.clone(),
            hint: self.show_hint.then(|| WORDS[self.index].1.to_string()),
            score: self.score,
            feedback: self.feedback,
        }
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.feedback_timer = None;
        self.feedback = None;
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

    fn game() -> (WordScramble<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let game =
            WordScramble::new(&ScrambleSettings::default(), clock.clone(), seeded_rng(2)).unwrap();
        (game, clock)
    }

    fn sorted(s: &str) -> Vec<char> {
        let mut chars: Vec<char> = s.chars().collect();
        chars.sort_unstable();
        chars
    }

    #[test]
    fn scrambled_word_is_an_anagram() {
        let (game, _clock) = game();
        assert_eq!(sorted(game.scrambled()), sorted("PEACEFUL"));
        assert_ne!(game.scrambled(), "PEACEFUL");
    }

    #[test]
    fn empty_guess_is_ignored() {
        let (mut game, _clock) = game();
        assert!(game.check("   ").is_empty());
        assert_eq!(game.feedback(), None);
    }

    #[test]
    fn correct_guess_scores_then_advances() {
        let (mut game, clock) = game();
        game.check("  peaceful ");
        assert_eq!(game.score(), 1);
        assert_eq!(game.feedback(), Some(Feedback::Correct));

        // Re-submitting during the pause does not score twice.
        game.check("peaceful");
        assert_eq!(game.score(), 1);

        clock.set(1_000);
        game.tick();
        assert_eq!(game.index(), 1);
        assert_eq!(game.word(), "BREATHE");
        assert_eq!(game.feedback(), None);
    }

    #[test]
    fn wrong_guess_feedback_clears() {
        let (mut game, clock) = game();
        game.check("peace");
        assert_eq!(game.feedback(), Some(Feedback::Wrong));
        clock.set(500);
        game.check("fulpeace");
        clock.set(800);
        game.tick();
        assert_eq!(game.feedback(), Some(Feedback::Wrong));
        clock.set(1_300);
        game.tick();
        assert_eq!(game.feedback(), None);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn hint_and_skip() {
        let (mut game, _clock) = game();
        assert_eq!(game.show_hint().len(), 1);
        assert!(game.show_hint().is_empty());
        assert_eq!(game.snapshot().hint.as_deref(), Some("Calm and tranquil"));

        game.skip();
        assert_eq!(game.index(), 1);
        assert_eq!(game.snapshot().hint, None);
    }

    #[test]
    fn words_wrap_around() {
        let (mut game, _clock) = game();
        for _ in 0..WORDS.len() {
            game.skip();
        }
        assert_eq!(game.index(), 0);
    }
}

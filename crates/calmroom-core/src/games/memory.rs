//! Memory match: find the pairs in a shuffled grid of face-down cards.
//!
//! At most two cards are face up at once. A pair is scored as soon as the
//! second card is turned; a mismatch stays visible for `mismatch_delay_ms`
//! before both cards flip back.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, MonotonicClock};
use crate::controller::Controller;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::random::{entropy_rng, new_session_id, shuffled, GameRng};
use crate::timer::TimerQueue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySettings {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_mismatch_delay_ms")]
    pub mismatch_delay_ms: u64,
}

fn default_symbols() -> Vec<String> {
    ["🌸", "🌿", "🦋", "🌊", "🌙", "☀️", "🍃", "🌺"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_mismatch_delay_ms() -> u64 {
    800
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            mismatch_delay_ms: default_mismatch_delay_ms(),
        }
    }
}

impl MemorySettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbols.is_empty() {
            return Err(ValidationError::EmptyCollection("memory.symbols".into()));
        }
        let mut unique = self.symbols.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != self.symbols.len() {
            return Err(ValidationError::invalid("memory.symbols", "symbols must be distinct"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryTimer {
    HideFlipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub session_id: Uuid,
    /// Face of each card, `None` while it is face down.
    pub faces: Vec<Option<String>>,
    pub moves: u32,
    pub matched_pairs: usize,
    pub won: bool,
}

pub struct MemoryMatch<C: Clock = MonotonicClock> {
    settings: MemorySettings,
    clock: C,
    rng: GameRng,
    timers: TimerQueue<MemoryTimer>,
    session_id: Uuid,
    cards: Vec<String>,
    flipped: Vec<usize>,
    matched: Vec<bool>,
    moves: u32,
}

impl<C: Clock> MemoryMatch<C> {
    /// Build and deal the first game.
    pub fn new(settings: &MemorySettings, clock: C, rng: GameRng) -> Result<Self> {
        settings.validate()?;
        let mut game = Self {
            settings: settings.clone(),
            clock,
            rng,
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            cards: Vec::new(),
            flipped: Vec::new(),
            matched: Vec::new(),
            moves: 0,
        };
        game.new_game();
        Ok(game)
    }

    pub fn cards(&self) -> &[String] {
        &self.cards
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn face_up(&self) -> &[usize] {
        &self.flipped
    }

    pub fn is_matched(&self, index: usize) -> bool {
        self.matched.get(index).copied().unwrap_or(false)
    }

    pub fn is_won(&self) -> bool {
        !self.cards.is_empty() && self.matched.iter().all(|&m| m)
    }

    /// Shuffle a fresh deck of doubled symbols.
    pub fn new_game(&mut self) -> Vec<Event> {
        self.timers.cancel_all();
        self.session_id = new_session_id();
        let mut deck = self.settings.symbols.clone();
        deck.extend(self.settings.symbols.iter().cloned());
        self.cards = shuffled(&deck, &mut self.rng);
        self.matched = vec![false; self.cards.len()];
        self.flipped.clear();
        self.moves = 0;
        tracing::debug!(session = %self.session_id, cards = self.cards.len(), "memory dealt");
        vec![Event::MemoryDealt {
            session_id: self.session_id,
            cards: self.cards.len(),
            at: Utc::now(),
        }]
    }

    /// Turn a card face up. Ignored while two cards are showing, or for a
    /// card that is already face up, matched, or off the board.
    pub fn flip(&mut self, index: usize) -> Vec<Event> {
        let mut events = self.drain_due();
        if self.flipped.len() >= 2
            || index >= self.cards.len()
            || self.flipped.contains(&index)
            || self.matched[index]
        {
            return events;
        }
        self.flipped.push(index);
        events.push(Event::CardFlipped {
            session_id: self.session_id,
            index,
            symbol: self.cards[index].clone(),
            at: Utc::now(),
        });
        if self.flipped.len() < 2 {
            return events;
        }

        self.moves += 1;
        let (first, second) = (self.flipped[0], self.flipped[1]);
        if self.cards[first] == self.cards[second] {
            self.matched[first] = true;
            self.matched[second] = true;
            self.flipped.clear();
            events.push(Event::CardsMatched {
                session_id: self.session_id,
                first,
                second,
                moves: self.moves,
                at: Utc::now(),
            });
            if self.is_won() {
                tracing::debug!(session = %self.session_id, moves = self.moves, "memory won");
                events.push(Event::MemoryWon {
                    session_id: self.session_id,
                    moves: self.moves,
                    at: Utc::now(),
                });
            }
        } else {
            let now = self.clock.now_ms();
            self.timers
                .once(now, self.settings.mismatch_delay_ms, MemoryTimer::HideFlipped);
            events.push(Event::CardsMismatched {
                session_id: self.session_id,
                first,
                second,
                moves: self.moves,
                at: Utc::now(),
            });
        }
        events
    }

    fn drain_due(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.timers.poll(now) {
            if !self.timers.is_current(&fired) {
                continue;
            }
            match fired.key {
                MemoryTimer::HideFlipped => {
                    self.flipped.clear();
                    events.push(Event::CardsHidden {
                        session_id: self.session_id,
                        at: Utc::now(),
                    });
                }
            }
        }
        events
    }
}

impl MemoryMatch<MonotonicClock> {
    pub fn with_defaults() -> Self {
        let mut game = Self {
            settings: MemorySettings::default(),
            clock: MonotonicClock::new(),
            rng: entropy_rng(),
            timers: TimerQueue::new(),
            session_id: new_session_id(),
            cards: Vec::new(),
            flipped: Vec::new(),
            matched: Vec::new(),
            moves: 0,
        };
        game.new_game();
        game
    }
}

impl<C: Clock> Controller for MemoryMatch<C> {
    type Snapshot = MemorySnapshot;

    fn tick(&mut self) -> Vec<Event> {
        self.drain_due()
    }

    fn snapshot(&self) -> MemorySnapshot {
        let faces = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| {
                (self.matched[i] || self.flipped.contains(&i)).then(|| card.clone())
            })
            .collect();
        MemorySnapshot {
            session_id: self.session_id,
            faces,
            moves: self.moves,
            matched_pairs: self.matched.iter().filter(|&&m| m).count() / 2,
            won: self.is_won(),
        }
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.flipped.clear();
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

    fn game() -> (MemoryMatch<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let game = MemoryMatch::new(&MemorySettings::default(), clock.clone(), seeded_rng(4))
            .unwrap();
        (game, clock)
    }

    fn pair_of(game: &MemoryMatch<ManualClock>, index: usize) -> usize {
        let symbol = &game.cards()[index];
        (0..game.cards().len())
            .find(|&j| j != index && &game.cards()[j] == symbol)
            .unwrap()
    }

    fn non_pair_of(game: &MemoryMatch<ManualClock>, index: usize) -> usize {
        let symbol = &game.cards()[index];
        (0..game.cards().len())
            .find(|&j| &game.cards()[j] != symbol)
            .unwrap()
    }

    #[test]
    fn deck_holds_each_symbol_twice() {
        let (game, _clock) = game();
        assert_eq!(game.cards().len(), 16);
        for symbol in default_symbols() {
            assert_eq!(game.cards().iter().filter(|c| **c == symbol).count(), 2);
        }
    }

    #[test]
    fn matching_pair_scores_immediately() {
        let (mut game, _clock) = game();
        let partner = pair_of(&game, 0);
        game.flip(0);
        let events = game.flip(partner);
        assert!(events.iter().any(|e| matches!(e, Event::CardsMatched { moves: 1, .. })));
        assert!(game.is_matched(0) && game.is_matched(partner));
        assert!(game.face_up().is_empty());
    }

    #[test]
    fn mismatch_flips_back_after_delay() {
        let (mut game, clock) = game();
        let other = non_pair_of(&game, 0);
        game.flip(0);
        game.flip(other);
        assert_eq!(game.moves(), 1);

        // A third card is refused while two are showing.
        let third = (0..16).find(|&j| j != 0 && j != other).unwrap();
        game.flip(third);
        assert_eq!(game.face_up().len(), 2);

        clock.set(799);
        game.tick();
        assert_eq!(game.face_up().len(), 2);
        clock.set(800);
        game.tick();
        assert!(game.face_up().is_empty());
        assert!(!game.is_matched(0));
    }

    #[test]
    fn flipping_same_card_twice_is_ignored() {
        let (mut game, _clock) = game();
        game.flip(3);
        assert!(game.flip(3).is_empty());
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn clearing_every_pair_wins() {
        let (mut game, _clock) = game();
        let mut won = false;
        for i in 0..16 {
            if game.is_matched(i) {
                continue;
            }
            let partner = pair_of(&game, i);
            game.flip(i);
            won |= game
                .flip(partner)
                .iter()
                .any(|e| matches!(e, Event::MemoryWon { .. }));
        }
        assert!(won);
        assert!(game.is_won());
        assert_eq!(game.moves(), 8);
        assert_eq!(game.snapshot().matched_pairs, 8);
    }

    #[test]
    fn new_game_cancels_pending_flip_back() {
        let (mut game, clock) = game();
        let other = non_pair_of(&game, 0);
        game.flip(0);
        game.flip(other);
        game.new_game();
        game.flip(1);
        clock.set(5_000);
        assert!(game.tick().is_empty());
        assert_eq!(game.face_up(), &[1]);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let settings = MemorySettings {
            symbols: vec!["a".into(), "a".into()],
            mismatch_delay_ms: 800,
        };
        assert!(MemoryMatch::new(&settings, ManualClock::new(), seeded_rng(0)).is_err());
    }
}

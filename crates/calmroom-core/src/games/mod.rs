//! Timed mini-games.
//!
//! Each game is an independent controller owning its own state, clock and
//! timers. None of them share anything, so they can be driven in any
//! interleaving.

pub mod breathing;
pub mod color_tap;
pub mod memory;
pub mod pattern;
pub mod reaction;
pub mod word_scramble;

pub use breathing::{BreathingCycle, BreathingSettings, BreathingSnapshot, Phase};
pub use color_tap::{ColorTap, ColorTapSettings, ColorTapSnapshot, COLORS};
pub use memory::{MemoryMatch, MemorySettings, MemorySnapshot};
pub use pattern::{PatternMemory, PatternSettings, PatternSnapshot};
pub use reaction::{ReactionSample, ReactionSettings, ReactionSnapshot, ReactionState, ReactionTimer};
pub use word_scramble::{Feedback, ScrambleSettings, ScrambleSnapshot, WordScramble, WORDS};

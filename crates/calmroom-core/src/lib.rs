//! # Calmroom Core Library
//!
//! This library provides the interaction logic behind the Calmroom wellness
//! app: breathing exercises, a guided stretch player and a handful of small
//! timed games. Every front end (the CLI, a GUI) is a thin layer that renders
//! snapshots and forwards user intents into the same controllers.
//!
//! ## Architecture
//!
//! - **Controllers**: single-user state machines that own their state and
//!   timers. No threads: the host calls `tick()` periodically and every due
//!   timer is applied at its scheduled instant.
//! - **Timer queue**: deterministic "once" / "every" scheduling with
//!   cancel-all generations, so a stale timer can never mutate a discarded
//!   session.
//! - **Clock**: injected monotonic time, hand-driven in tests.
//! - **Storage**: TOML-based configuration of every tunable.
//!
//! ## Key Components
//!
//! - [`BreathingCycle`]: fixed-duration phases on a loop
//! - [`ReactionTimer`]: randomized trigger and latency samples
//! - [`PatternMemory`]: growing sequence playback and replay checking
//! - [`StretchPlayer`]: step cadence plus an independent countdown
//! - [`Config`]: application configuration management

pub mod clock;
pub mod controller;
pub mod error;
pub mod events;
pub mod games;
pub mod random;
pub mod storage;
pub mod stretch;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::Controller;
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use games::{
    BreathingCycle, ColorTap, MemoryMatch, PatternMemory, ReactionSample, ReactionState,
    ReactionTimer, WordScramble,
};
pub use storage::Config;
pub use stretch::{Stretch, StretchCatalog, StretchPlayer};
pub use timer::{TimerId, TimerQueue};

use calmroom_core::random::rng_from;
use calmroom_core::{Config, Event, MonotonicClock, PatternMemory};
use clap::Args;

use super::session::{self, CmdResult, Output, Session, Step};

#[derive(Args)]
pub struct PatternArgs {
    /// Seed for the tile sequence
    #[arg(long)]
    seed: Option<u64>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

struct PatternSession {
    game: PatternMemory,
    tile_count: usize,
}

impl Session for PatternSession {
    type Ctl = PatternMemory;

    fn controller(&mut self) -> &mut PatternMemory {
        &mut self.game
    }

    fn banner(&self) -> String {
        format!(
            "Pattern repeat: watch the tiles, then type them back (0-{}), \
             space separated. r restarts after game over, q quits.",
            self.tile_count - 1
        )
    }

    fn begin(&mut self) -> Vec<Event> {
        self.game.start()
    }

    fn on_line(&mut self, line: &str) -> Step {
        if line.eq_ignore_ascii_case("r") {
            return Step::Continue(self.game.start());
        }
        let mut events = Vec::new();
        for token in line.split_whitespace() {
            match token.parse::<usize>() {
                Ok(tile) => events.extend(self.game.tap(tile)),
                Err(_) => tracing::warn!(%token, "not a tile number"),
            }
            if self.game.is_game_over() || self.game.is_showing_pattern() {
                break;
            }
        }
        Step::Continue(events)
    }

    fn describe(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::PatternPlaybackStarted { level, .. } => {
                Some(format!("Level {level}: watch the pattern..."))
            }
            Event::TileHighlighted {
                tile: Some(tile), ..
            } => Some(format!("  [{tile}]")),
            Event::PatternPlaybackFinished { .. } => Some("Your turn.".into()),
            Event::PatternGameOver {
                level,
                expected,
                high_score,
                ..
            } => Some(format!(
                "Game over! Reached level {level} (tile was {expected}). Best: {high_score}. r to retry."
            )),
            _ => None,
        }
    }
}

pub fn run(args: PatternArgs) -> CmdResult {
    let config = Config::load_or_default();
    let game = PatternMemory::new(&config.pattern, MonotonicClock::new(), rng_from(args.seed))?;
    session::run(
        PatternSession {
            game,
            tile_count: config.pattern.tile_count,
        },
        config.tick_ms,
        Output::new(args.json),
    )
}

use calmroom_core::random::rng_from;
use calmroom_core::{Config, Controller, Event, MemoryMatch, MonotonicClock};
use clap::Args;

use super::session::{self, CmdResult, Output, Session, Step};

#[derive(Args)]
pub struct MemoryArgs {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    json: bool,
}

struct MemorySession {
    game: MemoryMatch,
}

impl MemorySession {
    fn board(&self) -> String {
        let snapshot = self.game.snapshot();
        let cells: Vec<String> = snapshot
            .faces
            .iter()
            .enumerate()
            .map(|(i, face)| match face {
                Some(symbol) => format!("{symbol:>4}"),
                None => format!("{i:>4}"),
            })
            .collect();
        cells
            .chunks(4)
            .map(|row| row.concat())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Session for MemorySession {
    type Ctl = MemoryMatch;

    fn controller(&mut self) -> &mut MemoryMatch {
        &mut self.game
    }

    fn banner(&self) -> String {
        format!(
            "Memory match: type a card number to flip it, 'new' to reshuffle, q to quit.\n{}",
            self.board()
        )
    }

    fn begin(&mut self) -> Vec<Event> {
        Vec::new()
    }

    fn on_line(&mut self, line: &str) -> Step {
        if line.eq_ignore_ascii_case("new") {
            return Step::Continue(self.game.new_game());
        }
        match line.parse::<usize>() {
            Ok(index) => Step::Continue(self.game.flip(index)),
            Err(_) => Step::Continue(Vec::new()),
        }
    }

    fn describe(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::MemoryDealt { .. } | Event::CardsHidden { .. } => Some(self.board()),
            Event::CardFlipped { index, symbol, .. } => Some(format!("  card {index}: {symbol}")),
            Event::CardsMismatched { moves, .. } => {
                Some(format!("{}\nNo match. Moves: {moves}", self.board()))
            }
            Event::CardsMatched { moves, .. } => {
                Some(format!("{}\nMatch! Moves: {moves}", self.board()))
            }
            Event::MemoryWon { moves, .. } => Some(format!("You won in {moves} moves!")),
            _ => None,
        }
    }

    fn finished(&mut self) -> bool {
        self.game.is_won()
    }
}

pub fn run(args: MemoryArgs) -> CmdResult {
    let config = Config::load_or_default();
    let game = MemoryMatch::new(&config.memory, MonotonicClock::new(), rng_from(args.seed))?;
    session::run(MemorySession { game }, config.tick_ms, Output::new(args.json))
}

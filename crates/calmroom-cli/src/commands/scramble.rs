use calmroom_core::games::{Feedback, WordScramble};
use calmroom_core::random::rng_from;
use calmroom_core::{Config, Event, MonotonicClock};
use clap::Args;

use super::session::{self, CmdResult, Output, Session, Step};

#[derive(Args)]
pub struct ScrambleArgs {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    json: bool,
}

struct ScrambleSession {
    game: WordScramble,
}

impl Session for ScrambleSession {
    type Ctl = WordScramble;

    fn controller(&mut self) -> &mut WordScramble {
        &mut self.game
    }

    fn banner(&self) -> String {
        format!(
            "Word scramble: type your guess. ? for a hint, > to skip, q to quit.\n  {}",
            self.game.scrambled()
        )
    }

    fn begin(&mut self) -> Vec<Event> {
        Vec::new()
    }

    fn on_line(&mut self, line: &str) -> Step {
        let events = match line {
            "?" => self.game.show_hint(),
            ">" => self.game.skip(),
            guess => self.game.check(guess),
        };
        Step::Continue(events)
    }

    fn describe(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::ScrambleWordShown { scrambled, .. } => Some(format!("  {scrambled}")),
            Event::ScrambleGuessChecked {
                feedback: Feedback::Correct,
                score,
                ..
            } => Some(format!("Correct! Score: {score}")),
            Event::ScrambleGuessChecked {
                feedback: Feedback::Wrong,
                ..
            } => Some("Not quite, try again.".into()),
            Event::ScrambleHintShown { hint, .. } => Some(format!("  hint: {hint}")),
            _ => None,
        }
    }
}

pub fn run(args: ScrambleArgs) -> CmdResult {
    let config = Config::load_or_default();
    let game = WordScramble::new(&config.scramble, MonotonicClock::new(), rng_from(args.seed))?;
    session::run(ScrambleSession { game }, config.tick_ms, Output::new(args.json))
}

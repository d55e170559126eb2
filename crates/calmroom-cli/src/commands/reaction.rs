use calmroom_core::random::rng_from;
use calmroom_core::{Config, Event, MonotonicClock, ReactionTimer};
use clap::Args;

use super::session::{self, CmdResult, Output, Session, Step};

#[derive(Args)]
pub struct ReactionArgs {
    /// Stop after this many recorded reactions
    #[arg(long)]
    rounds: Option<usize>,
    /// Seed for the random delay
    #[arg(long)]
    seed: Option<u64>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

struct ReactionSession {
    timer: ReactionTimer,
    rounds: Option<usize>,
}

impl Session for ReactionSession {
    type Ctl = ReactionTimer;

    fn controller(&mut self) -> &mut ReactionTimer {
        &mut self.timer
    }

    fn banner(&self) -> String {
        "Reaction time: press Enter when you see TAP NOW. q quits.".into()
    }

    fn begin(&mut self) -> Vec<Event> {
        self.timer.start()
    }

    fn on_line(&mut self, _line: &str) -> Step {
        Step::Continue(self.timer.tap())
    }

    fn describe(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::ReactionWaiting { .. } => Some("Wait for it...".into()),
            Event::ReactionReady { .. } => Some(">>> TAP NOW! <<<".into()),
            Event::ReactionRecorded {
                sample,
                best_ms,
                average_ms,
                ..
            } => Some(format!(
                "{}ms  (best {best_ms}ms, avg {average_ms}ms). Enter to go again.",
                sample.reaction_ms
            )),
            Event::ReactionTooEarly { .. } => {
                Some("Too early! Press Enter to try again.".into())
            }
            _ => None,
        }
    }

    fn finished(&mut self) -> bool {
        self.rounds
            .is_some_and(|n| self.timer.samples().len() >= n)
    }
}

pub fn run(args: ReactionArgs) -> CmdResult {
    let config = Config::load_or_default();
    let timer = ReactionTimer::new(&config.reaction, MonotonicClock::new(), rng_from(args.seed))?;
    session::run(
        ReactionSession {
            timer,
            rounds: args.rounds,
        },
        config.tick_ms,
        Output::new(args.json),
    )
}

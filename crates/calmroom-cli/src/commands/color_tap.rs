use calmroom_core::games::COLORS;
use calmroom_core::random::rng_from;
use calmroom_core::{ColorTap, Config, Event, MonotonicClock};
use clap::Args;

use super::session::{self, CmdResult, Output, Session, Step};

#[derive(Args)]
pub struct ColorTapArgs {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    json: bool,
}

struct ColorTapSession {
    game: ColorTap,
    started: bool,
}

impl Session for ColorTapSession {
    type Ctl = ColorTap;

    fn controller(&mut self) -> &mut ColorTap {
        &mut self.game
    }

    fn banner(&self) -> String {
        "Color tap: type the button number showing the named colour. q quits.".into()
    }

    fn begin(&mut self) -> Vec<Event> {
        self.started = true;
        self.game.start()
    }

    fn on_line(&mut self, line: &str) -> Step {
        // Buttons are numbered in display order, not palette order.
        let events = line
            .parse::<usize>()
            .ok()
            .and_then(|button| self.game.options().get(button).copied())
            .map(|color| self.game.tap(color))
            .unwrap_or_default();
        Step::Continue(events)
    }

    fn describe(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::ColorRoundStarted {
                target, options, ..
            } => {
                let buttons: Vec<String> = options
                    .iter()
                    .enumerate()
                    .map(|(i, name)| format!("{i}:{name}"))
                    .collect();
                Some(format!("Tap {target}!   {}", buttons.join("  ")))
            }
            Event::ColorTapped { correct: false, score, .. } => {
                Some(format!("Wrong. Score: {score}"))
            }
            Event::ColorTimeLeft { secs_left, .. } if *secs_left % 5 == 0 => {
                Some(format!("  {secs_left}s left"))
            }
            Event::ColorTapFinished {
                score, high_score, ..
            } => Some(format!("Time's up! Score {score}, best {high_score}.")),
            _ => None,
        }
    }

    fn finished(&mut self) -> bool {
        self.started && !self.game.is_playing()
    }
}

pub fn run(args: ColorTapArgs) -> CmdResult {
    let config = Config::load_or_default();
    let game = ColorTap::new(&config.color_tap, MonotonicClock::new(), rng_from(args.seed))?;
    tracing::debug!(colors = COLORS.len(), "color tap ready");
    session::run(
        ColorTapSession {
            game,
            started: false,
        },
        config.tick_ms,
        Output::new(args.json),
    )
}

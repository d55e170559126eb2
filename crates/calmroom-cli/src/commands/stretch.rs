use calmroom_core::{Config, Event, MonotonicClock, StretchPlayer};
use clap::Subcommand;

use super::session::{self, CmdResult, Output, Session, Step};

#[derive(Subcommand)]
pub enum StretchAction {
    /// List the stretch catalog
    List {
        #[arg(long)]
        json: bool,
    },
    /// Play a stretch by catalog index
    Play {
        index: usize,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

struct StretchSession {
    player: StretchPlayer,
}

impl Session for StretchSession {
    type Ctl = StretchPlayer;

    fn controller(&mut self) -> &mut StretchPlayer {
        &mut self.player
    }

    fn banner(&self) -> String {
        "Enter r to reset, p to play again, n for the next stretch, q to quit.".into()
    }

    fn begin(&mut self) -> Vec<Event> {
        self.player.play()
    }

    fn on_line(&mut self, line: &str) -> Step {
        let events = match line {
            "r" => self.player.reset(),
            "p" => self.player.play(),
            "n" => {
                let mut events = self.player.next_stretch();
                if events.is_empty() {
                    if self.player.is_finished() {
                        println!("That was the last stretch.");
                        return Step::Quit;
                    }
                    return Step::Continue(events);
                }
                events.extend(self.player.play());
                events
            }
            _ => Vec::new(),
        };
        Step::Continue(events)
    }

    fn describe(&mut self, event: &Event) -> Option<String> {
        let step_count = self.player.stretch().map_or(0, |s| s.steps.len());
        match event {
            Event::StretchSelected {
                name, total_secs, ..
            } => Some(format!("{name} ({total_secs}s)")),
            Event::StretchStarted { .. } => self
                .player
                .current_instruction()
                .map(|i| format!("  1/{step_count}  {i}")),
            Event::StretchStepAdvanced {
                step_index,
                instruction,
                ..
            } => Some(format!("  {}/{step_count}  {instruction}", step_index + 1)),
            Event::StretchCountdown {
                remaining_secs: 0, ..
            } => Some("Done! n for the next stretch, p to repeat.".into()),
            Event::StretchCountdown { remaining_secs, .. }
                if *remaining_secs % 5 == 0 || *remaining_secs <= 3 =>
            {
                Some(format!("    {remaining_secs}s remaining"))
            }
            Event::StretchStepsFinished { .. } => Some("  Last step, hold it...".into()),
            Event::StretchReset { .. } => Some("Reset. p to begin.".into()),
            _ => None,
        }
    }
}

pub fn run(action: StretchAction) -> CmdResult {
    let config = Config::load_or_default();
    let catalog = config.stretch_catalog()?;

    match action {
        StretchAction::List { json } => {
            if json {
                let stretches: Vec<_> = catalog.iter().collect();
                println!("{}", serde_json::to_string_pretty(&stretches)?);
            } else {
                for (i, s) in catalog.iter().enumerate() {
                    println!(
                        "{i}: {} {} ({}s, {} steps)",
                        s.emoji,
                        s.name,
                        s.total_secs,
                        s.steps.len()
                    );
                }
            }
            Ok(())
        }
        StretchAction::Play { index, json } => {
            let mut player = StretchPlayer::new(catalog, MonotonicClock::new());
            let selected = player.select_index(index)?;
            let out = Output::new(json);
            if json {
                for event in &selected {
                    println!("{}", serde_json::to_string(event)?);
                }
            } else if let Some(s) = player.stretch() {
                println!("{} {} ({}s)", s.emoji, s.name, s.total_secs);
            }
            session::run(StretchSession { player }, config.tick_ms, out)
        }
    }
}

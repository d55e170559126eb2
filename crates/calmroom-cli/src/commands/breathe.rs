use calmroom_core::games::BreathingCycle;
use calmroom_core::{Config, Event, MonotonicClock};
use clap::Args;

use super::session::{self, CmdResult, Output, Session, Step};

#[derive(Args)]
pub struct BreatheArgs {
    /// Stop after this many completed cycles
    #[arg(long)]
    cycles: Option<u32>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

struct BreatheSession {
    cycle: BreathingCycle,
    target_cycles: Option<u32>,
}

impl Session for BreatheSession {
    type Ctl = BreathingCycle;

    fn controller(&mut self) -> &mut BreathingCycle {
        &mut self.cycle
    }

    fn banner(&self) -> String {
        let phases: Vec<String> = self
            .cycle
            .phases()
            .iter()
            .map(|p| format!("{} {}s", p.label, p.duration_ms / 1000))
            .collect();
        format!(
            "Breathing: {}\nEnter pauses/resumes, q quits.",
            phases.join(" / ")
        )
    }

    fn begin(&mut self) -> Vec<Event> {
        self.cycle.start()
    }

    fn on_line(&mut self, _line: &str) -> Step {
        Step::Continue(self.cycle.toggle())
    }

    fn describe(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::BreathingStarted {
                phase_label,
                duration_ms,
                ..
            }
            | Event::PhaseChanged {
                phase_label,
                duration_ms,
                ..
            } => Some(format!("  {phase_label} ({}s)", duration_ms / 1000)),
            Event::CycleCompleted {
                cycles_completed, ..
            } => Some(format!("Cycles completed: {cycles_completed}")),
            Event::BreathingStopped { .. } => Some("Paused. Press Enter to start again.".into()),
            _ => None,
        }
    }

    fn finished(&mut self) -> bool {
        self.target_cycles
            .is_some_and(|n| self.cycle.cycles_completed() >= n)
    }
}

pub fn run(args: BreatheArgs) -> CmdResult {
    let config = Config::load_or_default();
    let cycle = BreathingCycle::new(&config.breathing, MonotonicClock::new())?;
    session::run(
        BreatheSession {
            cycle,
            target_cycles: args.cycles,
        },
        config.tick_ms,
        Output::new(args.json),
    )
}

//! Interactive terminal loop shared by the game commands.
//!
//! One current-thread runtime, one controller: the loop either ticks the
//! controller on a fixed interval or hands it a line typed by the user.
//! Nothing else runs concurrently, so the controller needs no locking.

use std::time::Duration;

use calmroom_core::{Controller, Event};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// What to do after handling a line of input.
pub enum Step {
    Continue(Vec<Event>),
    Quit,
}

pub trait Session {
    type Ctl: Controller;

    fn controller(&mut self) -> &mut Self::Ctl;

    /// Intro text printed before anything else.
    fn banner(&self) -> String;

    /// Events from the initial user intent, e.g. starting the game.
    fn begin(&mut self) -> Vec<Event>;

    fn on_line(&mut self, line: &str) -> Step;

    /// Human-readable line for an event, `None` to stay quiet.
    fn describe(&mut self, event: &Event) -> Option<String>;

    /// The session ends on its own once this returns true.
    fn finished(&mut self) -> bool {
        false
    }
}

pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<S: Session>(&self, session: &mut S, events: &[Event]) -> CmdResult {
        for event in events {
            if self.json {
                println!("{}", serde_json::to_string(event)?);
            } else if let Some(line) = session.describe(event) {
                println!("{line}");
            }
        }
        Ok(())
    }
}

/// Drive `session` until it finishes, the user types `q`, or stdin closes.
pub fn run<S: Session>(mut session: S, tick_ms: u64, out: Output) -> CmdResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;

    let result = runtime.block_on(async {
        if !out.json {
            println!("{}", session.banner());
        }
        let events = session.begin();
        out.emit(&mut session, &events)?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !session.finished() {
            tokio::select! {
                _ = interval.tick() => {
                    let events = session.controller().tick();
                    out.emit(&mut session, &events)?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let line = line.trim();
                    if line.eq_ignore_ascii_case("q") {
                        break;
                    }
                    match session.on_line(line) {
                        Step::Continue(events) => out.emit(&mut session, &events)?,
                        Step::Quit => break,
                    }
                }
            }
        }

        session.controller().teardown();
        tracing::debug!("session closed");
        Ok::<(), Box<dyn std::error::Error>>(())
    });

    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_background();
    result
}

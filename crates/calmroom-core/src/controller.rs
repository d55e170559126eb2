//! The seam between controllers and whatever drives them.
//!
//! A host (the CLI, a GUI, a test) owns one controller per screen, calls
//! [`Controller::tick`] on its own cadence and forwards user intents to the
//! controller's inherent methods. Leaving the screen calls
//! [`Controller::teardown`].

use serde::Serialize;

use crate::events::Event;

pub trait Controller {
    type Snapshot: Serialize;

    /// Apply every timer callback that is due. Returns the resulting events
    /// in the order they happened.
    fn tick(&mut self) -> Vec<Event>;

    /// Read-only view of the current state for rendering.
    fn snapshot(&self) -> Self::Snapshot;

    /// Cancel every pending timer. Later ticks must not mutate state.
    fn teardown(&mut self);

    /// Clock time of the next pending timer, if any.
    fn next_due_ms(&self) -> Option<u64>;
}

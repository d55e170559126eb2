mod queue;

pub use queue::{Fired, TimerId, TimerQueue};

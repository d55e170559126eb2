use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::games::reaction::ReactionSample;
use crate::games::word_scramble::Feedback;

/// Every state change in a controller produces an Event.
/// The presentation layer renders from snapshots and uses events for
/// one-off effects (sounds, flashes, log lines).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // ── Breathing ────────────────────────────────────────────────────
    BreathingStarted {
        session_id: Uuid,
        phase_label: String,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        session_id: Uuid,
        phase_index: usize,
        phase_label: String,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        session_id: Uuid,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    BreathingStopped {
        session_id: Uuid,
        phase_index: usize,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },

    // ── Reaction timer ───────────────────────────────────────────────
    ReactionWaiting {
        session_id: Uuid,
        delay_ms: u64,
        at: DateTime<Utc>,
    },
    ReactionReady {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    ReactionRecorded {
        session_id: Uuid,
        sample: ReactionSample,
        best_ms: u64,
        average_ms: u64,
        at: DateTime<Utc>,
    },
    /// Tap arrived before the trigger; the round was abandoned.
    ReactionTooEarly {
        session_id: Uuid,
        at: DateTime<Utc>,
    },

    // ── Pattern memory ───────────────────────────────────────────────
    PatternStarted {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    PatternPlaybackStarted {
        session_id: Uuid,
        level: u32,
        length: usize,
        at: DateTime<Utc>,
    },
    /// `tile: None` means the highlight was switched off.
    TileHighlighted {
        session_id: Uuid,
        tile: Option<usize>,
        at: DateTime<Utc>,
    },
    PatternPlaybackFinished {
        session_id: Uuid,
        level: u32,
        at: DateTime<Utc>,
    },
    TileAccepted {
        session_id: Uuid,
        tile: usize,
        position: usize,
        at: DateTime<Utc>,
    },
    LevelAdvanced {
        session_id: Uuid,
        level: u32,
        at: DateTime<Utc>,
    },
    PatternGameOver {
        session_id: Uuid,
        level: u32,
        expected: usize,
        tapped: usize,
        high_score: u32,
        at: DateTime<Utc>,
    },

    // ── Stretch player ───────────────────────────────────────────────
    StretchSelected {
        name: String,
        steps: usize,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    StretchStarted {
        session_id: Uuid,
        name: String,
        step_interval_ms: u64,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    StretchStepAdvanced {
        session_id: Uuid,
        step_index: usize,
        instruction: String,
        at: DateTime<Utc>,
    },
    /// The last step was reached; the countdown may still be running.
    StretchStepsFinished {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    StretchCountdown {
        session_id: Uuid,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StretchReset {
        session_id: Uuid,
        at: DateTime<Utc>,
    },

    // ── Memory match ─────────────────────────────────────────────────
    MemoryDealt {
        session_id: Uuid,
        cards: usize,
        at: DateTime<Utc>,
    },
    CardFlipped {
        session_id: Uuid,
        index: usize,
        symbol: String,
        at: DateTime<Utc>,
    },
    CardsMatched {
        session_id: Uuid,
        first: usize,
        second: usize,
        moves: u32,
        at: DateTime<Utc>,
    },
    CardsMismatched {
        session_id: Uuid,
        first: usize,
        second: usize,
        moves: u32,
        at: DateTime<Utc>,
    },
    CardsHidden {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    MemoryWon {
        session_id: Uuid,
        moves: u32,
        at: DateTime<Utc>,
    },

    // ── Color tap ────────────────────────────────────────────────────
    ColorRoundStarted {
        session_id: Uuid,
        target: String,
        options: Vec<String>,
        at: DateTime<Utc>,
    },
    ColorTapped {
        session_id: Uuid,
        correct: bool,
        score: u32,
        at: DateTime<Utc>,
    },
    ColorTimeLeft {
        session_id: Uuid,
        secs_left: u64,
        at: DateTime<Utc>,
    },
    ColorTapFinished {
        session_id: Uuid,
        score: u32,
        high_score: u32,
        at: DateTime<Utc>,
    },

    // ── Word scramble ────────────────────────────────────────────────
    ScrambleWordShown {
        session_id: Uuid,
        index: usize,
        scrambled: String,
        at: DateTime<Utc>,
    },
    ScrambleGuessChecked {
        session_id: Uuid,
        feedback: Feedback,
        score: u32,
        at: DateTime<Utc>,
    },
    ScrambleFeedbackCleared {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    ScrambleHintShown {
        session_id: Uuid,
        hint: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Session the event belongs to, if it is session-scoped.
    pub fn session_id(&self) -> Option<Uuid> {
        let value = serde_json::to_value(self).ok()?;
        value
            .get("session_id")
            .and_then(|id| id.as_str())
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    /// The serde tag, e.g. `"PhaseChanged"`.
    pub fn kind(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let id = Uuid::new_v4();
        let event = Event::CycleCompleted {
            session_id: id,
            cycles_completed: 3,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CycleCompleted");
        assert_eq!(json["cycles_completed"], 3);
        assert_eq!(event.kind(), "CycleCompleted");
        assert_eq!(event.session_id(), Some(id));
    }

    #[test]
    fn stretch_selected_has_no_session() {
        let event = Event::StretchSelected {
            name: "Neck Roll".into(),
            steps: 5,
            total_secs: 15,
            at: Utc::now(),
        };
        assert_eq!(event.session_id(), None);
    }
}

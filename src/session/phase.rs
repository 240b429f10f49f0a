//! Interview phase progression.
//!
//! The interview follows a fixed script of six questions plus a terminal
//! `completed` marker. The remote service reports the current phase with every
//! reply; this module tracks it and derives display values from it.

use serde::{Deserialize, Serialize};

/// One step of the fixed interview script.
///
/// The declaration order is the script order; `completed` is terminal. Derived
/// `Ord` is relied on for regression detection in [`PhaseTracker::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    Opening,
    // rename_all would drop the underscore before the digit.
    #[serde(rename = "behavioral_1")]
    Behavioral1,
    #[serde(rename = "behavioral_2")]
    Behavioral2,
    LegalLogic,
    Motivation,
    Closing,
    Completed,
}

impl InterviewPhase {
    /// All phases in script order.
    pub fn all() -> &'static [Self] {
        &[
            InterviewPhase::Opening,
            InterviewPhase::Behavioral1,
            InterviewPhase::Behavioral2,
            InterviewPhase::LegalLogic,
            InterviewPhase::Motivation,
            InterviewPhase::Closing,
            InterviewPhase::Completed,
        ]
    }

    /// Wire identifier as the service reports it.
    pub fn id(&self) -> &'static str {
        match self {
            InterviewPhase::Opening => "opening",
            InterviewPhase::Behavioral1 => "behavioral_1",
            InterviewPhase::Behavioral2 => "behavioral_2",
            InterviewPhase::LegalLogic => "legal_logic",
            InterviewPhase::Motivation => "motivation",
            InterviewPhase::Closing => "closing",
            InterviewPhase::Completed => "completed",
        }
    }

    /// Human-readable label for the progress header.
    pub fn label(&self) -> &'static str {
        match self {
            InterviewPhase::Opening => "Opening",
            InterviewPhase::Behavioral1 => "Behavioral question",
            InterviewPhase::Behavioral2 => "Behavioral question",
            InterviewPhase::LegalLogic => "Legal reasoning",
            InterviewPhase::Motivation => "Motivation",
            InterviewPhase::Closing => "Closing",
            InterviewPhase::Completed => "Interview finished",
        }
    }

    /// Question number shown to the user, 1 through 6. `completed` maps to 6.
    pub fn progress(&self) -> u8 {
        match self {
            InterviewPhase::Opening => 1,
            InterviewPhase::Behavioral1 => 2,
            InterviewPhase::Behavioral2 => 3,
            InterviewPhase::LegalLogic => 4,
            InterviewPhase::Motivation => 5,
            InterviewPhase::Closing | InterviewPhase::Completed => 6,
        }
    }
}

impl std::fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Tracks the current phase of one session.
///
/// The service is authoritative: `advance` stores whatever phase the last
/// response carried. The script never moves backwards, so a value ordering
/// before the current one indicates a service defect and is logged, not
/// reordered locally.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: InterviewPhase,
}

impl PhaseTracker {
    pub fn new(initial: InterviewPhase) -> Self {
        Self { current: initial }
    }

    /// Stores the phase reported by the service.
    pub fn advance(&mut self, phase: InterviewPhase) {
        if phase < self.current {
            tracing::warn!(
                "Service reported phase '{}' after '{}'; phases must not regress",
                phase,
                self.current
            );
        }
        self.current = phase;
    }

    pub fn current(&self) -> InterviewPhase {
        self.current
    }

    /// Question number 1..=6 for display.
    pub fn progress(&self) -> u8 {
        self.current.progress()
    }

    pub fn label(&self) -> &'static str {
        self.current.label()
    }

    pub fn is_complete(&self) -> bool {
        self.current == InterviewPhase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_totally_ordered_in_script_order() {
        let all = InterviewPhase::all();
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1], "{} must order before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn wire_ids_round_trip_through_serde() {
        for phase in InterviewPhase::all() {
            let json = serde_json::to_string(phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase.id()));
            let back: InterviewPhase = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *phase);
        }
    }

    #[test]
    fn progress_maps_six_steps_and_completed_to_six() {
        let expected = [1u8, 2, 3, 4, 5, 6, 6];
        for (phase, want) in InterviewPhase::all().iter().zip(expected) {
            assert_eq!(phase.progress(), want);
        }
    }

    #[test]
    fn advance_never_regresses_over_a_full_interview() {
        let mut tracker = PhaseTracker::new(InterviewPhase::Opening);
        let mut last = tracker.current();
        for phase in InterviewPhase::all().iter().skip(1) {
            tracker.advance(*phase);
            assert!(tracker.current() >= last);
            last = tracker.current();
        }
        assert!(tracker.is_complete());
        assert_eq!(tracker.progress(), 6);
    }

    #[test]
    fn completed_is_terminal() {
        let mut tracker = PhaseTracker::new(InterviewPhase::Closing);
        tracker.advance(InterviewPhase::Completed);
        assert!(tracker.is_complete());
        // A repeated completed report stays terminal.
        tracker.advance(InterviewPhase::Completed);
        assert!(tracker.is_complete());
    }
}

//! Session transcript with optimistic candidate entries.
//!
//! The transcript is an append-only sequence of interviewer and candidate
//! messages. A candidate entry is appended optimistically before the service
//! confirms the turn; it stays mutable (removable) until the reply arrives and
//! is rolled back exactly if the turn fails.

use serde::{Deserialize, Serialize};

use super::phase::InterviewPhase;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Interviewer,
    Candidate,
}

/// One transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Phase the message was produced in.
    pub phase: InterviewPhase,
}

/// Ordered transcript of one session.
///
/// At most one optimistic entry exists at a time; it is always the last entry.
/// Confirmed entries are never mutated or removed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Message>,
    pending: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a confirmed interviewer message.
    pub fn push_interviewer(&mut self, content: impl Into<String>, phase: InterviewPhase) {
        self.entries.push(Message {
            role: Role::Interviewer,
            content: content.into(),
            phase,
        });
    }

    /// Appends a candidate entry ahead of service confirmation.
    ///
    /// Panics in debug builds if an optimistic entry is already outstanding;
    /// the dispatcher's single-flight guard makes that unreachable.
    pub fn push_optimistic(&mut self, content: impl Into<String>, phase: InterviewPhase) {
        debug_assert!(self.pending.is_none(), "optimistic entry already pending");
        self.entries.push(Message {
            role: Role::Candidate,
            content: content.into(),
            phase,
        });
        self.pending = Some(self.entries.len() - 1);
    }

    /// Marks the outstanding optimistic entry as confirmed and immutable.
    pub fn confirm_optimistic(&mut self) {
        self.pending = None;
    }

    /// Removes the outstanding optimistic entry, restoring the transcript to
    /// exactly its pre-dispatch state. No-op when nothing is pending.
    pub fn rollback_optimistic(&mut self) {
        if let Some(index) = self.pending.take() {
            // The optimistic entry is always the last one appended.
            debug_assert_eq!(index, self.entries.len() - 1);
            self.entries.remove(index);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interviewer_and_candidate_entries_append_in_order() {
        let mut transcript = Transcript::new();
        transcript.push_interviewer("Welcome", InterviewPhase::Opening);
        transcript.push_optimistic("Thanks", InterviewPhase::Opening);
        transcript.confirm_optimistic();
        transcript.push_interviewer("First question", InterviewPhase::Behavioral1);

        let roles: Vec<Role> = transcript.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Interviewer, Role::Candidate, Role::Interviewer]);
    }

    #[test]
    fn rollback_restores_exact_pre_dispatch_state() {
        let mut transcript = Transcript::new();
        transcript.push_interviewer("Welcome", InterviewPhase::Opening);
        let before = transcript.len();

        transcript.push_optimistic("Answer", InterviewPhase::Opening);
        assert_eq!(transcript.len(), before + 1);
        assert!(transcript.has_pending());

        transcript.rollback_optimistic();
        assert_eq!(transcript.len(), before);
        assert!(!transcript.has_pending());
        assert_eq!(transcript.last().unwrap().content, "Welcome");
    }

    #[test]
    fn rollback_without_pending_entry_is_a_no_op() {
        let mut transcript = Transcript::new();
        transcript.push_interviewer("Welcome", InterviewPhase::Opening);
        transcript.rollback_optimistic();
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn confirmed_entries_survive_later_rollbacks() {
        let mut transcript = Transcript::new();
        transcript.push_optimistic("First answer", InterviewPhase::Opening);
        transcript.confirm_optimistic();
        transcript.push_optimistic("Second answer", InterviewPhase::Behavioral1);
        transcript.rollback_optimistic();

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().content, "First answer");
    }
}

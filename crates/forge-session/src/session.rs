//! Per-session conversational state.

use forge_shared::{DetailSpec, ProblemBrief, TurnRecord};

/// Conversation phase for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No automation cycle in flight; every turn goes to the classifier.
    #[default]
    Listening,
    /// A clarifying question is pending; the next turn feeds the elicitor.
    AwaitingDetailAnswer,
    /// An artifact is parked server-side awaiting explicit consent.
    AwaitingYamlConfirmation,
}

/// State for one conversation. Invariants: `Listening` implies no brief and
/// no pending question; a parked artifact implies `AwaitingYamlConfirmation`.
#[derive(Debug, Default)]
pub struct Session {
    pub phase: Phase,
    pub pending_question: Option<String>,
    pub brief: Option<ProblemBrief>,
    pub spec: Option<DetailSpec>,
    pub ready_artifact: Option<String>,
    pub history: Vec<TurnRecord>,
}

impl Session {
    const HISTORY_CAP: usize = 6;

    /// Returns to `Listening` with all cycle state cleared. History survives
    /// a cycle reset; it belongs to the conversation, not the cycle.
    pub fn reset(&mut self) {
        let history = std::mem::take(&mut self.history);
        *self = Session {
            history,
            ..Session::default()
        };
    }

    pub fn remember(&mut self, record: TurnRecord) {
        self.history.push(record);
        if self.history.len() > Self::HISTORY_CAP {
            self.history.remove(0);
        }
    }
}

/// Read-only view of a session for diagnostics and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub pending_question: Option<String>,
    pub brief: Option<ProblemBrief>,
    pub spec: Option<DetailSpec>,
    pub ready_artifact: Option<String>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            phase: session.phase,
            pending_question: session.pending_question.clone(),
            brief: session.brief.clone(),
            spec: session.spec.clone(),
            ready_artifact: session.ready_artifact.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_cycle_state_but_keeps_history() {
        let mut session = Session {
            phase: Phase::AwaitingYamlConfirmation,
            pending_question: Some("q".into()),
            ready_artifact: Some("agent: {}".into()),
            ..Session::default()
        };
        session.remember(TurnRecord::new("hi", "Noted."));
        session.reset();
        assert_eq!(session.phase, Phase::Listening);
        assert!(session.pending_question.is_none());
        assert!(session.ready_artifact.is_none());
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn history_is_capped_at_six_turns() {
        let mut session = Session::default();
        for i in 0..10 {
            session.remember(TurnRecord::new(format!("u{i}"), "r"));
        }
        assert_eq!(session.history.len(), 6);
        assert_eq!(session.history[0].user_text, "u4");
    }
}

//! Conversation orchestrator: drives the three stages across turns.
//!
//! One state machine per session: `Listening` until the classifier accepts a
//! problem brief, `AwaitingDetailAnswer` while the elicitor gathers fields,
//! `AwaitingYamlConfirmation` once an artifact is parked. The artifact is
//! never sent to the caller; generation writes a file, so it is gated on an
//! explicit affirmative reply.

mod session;
mod sinks;
pub mod vocab;

pub use session::{Phase, Session, SessionSnapshot};
pub use sinks::{ArtifactSink, SinkError, TranscriptSink};
pub use vocab::Consent;

use dashmap::DashMap;
use forge_shared::TurnRecord;
use forge_stages::{DetailVerdict, JournalVerdict, StageSet, YamlVerdict};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Acknowledgment sent when a brief is accepted.
pub const PROBLEM_ACK: &str = "I detected a problem worth automating. I'll dig into details.";
/// Reply for turns that produce nothing actionable.
pub const NEUTRAL_ACK: &str = "Noted.";
/// The consent gate. Re-asked verbatim on ambiguous replies.
pub const CONFIRM_QUESTION: &str =
    "I have a complete agent configuration ready. Should I proceed to generate it now?";
/// Reply after a declined confirmation.
pub const DISCARDED: &str =
    "Understood, I've discarded the draft. Tell me about another problem any time.";
/// Reply when the artifact could not be written.
pub const PERSIST_FAILED: &str =
    "I couldn't save the configuration, so I've discarded the draft. Let's try again later.";
/// Reply when details are gathered but the generator stage is unconfigured.
pub const GENERATION_UNAVAILABLE: &str =
    "I have what I need, but configuration drafting isn't enabled right now.";

/// Orchestrator over all sessions. Turns within one session are serialized
/// by a per-session mutex; distinct sessions proceed independently.
pub struct Orchestrator {
    stages: StageSet,
    artifacts: Arc<dyn ArtifactSink>,
    transcripts: Option<Arc<dyn TranscriptSink>>,
    sessions: DashMap<String, Arc<Mutex<Session>>>,
}

impl Orchestrator {
    pub fn new(stages: StageSet, artifacts: Arc<dyn ArtifactSink>) -> Self {
        Self {
            stages,
            artifacts,
            transcripts: None,
            sessions: DashMap::new(),
        }
    }

    pub fn with_transcripts(mut self, transcripts: Arc<dyn TranscriptSink>) -> Self {
        self.transcripts = Some(transcripts);
        self
    }

    /// Processes one user turn and returns the conversational reply. Always
    /// returns non-empty text; stage failures degrade inside the stages.
    pub async fn process_turn(&self, session_id: &str, user_text: &str) -> String {
        let handle = self.session_handle(session_id);
        let mut session = handle.lock().await;
        let (reply, model) = self.advance(&mut session, user_text).await;

        let mut record = TurnRecord::new(user_text, reply.as_str());
        record.model = model;
        if let Some(transcripts) = &self.transcripts {
            if let Err(err) = transcripts.append(&record).await {
                tracing::warn!(session_id, error = %err, "failed to append transcript record");
            }
        }
        session.remember(record);
        reply
    }

    /// Drops the session entirely, history included.
    pub fn reset_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Read-only view of a session; a fresh one if it does not exist yet.
    pub async fn snapshot(&self, session_id: &str) -> SessionSnapshot {
        let handle = self.session_handle(session_id);
        let session = handle.lock().await;
        SessionSnapshot::from(&*session)
    }

    fn session_handle(&self, session_id: &str) -> Arc<Mutex<Session>> {
        let entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::default())));
        Arc::clone(entry.value())
    }

    /// Returns the reply and, when a stage's model produced its text, that
    /// model's id for the transcript record.
    async fn advance(&self, session: &mut Session, user_text: &str) -> (String, Option<String>) {
        match session.phase {
            Phase::AwaitingYamlConfirmation => {
                (self.handle_confirmation(session, user_text).await, None)
            }
            Phase::Listening => match self.stages.journal.classify(user_text).await {
                JournalVerdict::Brief(brief) => {
                    let verdict = self.stages.detail.elicit(&brief, user_text, None).await;
                    session.brief = Some(brief);
                    self.handle_detail_verdict(session, verdict, true).await
                }
                JournalVerdict::Summary(summary) => {
                    (summary, Some(self.stages.journal.model().to_string()))
                }
                JournalVerdict::Neutral(cause) => {
                    tracing::debug!(?cause, "journal stage degraded");
                    (NEUTRAL_ACK.to_string(), None)
                }
            },
            Phase::AwaitingDetailAnswer => {
                let Some(brief) = session.brief.clone() else {
                    tracing::error!("detail phase without a brief, resetting session");
                    session.reset();
                    return (NEUTRAL_ACK.to_string(), None);
                };
                let verdict = self
                    .stages
                    .detail
                    .elicit(&brief, user_text, session.spec.as_ref())
                    .await;
                self.handle_detail_verdict(session, verdict, false).await
            }
        }
    }

    /// Shared continuation for both the first elicitor run (same turn as the
    /// brief) and answer turns. `first_contact` prefixes the acknowledgment.
    async fn handle_detail_verdict(
        &self,
        session: &mut Session,
        verdict: DetailVerdict,
        first_contact: bool,
    ) -> (String, Option<String>) {
        let (reply, model) = match verdict {
            DetailVerdict::Question(question) => {
                session.pending_question = Some(question.clone());
                session.phase = Phase::AwaitingDetailAnswer;
                (question, Some(self.stages.detail.model().to_string()))
            }
            DetailVerdict::Fallback(question) => {
                session.pending_question = Some(question.clone());
                session.phase = Phase::AwaitingDetailAnswer;
                (question, None)
            }
            DetailVerdict::Spec(newer) => {
                let mut spec = session.spec.take().unwrap_or_default();
                spec.merge_from(newer);
                let verdict = self.stages.yaml.generate(&spec).await;
                session.spec = Some(spec);
                match verdict {
                    YamlVerdict::Artifact(artifact) => {
                        session.ready_artifact = Some(artifact);
                        session.pending_question = Some(CONFIRM_QUESTION.to_string());
                        session.phase = Phase::AwaitingYamlConfirmation;
                        (
                            CONFIRM_QUESTION.to_string(),
                            Some(self.stages.yaml.model().to_string()),
                        )
                    }
                    YamlVerdict::MissingInfo(question) => {
                        session.pending_question = Some(question.clone());
                        session.phase = Phase::AwaitingDetailAnswer;
                        (question, Some(self.stages.yaml.model().to_string()))
                    }
                    YamlVerdict::Fallback(question) => {
                        session.pending_question = Some(question.clone());
                        session.phase = Phase::AwaitingDetailAnswer;
                        (question, None)
                    }
                    YamlVerdict::Skipped => {
                        session.reset();
                        return (GENERATION_UNAVAILABLE.to_string(), None);
                    }
                }
            }
            DetailVerdict::Skipped => {
                session.reset();
                return (PROBLEM_ACK.to_string(), None);
            }
        };
        if first_contact {
            (format!("{} {}", PROBLEM_ACK, reply), model)
        } else {
            (reply, model)
        }
    }

    async fn handle_confirmation(&self, session: &mut Session, user_text: &str) -> String {
        match vocab::classify(user_text) {
            Consent::Affirmed => {
                let artifact = session.ready_artifact.take().unwrap_or_default();
                let reply = match self.artifacts.persist(&artifact).await {
                    Ok(location) => format!("Saved the agent configuration to {}.", location),
                    Err(err) => {
                        tracing::error!(error = %err, "failed to persist confirmed artifact");
                        PERSIST_FAILED.to_string()
                    }
                };
                session.reset();
                reply
            }
            Consent::Declined => {
                session.reset();
                DISCARDED.to_string()
            }
            Consent::Ambiguous => session
                .pending_question
                .clone()
                .unwrap_or_else(|| CONFIRM_QUESTION.to_string()),
        }
    }
}

//! Per-turn message dispatch.
//!
//! Sends exactly one candidate answer per invocation and reconciles the
//! transcript with the service's reply. The transcript gets an optimistic
//! candidate entry before the network call; on any failure that entry is
//! rolled back exactly and phase/completion stay untouched.

use anyhow::bail;

use super::controller::ActiveSession;
use crate::api::{ChatResponse, InterviewClient};
use crate::recording::AudioArtifact;
use crate::session::InterviewPhase;

/// Transcript label for an audio-only turn.
pub const VOICE_PLACEHOLDER: &str = "🎤 Voice answer";

/// One candidate turn: typed text or a recorded answer.
///
/// Exactly one variant is dispatched per turn. Text and audio are never
/// combined as equals: non-empty text always wins and the artifact is
/// discarded (see [`UserInput::resolve`]).
#[derive(Debug)]
pub enum UserInput {
    Text(String),
    Audio {
        artifact: AudioArtifact,
        /// Optional text accompanying the upload in the `message` field.
        text: Option<String>,
    },
}

impl UserInput {
    /// Resolves raw UI state into the input for this turn.
    ///
    /// Non-empty (trimmed) text wins: any pending artifact is dropped here,
    /// abandoning the recording before send. With no text, a present artifact
    /// becomes an audio-only turn. Returns `None` when there is nothing to
    /// send.
    pub fn resolve(text: &str, artifact: Option<AudioArtifact>) -> Option<Self> {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if artifact.is_some() {
                tracing::debug!("Typed text takes precedence; discarding recorded answer");
            }
            return Some(UserInput::Text(trimmed.to_string()));
        }
        artifact.map(|artifact| UserInput::Audio {
            artifact,
            text: None,
        })
    }
}

/// Sends candidate turns to the service, one at a time.
#[derive(Debug, Default)]
pub struct MessageDispatcher {
    in_flight: bool,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a turn is currently awaiting its reply.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Dispatches one turn and reconciles the session with the reply.
    ///
    /// Preconditions: the session is not complete and no other dispatch is
    /// outstanding. The artifact inside an audio input is consumed by this
    /// call and is not retried on failure.
    ///
    /// # Errors
    /// - If the session is complete or a dispatch is already in flight
    /// - If the network call or response parsing fails (the optimistic entry
    ///   is rolled back before the error is returned)
    pub async fn dispatch(
        &mut self,
        client: &InterviewClient,
        session: &mut ActiveSession,
        input: UserInput,
    ) -> anyhow::Result<ChatResponse> {
        // The explicit flag is the primary signal, but a terminal phase is
        // equally final even if the service forgot to set the flag.
        if session.complete || session.phases.is_complete() {
            bail!("The interview is complete; no further answers are accepted.");
        }
        if self.in_flight {
            bail!("An answer is already being sent. Wait for the reply first.");
        }

        let optimistic_text = match &input {
            UserInput::Text(text) => text.clone(),
            UserInput::Audio { text, .. } => text
                .clone()
                .unwrap_or_else(|| VOICE_PLACEHOLDER.to_string()),
        };
        session
            .transcript
            .push_optimistic(optimistic_text, session.phases.current());

        self.in_flight = true;
        let result = match &input {
            UserInput::Text(text) => client.chat(&session.id, text).await,
            UserInput::Audio { artifact, text } => {
                client.chat_audio(&session.id, artifact, text.as_deref()).await
            }
        };
        self.in_flight = false;

        match result {
            Ok(reply) => {
                session.transcript.confirm_optimistic();
                session
                    .transcript
                    .push_interviewer(reply.message.clone(), reply.phase);
                session.phases.advance(reply.phase);
                if reply.is_complete && reply.phase != InterviewPhase::Completed {
                    tracing::warn!(
                        "Service reported is_complete with non-terminal phase '{}'",
                        reply.phase
                    );
                }
                // The explicit flag ends the session; phase only drives display.
                session.complete = reply.is_complete;
                tracing::info!(
                    "Turn accepted: phase={}, complete={}",
                    reply.phase,
                    reply.is_complete
                );
                Ok(reply)
            }
            Err(e) => {
                session.transcript.rollback_optimistic();
                tracing::warn!("Turn failed, transcript rolled back: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::controller::ActiveSession;
    use crate::session::{PhaseTracker, Transcript};

    fn artifact() -> AudioArtifact {
        AudioArtifact {
            data: vec![0u8; 16],
            mime: "audio/ogg".to_string(),
            extension: "ogg".to_string(),
            duration_secs: 2,
        }
    }

    fn session() -> ActiveSession {
        let mut transcript = Transcript::new();
        transcript.push_interviewer("Welcome", InterviewPhase::Opening);
        ActiveSession {
            id: "s1".to_string(),
            candidate_name: None,
            transcript,
            phases: PhaseTracker::new(InterviewPhase::Opening),
            complete: false,
        }
    }

    const REPLY_BEHAVIORAL: &str = r#"{"message":"Tell me about a conflict.","phase":"behavioral_1","is_follow_up":false,"is_complete":false}"#;

    #[test]
    fn resolve_prefers_text_and_discards_audio() {
        match UserInput::resolve("hello", Some(artifact())) {
            Some(UserInput::Text(text)) => assert_eq!(text, "hello"),
            other => panic!("expected text input, got {other:?}"),
        }
    }

    #[test]
    fn resolve_uses_audio_when_text_is_blank() {
        match UserInput::resolve("   ", Some(artifact())) {
            Some(UserInput::Audio { text, .. }) => assert!(text.is_none()),
            other => panic!("expected audio input, got {other:?}"),
        }
    }

    #[test]
    fn resolve_returns_none_for_empty_turn() {
        assert!(UserInput::resolve("", None).is_none());
    }

    #[tokio::test]
    async fn successful_text_turn_appends_reply_and_advances_phase() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/chat")
            .with_status(200)
            .with_body(REPLY_BEHAVIORAL)
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();

        dispatcher
            .dispatch(
                &client,
                &mut session,
                UserInput::Text("I am ready".to_string()),
            )
            .await
            .unwrap();

        // Seed interviewer + candidate + reply.
        assert_eq!(session.transcript.len(), 3);
        assert_eq!(session.phases.progress(), 2);
        assert!(!session.complete);
        assert!(!session.transcript.has_pending());
    }

    #[tokio::test]
    async fn failed_turn_rolls_back_to_exact_prior_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/chat")
            .with_status(502)
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();
        let len_before = session.transcript.len();
        let phase_before = session.phases.current();

        let err = dispatcher
            .dispatch(&client, &mut session, UserInput::Text("hello".to_string()))
            .await;

        assert!(err.is_err());
        assert_eq!(session.transcript.len(), len_before);
        assert_eq!(session.phases.current(), phase_before);
        assert!(!session.complete);
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn malformed_reply_takes_the_same_rollback_path() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/chat")
            .with_status(200)
            .with_body("{\"unexpected\":true}")
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();

        let err = dispatcher
            .dispatch(&client, &mut session, UserInput::Text("hello".to_string()))
            .await;

        assert!(err.is_err());
        assert_eq!(session.transcript.len(), 1);
    }

    #[tokio::test]
    async fn audio_turn_uploads_and_uses_placeholder_label() {
        let mut server = mockito::Server::new_async().await;
        let audio_mock = server
            .mock("POST", "/interview/chat-audio")
            .with_status(200)
            .with_body(REPLY_BEHAVIORAL)
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();

        let input = UserInput::resolve("", Some(artifact())).unwrap();
        dispatcher.dispatch(&client, &mut session, input).await.unwrap();

        audio_mock.assert_async().await;
        let candidate = &session.transcript.messages()[1];
        assert_eq!(candidate.content, VOICE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn typed_text_beside_an_artifact_dispatches_text_only() {
        let mut server = mockito::Server::new_async().await;
        let chat_mock = server
            .mock("POST", "/interview/chat")
            .with_status(200)
            .with_body(REPLY_BEHAVIORAL)
            .create_async()
            .await;
        let audio_mock = server
            .mock("POST", "/interview/chat-audio")
            .expect(0)
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();

        let input = UserInput::resolve("hello", Some(artifact())).unwrap();
        dispatcher.dispatch(&client, &mut session, input).await.unwrap();

        chat_mock.assert_async().await;
        audio_mock.assert_async().await;
    }

    #[tokio::test]
    async fn completed_session_rejects_further_turns_without_mutation() {
        let client = InterviewClient::new("http://localhost:1", None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();
        session.complete = true;
        let len_before = session.transcript.len();

        let err = dispatcher
            .dispatch(&client, &mut session, UserInput::Text("more".to_string()))
            .await;

        assert!(err.is_err());
        assert_eq!(session.transcript.len(), len_before);
    }

    #[tokio::test]
    async fn contradictory_completion_signals_still_end_the_session() {
        // is_complete with a non-terminal phase: the flag wins.
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/chat")
            .with_status(200)
            .with_body(
                r#"{"message":"That concludes it.","phase":"closing","is_follow_up":false,"is_complete":true}"#,
            )
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();

        dispatcher
            .dispatch(&client, &mut session, UserInput::Text("done".to_string()))
            .await
            .unwrap();

        assert!(session.complete);
        assert!(!session.phases.is_complete());
        assert_eq!(session.phases.progress(), 6);

        let err = dispatcher
            .dispatch(&client, &mut session, UserInput::Text("more".to_string()))
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn completion_flag_is_taken_from_the_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/chat")
            .with_status(200)
            .with_body(
                r#"{"message":"Thank you, we are done.","phase":"completed","is_follow_up":false,"is_complete":true}"#,
            )
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut dispatcher = MessageDispatcher::new();
        let mut session = session();

        dispatcher
            .dispatch(&client, &mut session, UserInput::Text("goodbye".to_string()))
            .await
            .unwrap();

        assert!(session.complete);
        assert!(session.phases.is_complete());
        assert_eq!(session.phases.progress(), 6);
    }
}

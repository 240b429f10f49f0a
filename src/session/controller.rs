//! Session lifecycle: start, converse, report, teardown.
//!
//! `SessionController` owns the session identifier and transcript for the
//! lifetime of one interview and is the only mutator of that state. Turns go
//! through the dispatcher; teardown performs a best-effort remote delete and
//! always resets local state.

use std::path::PathBuf;

use anyhow::anyhow;

use super::dispatch::{MessageDispatcher, UserInput};
use super::phase::PhaseTracker;
use super::transcript::Transcript;
use crate::api::{ChatResponse, InterviewClient, InterviewReport};

/// CV handed to the start call: inline text or a file uploaded as multipart.
#[derive(Debug, Clone)]
pub enum CvSource {
    Text(String),
    File(PathBuf),
}

/// State of one running interview.
#[derive(Debug)]
pub struct ActiveSession {
    /// Opaque identifier issued by the service.
    pub id: String,
    pub candidate_name: Option<String>,
    pub transcript: Transcript,
    pub phases: PhaseTracker,
    /// Set from the service's explicit `is_complete` flag.
    pub complete: bool,
}

/// Owns at most one active session and the client used to drive it.
pub struct SessionController {
    client: InterviewClient,
    dispatcher: MessageDispatcher,
    session: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(client: InterviewClient) -> Self {
        Self {
            client,
            dispatcher: MessageDispatcher::new(),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.complete)
    }

    /// Starts a new session, superseding (and best-effort deleting) any
    /// session that is still active.
    ///
    /// On success the transcript is seeded with the interviewer's opening
    /// message. On failure no session exists locally.
    ///
    /// # Errors
    /// - If the start call fails or returns a malformed body
    pub async fn start_session(
        &mut self,
        candidate_name: Option<&str>,
        cv: Option<CvSource>,
    ) -> anyhow::Result<&ActiveSession> {
        if self.session.is_some() {
            tracing::info!("Superseding active session with a new start");
            self.end_session().await;
        }

        let response = match cv {
            Some(CvSource::File(path)) => {
                self.client.start_with_cv(candidate_name, &path).await?
            }
            Some(CvSource::Text(text)) => {
                self.client.start(candidate_name, Some(&text)).await?
            }
            None => self.client.start(candidate_name, None).await?,
        };

        let mut transcript = Transcript::new();
        transcript.push_interviewer(response.message.clone(), response.phase);

        tracing::info!(
            "Session started: id={}, phase={}",
            response.session_id,
            response.phase
        );

        self.session = Some(ActiveSession {
            id: response.session_id,
            candidate_name: candidate_name.map(str::to_string),
            transcript,
            phases: PhaseTracker::new(response.phase),
            complete: false,
        });
        Ok(self.session.as_ref().unwrap())
    }

    /// Dispatches one candidate turn through the active session.
    ///
    /// # Errors
    /// - If no session is active
    /// - If the dispatcher rejects or the turn fails (see
    ///   [`MessageDispatcher::dispatch`])
    pub async fn send(&mut self, input: UserInput) -> anyhow::Result<ChatResponse> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("No active interview session"))?;
        self.dispatcher.dispatch(&self.client, session, input).await
    }

    /// Fetches the evaluation report for the active session.
    ///
    /// Does not mutate transcript or phase.
    ///
    /// # Errors
    /// - If no session is active
    /// - If the report call fails
    pub async fn request_report(&self) -> anyhow::Result<InterviewReport> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("No active interview session"))?;
        self.client.report(&session.id).await
    }

    /// Tears the session down: best-effort remote delete, unconditional local
    /// reset. A failed delete is logged and never blocks the reset.
    pub async fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = self.client.delete_session(&session.id).await {
                tracing::warn!("Failed to delete session {} on the service: {e}", session.id);
            } else {
                tracing::info!("Session {} deleted", session.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InterviewPhase;

    const START_BODY: &str =
        r#"{"session_id":"s1","message":"Welcome to the interview.","phase":"opening"}"#;

    fn chat_body(message: &str, phase: &str, complete: bool) -> String {
        format!(
            r#"{{"message":"{message}","phase":"{phase}","is_follow_up":false,"is_complete":{complete}}}"#
        )
    }

    async fn started_controller(server: &mockito::Server) -> SessionController {
        let client = InterviewClient::new(server.url(), None);
        let mut controller = SessionController::new(client);
        controller.start_session(Some("Dana"), None).await.unwrap();
        controller
    }

    #[tokio::test]
    async fn start_seeds_transcript_with_opening_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/start")
            .with_status(200)
            .with_body(START_BODY)
            .create_async()
            .await;

        let controller = started_controller(&server).await;
        let session = controller.session().unwrap();
        assert_eq!(session.id, "s1");
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.phases.current(), InterviewPhase::Opening);
        assert!(!session.complete);
    }

    #[tokio::test]
    async fn failed_start_leaves_no_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/start")
            .with_status(503)
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), None);
        let mut controller = SessionController::new(client);
        let err = controller.start_session(None, None).await;

        assert!(err.is_err());
        assert!(controller.session().is_none());
    }

    #[tokio::test]
    async fn one_turn_scenario_reaches_three_entries_and_progress_two() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/start")
            .with_status(200)
            .with_body(START_BODY)
            .create_async()
            .await;
        server
            .mock("POST", "/interview/chat")
            .with_status(200)
            .with_body(chat_body("Tell me about yourself.", "behavioral_1", false))
            .create_async()
            .await;

        let mut controller = started_controller(&server).await;
        controller
            .send(UserInput::Text("I am ready".to_string()))
            .await
            .unwrap();

        let session = controller.session().unwrap();
        assert_eq!(session.transcript.len(), 3);
        assert_eq!(session.phases.progress(), 2);
    }

    #[tokio::test]
    async fn six_turns_advance_to_completion() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/start")
            .with_status(200)
            .with_body(START_BODY)
            .create_async()
            .await;

        let phases = [
            "behavioral_1",
            "behavioral_2",
            "legal_logic",
            "motivation",
            "closing",
            "completed",
        ];
        let mut mocks = Vec::new();
        for (i, phase) in phases.iter().enumerate() {
            let complete = i == phases.len() - 1;
            // Matched by body so each turn gets its own reply regardless of
            // mock lookup order.
            mocks.push(
                server
                    .mock("POST", "/interview/chat")
                    .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                        "message": format!("answer {i}")
                    })))
                    .with_status(200)
                    .with_body(chat_body("Next question.", phase, complete))
                    .expect(1)
                    .create_async()
                    .await,
            );
        }

        let mut controller = started_controller(&server).await;
        for i in 0..phases.len() {
            controller
                .send(UserInput::Text(format!("answer {i}")))
                .await
                .unwrap();
        }

        let session = controller.session().unwrap();
        assert!(session.complete);
        assert!(session.phases.is_complete());
        assert_eq!(session.phases.progress(), 6);
        // Seed + six (candidate, interviewer) pairs.
        assert_eq!(session.transcript.len(), 13);

        // No further turn is accepted once complete.
        let err = controller.send(UserInput::Text("extra".to_string())).await;
        assert!(err.is_err());
        assert_eq!(controller.session().unwrap().transcript.len(), 13);
    }

    #[tokio::test]
    async fn end_session_resets_locally_even_when_delete_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/start")
            .with_status(200)
            .with_body(START_BODY)
            .create_async()
            .await;
        server
            .mock("DELETE", "/interview/s1")
            .with_status(500)
            .create_async()
            .await;

        let mut controller = started_controller(&server).await;
        controller.end_session().await;
        assert!(controller.session().is_none());
    }

    #[tokio::test]
    async fn report_requires_an_active_session() {
        let client = InterviewClient::new("http://localhost:1", None);
        let controller = SessionController::new(client);
        assert!(controller.request_report().await.is_err());
    }
}

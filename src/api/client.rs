//! HTTP client for the interview service.
//!
//! Wraps every remote endpoint the client consumes: session start (JSON or
//! multipart with a CV file), text and audio chat turns, report retrieval,
//! session deletion, authentication, and the server-side report archive.
//! Network and HTTP failures are mapped to human-readable messages; full
//! detail goes to the log.

use std::path::Path;

use anyhow::anyhow;
use reqwest::multipart;

use super::types::{
    AuthResponse, ChatRequest, ChatResponse, CredentialsRequest, InterviewReport, ReportRequest,
    ReportResponse, SavedReport, SavedReportsResponse, StartRequest, StartResponse,
    VerifyTokenResponse,
};
use crate::recording::AudioArtifact;

/// Client for one interview service instance.
#[derive(Debug, Clone)]
pub struct InterviewClient {
    base_url: String,
    /// Bearer token attached to report, archive, and verify calls when present.
    token: Option<String>,
    http: reqwest::Client,
}

impl InterviewClient {
    /// Creates a client for the given base URL, e.g. `http://host:8000/api`.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Starts a new interview session.
    ///
    /// # Errors
    /// - If the request cannot reach the service
    /// - If the service rejects the request or returns a malformed body
    pub async fn start(
        &self,
        candidate_name: Option<&str>,
        cv_text: Option<&str>,
    ) -> anyhow::Result<StartResponse> {
        tracing::debug!(
            "POST /interview/start (candidate_name={:?}, cv_text={} chars)",
            candidate_name,
            cv_text.map_or(0, str::len)
        );

        let request = self.http.post(self.url("/interview/start")).json(&StartRequest {
            candidate_name,
            cv_text,
        });

        let response = self.send_checked(request, "start interview").await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse interview start response: {e}"))
    }

    /// Starts a new interview session with a CV file attached as multipart.
    ///
    /// # Errors
    /// - If the CV file cannot be read
    /// - If the request fails or returns a malformed body
    pub async fn start_with_cv(
        &self,
        candidate_name: Option<&str>,
        cv_path: &Path,
    ) -> anyhow::Result<StartResponse> {
        let cv_data = std::fs::read(cv_path)
            .map_err(|e| anyhow!("Failed to read CV file {}: {e}", cv_path.display()))?;
        let file_name = cv_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        tracing::debug!(
            "POST /interview/start-with-cv (cv_file={}, {} bytes)",
            file_name,
            cv_data.len()
        );

        let mut form = multipart::Form::new().part(
            "cv_file",
            multipart::Part::bytes(cv_data)
                .file_name(file_name)
                .mime_str("application/octet-stream")
                .map_err(|e| anyhow!("Failed to build CV file part: {e}"))?,
        );
        if let Some(name) = candidate_name {
            form = form.text("candidate_name", name.to_string());
        }

        let request = self.http.post(self.url("/interview/start-with-cv")).multipart(form);
        let response = self.send_checked(request, "start interview").await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse interview start response: {e}"))
    }

    /// Sends one typed candidate answer.
    ///
    /// # Errors
    /// - If the request fails, the service rejects it, or the body is malformed
    pub async fn chat(&self, session_id: &str, message: &str) -> anyhow::Result<ChatResponse> {
        tracing::debug!("POST /interview/chat ({} chars)", message.len());

        let request = self.http.post(self.url("/interview/chat")).json(&ChatRequest {
            session_id,
            message,
        });

        let response = self.send_checked(request, "send answer").await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse chat response: {e}"))
    }

    /// Sends one spoken candidate answer as a multipart upload.
    ///
    /// The artifact bytes go into the `audio` file part with the negotiated
    /// mime type; accompanying text, when present, rides in the optional
    /// `message` field.
    ///
    /// # Errors
    /// - If the request fails, the service rejects it, or the body is malformed
    pub async fn chat_audio(
        &self,
        session_id: &str,
        audio: &AudioArtifact,
        message: Option<&str>,
    ) -> anyhow::Result<ChatResponse> {
        tracing::debug!(
            "POST /interview/chat-audio ({} bytes, mime={}, duration={}s)",
            audio.data.len(),
            audio.mime,
            audio.duration_secs
        );

        let file_part = multipart::Part::bytes(audio.data.clone())
            .file_name(format!("answer.{}", audio.extension))
            .mime_str(&audio.mime)
            .map_err(|e| anyhow!("Failed to build audio part for upload: {e}"))?;

        let mut form = multipart::Form::new()
            .text("session_id", session_id.to_string())
            .part("audio", file_part);
        if let Some(text) = message {
            form = form.text("message", text.to_string());
        }

        let request = self.http.post(self.url("/interview/chat-audio")).multipart(form);
        let response = self.send_checked(request, "send voice answer").await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse chat response: {e}"))
    }

    /// Fetches the evaluation report for a session. Bearer-authenticated when
    /// a token is stored.
    ///
    /// # Errors
    /// - If the request fails, the service rejects it, or the body is malformed
    pub async fn report(&self, session_id: &str) -> anyhow::Result<InterviewReport> {
        tracing::debug!("POST /interview/report");

        let mut request = self
            .http
            .post(self.url("/interview/report"))
            .json(&ReportRequest { session_id });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = self.send_checked(request, "fetch report").await?;
        let body: ReportResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse report response: {e}"))?;
        Ok(body.report)
    }

    /// Deletes a session on the service. Used for restart and abandon paths.
    ///
    /// # Errors
    /// - If the request fails or the service rejects it
    pub async fn delete_session(&self, session_id: &str) -> anyhow::Result<()> {
        tracing::debug!("DELETE /interview/{{id}}");

        let path = format!("/interview/{}", urlencoding::encode(session_id));
        let request = self.http.delete(self.url(&path));
        self.send_checked(request, "delete session").await?;
        Ok(())
    }

    /// Signs in and returns the service's auth result.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<AuthResponse> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&CredentialsRequest { username, password });
        let response = self.send_checked(request, "sign in").await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse auth response: {e}"))
    }

    /// Registers a new account and returns the service's auth result.
    pub async fn register(&self, username: &str, password: &str) -> anyhow::Result<AuthResponse> {
        let request = self
            .http
            .post(self.url("/auth/register"))
            .json(&CredentialsRequest { username, password });
        let response = self.send_checked(request, "register").await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse auth response: {e}"))
    }

    /// Validates the stored bearer token.
    pub async fn verify_token(&self) -> anyhow::Result<VerifyTokenResponse> {
        let mut request = self.http.post(self.url("/auth/verify"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = self.send_checked(request, "verify token").await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse verify response: {e}"))
    }

    /// Lists reports archived server-side. Bearer-authenticated when a token
    /// is stored.
    pub async fn saved_reports(&self) -> anyhow::Result<Vec<SavedReport>> {
        let mut request = self.http.get(self.url("/reports"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = self.send_checked(request, "list saved reports").await?;
        let body: SavedReportsResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse saved reports response: {e}"))?;
        Ok(body.reports)
    }

    /// Deletes a server-side saved report.
    pub async fn delete_saved_report(&self, report_id: &str) -> anyhow::Result<()> {
        let path = format!("/reports/{}", urlencoding::encode(report_id));
        let mut request = self.http.delete(self.url(&path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        self.send_checked(request, "delete saved report").await?;
        Ok(())
    }

    /// Sends a request and maps transport and HTTP-status failures to
    /// human-readable errors. `what` names the operation for the message.
    async fn send_checked(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> anyhow::Result<reqwest::Response> {
        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let message = if e.is_connect() {
                    format!(
                        "Failed to connect to the interview service to {what}. \
                         Check the server address in your config and your connection."
                    )
                } else if e.is_timeout() {
                    format!("Request to {what} timed out. The service is not responding.")
                } else {
                    format!("Network error while trying to {what}: {e}")
                };
                tracing::error!("{message}");
                return Err(anyhow!(message));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!("Service returned {status} for {what}: {error_body}");

        let human_readable = match status.as_u16() {
            401 => "Not signed in or token expired. Run 'intervox auth' to sign in.".to_string(),
            403 => "You don't have permission for this operation.".to_string(),
            404 => format!("The service could not {what}: session not found (it may have expired)."),
            429 => "Too many requests. Please wait a moment and try again.".to_string(),
            500..=504 => {
                format!("The interview service is experiencing issues; could not {what}. Try again later.")
            }
            _ => format!("The service rejected the request to {what} (status {status}): {error_body}"),
        };

        Err(anyhow!(human_readable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: &str) -> InterviewClient {
        InterviewClient::new(url, None)
    }

    fn artifact() -> AudioArtifact {
        AudioArtifact {
            data: vec![1, 2, 3, 4],
            mime: "audio/ogg".to_string(),
            extension: "ogg".to_string(),
            duration_secs: 3,
        }
    }

    #[tokio::test]
    async fn start_parses_session_and_opening_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/interview/start")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "candidate_name": "Dana"
            })))
            .with_status(200)
            .with_body(r#"{"session_id":"s1","message":"Welcome","phase":"opening"}"#)
            .create_async()
            .await;

        let res = client(&server.url()).start(Some("Dana"), None).await.unwrap();
        assert_eq!(res.session_id, "s1");
        assert_eq!(res.phase, crate::session::InterviewPhase::Opening);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_parses_phase_and_completion_flags() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/interview/chat")
            .match_body(Matcher::Json(serde_json::json!({
                "session_id": "s1",
                "message": "I am ready"
            })))
            .with_status(200)
            .with_body(
                r#"{"message":"Tell me about a conflict","phase":"behavioral_1","is_follow_up":false,"is_complete":false}"#,
            )
            .create_async()
            .await;

        let res = client(&server.url()).chat("s1", "I am ready").await.unwrap();
        assert_eq!(res.phase, crate::session::InterviewPhase::Behavioral1);
        assert!(!res.is_complete);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_maps_server_errors_to_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/interview/chat")
            .with_status(500)
            .create_async()
            .await;

        let err = client(&server.url()).chat("s1", "hello").await.unwrap_err();
        assert!(err.to_string().contains("experiencing issues"));
    }

    #[tokio::test]
    async fn chat_audio_uploads_multipart_with_session_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/interview/chat-audio")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data.*".to_string()),
            )
            .match_body(Matcher::Regex("name=\"session_id\"".to_string()))
            .with_status(200)
            .with_body(
                r#"{"message":"Thanks","phase":"behavioral_2","is_follow_up":false,"is_complete":false}"#,
            )
            .create_async()
            .await;

        let res = client(&server.url())
            .chat_audio("s1", &artifact(), None)
            .await
            .unwrap();
        assert_eq!(res.phase, crate::session::InterviewPhase::Behavioral2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn report_attaches_bearer_token_when_present() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/interview/report")
            .match_header("authorization", "Bearer tok123")
            .with_status(200)
            .with_body(
                r#"{"report":{"overall_score":8.5,"summary":"Good","criteria":[],"strengths":[],"improvements":[],"recommendation":"Hire"}}"#,
            )
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), Some("tok123".to_string()));
        let report = client.report("s1").await.unwrap();
        assert_eq!(report.overall_score, 8.5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_omits_bearer_token_even_when_stored() {
        // Start/chat must work without auth; the token contract only covers
        // report and archive calls.
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/interview/chat")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(
                r#"{"message":"ok","phase":"opening","is_follow_up":false,"is_complete":false}"#,
            )
            .create_async()
            .await;

        let client = InterviewClient::new(server.url(), Some("tok123".to_string()));
        client.chat("s1", "hi").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_session_encodes_the_id_into_the_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/interview/s%201")
            .with_status(204)
            .create_async()
            .await;

        client(&server.url()).delete_session("s 1").await.unwrap();
        mock.assert_async().await;
    }
}

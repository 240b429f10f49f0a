//! Wire types for the interview service.
//!
//! Request and response bodies exchanged with the remote scoring service.
//! Field names match the service's JSON exactly.

use serde::{Deserialize, Serialize};

use crate::session::InterviewPhase;

/// Response to `POST /interview/start` and `POST /interview/start-with-cv`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
    /// The interviewer's opening message.
    pub message: String,
    pub phase: InterviewPhase,
}

/// Response to `POST /interview/chat` and `POST /interview/chat-audio`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub phase: InterviewPhase,
    #[serde(default)]
    pub is_follow_up: bool,
    /// Explicit completion flag. Reported independently of `phase`; this flag
    /// is authoritative for ending the session.
    pub is_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartRequest<'a> {
    pub candidate_name: Option<&'a str>,
    pub cv_text: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest<'a> {
    pub session_id: &'a str,
}

/// One scored evaluation criterion in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackCriterion {
    pub name: String,
    pub score: f64,
    pub feedback: String,
}

/// The evaluation report produced by the service after a completed interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewReport {
    pub overall_score: f64,
    pub summary: String,
    pub criteria: Vec<FeedbackCriterion>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub recommendation: String,
}

/// Response to `POST /interview/report`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    pub report: InterviewReport,
}

/// A report the service has archived server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedReport {
    pub id: String,
    pub candidate_name: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub report: InterviewReport,
    #[serde(default)]
    pub messages: Vec<crate::session::Message>,
}

/// Response to `GET /reports`.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedReportsResponse {
    pub reports: Vec<SavedReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialsRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response to `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
    pub username: Option<String>,
}

/// Response to `POST /auth/verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub username: Option<String>,
}

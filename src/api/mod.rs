//! Client for the remote interview scoring service.

pub mod client;
pub mod types;

pub use client::InterviewClient;
pub use types::{
    AuthResponse, ChatResponse, FeedbackCriterion, InterviewReport, SavedReport, StartResponse,
    VerifyTokenResponse,
};

//! Interview session core: phase progression, transcript, dispatch, and the
//! per-session lifecycle controller.

pub mod controller;
pub mod dispatch;
pub mod phase;
pub mod transcript;

pub use controller::{ActiveSession, CvSource, SessionController};
pub use dispatch::{MessageDispatcher, UserInput, VOICE_PLACEHOLDER};
pub use phase::{InterviewPhase, PhaseTracker};
pub use transcript::{Message, Role, Transcript};

//! Mime negotiation for recorded answers.
//!
//! The service accepts a handful of audio containers; candidates are tried in
//! strict preference order against the encoders this system actually has.
//! Negotiation is a pure function of the capability set, so the same system
//! always produces the same mime type.

use std::collections::HashSet;

/// One container/codec candidate for the uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeCandidate {
    /// Mime type sent with the upload.
    pub mime: &'static str,
    /// ffmpeg encoder required, or `None` when encoded in-process.
    pub encoder: Option<&'static str>,
    /// File extension for the uploaded part name.
    pub extension: &'static str,
}

/// Candidates in preference order: what the service handles best first, the
/// universally encodable WAV last. WAV needs no external encoder, so
/// negotiation always succeeds.
pub const CANDIDATES: &[MimeCandidate] = &[
    MimeCandidate {
        mime: "audio/ogg",
        encoder: Some("libopus"),
        extension: "ogg",
    },
    MimeCandidate {
        mime: "audio/mpeg",
        encoder: Some("libmp3lame"),
        extension: "mp3",
    },
    MimeCandidate {
        mime: "audio/wav",
        encoder: None,
        extension: "wav",
    },
];

/// Picks the first candidate whose encoder is available.
pub fn negotiate(available_encoders: &HashSet<String>) -> &'static MimeCandidate {
    let chosen = CANDIDATES
        .iter()
        .find(|candidate| match candidate.encoder {
            Some(encoder) => available_encoders.contains(encoder),
            None => true,
        })
        .unwrap_or(&CANDIDATES[CANDIDATES.len() - 1]);

    tracing::debug!("Negotiated recording format: {}", chosen.mime);
    chosen
}

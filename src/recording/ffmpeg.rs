//! FFmpeg locator and encoder probe.
//!
//! Finds the ffmpeg binary across platforms (standard install locations first,
//! PATH search as fallback) and probes its available audio encoders once per
//! process. The probe result drives mime negotiation for recorded answers.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};

static AUDIO_ENCODERS: OnceLock<HashSet<String>> = OnceLock::new();

/// Locates the ffmpeg binary on the system.
///
/// Checks common install locations by platform, then falls back to a PATH
/// search via `which`/`where`.
///
/// # Errors
/// - If ffmpeg cannot be found anywhere
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/opt/homebrew/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/snap/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files (x86)\\ffmpeg\\bin\\ffmpeg.exe"),
        ]
    } else {
        vec![]
    };

    for path in candidates {
        if path.exists() {
            tracing::debug!("Found ffmpeg at: {}", path.display());
            return Ok(path);
        }
    }

    let ffmpeg_path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", ffmpeg_path.display());
    Ok(ffmpeg_path)
}

/// Returns the set of audio encoder names ffmpeg supports on this system.
///
/// Probed once per process; an absent or broken ffmpeg yields the empty set,
/// which makes mime negotiation fall back to in-process WAV encoding.
pub fn available_audio_encoders() -> &'static HashSet<String> {
    AUDIO_ENCODERS.get_or_init(|| match probe_audio_encoders() {
        Ok(encoders) => {
            tracing::debug!("ffmpeg audio encoders available: {}", encoders.len());
            encoders
        }
        Err(e) => {
            tracing::warn!("Could not probe ffmpeg encoders, recording as WAV: {e}");
            HashSet::new()
        }
    })
}

/// Runs `ffmpeg -encoders` and extracts the audio encoder names.
fn probe_audio_encoders() -> Result<HashSet<String>> {
    let ffmpeg_path = find_ffmpeg()?;

    let output = std::process::Command::new(&ffmpeg_path)
        .args(["-hide_banner", "-encoders"])
        .output()
        .map_err(|e| anyhow!("Failed to run ffmpeg -encoders: {e}"))?;

    if !output.status.success() {
        return Err(anyhow!("ffmpeg -encoders exited with an error"));
    }

    Ok(parse_audio_encoders(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `ffmpeg -encoders` output.
///
/// Encoder lines look like ` A....D libopus    Opus encoder`; the first column
/// is a flag field whose leading `A` marks an audio encoder.
fn parse_audio_encoders(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            if flags.starts_with('A') && flags.len() >= 6 {
                Some(name.to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Searches for a binary in the system PATH.
///
/// Uses `which` on Unix systems and `where` on Windows.
fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = std::process::Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(path_str.trim());
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "ffmpeg not found. Voice answers fall back to WAV without it; to record \
         compressed audio install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_audio_encoders_and_skips_video_lines() {
        let output = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              H.264
 A....D libopus              libopus Opus
 A....D libmp3lame           MP3 (libmp3lame)
 A....D aac                  AAC
 S..... srt                  subtitles";

        let encoders = parse_audio_encoders(output);
        assert!(encoders.contains("libopus"));
        assert!(encoders.contains("libmp3lame"));
        assert!(encoders.contains("aac"));
        assert!(!encoders.contains("libx264"));
        assert!(!encoders.contains("srt"));
    }

    #[test]
    fn parses_empty_output_to_empty_set() {
        assert!(parse_audio_encoders("").is_empty());
    }
}

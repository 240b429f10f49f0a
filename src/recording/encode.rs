//! Finalizes captured PCM samples into an uploadable byte blob.
//!
//! WAV is written in-process with hound. Compressed formats go through a
//! temporary WAV handed to ffmpeg with the negotiated codec, mono enforced.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use hound::WavWriter;

use super::ffmpeg::find_ffmpeg;
use super::mime::MimeCandidate;

/// Encodes mono i16 samples into the negotiated format.
///
/// # Errors
/// - If WAV writing fails
/// - If the ffmpeg conversion fails for a compressed candidate
pub fn encode(samples: &[i16], sample_rate: u32, format: &MimeCandidate) -> Result<Vec<u8>> {
    match format.encoder {
        None => encode_wav(samples, sample_rate),
        Some(codec) => encode_with_ffmpeg(samples, sample_rate, codec, format.extension),
    }
}

/// Writes samples as an in-memory PCM WAV.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Converts samples to a compressed format via a temporary WAV and ffmpeg.
fn encode_with_ffmpeg(
    samples: &[i16],
    sample_rate: u32,
    codec: &str,
    extension: &str,
) -> Result<Vec<u8>> {
    let temp_wav = temp_path("wav");
    let temp_out = temp_path(extension);

    let wav_bytes = encode_wav(samples, sample_rate)?;
    std::fs::write(&temp_wav, wav_bytes)?;

    let result = run_ffmpeg(&temp_wav, &temp_out, codec);

    // Clean up intermediates regardless of conversion outcome.
    if let Err(e) = std::fs::remove_file(&temp_wav) {
        tracing::debug!("Failed to remove temp file: {}", e);
    }
    let encoded = result.and_then(|()| {
        std::fs::read(&temp_out).map_err(|e| anyhow!("Failed to read encoded audio: {e}"))
    });
    if temp_out.exists() {
        if let Err(e) = std::fs::remove_file(&temp_out) {
            tracing::debug!("Failed to remove temp file: {}", e);
        }
    }

    encoded
}

fn run_ffmpeg(input_wav: &Path, output_path: &Path, codec: &str) -> Result<()> {
    let ffmpeg_path = find_ffmpeg()?;

    let output = std::process::Command::new(&ffmpeg_path)
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input_wav)
        .arg("-acodec")
        .arg(codec)
        .arg("-ac")
        .arg("1") // Force mono
        .arg("-y") // Overwrite output
        .arg(output_path)
        .output()?;

    if output.status.success() {
        tracing::debug!("Audio converted with {} codec", codec);
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&output.stderr);
        tracing::error!("ffmpeg conversion failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}

fn temp_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("intervox_{}.{extension}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_encoding_produces_a_readable_mono_file() {
        let samples: Vec<i16> = (0..16_000).map(|i| ((i % 200) * 50) as i16).collect();
        let bytes = encode_wav(&samples, 16_000).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(reader.len(), 16_000);
    }

    #[test]
    fn wav_encoding_accepts_an_empty_capture() {
        let bytes = encode_wav(&[], 16_000).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }
}

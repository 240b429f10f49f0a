//! Microphone capture for spoken answers.
//!
//! `AudioRecorder` owns the capture lifecycle as an explicit state machine:
//! `idle → requesting-permission → recording → stopped-ready`, leaving
//! `stopped-ready` through submission (`take_artifact`) or cancellation, both
//! back to `idle`. Every exit path releases the input stream and the elapsed
//! ticker, including drop.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::encode;
use super::ffmpeg;
use super::mime::{self, MimeCandidate};
use super::timer::ElapsedTimer;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// A finalized recording ready for upload.
///
/// Owned by the recorder until handed to dispatch via
/// [`AudioRecorder::take_artifact`]; after that it is consumed with the turn
/// and never retried.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub data: Vec<u8>,
    pub mime: String,
    pub extension: String,
    /// Elapsed recording time at the one-second resolution of the ticker.
    pub duration_secs: u64,
}

/// Capture lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    /// Device acquisition in progress; fails back to `Idle`.
    RequestingPermission,
    Recording,
    /// An artifact is finalized and waiting for submission or cancellation.
    StoppedReady,
}

/// Records one spoken answer from the configured input device.
pub struct AudioRecorder {
    state: RecorderState,
    /// Device name, numeric index, or "default".
    device_name: String,
    /// Device rate after acquisition; the requested rate before.
    sample_rate: u32,
    /// Recorded audio samples (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active input stream, held only while recording.
    stream: Option<cpal::Stream>,
    negotiated: Option<&'static MimeCandidate>,
    timer: ElapsedTimer,
    artifact: Option<AudioArtifact>,
}

impl AudioRecorder {
    /// Creates an idle recorder. Nothing is acquired until [`start`].
    ///
    /// [`start`]: AudioRecorder::start
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            state: RecorderState::Idle,
            device_name,
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            negotiated: None,
            timer: ElapsedTimer::new(),
            artifact: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    /// Snapshot of the captured samples, for the level meter.
    pub fn samples_snapshot(&self) -> Vec<i16> {
        self.samples.lock().unwrap().clone()
    }

    /// Acquires the microphone and starts capturing.
    ///
    /// Negotiates the artifact format against the system's encoder set before
    /// any audio arrives, starts the elapsed ticker, and begins buffering
    /// mono i16 samples. On any failure the recorder is back in `Idle` with
    /// no stream or ticker held.
    ///
    /// # Errors
    /// - If a recording or finalized answer already exists
    /// - If no input device is available, the device is denied/busy, or the
    ///   stream cannot be configured
    pub fn start(&mut self) -> Result<()> {
        if self.state != RecorderState::Idle {
            return Err(anyhow!("A recording is already in progress"));
        }

        self.state = RecorderState::RequestingPermission;

        match self.acquire_and_stream() {
            Ok(()) => {
                self.timer.start();
                self.state = RecorderState::Recording;
                tracing::debug!("Audio stream started");
                Ok(())
            }
            Err(e) => {
                self.stream = None;
                self.state = RecorderState::Idle;
                tracing::error!("Microphone acquisition failed: {e}");
                Err(anyhow!(
                    "Could not access the microphone: {e}. \
                     Check your input device and permissions, then try again."
                ))
            }
        }
    }

    /// Device acquisition and stream setup, separated so `start` can unwind
    /// to `Idle` on any failure.
    fn acquire_and_stream(&mut self) -> Result<()> {
        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_label = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_label);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }
        self.sample_rate = device_sample_rate;

        self.negotiated = Some(mime::negotiate(ffmpeg::available_audio_encoders()));

        self.samples.lock().unwrap().clear();
        let samples_arc = Arc::clone(&self.samples);

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                Self::handle_audio_callback(data, &samples_arc, num_channels);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Finalizes the capture into a single artifact.
    ///
    /// Releases the input stream, freezes the elapsed counter, and encodes
    /// the buffered samples with the negotiated format. Idempotent: calling
    /// stop when not recording is a no-op.
    ///
    /// # Errors
    /// - If encoding the buffered samples fails
    pub fn stop(&mut self) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Ok(());
        }

        self.stream = None;
        self.timer.stop();

        let samples = self.samples.lock().unwrap().clone();
        let duration_secs = self.timer.elapsed_secs();
        if samples.is_empty() {
            tracing::warn!("Recording stopped with no samples captured");
        } else {
            tracing::info!(
                "Recording stopped: {}s ({} samples at {}Hz)",
                duration_secs,
                samples.len(),
                self.sample_rate
            );
        }

        // Negotiation happened in start(), so the format is always set here.
        let format = self
            .negotiated
            .ok_or_else(|| anyhow!("Recording was never started"))?;
        let data = encode::encode(&samples, self.sample_rate, format)?;

        tracing::debug!(
            "Answer finalized: {} bytes, mime={}",
            data.len(),
            format.mime
        );

        self.artifact = Some(AudioArtifact {
            data,
            mime: format.mime.to_string(),
            extension: format.extension.to_string(),
            duration_secs,
        });
        self.state = RecorderState::StoppedReady;
        Ok(())
    }

    /// Discards any buffered or finalized audio and returns to `Idle`.
    ///
    /// Safe to call in any state, at any point after `start`, including on
    /// teardown mid-capture. Always releases the stream and ticker.
    pub fn cancel(&mut self) {
        match self.state {
            RecorderState::Recording | RecorderState::StoppedReady => {
                self.stream = None;
                self.timer.reset();
                self.samples.lock().unwrap().clear();
                self.artifact = None;
                self.state = RecorderState::Idle;
                tracing::debug!("Recording cancelled");
            }
            RecorderState::Idle | RecorderState::RequestingPermission => {}
        }
    }

    /// Hands the finalized artifact to the caller (submission), returning the
    /// recorder to `Idle`. Returns `None` unless the state is `StoppedReady`.
    pub fn take_artifact(&mut self) -> Option<AudioArtifact> {
        if self.state != RecorderState::StoppedReady {
            return None;
        }
        self.timer.reset();
        self.samples.lock().unwrap().clear();
        self.state = RecorderState::Idle;
        self.artifact.take()
    }

    /// Handles incoming audio data from the audio callback.
    ///
    /// Converts multi-channel audio to mono by averaging all channels.
    fn handle_audio_callback(
        data: &[i16],
        samples_arc: &Arc<Mutex<Vec<i16>>>,
        num_channels: usize,
    ) {
        let mut samples = samples_arc.lock().unwrap();

        match num_channels {
            1 => {
                samples.extend_from_slice(data);
            }
            2 => {
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    samples.push(((left + right) / 2) as i16);
                }
            }
            _ => {
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    samples.push((sum / num_channels as i32) as i16);
                }
            }
        }
    }

    #[cfg(test)]
    fn stopped_for_test(artifact: AudioArtifact) -> Self {
        let mut recorder = Self::new(16_000, "default".to_string());
        recorder.artifact = Some(artifact);
        recorder.state = RecorderState::StoppedReady;
        recorder
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        // Stream and ticker must not outlive the recorder.
        self.stream = None;
        self.timer.reset();
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            devices.len().saturating_sub(1)
        ));
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'intervox list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> AudioArtifact {
        AudioArtifact {
            data: vec![0u8; 8],
            mime: "audio/wav".to_string(),
            extension: "wav".to_string(),
            duration_secs: 1,
        }
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_no_op() {
        let mut recorder = AudioRecorder::new(16_000, "default".to_string());
        recorder.stop().unwrap();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(recorder.take_artifact().is_none());
    }

    #[tokio::test]
    async fn cancel_when_idle_is_a_no_op() {
        let mut recorder = AudioRecorder::new(16_000, "default".to_string());
        recorder.cancel();
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn submission_consumes_the_artifact_and_returns_to_idle() {
        let mut recorder = AudioRecorder::stopped_for_test(artifact());
        let taken = recorder.take_artifact().unwrap();
        assert_eq!(taken.mime, "audio/wav");
        assert_eq!(recorder.state(), RecorderState::Idle);
        // A second take yields nothing; a single artifact is never reused.
        assert!(recorder.take_artifact().is_none());
    }

    #[tokio::test]
    async fn cancel_from_stopped_ready_discards_the_artifact() {
        let mut recorder = AudioRecorder::stopped_for_test(artifact());
        recorder.cancel();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(recorder.take_artifact().is_none());
        assert_eq!(recorder.elapsed_secs(), 0);
    }

    #[tokio::test]
    async fn take_artifact_requires_a_finalized_recording() {
        let mut recorder = AudioRecorder::new(16_000, "default".to_string());
        assert!(recorder.take_artifact().is_none());
    }
}

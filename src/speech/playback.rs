//! Audio playback to speakers

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Plays audio on the default output device
pub struct SpeechPlayback {
    device: Device,
    config: StreamConfig,
}

impl SpeechPlayback {
    /// Create a new playback instance
    ///
    /// # Errors
    ///
    /// Returns error if no suitable output device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Playback("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Playback(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Playback("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { device, config })
    }

    /// Decode MP3 bytes and play them, blocking until playback completes
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    pub fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        let samples = decode_mp3(mp3_data)?;
        self.play_samples(&samples)
    }

    /// Play f32 samples, blocking until playback completes
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built
    pub fn play_samples(&self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let channels = usize::from(self.config.channels);
        let samples: Arc<[f32]> = Arc::from(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let cb_samples = Arc::clone(&samples);
        let cb_position = Arc::clone(&position);
        let cb_finished = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = cb_position.load(Ordering::Relaxed);
                    for frame in data.chunks_mut(channels) {
                        let sample = if pos < cb_samples.len() {
                            let s = cb_samples[pos];
                            pos += 1;
                            s
                        } else {
                            cb_finished.store(true, Ordering::Relaxed);
                            0.0
                        };
                        frame.fill(sample);
                    }
                    cb_position.store(pos, Ordering::Relaxed);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Playback(e.to_string()))?;

        stream.play().map_err(|e| Error::Playback(e.to_string()))?;

        // Wait for the callback to drain the sample buffer
        let duration_ms = (samples.len() as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);

        while !finished.load(Ordering::Relaxed) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        std::thread::sleep(Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = samples.len(), "playback complete");

        Ok(())
    }
}

/// Handle to a background playback thread
///
/// Playback blocks its thread while audio plays, so the detection loop hands
/// payloads off through a channel instead of playing inline. Dropping the
/// handle closes the channel; the detached worker drains whatever is queued
/// and exits on its own. The worker may be mid-playback when the handle is
/// dropped from an async task, so it is never joined.
pub struct PlaybackHandle {
    tx: mpsc::Sender<Arc<Vec<u8>>>,
}

impl PlaybackHandle {
    /// Spawn the playback thread
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Arc<Vec<u8>>>();

        std::thread::Builder::new()
            .name("speech-playback".to_string())
            .spawn(move || {
                let playback = match SpeechPlayback::new() {
                    Ok(playback) => playback,
                    Err(e) => {
                        tracing::error!(error = %e, "playback unavailable, discarding audio");
                        while rx.recv().is_ok() {}
                        return;
                    }
                };

                while let Ok(audio) = rx.recv() {
                    if let Err(e) = playback.play_mp3(&audio) {
                        tracing::error!(error = %e, "playback failed");
                    }
                }
            })?;

        Ok(Self { tx })
    }

    /// Queue an MP3 payload for playback
    pub fn play(&self, audio: Arc<Vec<u8>>) {
        if self.tx.send(audio).is_err() {
            tracing::warn!("playback thread gone, dropping audio");
        }
    }
}

/// Decode MP3 bytes to f32 samples, averaging stereo down to mono
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Playback(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

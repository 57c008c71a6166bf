//! Audio cues for task and timer events.

use rodio::source::{SineWave, Source, Zero};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
}

/// Symbolic sound requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    Notification,
    Success,
    Warning,
}

impl AudioCue {
    /// Tones as (frequency Hz, duration ms), played in order.
    pub fn tones(&self) -> &'static [(f32, u64)] {
        match self {
            Self::Notification => &[(1000.0, 300)],
            Self::Success => &[(1200.0, 150), (1400.0, 150)],
            Self::Warning => &[(800.0, 200), (600.0, 200)],
        }
    }
}

/// Receives audio cue requests. Failures are reported, never retried.
pub trait CueSink {
    fn play(&self, cue: AudioCue) -> Result<(), AudioError>;
}

pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    /// Creates a new audio player on the default output device.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl CueSink for AudioPlayer {
    fn play(&self, cue: AudioCue) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;

        for (i, &(freq, ms)) in cue.tones().iter().enumerate() {
            if i > 0 {
                sink.append(Zero::<f32>::new(1, 44100).take_duration(Duration::from_millis(50)));
            }
            sink.append(
                SineWave::new(freq)
                    .take_duration(Duration::from_millis(ms))
                    .amplify(0.3),
            );
        }
        sink.detach(); // Play in background

        Ok(())
    }
}

//! Replay of recorded skeleton streams
//!
//! A recording is a JSON-lines file with one entry per frame: either a
//! skeleton object, or an array of raw landmarks with confidences that is
//! filtered the way a live estimator would be. A `null` line is a frame in
//! which no body was detected. Replaying a recording exercises the whole
//! session pipeline without a camera or a pose model.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::pipeline::{
    CaptureBackend, CaptureError, EstimatorError, Frame, FrameSource, Pipeline, PoseEstimator,
    Renderer, TracingRenderer,
};
use crate::config::{PoseConfig, ReplayConfig};
use crate::models::{Landmark, Skeleton};

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordedFrame {
    /// Raw estimator output, still to be filtered by confidence
    Landmarks(Vec<Landmark>),
    Skeleton(Skeleton),
}

impl From<Skeleton> for RecordedFrame {
    fn from(skeleton: Skeleton) -> Self {
        RecordedFrame::Skeleton(skeleton)
    }
}

/// Recorded frames of a session, one entry per frame
#[derive(Debug, Clone, Default)]
pub struct SkeletonRecording {
    frames: Arc<Vec<Option<RecordedFrame>>>,
}

impl SkeletonRecording {
    pub fn from_frames(frames: Vec<Option<Skeleton>>) -> Self {
        Self::from_recorded(
            frames
                .into_iter()
                .map(|frame| frame.map(RecordedFrame::from))
                .collect(),
        )
    }

    pub fn from_recorded(frames: Vec<Option<RecordedFrame>>) -> Self {
        Self {
            frames: Arc::new(frames),
        }
    }

    /// Parse JSON lines; blank lines are ignored
    pub fn parse(text: &str) -> Result<Self> {
        let frames = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                serde_json::from_str::<Option<RecordedFrame>>(line)
                    .with_context(|| format!("Invalid skeleton on line {}", number + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_recorded(frames))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        let recording = Self::parse(&text)?;

        tracing::info!(
            "Loaded skeleton recording with {} frames from {}",
            recording.len(),
            path.display()
        );

        Ok(recording)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<Option<&RecordedFrame>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.frames.get(i))
            .map(Option::as_ref)
    }
}

/// Emits one blank frame per recorded skeleton at a fixed rate
pub struct ReplaySource {
    total: u64,
    next_index: u64,
    frame_interval: Duration,
}

impl ReplaySource {
    pub fn new(recording: &SkeletonRecording, frame_interval: Duration) -> Self {
        Self {
            total: recording.len() as u64,
            next_index: 0,
            frame_interval,
        }
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.next_index >= self.total {
            return Ok(None);
        }

        if self.next_index > 0 && !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }

        let frame = Frame::blank(self.next_index, Utc::now());
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Looks up the recorded frame for each frame index.
///
/// Landmarks must reach `min_detection_confidence` to acquire a body and
/// `min_tracking_confidence` while the previous frame had one.
pub struct ReplayEstimator {
    recording: SkeletonRecording,
    min_detection_confidence: f64,
    min_tracking_confidence: f64,
    tracking: bool,
}

impl ReplayEstimator {
    pub fn new(recording: SkeletonRecording, pose: &PoseConfig) -> Self {
        Self {
            recording,
            min_detection_confidence: pose.min_detection_confidence,
            min_tracking_confidence: pose.min_tracking_confidence,
            tracking: false,
        }
    }

    fn min_confidence(&self) -> f64 {
        if self.tracking {
            self.min_tracking_confidence
        } else {
            self.min_detection_confidence
        }
    }
}

impl PoseEstimator for ReplayEstimator {
    fn process(&mut self, frame: &Frame) -> Result<Option<Skeleton>, EstimatorError> {
        let recorded = self
            .recording
            .get(frame.index)
            .ok_or_else(|| EstimatorError::Frame(format!("no recorded frame {}", frame.index)))?;

        let skeleton = match recorded {
            None => None,
            Some(RecordedFrame::Skeleton(skeleton)) => Some(skeleton.clone()),
            Some(RecordedFrame::Landmarks(landmarks)) => {
                Some(Skeleton::from_landmarks(landmarks.iter().copied(), self.min_confidence()))
                    .filter(|skeleton| !skeleton.is_empty())
            }
        };

        self.tracking = skeleton.is_some();
        Ok(skeleton)
    }
}

/// Capture backend serving a recording instead of a camera.
///
/// Without a recording there is nothing to capture and opening fails like an
/// unavailable camera.
#[derive(Debug, Clone, Default)]
pub struct ReplayBackend {
    recording: Option<SkeletonRecording>,
    frame_interval: Duration,
}

impl ReplayBackend {
    pub fn new(recording: Option<SkeletonRecording>, fps: u32) -> Self {
        Self {
            recording,
            frame_interval: Duration::from_secs(1) / fps.max(1),
        }
    }

    pub fn from_config(config: &ReplayConfig) -> Result<Self> {
        let recording = config
            .path
            .as_ref()
            .map(SkeletonRecording::load)
            .transpose()?;
        Ok(Self::new(recording, config.fps))
    }

    /// Replay without pacing, as fast as the loop consumes frames
    pub fn unpaced(recording: SkeletonRecording) -> Self {
        Self {
            recording: Some(recording),
            frame_interval: Duration::ZERO,
        }
    }

    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }
}

impl CaptureBackend for ReplayBackend {
    fn open(&self, pose: &PoseConfig) -> Result<Pipeline, CaptureError> {
        let recording = self
            .recording
            .clone()
            .ok_or(CaptureError::CameraUnavailable(pose.camera_index))?;

        let renderer: Box<dyn Renderer> = Box::new(TracingRenderer);
        Ok(Pipeline {
            source: Box::new(ReplaySource::new(&recording, self.frame_interval)),
            estimator: Box::new(ReplayEstimator::new(recording, pose)),
            renderer,
        })
    }
}

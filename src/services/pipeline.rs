//! Collaborators of the frame loop
//!
//! Capture, pose estimation and rendering are blocking calls made one after
//! another on the session worker. Implementations live outside the detection
//! core; this crate ships a replay backend and tracing-based defaults.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use thiserror::Error;

use crate::config::PoseConfig;
use crate::models::{OverlayState, Skeleton};

/// One captured video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the stream, starting at 0
    pub index: u64,
    pub captured_at: DateTime<Utc>,
    pub image: DynamicImage,
}

impl Frame {
    pub fn new(index: u64, captured_at: DateTime<Utc>, image: DynamicImage) -> Self {
        Self {
            index,
            captured_at,
            image,
        }
    }

    /// Frame without pixel data, for sources that only carry landmarks
    pub fn blank(index: u64, captured_at: DateTime<Utc>) -> Self {
        Self::new(index, captured_at, DynamicImage::new_rgb8(1, 1))
    }
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Could not open camera {0}")]
    CameraUnavailable(u32),
    #[error("Failed to read frame: {0}")]
    Read(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum EstimatorError {
    /// The estimator cannot continue; the session ends
    #[error("Pose estimator unavailable: {0}")]
    Unavailable(String),
    /// Only this frame is lost
    #[error("Pose estimation failed for frame: {0}")]
    Frame(String),
}

impl EstimatorError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EstimatorError::Unavailable(_))
    }
}

/// Blocking video source
pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Release the underlying device
    fn release(&mut self) {}
}

/// Maps a frame to the skeleton of the person in it
pub trait PoseEstimator: Send {
    fn process(&mut self, frame: &Frame) -> Result<Option<Skeleton>, EstimatorError>;
}

/// Draws the skeleton and overlay on top of a frame
pub trait Renderer: Send {
    fn draw(
        &mut self,
        frame: &Frame,
        skeleton: Option<&Skeleton>,
        overlay: &OverlayState,
    ) -> anyhow::Result<()>;
}

/// Everything a session needs from the capture side
pub struct Pipeline {
    pub source: Box<dyn FrameSource>,
    pub estimator: Box<dyn PoseEstimator>,
    pub renderer: Box<dyn Renderer>,
}

/// Opens a fresh pipeline for each session. Opening may block on the device.
pub trait CaptureBackend: Send + Sync {
    fn open(&self, pose: &PoseConfig) -> Result<Pipeline, CaptureError>;
}

/// Renderer that logs the overlay instead of drawing it
#[derive(Debug, Default)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn draw(
        &mut self,
        frame: &Frame,
        skeleton: Option<&Skeleton>,
        overlay: &OverlayState,
    ) -> anyhow::Result<()> {
        tracing::trace!(
            frame = frame.index,
            joints = skeleton.map_or(0, |s| s.len()),
            reps = overlay.rep_count,
            stage = overlay.stage.map(|s| s.label()).unwrap_or("-"),
            banners = ?overlay.banners,
            "Overlay"
        );
        Ok(())
    }
}

//! Per-session frame loop
//!
//! Runs on a blocking worker: capture, estimation, classification and
//! rendering happen in sequence for every frame, since each frame's stage
//! depends on the previous one. The loop ends when the cancellation token
//! fires (checked between frames), the source runs dry, or a fatal capture or
//! estimator error occurs. A failure confined to one frame never ends it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::alert_dispatcher::{AlertEvent, AlertSender};
use super::alert_throttle::AlertThrottle;
use super::classifier::RepClassifier;
use super::pipeline::{EstimatorError, Frame, Pipeline};
use crate::models::{ClassifierOutput, ExerciseKind, OverlayState, SessionStats};

/// Why a frame loop returned
#[derive(Debug, Clone, PartialEq)]
pub enum LoopExit {
    Cancelled,
    EndOfStream,
    CaptureFailed(String),
    EstimatorFailed(String),
}

impl LoopExit {
    pub fn is_failure(&self) -> bool {
        matches!(self, LoopExit::CaptureFailed(_) | LoopExit::EstimatorFailed(_))
    }
}

pub struct FrameLoop {
    pipeline: Pipeline,
    classifier: RepClassifier,
    throttle: AlertThrottle,
    alerts: AlertSender,
    stats: Arc<SessionStats>,
}

impl FrameLoop {
    pub fn new(
        pipeline: Pipeline,
        classifier: RepClassifier,
        throttle: AlertThrottle,
        alerts: AlertSender,
        stats: Arc<SessionStats>,
    ) -> Self {
        Self {
            pipeline,
            classifier,
            throttle,
            alerts,
            stats,
        }
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.classifier.kind()
    }

    /// Process frames until cancelled, out of frames, or fatally broken
    pub fn run(mut self, cancel: CancellationToken) -> LoopExit {
        let exercise = self.exercise();
        info!(%exercise, "Frame loop started");

        let exit = loop {
            if cancel.is_cancelled() {
                break LoopExit::Cancelled;
            }

            let frame = match self.pipeline.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break LoopExit::EndOfStream,
                Err(e) => {
                    error!(%exercise, "Error reading frame: {}", e);
                    break LoopExit::CaptureFailed(e.to_string());
                }
            };

            if let Err(e) = self.process_frame(&frame) {
                error!(%exercise, "Error in {} detection: {}", exercise.display_name(), e);
                break LoopExit::EstimatorFailed(e.to_string());
            }
        };

        self.pipeline.source.release();
        self.stats.mark_stopped();
        info!(
            %exercise,
            reps = self.classifier.rep_count(),
            frames = self.stats.frames_processed(),
            "{} detection stopped ({:?})",
            exercise.display_name(),
            exit
        );

        exit
    }

    /// Run one frame through estimation, classification, alerting and
    /// rendering. Only a fatal estimator error is returned.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<ClassifierOutput, EstimatorError> {
        let now = frame.captured_at;
        let estimator = &mut self.pipeline.estimator;

        let skeleton = match catch_unwind(AssertUnwindSafe(|| estimator.process(frame))) {
            Ok(Ok(skeleton)) => skeleton,
            Ok(Err(e)) if e.is_fatal() => return Err(e),
            Ok(Err(e)) => {
                debug!(frame = frame.index, "Error processing landmarks: {}", e);
                None
            }
            Err(_) => {
                warn!(frame = frame.index, "Pose estimator panicked, skipping landmarks");
                None
            }
        };

        let output = self.classifier.observe(skeleton.as_ref(), now);
        self.stats.record_frame(output.rep_count, output.stage);

        for flag in &output.error_flags {
            if self.throttle.should_trigger(*flag, now) {
                debug!(frame = frame.index, "Alert triggered: {}", flag);
                self.alerts
                    .emit(AlertEvent::new(self.classifier.kind(), *flag, now));
            }
        }

        let overlay = OverlayState {
            exercise: self.classifier.kind(),
            rep_count: output.rep_count,
            stage: output.stage,
            banners: self.throttle.active_flags(now),
            angles: output.angles.clone(),
        };

        let renderer = &mut self.pipeline.renderer;
        match catch_unwind(AssertUnwindSafe(|| {
            renderer.draw(frame, skeleton.as_ref(), &overlay)
        })) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(frame = frame.index, "Failed to render frame: {}", e),
            Err(_) => warn!(frame = frame.index, "Renderer panicked"),
        }

        Ok(output)
    }
}

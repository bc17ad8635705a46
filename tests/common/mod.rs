// Shared fixtures for integration tests: synthetic poses and scripted
// capture pipelines.
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rep_counter::config::PoseConfig;
use rep_counter::models::{Joint, OverlayState, Point2D, Skeleton};
use rep_counter::services::{
    CaptureBackend, CaptureError, EstimatorError, Frame, FrameSource, Pipeline, PoseEstimator,
    Renderer,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

const LIMB: f64 = 0.15;

/// Point `length` away from `vertex`, turned `degrees` away from the ray
/// towards `reference`. `turn` picks the side (1.0 or -1.0).
pub fn rotate_towards(
    vertex: Point2D,
    reference: Point2D,
    degrees: f64,
    length: f64,
    turn: f64,
) -> Point2D {
    let base = (reference.y - vertex.y).atan2(reference.x - vertex.x);
    let direction = base + turn * degrees.to_radians();
    Point2D::new(
        vertex.x + length * direction.cos(),
        vertex.y + length * direction.sin(),
    )
}

struct Side {
    shoulder: Joint,
    elbow: Joint,
    wrist: Joint,
    hip: Joint,
    knee: Joint,
    ankle: Joint,
    x: f64,
    // Rotating away from the body
    turn: f64,
}

const LEFT: Side = Side {
    shoulder: Joint::LeftShoulder,
    elbow: Joint::LeftElbow,
    wrist: Joint::LeftWrist,
    hip: Joint::LeftHip,
    knee: Joint::LeftKnee,
    ankle: Joint::LeftAnkle,
    x: 0.4,
    turn: 1.0,
};

const RIGHT: Side = Side {
    shoulder: Joint::RightShoulder,
    elbow: Joint::RightElbow,
    wrist: Joint::RightWrist,
    hip: Joint::RightHip,
    knee: Joint::RightKnee,
    ankle: Joint::RightAnkle,
    x: 0.6,
    turn: -1.0,
};

/// Standing upper body with both arms set to the given shoulder abduction
/// (hip-shoulder-elbow) and elbow flexion (shoulder-elbow-wrist) angles
pub fn upper_body(shoulder_deg: f64, elbow_deg: f64) -> Skeleton {
    let mut skeleton = Skeleton::new();
    for side in [LEFT, RIGHT] {
        let shoulder = Point2D::new(side.x, 0.3);
        let hip = Point2D::new(side.x, 0.7);
        let elbow = rotate_towards(shoulder, hip, shoulder_deg, LIMB, side.turn);
        let wrist = rotate_towards(elbow, shoulder, elbow_deg, LIMB, side.turn);

        skeleton.insert(side.shoulder, shoulder);
        skeleton.insert(side.hip, hip);
        skeleton.insert(side.elbow, elbow);
        skeleton.insert(side.wrist, wrist);
    }
    skeleton
}

pub fn bicep_pose(elbow_deg: f64) -> Skeleton {
    upper_body(10.0, elbow_deg)
}

pub fn lateral_pose(shoulder_deg: f64) -> Skeleton {
    upper_body(shoulder_deg, 175.0)
}

/// Upper arms out at shoulder height, elbows bent to `elbow_deg`
pub fn press_pose(elbow_deg: f64) -> Skeleton {
    upper_body(90.0, elbow_deg)
}

/// Lying body with the given hip flexion (shoulder-hip-knee) and knee bend
/// (hip-knee-ankle) on both sides
pub fn crunch_pose(hip_deg: f64, knee_deg: f64) -> Skeleton {
    let mut skeleton = Skeleton::new();
    for (side, y) in [(LEFT, 0.6), (RIGHT, 0.62)] {
        let hip = Point2D::new(0.5, y);
        let knee = Point2D::new(0.65, y - 0.1);
        let shoulder = rotate_towards(hip, knee, hip_deg, 0.3, -1.0);
        let ankle = rotate_towards(knee, hip, knee_deg, LIMB, 1.0);

        skeleton.insert(side.shoulder, shoulder);
        skeleton.insert(side.hip, hip);
        skeleton.insert(side.knee, knee);
        skeleton.insert(side.ankle, ankle);
    }
    skeleton
}

pub fn timeline(start: DateTime<Utc>, step_ms: i64, len: usize) -> Vec<DateTime<Utc>> {
    (0..len)
        .map(|i| start + Duration::milliseconds(step_ms * i as i64))
        .collect()
}

/// Finite source of blank frames stamped with the given times
pub struct TimedSource {
    stamps: Vec<DateTime<Utc>>,
    next: usize,
    pub released: Arc<AtomicBool>,
}

impl TimedSource {
    pub fn new(stamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            stamps,
            next: 0,
            released: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FrameSource for TimedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let Some(stamp) = self.stamps.get(self.next).copied() else {
            return Ok(None);
        };
        let frame = Frame::blank(self.next as u64, stamp);
        self.next += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Source that fails after handing out `frames` frames
pub struct BrokenSource {
    pub frames: u64,
    next: u64,
}

impl BrokenSource {
    pub fn new(frames: u64) -> Self {
        Self { frames, next: 0 }
    }
}

impl FrameSource for BrokenSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.next >= self.frames {
            return Err(CaptureError::Read("device disconnected".to_string()));
        }
        self.next += 1;
        Ok(Some(Frame::blank(self.next - 1, Utc::now())))
    }
}

/// Never-ending source producing a frame every `interval`
pub struct EndlessSource {
    next: u64,
    interval: std::time::Duration,
    devices: DeviceCounter,
}

impl FrameSource for EndlessSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        std::thread::sleep(self.interval);
        let frame = Frame::blank(self.next, Utc::now());
        self.next += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.devices.close();
    }
}

/// Tracks how many capture pipelines are open at once
#[derive(Clone, Default)]
pub struct DeviceCounter {
    open: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

impl DeviceCounter {
    fn open(&self) {
        let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn close(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn open_now(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn max_open(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

pub enum Step {
    Pose(Option<Skeleton>),
    Fail(EstimatorError),
    Panic,
}

/// Estimator replaying a script, one step per frame, cycling at the end
pub struct ScriptedEstimator {
    steps: Vec<Step>,
}

impl ScriptedEstimator {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn poses(poses: Vec<Option<Skeleton>>) -> Self {
        Self::new(poses.into_iter().map(Step::Pose).collect())
    }
}

impl PoseEstimator for ScriptedEstimator {
    fn process(&mut self, frame: &Frame) -> Result<Option<Skeleton>, EstimatorError> {
        if self.steps.is_empty() {
            return Ok(None);
        }
        match &self.steps[frame.index as usize % self.steps.len()] {
            Step::Pose(skeleton) => Ok(skeleton.clone()),
            Step::Fail(EstimatorError::Unavailable(msg)) => {
                Err(EstimatorError::Unavailable(msg.clone()))
            }
            Step::Fail(EstimatorError::Frame(msg)) => Err(EstimatorError::Frame(msg.clone())),
            Step::Panic => panic!("estimator crashed on frame {}", frame.index),
        }
    }
}

/// Renderer keeping every overlay it was asked to draw
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub overlays: Arc<Mutex<Vec<OverlayState>>>,
}

impl Renderer for RecordingRenderer {
    fn draw(
        &mut self,
        _frame: &Frame,
        _skeleton: Option<&Skeleton>,
        overlay: &OverlayState,
    ) -> anyhow::Result<()> {
        self.overlays.lock().push(overlay.clone());
        Ok(())
    }
}

/// Renderer whose every draw fails
pub struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn draw(
        &mut self,
        _frame: &Frame,
        _skeleton: Option<&Skeleton>,
        _overlay: &OverlayState,
    ) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("display closed"))
    }
}

/// Renderer that panics on every draw
pub struct PanickingRenderer;

impl Renderer for PanickingRenderer {
    fn draw(
        &mut self,
        frame: &Frame,
        _skeleton: Option<&Skeleton>,
        _overlay: &OverlayState,
    ) -> anyhow::Result<()> {
        panic!("renderer crashed on frame {}", frame.index)
    }
}

/// Backend producing an endless stream cycling through `poses`
pub struct LoopingBackend {
    poses: Vec<Option<Skeleton>>,
    frame_interval: std::time::Duration,
    open_delay: std::time::Duration,
    devices: DeviceCounter,
}

impl LoopingBackend {
    pub fn new(poses: Vec<Option<Skeleton>>) -> Self {
        Self {
            poses,
            frame_interval: std::time::Duration::from_millis(2),
            open_delay: std::time::Duration::ZERO,
            devices: DeviceCounter::default(),
        }
    }

    pub fn with_frame_interval(mut self, ms: u64) -> Self {
        self.frame_interval = std::time::Duration::from_millis(ms);
        self
    }

    /// Make `open` block like a slow camera
    pub fn with_open_delay(mut self, ms: u64) -> Self {
        self.open_delay = std::time::Duration::from_millis(ms);
        self
    }

    pub fn devices(&self) -> DeviceCounter {
        self.devices.clone()
    }
}

impl CaptureBackend for LoopingBackend {
    fn open(&self, _pose: &PoseConfig) -> Result<Pipeline, CaptureError> {
        std::thread::sleep(self.open_delay);
        self.devices.open();
        Ok(Pipeline {
            source: Box::new(EndlessSource {
                next: 0,
                interval: self.frame_interval,
                devices: self.devices.clone(),
            }),
            estimator: Box::new(ScriptedEstimator::poses(self.poses.clone())),
            renderer: Box::new(RecordingRenderer::default()),
        })
    }
}

/// Poll `condition` until it holds or `timeout_ms` elapses
pub async fn wait_until<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + std::time::Duration::from_millis(timeout_ms);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    condition()
}

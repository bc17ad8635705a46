// Detection core and session services

pub mod alert_dispatcher;
pub mod alert_throttle;
pub mod classifier;
pub mod frame_loop;
pub mod geometry;
pub mod pipeline;
pub mod replay;
pub mod rules;
pub mod session_manager;

pub use alert_dispatcher::{
    AlertDispatcher, AlertEvent, AlertSender, AudioPlayer, SoundAssets, TracingAudioPlayer,
};
pub use alert_throttle::AlertThrottle;
pub use classifier::RepClassifier;
pub use frame_loop::{FrameLoop, LoopExit};
pub use geometry::angle_at;
pub use pipeline::{
    CaptureBackend, CaptureError, EstimatorError, Frame, FrameSource, Pipeline, PoseEstimator,
    Renderer, TracingRenderer,
};
pub use replay::{RecordedFrame, ReplayBackend, SkeletonRecording};
pub use rules::ExerciseRules;
pub use session_manager::{SessionError, SessionHandle, SessionManager};

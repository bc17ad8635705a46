pub mod app;
pub mod thresholds;

pub use app::{AlertConfig, AppConfig, PoseConfig, ReplayConfig};
pub use thresholds::{
    BicepCurlThresholds, CrunchThresholds, ExerciseThresholds, LateralRaiseThresholds,
    ShoulderPressThresholds,
};

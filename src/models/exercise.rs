use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Exercises the service can count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    LateralRaises,
    ShoulderPress,
    Crunches,
    BicepCurls,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::LateralRaises,
        ExerciseKind::ShoulderPress,
        ExerciseKind::Crunches,
        ExerciseKind::BicepCurls,
    ];

    /// Route segment and wire name, e.g. `bicep_curls`
    pub fn slug(&self) -> &'static str {
        match self {
            Self::LateralRaises => "lateral_raises",
            Self::ShoulderPress => "shoulder_press",
            Self::Crunches => "crunches",
            Self::BicepCurls => "bicep_curls",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LateralRaises => "Lateral Raises",
            Self::ShoulderPress => "Shoulder Press",
            Self::Crunches => "Crunches",
            Self::BicepCurls => "Bicep Curl",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("unknown exercise: {}", s))
    }
}

/// Discrete body position used to gate rep counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Down,
    Up,
    Lowered,
    Raised,
    Pressing,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
            Self::Lowered => "lowered",
            Self::Raised => "raised",
            Self::Pressing => "pressing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sound cue played when a form error triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundId {
    Alert,
    NotInFrame,
}

impl SoundId {
    pub const ALL: [SoundId; 2] = [SoundId::Alert, SoundId::NotInFrame];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Alert => "alert.mp3",
            Self::NotInFrame => "notinframe.mp3",
        }
    }
}

/// Incorrect-form condition evaluated from a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormError {
    NotInFrame,
    HandsTooHigh,
    HandsTooLow,
    IncorrectForm,
}

impl FormError {
    /// Banner text shown while the alert is active
    pub fn banner(&self) -> &'static str {
        match self {
            Self::NotInFrame => "NOT IN FRAME",
            Self::HandsTooHigh => "HANDS TOO HIGH",
            Self::HandsTooLow => "HANDS TOO LOW",
            Self::IncorrectForm => "INCORRECT FORM",
        }
    }

    pub fn sound(&self) -> SoundId {
        match self {
            Self::NotInFrame => SoundId::NotInFrame,
            _ => SoundId::Alert,
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.banner())
    }
}

/// Angle measured for one joint angle of the rule table in the current frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasuredAngle {
    pub name: &'static str,
    pub degrees: f64,
}

/// Result of feeding one frame to a classifier
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifierOutput {
    /// Stage after this frame
    pub stage: Option<Stage>,
    /// 1 when this frame completed a repetition, else 0
    pub rep_count_delta: u32,
    /// Running total after this frame
    pub rep_count: u32,
    pub error_flags: BTreeSet<FormError>,
    /// Empty when the frame had no usable skeleton
    pub angles: Vec<MeasuredAngle>,
}

impl ClassifierOutput {
    pub fn completed_rep(&self) -> bool {
        self.rep_count_delta > 0
    }
}

/// Everything the renderer needs to draw on top of a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayState {
    pub exercise: ExerciseKind,
    pub rep_count: u32,
    pub stage: Option<Stage>,
    /// Alerts inside their display window
    pub banners: Vec<FormError>,
    pub angles: Vec<MeasuredAngle>,
}

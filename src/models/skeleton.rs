//! Skeleton models and data structures
//!
//! A skeleton is the per-frame output of pose estimation: a set of named body
//! joints mapped to normalized image coordinates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A point in normalized image coordinates (x and y in [0, 1], y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates fall inside the normalized image bounds
    pub fn is_in_bounds(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// COCO body joints tracked by the pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// Get joint name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw landmark as reported by a pose estimator, before validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub joint: Joint,
    pub x: f64,
    pub y: f64,
    /// Detection confidence (0-1)
    pub confidence: f64,
}

impl Landmark {
    pub fn new(joint: Joint, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            joint,
            x,
            y,
            confidence,
        }
    }

    /// Check if the landmark is usable: confident enough and inside the frame
    pub fn is_valid(&self, min_confidence: f64) -> bool {
        self.confidence >= min_confidence && Point2D::new(self.x, self.y).is_in_bounds()
    }
}

/// Joints detected in a single frame.
///
/// Joints the estimator could not place are simply absent; consumers must not
/// assume every [`Joint`] is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skeleton {
    joints: BTreeMap<Joint, Point2D>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a skeleton from raw landmarks, keeping only valid ones
    pub fn from_landmarks<I>(landmarks: I, min_confidence: f64) -> Self
    where
        I: IntoIterator<Item = Landmark>,
    {
        let joints = landmarks
            .into_iter()
            .filter(|lm| lm.is_valid(min_confidence))
            .map(|lm| (lm.joint, Point2D::new(lm.x, lm.y)))
            .collect();

        Self { joints }
    }

    pub fn with_joint(mut self, joint: Joint, point: Point2D) -> Self {
        self.joints.insert(joint, point);
        self
    }

    pub fn insert(&mut self, joint: Joint, point: Point2D) {
        self.joints.insert(joint, point);
    }

    pub fn get(&self, joint: Joint) -> Option<Point2D> {
        self.joints.get(&joint).copied()
    }

    pub fn contains(&self, joint: Joint) -> bool {
        self.joints.contains_key(&joint)
    }

    /// Check if all required joints are present
    pub fn has_joints(&self, joints: &[Joint]) -> bool {
        joints.iter().all(|joint| self.contains(*joint))
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, Point2D)> + '_ {
        self.joints.iter().map(|(joint, point)| (*joint, *point))
    }
}

impl FromIterator<(Joint, Point2D)> for Skeleton {
    fn from_iter<T: IntoIterator<Item = (Joint, Point2D)>>(iter: T) -> Self {
        Self {
            joints: iter.into_iter().collect(),
        }
    }
}

//! Declarative rep-counting rules
//!
//! Each exercise is described by the joint triples it measures, the angle
//! conditions that put the body into its start and end stages, an optional
//! posture gate, and the form checks evaluated on every frame. The generic
//! [`RepClassifier`](super::classifier::RepClassifier) interprets these tables.

use crate::config::{
    BicepCurlThresholds, CrunchThresholds, ExerciseThresholds, LateralRaiseThresholds,
    ShoulderPressThresholds,
};
use crate::models::{ExerciseKind, FormError, Joint, Skeleton, Stage};

/// Angle measured at `vertex` between the rays towards `a` and `c`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngle {
    pub name: &'static str,
    pub a: Joint,
    pub vertex: Joint,
    pub c: Joint,
}

impl JointAngle {
    pub const fn new(name: &'static str, a: Joint, vertex: Joint, c: Joint) -> Self {
        Self { name, a, vertex, c }
    }

    pub fn joints(&self) -> [Joint; 3] {
        [self.a, self.vertex, self.c]
    }
}

/// Threshold comparison applied to a measured angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    /// Strictly greater than
    Above(f64),
    /// Strictly less than
    Below(f64),
    /// Greater than or equal
    AtLeast(f64),
    /// Inclusive range
    Within { min: f64, max: f64 },
}

impl Comparison {
    pub fn holds(&self, degrees: f64) -> bool {
        match *self {
            Comparison::Above(limit) => degrees > limit,
            Comparison::Below(limit) => degrees < limit,
            Comparison::AtLeast(limit) => degrees >= limit,
            Comparison::Within { min, max } => degrees >= min && degrees <= max,
        }
    }
}

/// Condition on one joint angle, referenced by its index in [`ExerciseRules::joint_angles`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleCondition {
    pub angle: usize,
    pub comparison: Comparison,
}

impl AngleCondition {
    pub fn holds(&self, angles: &[f64]) -> bool {
        angles
            .get(self.angle)
            .map_or(false, |degrees| self.comparison.holds(*degrees))
    }
}

/// Stage entered when every condition holds
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub stage: Stage,
    pub conditions: Vec<AngleCondition>,
}

impl Transition {
    pub fn holds(&self, angles: &[f64]) -> bool {
        self.conditions.iter().all(|condition| condition.holds(angles))
    }
}

/// Single-frame predicate used by form checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    Angle(AngleCondition),
    /// `joint` is higher in the image than `reference` (smaller y)
    JointAbove { joint: Joint, reference: Joint },
}

impl Predicate {
    fn holds(&self, angles: &[f64], skeleton: &Skeleton) -> bool {
        match *self {
            Predicate::Angle(condition) => condition.holds(angles),
            Predicate::JointAbove { joint, reference } => {
                match (skeleton.get(joint), skeleton.get(reference)) {
                    (Some(joint), Some(reference)) => joint.y < reference.y,
                    _ => false,
                }
            }
        }
    }
}

/// Form error raised when every predicate holds
#[derive(Debug, Clone, PartialEq)]
pub struct FormCheck {
    pub flag: FormError,
    pub predicates: Vec<Predicate>,
}

impl FormCheck {
    pub fn holds(&self, angles: &[f64], skeleton: &Skeleton) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate.holds(angles, skeleton))
    }
}

/// Complete rule table of one exercise
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseRules {
    pub kind: ExerciseKind,
    pub joint_angles: Vec<JointAngle>,
    /// Entering this stage arms the rep
    pub start: Transition,
    /// Entering this stage from `start` completes a rep
    pub end: Transition,
    /// Must hold for either transition; empty means no gate
    pub gate: Vec<AngleCondition>,
    pub form_checks: Vec<FormCheck>,
}

fn both(left: usize, right: usize, comparison: Comparison) -> Vec<AngleCondition> {
    vec![
        AngleCondition {
            angle: left,
            comparison,
        },
        AngleCondition {
            angle: right,
            comparison,
        },
    ]
}

fn both_angles(left: usize, right: usize, comparison: Comparison) -> Vec<Predicate> {
    both(left, right, comparison)
        .into_iter()
        .map(Predicate::Angle)
        .collect()
}

const LEFT_ELBOW: JointAngle = JointAngle::new(
    "left_elbow",
    Joint::LeftShoulder,
    Joint::LeftElbow,
    Joint::LeftWrist,
);
const RIGHT_ELBOW: JointAngle = JointAngle::new(
    "right_elbow",
    Joint::RightShoulder,
    Joint::RightElbow,
    Joint::RightWrist,
);
const LEFT_SHOULDER: JointAngle = JointAngle::new(
    "left_shoulder",
    Joint::LeftHip,
    Joint::LeftShoulder,
    Joint::LeftElbow,
);
const RIGHT_SHOULDER: JointAngle = JointAngle::new(
    "right_shoulder",
    Joint::RightHip,
    Joint::RightShoulder,
    Joint::RightElbow,
);
const LEFT_HIP: JointAngle = JointAngle::new(
    "left_hip",
    Joint::LeftShoulder,
    Joint::LeftHip,
    Joint::LeftKnee,
);
const RIGHT_HIP: JointAngle = JointAngle::new(
    "right_hip",
    Joint::RightShoulder,
    Joint::RightHip,
    Joint::RightKnee,
);
const LEFT_KNEE: JointAngle = JointAngle::new(
    "left_knee",
    Joint::LeftHip,
    Joint::LeftKnee,
    Joint::LeftAnkle,
);
const RIGHT_KNEE: JointAngle = JointAngle::new(
    "right_knee",
    Joint::RightHip,
    Joint::RightKnee,
    Joint::RightAnkle,
);

impl ExerciseRules {
    pub fn for_exercise(kind: ExerciseKind, thresholds: &ExerciseThresholds) -> Self {
        match kind {
            ExerciseKind::BicepCurls => Self::bicep_curl(&thresholds.bicep_curl),
            ExerciseKind::LateralRaises => Self::lateral_raises(&thresholds.lateral_raises),
            ExerciseKind::ShoulderPress => Self::shoulder_press(&thresholds.shoulder_press),
            ExerciseKind::Crunches => Self::crunches(&thresholds.crunches),
        }
    }

    /// Elbows extended then fully flexed, upper arms kept against the torso
    pub fn bicep_curl(t: &BicepCurlThresholds) -> Self {
        // angles: 0/1 elbow flexion, 2/3 upper arm away from the torso
        Self {
            kind: ExerciseKind::BicepCurls,
            joint_angles: vec![LEFT_ELBOW, RIGHT_ELBOW, LEFT_SHOULDER, RIGHT_SHOULDER],
            start: Transition {
                stage: Stage::Down,
                conditions: both(0, 1, Comparison::Above(t.down_angle_min)),
            },
            end: Transition {
                stage: Stage::Up,
                conditions: both(0, 1, Comparison::Below(t.up_angle_max)),
            },
            gate: both(2, 3, Comparison::Below(t.torso_angle_max)),
            form_checks: vec![FormCheck {
                flag: FormError::HandsTooHigh,
                predicates: vec![
                    Predicate::JointAbove {
                        joint: Joint::LeftWrist,
                        reference: Joint::LeftShoulder,
                    },
                    Predicate::JointAbove {
                        joint: Joint::RightWrist,
                        reference: Joint::RightShoulder,
                    },
                ],
            }],
        }
    }

    /// Arms abducted from the resting band to above shoulder height
    pub fn lateral_raises(t: &LateralRaiseThresholds) -> Self {
        Self {
            kind: ExerciseKind::LateralRaises,
            joint_angles: vec![LEFT_SHOULDER, RIGHT_SHOULDER],
            start: Transition {
                stage: Stage::Lowered,
                conditions: both(
                    0,
                    1,
                    Comparison::Within {
                        min: t.lowered_angle_min,
                        max: t.lowered_angle_max,
                    },
                ),
            },
            end: Transition {
                stage: Stage::Raised,
                conditions: both(0, 1, Comparison::Above(t.raised_angle_min)),
            },
            gate: Vec::new(),
            form_checks: Vec::new(),
        }
    }

    /// Elbows bent at shoulder level then pressed overhead
    pub fn shoulder_press(t: &ShoulderPressThresholds) -> Self {
        Self {
            kind: ExerciseKind::ShoulderPress,
            joint_angles: vec![LEFT_ELBOW, RIGHT_ELBOW],
            start: Transition {
                stage: Stage::Lowered,
                conditions: both(
                    0,
                    1,
                    Comparison::Within {
                        min: t.lowered_angle_min,
                        max: t.lowered_angle_max,
                    },
                ),
            },
            end: Transition {
                stage: Stage::Pressing,
                conditions: both(0, 1, Comparison::Above(t.pressing_angle_min)),
            },
            gate: Vec::new(),
            form_checks: vec![FormCheck {
                flag: FormError::HandsTooLow,
                predicates: both_angles(0, 1, Comparison::Below(t.hands_too_low_angle_max)),
            }],
        }
    }

    /// Torso curled from lying flat towards the knees, knees kept bent
    pub fn crunches(t: &CrunchThresholds) -> Self {
        // angles: 0/1 hip flexion, 2/3 knee bend
        Self {
            kind: ExerciseKind::Crunches,
            joint_angles: vec![LEFT_HIP, RIGHT_HIP, LEFT_KNEE, RIGHT_KNEE],
            start: Transition {
                stage: Stage::Down,
                conditions: both(0, 1, Comparison::Above(t.down_angle_min)),
            },
            end: Transition {
                stage: Stage::Up,
                conditions: both(0, 1, Comparison::Below(t.up_angle_max)),
            },
            gate: Vec::new(),
            form_checks: vec![FormCheck {
                flag: FormError::IncorrectForm,
                predicates: both_angles(2, 3, Comparison::AtLeast(t.incorrect_form_angle_min)),
            }],
        }
    }

    /// Every joint a frame must contain to be evaluated
    pub fn required_joints(&self) -> Vec<Joint> {
        let mut joints: Vec<Joint> = self
            .joint_angles
            .iter()
            .flat_map(|joint_angle| joint_angle.joints())
            .chain(self.form_checks.iter().flat_map(|check| {
                check.predicates.iter().flat_map(|predicate| match *predicate {
                    Predicate::Angle(_) => Vec::new(),
                    Predicate::JointAbove { joint, reference } => vec![joint, reference],
                })
            }))
            .collect();
        joints.sort();
        joints.dedup();
        joints
    }

    pub fn gate_holds(&self, angles: &[f64]) -> bool {
        self.gate.iter().all(|condition| condition.holds(angles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_bounds() {
        assert!(Comparison::Above(140.0).holds(140.5));
        assert!(!Comparison::Above(140.0).holds(140.0));
        assert!(Comparison::Below(35.0).holds(34.9));
        assert!(!Comparison::Below(35.0).holds(35.0));
        assert!(Comparison::AtLeast(120.0).holds(120.0));

        let band = Comparison::Within { min: 95.0, max: 150.0 };
        assert!(band.holds(95.0));
        assert!(band.holds(150.0));
        assert!(!band.holds(150.1));
    }

    #[test]
    fn test_every_condition_references_a_joint_angle() {
        let thresholds = ExerciseThresholds::default();
        for kind in ExerciseKind::ALL {
            let rules = ExerciseRules::for_exercise(kind, &thresholds);
            let conditions = rules
                .start
                .conditions
                .iter()
                .chain(&rules.end.conditions)
                .chain(&rules.gate);
            for condition in conditions {
                assert!(condition.angle < rules.joint_angles.len(), "{:?}", kind);
            }
        }
    }

    #[test]
    fn test_required_joints_for_bicep_curl() {
        let rules = ExerciseRules::bicep_curl(&BicepCurlThresholds::default());
        let joints = rules.required_joints();

        assert_eq!(joints.len(), 8);
        assert!(joints.contains(&Joint::LeftHip));
        assert!(joints.contains(&Joint::RightWrist));
        assert!(!joints.contains(&Joint::Nose));
    }

    #[test]
    fn test_lateral_raises_has_no_gate_or_form_checks() {
        let rules = ExerciseRules::lateral_raises(&LateralRaiseThresholds::default());
        assert!(rules.gate_holds(&[]));
        assert!(rules.form_checks.is_empty());
    }
}

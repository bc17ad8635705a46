//! Repetition counting state machine
//!
//! One classifier instance lives for the duration of a session. It interprets
//! an [`ExerciseRules`] table frame by frame:
//! - absent or incomplete skeletons raise `NotInFrame` and leave state untouched
//! - the start transition arms a rep, the end transition completes it, but only
//!   when the previous stage is the start stage
//! - form checks are evaluated on every usable frame regardless of stage

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::geometry::angle_at;
use super::rules::ExerciseRules;
use crate::config::ExerciseThresholds;
use crate::models::{
    ClassifierOutput, ExerciseKind, FormError, Joint, MeasuredAngle, Skeleton, Stage,
};

pub struct RepClassifier {
    rules: ExerciseRules,
    required_joints: Vec<Joint>,
    stage: Option<Stage>,
    rep_count: u32,
}

impl RepClassifier {
    pub fn new(rules: ExerciseRules) -> Self {
        let required_joints = rules.required_joints();
        Self {
            rules,
            required_joints,
            stage: None,
            rep_count: 0,
        }
    }

    pub fn for_exercise(kind: ExerciseKind, thresholds: &ExerciseThresholds) -> Self {
        Self::new(ExerciseRules::for_exercise(kind, thresholds))
    }

    pub fn kind(&self) -> ExerciseKind {
        self.rules.kind
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Feed one frame's skeleton (`None` when no body was detected)
    pub fn observe(&mut self, skeleton: Option<&Skeleton>, now: DateTime<Utc>) -> ClassifierOutput {
        let Some(skeleton) = skeleton else {
            return self.not_in_frame();
        };

        let Some(angles) = self.measure(skeleton) else {
            debug!(
                exercise = %self.rules.kind,
                "Skeleton is missing required joints, treating frame as empty"
            );
            return self.not_in_frame();
        };

        let mut rep_count_delta = 0;

        if self.rules.gate_holds(&angles) {
            if self.rules.start.holds(&angles) {
                self.stage = Some(self.rules.start.stage);
            }

            if self.rules.end.holds(&angles) && self.stage == Some(self.rules.start.stage) {
                self.stage = Some(self.rules.end.stage);
                self.rep_count += 1;
                rep_count_delta = 1;
                info!(
                    exercise = %self.rules.kind,
                    at = %now.to_rfc3339(),
                    "Rep count: {}",
                    self.rep_count
                );
            }
        }

        let error_flags = self
            .rules
            .form_checks
            .iter()
            .filter(|check| check.holds(&angles, skeleton))
            .map(|check| check.flag)
            .collect();

        let angles = self
            .rules
            .joint_angles
            .iter()
            .zip(angles)
            .map(|(joint_angle, degrees)| MeasuredAngle {
                name: joint_angle.name,
                degrees,
            })
            .collect();

        ClassifierOutput {
            stage: self.stage,
            rep_count_delta,
            rep_count: self.rep_count,
            error_flags,
            angles,
        }
    }

    /// Start over for a new session
    pub fn reset(&mut self) {
        self.stage = None;
        self.rep_count = 0;
    }

    fn measure(&self, skeleton: &Skeleton) -> Option<Vec<f64>> {
        if !skeleton.has_joints(&self.required_joints) {
            return None;
        }

        self.rules
            .joint_angles
            .iter()
            .map(|joint_angle| {
                Some(angle_at(
                    skeleton.get(joint_angle.a)?,
                    skeleton.get(joint_angle.vertex)?,
                    skeleton.get(joint_angle.c)?,
                ))
            })
            .collect()
    }

    fn not_in_frame(&self) -> ClassifierOutput {
        ClassifierOutput {
            stage: self.stage,
            rep_count_delta: 0,
            rep_count: self.rep_count,
            error_flags: BTreeSet::from([FormError::NotInFrame]),
            angles: Vec::new(),
        }
    }
}

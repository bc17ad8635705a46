use anyhow::{bail, Result};

use super::app::env_or;

/// Bicep curl thresholds (degrees)
#[derive(Debug, Clone, PartialEq)]
pub struct BicepCurlThresholds {
    pub down_angle_min: f64,
    pub up_angle_max: f64,
    pub torso_angle_max: f64,
}

impl Default for BicepCurlThresholds {
    fn default() -> Self {
        Self {
            down_angle_min: 140.0,
            up_angle_max: 35.0,
            torso_angle_max: 45.0,
        }
    }
}

/// Lateral raise thresholds (degrees)
#[derive(Debug, Clone, PartialEq)]
pub struct LateralRaiseThresholds {
    pub raised_angle_min: f64,
    pub lowered_angle_min: f64,
    pub lowered_angle_max: f64,
}

impl Default for LateralRaiseThresholds {
    fn default() -> Self {
        Self {
            raised_angle_min: 100.0,
            lowered_angle_min: 50.0,
            lowered_angle_max: 75.0,
        }
    }
}

/// Shoulder press thresholds (degrees)
#[derive(Debug, Clone, PartialEq)]
pub struct ShoulderPressThresholds {
    pub pressing_angle_min: f64,
    pub lowered_angle_min: f64,
    pub lowered_angle_max: f64,
    pub hands_too_low_angle_max: f64,
}

impl Default for ShoulderPressThresholds {
    fn default() -> Self {
        Self {
            pressing_angle_min: 150.0,
            lowered_angle_min: 95.0,
            lowered_angle_max: 150.0,
            hands_too_low_angle_max: 80.0,
        }
    }
}

/// Crunch thresholds (degrees)
#[derive(Debug, Clone, PartialEq)]
pub struct CrunchThresholds {
    pub up_angle_max: f64,
    pub down_angle_min: f64,
    pub incorrect_form_angle_min: f64,
}

impl Default for CrunchThresholds {
    fn default() -> Self {
        Self {
            up_angle_max: 90.0,
            down_angle_min: 100.0,
            incorrect_form_angle_min: 120.0,
        }
    }
}

/// Angle thresholds for every supported exercise
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseThresholds {
    pub bicep_curl: BicepCurlThresholds,
    pub lateral_raises: LateralRaiseThresholds,
    pub shoulder_press: ShoulderPressThresholds,
    pub crunches: CrunchThresholds,
}

impl ExerciseThresholds {
    /// Read thresholds from the environment, falling back to the defaults
    pub fn from_env() -> Result<Self> {
        let bicep = BicepCurlThresholds::default();
        let lateral = LateralRaiseThresholds::default();
        let press = ShoulderPressThresholds::default();
        let crunch = CrunchThresholds::default();

        let thresholds = Self {
            bicep_curl: BicepCurlThresholds {
                down_angle_min: env_or("BICEP_DOWN_ANGLE_MIN", bicep.down_angle_min)?,
                up_angle_max: env_or("BICEP_UP_ANGLE_MAX", bicep.up_angle_max)?,
                torso_angle_max: env_or("BICEP_TORSO_ANGLE_MAX", bicep.torso_angle_max)?,
            },
            lateral_raises: LateralRaiseThresholds {
                raised_angle_min: env_or("LATERAL_RAISED_ANGLE_MIN", lateral.raised_angle_min)?,
                lowered_angle_min: env_or("LATERAL_LOWERED_ANGLE_MIN", lateral.lowered_angle_min)?,
                lowered_angle_max: env_or("LATERAL_LOWERED_ANGLE_MAX", lateral.lowered_angle_max)?,
            },
            shoulder_press: ShoulderPressThresholds {
                pressing_angle_min: env_or("PRESS_PRESSING_ANGLE_MIN", press.pressing_angle_min)?,
                lowered_angle_min: env_or("PRESS_LOWERED_ANGLE_MIN", press.lowered_angle_min)?,
                lowered_angle_max: env_or("PRESS_LOWERED_ANGLE_MAX", press.lowered_angle_max)?,
                hands_too_low_angle_max: env_or(
                    "PRESS_HANDS_TOO_LOW_ANGLE_MAX",
                    press.hands_too_low_angle_max,
                )?,
            },
            crunches: CrunchThresholds {
                up_angle_max: env_or("CRUNCH_UP_ANGLE_MAX", crunch.up_angle_max)?,
                down_angle_min: env_or("CRUNCH_DOWN_ANGLE_MIN", crunch.down_angle_min)?,
                incorrect_form_angle_min: env_or(
                    "CRUNCH_INCORRECT_FORM_ANGLE_MIN",
                    crunch.incorrect_form_angle_min,
                )?,
            },
        };

        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Reject start and end bands that overlap, since a single angle could then
    /// satisfy both stages of a rep
    pub fn validate(&self) -> Result<()> {
        let bicep = &self.bicep_curl;
        if bicep.up_angle_max > bicep.down_angle_min {
            bail!(
                "Bicep curl bands overlap: up_angle_max {} exceeds down_angle_min {}",
                bicep.up_angle_max,
                bicep.down_angle_min
            );
        }

        let lateral = &self.lateral_raises;
        if lateral.lowered_angle_min > lateral.lowered_angle_max {
            bail!(
                "Lateral raise lowered band is empty: {} > {}",
                lateral.lowered_angle_min,
                lateral.lowered_angle_max
            );
        }
        if lateral.lowered_angle_max > lateral.raised_angle_min {
            bail!(
                "Lateral raise bands overlap: lowered_angle_max {} exceeds raised_angle_min {}",
                lateral.lowered_angle_max,
                lateral.raised_angle_min
            );
        }

        let press = &self.shoulder_press;
        if press.lowered_angle_min > press.lowered_angle_max {
            bail!(
                "Shoulder press lowered band is empty: {} > {}",
                press.lowered_angle_min,
                press.lowered_angle_max
            );
        }
        if press.lowered_angle_max > press.pressing_angle_min {
            bail!(
                "Shoulder press bands overlap: lowered_angle_max {} exceeds pressing_angle_min {}",
                press.lowered_angle_max,
                press.pressing_angle_min
            );
        }

        let crunch = &self.crunches;
        if crunch.up_angle_max > crunch.down_angle_min {
            bail!(
                "Crunch bands overlap: up_angle_max {} exceeds down_angle_min {}",
                crunch.up_angle_max,
                crunch.down_angle_min
            );
        }

        Ok(())
    }
}

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::config::AlertConfig;
use crate::models::FormError;

const DEFAULT_COOLDOWN_SECS: i64 = 5;
const DEFAULT_DISPLAY_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ThrottleEntry {
    last_triggered_at: DateTime<Utc>,
    active_until: DateTime<Utc>,
}

/// Decides when a form error may re-trigger its alert and how long the alert
/// stays on screen. Every flag kind has its own timer.
#[derive(Debug, Clone)]
pub struct AlertThrottle {
    cooldown: Duration,
    display_duration: Duration,
    entries: HashMap<FormError, ThrottleEntry>,
}

impl AlertThrottle {
    pub fn new(cooldown: Duration, display_duration: Duration) -> Self {
        Self {
            cooldown,
            display_duration,
            entries: HashMap::new(),
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(config.cooldown(), config.display_duration())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn display_duration(&self) -> Duration {
        self.display_duration
    }

    /// Returns true and starts a new display window when `flag` is out of its
    /// cooldown (or has never triggered).
    pub fn should_trigger(&mut self, flag: FormError, now: DateTime<Utc>) -> bool {
        if self.is_in_cooldown(flag, now) {
            tracing::trace!("Alert {:?} is in cooldown", flag);
            return false;
        }

        self.entries.insert(
            flag,
            ThrottleEntry {
                last_triggered_at: now,
                active_until: now + self.display_duration,
            },
        );
        true
    }

    /// Whether the alert for `flag` is inside its display window, whether or
    /// not the condition still holds.
    pub fn is_active(&self, flag: FormError, now: DateTime<Utc>) -> bool {
        self.entries
            .get(&flag)
            .map_or(false, |entry| now <= entry.active_until)
    }

    /// Flags currently on screen, in a stable order
    pub fn active_flags(&self, now: DateTime<Utc>) -> Vec<FormError> {
        let mut active: Vec<FormError> = self
            .entries
            .iter()
            .filter(|(_, entry)| now <= entry.active_until)
            .map(|(flag, _)| *flag)
            .collect();
        active.sort();
        active
    }

    pub fn last_triggered_at(&self, flag: FormError) -> Option<DateTime<Utc>> {
        self.entries.get(&flag).map(|entry| entry.last_triggered_at)
    }

    fn is_in_cooldown(&self, flag: FormError, now: DateTime<Utc>) -> bool {
        self.entries
            .get(&flag)
            .map_or(false, |entry| now - entry.last_triggered_at <= self.cooldown)
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_COOLDOWN_SECS),
            Duration::seconds(DEFAULT_DISPLAY_SECS),
        )
    }
}

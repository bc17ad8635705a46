use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use uuid::Uuid;

use super::exercise::{ExerciseKind, Stage};

/// Progress of a running session, written by the frame loop and read by the
/// control layer. Readers see the state of the last fully processed frame.
#[derive(Debug)]
pub struct SessionStats {
    rep_count: AtomicU32,
    frames_processed: AtomicU64,
    running: AtomicBool,
    stage: RwLock<Option<Stage>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            rep_count: AtomicU32::new(0),
            frames_processed: AtomicU64::new(0),
            running: AtomicBool::new(true),
            stage: RwLock::new(None),
        }
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count.load(Ordering::Acquire)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stage(&self) -> Option<Stage> {
        *self.stage.read()
    }

    /// Publish the outcome of one processed frame
    pub fn record_frame(&self, rep_count: u32, stage: Option<Stage>) {
        *self.stage.write() = stage;
        self.rep_count.store(rep_count, Ordering::Release);
        self.frames_processed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot returned by the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub active_exercise: Option<ExerciseKind>,
    pub running: bool,
    pub rep_count: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub stage: Option<Stage>,
    pub frames_processed: u64,
}

impl SessionStatus {
    pub fn idle(rep_count: u32) -> Self {
        Self {
            active_exercise: None,
            running: false,
            rep_count,
            start_time: None,
            stage: None,
            frames_processed: 0,
        }
    }
}

/// Final numbers of a stopped session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSummary {
    pub session_id: Uuid,
    pub exercise: ExerciseKind,
    pub final_rep_count: u32,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
}

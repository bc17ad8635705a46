//! Single active exercise session
//!
//! The manager owns at most one running session process-wide. Starting a
//! session while another one runs, is being opened, or is still stopping is
//! rejected, never queued. Each session runs its [`FrameLoop`] on a dedicated
//! blocking worker and is stopped cooperatively through a cancellation token;
//! a stop returns only once that worker has released the capture device.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::alert_dispatcher::AlertSender;
use super::alert_throttle::AlertThrottle;
use super::classifier::RepClassifier;
use super::frame_loop::{FrameLoop, LoopExit};
use super::pipeline::{CaptureBackend, CaptureError};
use crate::config::AppConfig;
use crate::models::{ExerciseKind, SessionStats, SessionStatus, StopSummary};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Another exercise is already running: {active}")]
    AlreadyRunning { active: ExerciseKind },
    #[error("No exercise is currently running")]
    NotRunning,
    #[error("Failed to open capture: {0}")]
    Capture(#[from] CaptureError),
}

/// Caller's view of a started session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub exercise: ExerciseKind,
    pub started_at: DateTime<Utc>,
    stats: Arc<SessionStats>,
}

impl SessionHandle {
    pub fn rep_count(&self) -> u32 {
        self.stats.rep_count()
    }

    pub fn is_running(&self) -> bool {
        self.stats.is_running()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

struct ActiveSession {
    handle: SessionHandle,
    cancel: CancellationToken,
    /// Taken by the stop that is waiting for the worker
    worker: Option<JoinHandle<LoopExit>>,
}

#[derive(Default)]
struct ManagerState {
    active: Option<ActiveSession>,
    /// Exercise whose capture is being opened
    starting: Option<ExerciseKind>,
    last_rep_count: u32,
}

/// Clears the start reservation however `try_start` returns
struct StartReservation<'a> {
    state: &'a Mutex<ManagerState>,
}

impl Drop for StartReservation<'_> {
    fn drop(&mut self) {
        self.state.lock().starting = None;
    }
}

pub struct SessionManager {
    config: Arc<AppConfig>,
    backend: Arc<dyn CaptureBackend>,
    alerts: AlertSender,
    state: Mutex<ManagerState>,
}

impl SessionManager {
    pub fn new(config: Arc<AppConfig>, backend: Arc<dyn CaptureBackend>, alerts: AlertSender) -> Self {
        Self {
            config,
            backend,
            alerts,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Start `kind` unless a session is already running.
    ///
    /// Blocks while the capture device opens, so async callers should run it
    /// on the blocking pool. Must be called from within a Tokio runtime.
    pub fn try_start(&self, kind: ExerciseKind) -> Result<SessionHandle, SessionError> {
        {
            let mut state = self.state.lock();

            if let Some(opening) = state.starting {
                warn!("Exercise {} is still starting", opening);
                return Err(SessionError::AlreadyRunning { active: opening });
            }

            if let Some(active) = &state.active {
                if active.handle.is_running() {
                    warn!("Exercise {} is already running", active.handle.exercise);
                    return Err(SessionError::AlreadyRunning {
                        active: active.handle.exercise,
                    });
                }
            }

            if let Some(finished) = state.active.take() {
                debug!("Reaping finished {} session", finished.handle.exercise);
                state.last_rep_count = finished.handle.rep_count();
            }

            state.starting = Some(kind);
        }
        let _reservation = StartReservation { state: &self.state };

        let pose = &self.config.pose;
        let pipeline = self.backend.open(pose).map_err(|e| {
            error!("Could not open camera {}: {}", pose.camera_index, e);
            e
        })?;

        let stats = Arc::new(SessionStats::new());
        let frame_loop = FrameLoop::new(
            pipeline,
            RepClassifier::for_exercise(kind, &self.config.thresholds),
            AlertThrottle::from_config(&self.config.alerts),
            self.alerts.clone(),
            stats.clone(),
        );

        let cancel = CancellationToken::new();
        let worker = tokio::task::spawn_blocking({
            let cancel = cancel.clone();
            move || frame_loop.run(cancel)
        });

        let handle = SessionHandle {
            id: Uuid::new_v4(),
            exercise: kind,
            started_at: Utc::now(),
            stats,
        };

        info!("Started exercise: {} (session {})", kind, handle.id);

        let mut state = self.state.lock();
        state.last_rep_count = 0;
        state.active = Some(ActiveSession {
            handle: handle.clone(),
            cancel,
            worker: Some(worker),
        });

        Ok(handle)
    }

    /// Stop the session identified by `handle`
    pub async fn stop(&self, handle: &SessionHandle) -> Result<StopSummary, SessionError> {
        let is_current = self
            .state
            .lock()
            .active
            .as_ref()
            .map_or(false, |active| active.handle.id == handle.id);

        if !is_current {
            return Err(SessionError::NotRunning);
        }
        self.stop_active().await
    }

    /// Stop whatever session is running and wait for its worker to finish
    /// the frame it is on. The session keeps its slot until then, so no
    /// other session can open the capture device in the meantime.
    pub async fn stop_active(&self) -> Result<StopSummary, SessionError> {
        let (handle, worker) = {
            let mut state = self.state.lock();

            let running = match &state.active {
                Some(active) => active.handle.is_running(),
                None => return Err(SessionError::NotRunning),
            };

            if !running {
                if let Some(finished) = state.active.take() {
                    debug!("Session {} had already ended", finished.handle.id);
                    state.last_rep_count = finished.handle.rep_count();
                }
                return Err(SessionError::NotRunning);
            }

            let active = state.active.as_mut().ok_or(SessionError::NotRunning)?;
            let Some(worker) = active.worker.take() else {
                debug!("Session {} is already stopping", active.handle.id);
                return Err(SessionError::NotRunning);
            };
            active.cancel.cancel();
            (active.handle.clone(), worker)
        };

        match worker.await {
            Ok(exit) => debug!("Session {} worker exited: {:?}", handle.id, exit),
            Err(e) => error!("Session worker failed: {}", e),
        }

        let final_rep_count = handle.rep_count();
        {
            let mut state = self.state.lock();
            let is_current = state
                .active
                .as_ref()
                .map_or(false, |active| active.handle.id == handle.id);
            if is_current {
                state.active = None;
                state.last_rep_count = final_rep_count;
            }
        }

        info!("Stopped exercise: {}", handle.exercise);

        Ok(StopSummary {
            session_id: handle.id,
            exercise: handle.exercise,
            final_rep_count,
            started_at: handle.started_at,
            stopped_at: Utc::now(),
        })
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state.lock();

        match &state.active {
            Some(active) => {
                let stats = active.handle.stats();
                SessionStatus {
                    active_exercise: Some(active.handle.exercise),
                    running: stats.is_running(),
                    rep_count: stats.rep_count(),
                    start_time: Some(active.handle.started_at),
                    stage: stats.stage(),
                    frames_processed: stats.frames_processed(),
                }
            }
            None => SessionStatus::idle(state.last_rep_count),
        }
    }

    /// Cancel the active session, if any, and wait for its worker to exit
    pub async fn shutdown(&self) -> Option<LoopExit> {
        let (id, worker) = {
            let mut state = self.state.lock();
            let active = state.active.as_mut()?;
            active.cancel.cancel();
            (active.handle.id, active.worker.take()?)
        };

        let exit = match worker.await {
            Ok(exit) => {
                info!("Session {} shut down: {:?}", id, exit);
                Some(exit)
            }
            Err(e) => {
                error!("Session worker failed: {}", e);
                None
            }
        };

        let mut state = self.state.lock();
        if let Some(active) = state.active.take() {
            state.last_rep_count = active.handle.rep_count();
        }
        exit
    }
}

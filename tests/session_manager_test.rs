mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rep_counter::config::AppConfig;
use rep_counter::models::{ExerciseKind, Stage};
use rep_counter::services::{
    AlertSender, CaptureBackend, CaptureError, LoopExit, ReplayBackend, SessionError,
    SessionManager, SkeletonRecording,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{bicep_pose, wait_until, LoopingBackend};

fn manager(backend: impl CaptureBackend + 'static) -> SessionManager {
    let (alerts, _rx) = AlertSender::channel(16);
    SessionManager::new(Arc::new(AppConfig::default()), Arc::new(backend), alerts)
}

fn curling() -> LoopingBackend {
    LoopingBackend::new(vec![Some(bicep_pose(170.0)), Some(bicep_pose(20.0))])
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_and_count() {
    let sessions = manager(curling());

    let handle = sessions.try_start(ExerciseKind::BicepCurls).unwrap();
    assert_eq!(handle.exercise, ExerciseKind::BicepCurls);

    assert!(wait_until(2000, || handle.rep_count() >= 2).await);

    let status = sessions.status();
    assert_eq!(status.active_exercise, Some(ExerciseKind::BicepCurls));
    assert!(status.running);
    assert!(status.rep_count >= 2);
    assert_eq!(status.start_time, Some(handle.started_at));
    assert!(status.frames_processed > 0);

    sessions.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejects_second_session() {
    let sessions = manager(curling());
    sessions.try_start(ExerciseKind::BicepCurls).unwrap();

    let same = sessions.try_start(ExerciseKind::BicepCurls);
    assert_matches!(
        same,
        Err(SessionError::AlreadyRunning {
            active: ExerciseKind::BicepCurls
        })
    );

    let other = sessions.try_start(ExerciseKind::Crunches);
    assert_matches!(
        other,
        Err(SessionError::AlreadyRunning {
            active: ExerciseKind::BicepCurls
        })
    );

    assert_eq!(
        sessions.status().active_exercise,
        Some(ExerciseKind::BicepCurls)
    );
    sessions.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_reports_final_count() {
    let sessions = manager(curling());
    let handle = sessions.try_start(ExerciseKind::BicepCurls).unwrap();
    assert!(wait_until(2000, || handle.rep_count() >= 1).await);

    let summary = sessions.stop_active().await.unwrap();
    assert_eq!(summary.session_id, handle.id);
    assert_eq!(summary.exercise, ExerciseKind::BicepCurls);
    assert!(summary.final_rep_count >= 1);
    assert!(summary.stopped_at >= summary.started_at);

    // Stop returns once the worker has finished its last frame
    assert!(!handle.is_running());
    assert_eq!(handle.rep_count(), summary.final_rep_count);

    let status = sessions.status();
    assert_eq!(status.active_exercise, None);
    assert!(!status.running);
    assert_eq!(status.rep_count, summary.final_rep_count);
    assert_eq!(status.stage, None);

    assert_matches!(sessions.stop_active().await, Err(SessionError::NotRunning));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_without_session() {
    let sessions = manager(curling());

    assert_matches!(sessions.stop_active().await, Err(SessionError::NotRunning));

    let status = sessions.status();
    assert_eq!(status.active_exercise, None);
    assert!(!status.running);
    assert_eq!(status.rep_count, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_with_stale_handle() {
    let sessions = manager(curling());
    let first = sessions.try_start(ExerciseKind::BicepCurls).unwrap();
    sessions.stop(&first).await.unwrap();

    let second = sessions.try_start(ExerciseKind::ShoulderPress).unwrap();
    assert_matches!(sessions.stop(&first).await, Err(SessionError::NotRunning));
    assert!(second.is_running());

    sessions.stop(&second).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_camera_unavailable() {
    let sessions = manager(ReplayBackend::new(None, 30));

    let result = sessions.try_start(ExerciseKind::LateralRaises);
    assert_matches!(
        result,
        Err(SessionError::Capture(CaptureError::CameraUnavailable(0)))
    );

    let status = sessions.status();
    assert_eq!(status.active_exercise, None);
    assert!(!status.running);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_finished_session_is_replaced() {
    let recording = SkeletonRecording::from_frames(vec![
        Some(bicep_pose(170.0)),
        Some(bicep_pose(20.0)),
        None,
    ]);
    let sessions = manager(ReplayBackend::unpaced(recording));

    let handle = sessions.try_start(ExerciseKind::BicepCurls).unwrap();
    assert!(wait_until(2000, || !handle.is_running()).await);

    let status = sessions.status();
    assert_eq!(status.active_exercise, Some(ExerciseKind::BicepCurls));
    assert!(!status.running);
    assert_eq!(status.rep_count, 1);
    assert_eq!(status.stage, Some(Stage::Up));
    assert_eq!(status.frames_processed, 3);

    // Nothing left to stop
    assert_matches!(sessions.stop_active().await, Err(SessionError::NotRunning));

    let next = sessions.try_start(ExerciseKind::Crunches).unwrap();
    assert_eq!(next.exercise, ExerciseKind::Crunches);
    assert_eq!(sessions.status().active_exercise, Some(ExerciseKind::Crunches));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_cancels_session() {
    let sessions = manager(curling());
    let handle = sessions.try_start(ExerciseKind::BicepCurls).unwrap();

    let exit = sessions.shutdown().await;

    assert_eq!(exit, Some(LoopExit::Cancelled));
    assert!(!handle.is_running());
    assert_eq!(sessions.shutdown().await, None);
}

fn slow_curling() -> LoopingBackend {
    curling().with_frame_interval(500)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restart_after_stop_never_shares_camera() {
    let backend = slow_curling();
    let devices = backend.devices();
    let sessions = manager(backend);

    sessions.try_start(ExerciseKind::BicepCurls).unwrap();
    assert!(wait_until(2000, || sessions.status().frames_processed >= 1).await);

    sessions.stop_active().await.unwrap();
    assert_eq!(devices.open_now(), 0);

    sessions.try_start(ExerciseKind::Crunches).unwrap();
    assert_eq!(devices.max_open(), 1);

    sessions.shutdown().await;
    assert_eq!(devices.open_now(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_rejected_while_stopping() {
    let sessions = Arc::new(manager(slow_curling()));
    sessions.try_start(ExerciseKind::BicepCurls).unwrap();
    // The worker has just finished a frame and waits a full interval for the next
    assert!(wait_until(2000, || sessions.status().frames_processed >= 1).await);

    let stopping = tokio::spawn({
        let sessions = sessions.clone();
        async move { sessions.stop_active().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_matches!(
        sessions.try_start(ExerciseKind::Crunches),
        Err(SessionError::AlreadyRunning {
            active: ExerciseKind::BicepCurls
        })
    );
    // A second stop does not wait on the same worker
    assert_matches!(sessions.stop_active().await, Err(SessionError::NotRunning));

    let summary = stopping.await.unwrap().unwrap();
    assert_eq!(summary.exercise, ExerciseKind::BicepCurls);
    assert!(sessions.try_start(ExerciseKind::Crunches).is_ok());
    sessions.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_rejected_while_camera_opens() {
    let sessions = Arc::new(manager(curling().with_open_delay(300)));

    let opening = tokio::task::spawn_blocking({
        let sessions = sessions.clone();
        move || sessions.try_start(ExerciseKind::LateralRaises)
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Status does not wait for the camera
    let asked = Instant::now();
    let status = sessions.status();
    assert!(asked.elapsed() < Duration::from_millis(100));
    assert_eq!(status.active_exercise, None);

    assert_matches!(
        sessions.try_start(ExerciseKind::ShoulderPress),
        Err(SessionError::AlreadyRunning {
            active: ExerciseKind::LateralRaises
        })
    );

    let handle = opening.await.unwrap().unwrap();
    assert_eq!(handle.exercise, ExerciseKind::LateralRaises);
    sessions.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_open_releases_reservation() {
    let sessions = manager(ReplayBackend::new(None, 30));

    assert!(sessions.try_start(ExerciseKind::Crunches).is_err());
    assert_matches!(
        sessions.try_start(ExerciseKind::Crunches),
        Err(SessionError::Capture(_))
    );
}

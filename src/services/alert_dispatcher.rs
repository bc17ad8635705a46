//! Alert playback queue
//!
//! The frame loop never plays sounds itself. It pushes an [`AlertEvent`] onto
//! a bounded queue without blocking, and a separate worker hands each event to
//! the [`AudioPlayer`] on the blocking pool. Playback failures are logged and
//! otherwise ignored.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{ExerciseKind, FormError, SoundId};

/// Request to play the cue of a freshly triggered alert
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub exercise: ExerciseKind,
    pub flag: FormError,
    pub sound: SoundId,
    pub triggered_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(exercise: ExerciseKind, flag: FormError, triggered_at: DateTime<Utc>) -> Self {
        Self {
            exercise,
            flag,
            sound: flag.sound(),
            triggered_at,
        }
    }
}

/// Plays a sound cue. Called from the blocking pool.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, sound: SoundId) -> Result<()>;
}

/// Sound files found on disk
#[derive(Debug, Clone, Default)]
pub struct SoundAssets {
    paths: HashMap<SoundId, PathBuf>,
}

impl SoundAssets {
    /// Directories searched after the configured one
    const FALLBACK_DIRS: [&'static str; 3] = ["static/audio", "audio", "lib/static/audio"];

    /// Locate every sound cue, trying `audio_dir` first. Missing cues are
    /// reported once here and then stay silent.
    pub fn discover(audio_dir: &Path) -> Self {
        let search: Vec<PathBuf> = std::iter::once(audio_dir.to_path_buf())
            .chain(Self::FALLBACK_DIRS.iter().map(PathBuf::from))
            .collect();

        let mut paths = HashMap::new();
        for sound in SoundId::ALL {
            match search
                .iter()
                .map(|dir| dir.join(sound.file_name()))
                .find(|candidate| candidate.is_file())
            {
                Some(path) => {
                    debug!("Found sound {:?} at {}", sound, path.display());
                    paths.insert(sound, path);
                }
                None => warn!(
                    "Could not find {} under {}. Audio feedback for {:?} will be disabled.",
                    sound.file_name(),
                    audio_dir.display(),
                    sound
                ),
            }
        }

        Self { paths }
    }

    pub fn path(&self, sound: SoundId) -> Option<&Path> {
        self.paths.get(&sound).map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Player that logs the cue it would play
#[derive(Debug, Clone, Default)]
pub struct TracingAudioPlayer {
    assets: SoundAssets,
}

impl TracingAudioPlayer {
    pub fn new(assets: SoundAssets) -> Self {
        Self { assets }
    }
}

impl AudioPlayer for TracingAudioPlayer {
    fn play(&self, sound: SoundId) -> Result<()> {
        let path = self
            .assets
            .path(sound)
            .ok_or_else(|| anyhow!("no sound file for {:?}", sound))?;
        info!("Playing {}", path.display());
        Ok(())
    }
}

/// Cloneable, non-blocking handle used by frame loops to queue alerts
#[derive(Debug, Clone)]
pub struct AlertSender {
    tx: mpsc::Sender<AlertEvent>,
}

impl AlertSender {
    /// Bare channel, for callers that consume events themselves
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AlertEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue an alert. Returns false when it was dropped.
    pub fn emit(&self, event: AlertEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!("Alert queue full, dropping {:?} cue", event.flag);
                false
            }
            Err(TrySendError::Closed(event)) => {
                debug!("Alert worker gone, dropping {:?} cue", event.flag);
                false
            }
        }
    }
}

/// Background worker draining the alert queue
pub struct AlertDispatcher;

impl AlertDispatcher {
    /// Spawn the playback worker on the current runtime
    pub fn spawn(player: Arc<dyn AudioPlayer>, capacity: usize) -> (AlertSender, JoinHandle<()>) {
        let (sender, rx) = AlertSender::channel(capacity);
        let handle = tokio::spawn(Self::run(rx, player));
        info!("Alert dispatcher started");
        (sender, handle)
    }

    async fn run(mut rx: mpsc::Receiver<AlertEvent>, player: Arc<dyn AudioPlayer>) {
        while let Some(event) = rx.recv().await {
            let player = player.clone();
            let sound = event.sound;
            match tokio::task::spawn_blocking(move || player.play(sound)).await {
                Ok(Ok(())) => debug!("Played {:?} for {:?}", sound, event.flag),
                Ok(Err(e)) => debug!("Error playing audio: {}", e),
                Err(e) => warn!("Audio playback task failed: {}", e),
            }
        }
        debug!("Alert dispatcher stopped");
    }
}

mod audio;
mod controller;
mod dummy;
mod selector;

use crate::catalog::Track;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use audio::RodioAudioEngine;
pub use controller::PlaybackController;
pub use dummy::{DummyAudioEngine, EngineCall};
pub use selector::PlaybackSelector;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("track not found: {0}")]
    TrackMissing(Track),

    #[error("failed to load {track}: {details}")]
    TrackLoad { track: Track, details: String },

    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },

    #[error("no tracks available")]
    EmptyCatalog,
}

/// Audio backend primitives. `load` stages a track without disturbing the one
/// currently audible; `play` swaps the staged track in.
pub trait AudioEngine {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError>;
    fn play(&mut self);
    fn stop(&mut self);
    fn pause(&mut self);
    fn unpause(&mut self);
    fn is_busy(&self) -> bool;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
}

/// Resolves catalog tracks to files that exist.
pub trait TrackStore {
    fn locate(&self, track: &Track) -> Option<PathBuf>;
}

#[derive(Clone, Debug)]
pub struct DirTrackStore {
    root: PathBuf,
}

impl DirTrackStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TrackStore for DirTrackStore {
    fn locate(&self, track: &Track) -> Option<PathBuf> {
        let path = self.root.join(track.path());
        path.is_file().then_some(path)
    }
}

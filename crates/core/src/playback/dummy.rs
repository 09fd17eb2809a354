use crate::playback::{AudioEngine, PlaybackError};
use crate::catalog::Track;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub enum EngineCall {
    Load(PathBuf),
    Play,
    Stop,
    Pause,
    Unpause,
    SetVolume(f32),
}

/// Silent engine that only records what it was asked to do.
#[derive(Clone, Debug)]
pub struct DummyAudioEngine {
    calls: Vec<EngineCall>,
    failing: HashSet<PathBuf>,
    staged: Option<PathBuf>,
    current: Option<PathBuf>,
    paused: bool,
    volume: f32,
}

impl DummyAudioEngine {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            failing: HashSet::new(),
            staged: None,
            current: None,
            paused: false,
            volume: 1.0,
        }
    }

    /// Makes `load` fail for `path`.
    pub fn failing_on<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.failing.insert(path.into());
        self
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn play_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == EngineCall::Play).count()
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

impl Default for DummyAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for DummyAudioEngine {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.calls.push(EngineCall::Load(path.to_path_buf()));
        if self.failing.contains(path) {
            return Err(PlaybackError::TrackLoad {
                track: Track::new(path),
                details: "rejected by dummy engine".to_owned(),
            });
        }
        self.staged = Some(path.to_path_buf());
        Ok(())
    }

    fn play(&mut self) {
        self.calls.push(EngineCall::Play);
        if let Some(staged) = self.staged.take() {
            self.current = Some(staged);
        }
        self.paused = false;
    }

    fn stop(&mut self) {
        self.calls.push(EngineCall::Stop);
        self.current = None;
        self.paused = false;
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
        self.paused = true;
    }

    fn unpause(&mut self) {
        self.calls.push(EngineCall::Unpause);
        self.paused = false;
    }

    fn is_busy(&self) -> bool {
        self.current.is_some() && !self.paused
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(EngineCall::SetVolume(volume));
        self.volume = volume;
    }
}

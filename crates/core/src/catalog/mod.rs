use crate::emotion::Emotion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_SONGS_DIR: &str = "songs";

/// An audio file, addressed relative to the music root.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Track(PathBuf);

impl Track {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Short name for status lines: `songs/songshappy1.mp3` becomes `happy1`.
    pub fn display_name(&self) -> String {
        let stem = self
            .0
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.to_string_lossy().into_owned());
        stem.replace("songs", "")
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for Track {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("no tracks listed for emotion: {0}")]
    MissingEmotion(Emotion),

    #[error("catalog file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog json invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Emotion to track mapping plus the flat, de-duplicated track list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongCatalog {
    by_emotion: BTreeMap<Emotion, Vec<Track>>,
    flat: Vec<Track>,
}

impl SongCatalog {
    /// Builds a catalog; every active emotion needs at least one track.
    pub fn new(by_emotion: BTreeMap<Emotion, Vec<Track>>) -> Result<Self, CatalogError> {
        for emotion in Emotion::ACTIVE {
            if by_emotion.get(&emotion).map_or(true, Vec::is_empty) {
                return Err(CatalogError::MissingEmotion(emotion));
            }
        }

        let mut flat: Vec<Track> = Vec::new();
        for emotion in Emotion::ALL {
            for track in by_emotion.get(&emotion).into_iter().flatten() {
                if !flat.contains(track) {
                    flat.push(track.clone());
                }
            }
        }

        Ok(Self { by_emotion, flat })
    }

    /// One `songs<emotion>1.mp3` per emotion under `dir`.
    pub fn builtin_in<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let by_emotion: BTreeMap<Emotion, Vec<Track>> = Emotion::ALL
            .into_iter()
            .map(|e| (e, vec![Track::new(dir.join(format!("songs{}1.mp3", e.as_str())))]))
            .collect();
        let flat = Emotion::ALL
            .into_iter()
            .filter_map(|e| by_emotion.get(&e).and_then(|t| t.first().cloned()))
            .collect();
        Self { by_emotion, flat }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let by_emotion: BTreeMap<Emotion, Vec<Track>> = serde_json::from_str(json)?;
        Self::new(by_emotion)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn tracks_for(&self, emotion: Emotion) -> &[Track] {
        self.by_emotion
            .get(&emotion)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First listed track of `emotion`.
    pub fn canonical(&self, emotion: Emotion) -> Option<&Track> {
        self.tracks_for(emotion).first()
    }

    pub fn flat(&self) -> &[Track] {
        &self.flat
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.flat.contains(track)
    }

    /// Tracks whose files are absent under `root`.
    pub fn missing_under<P: AsRef<Path>>(&self, root: P) -> Vec<&Track> {
        let root = root.as_ref();
        self.flat
            .iter()
            .filter(|t| !root.join(t.path()).is_file())
            .collect()
    }
}

impl Default for SongCatalog {
    fn default() -> Self {
        Self::builtin_in(DEFAULT_SONGS_DIR)
    }
}

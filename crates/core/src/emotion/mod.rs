mod sampler;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use sampler::EmotionSampler;

/// Minimum time an active emotion is held before a new draw.
pub const DEFAULT_DWELL: Duration = Duration::from_secs(5);

/// Glyph shown for labels missing from the emoji table.
pub const PLACEHOLDER_GLYPH: &str = "❓";

/// Glyph shown before the first tick has rendered anything.
pub const STARTUP_GLYPH: &str = "🙂";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprise,
    Neutral,
    Fear,
    Disgust,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprise,
        Emotion::Neutral,
        Emotion::Fear,
        Emotion::Disgust,
    ];

    /// Every label except `Neutral`, in table order.
    pub const ACTIVE: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprise,
        Emotion::Fear,
        Emotion::Disgust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Emotion::Neutral
    }

    pub fn emoji(&self) -> &'static str {
        emoji_for(self.as_str())
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown emotion label: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| UnknownEmotion(s.to_owned()))
    }
}

/// Looks up the glyph for a label name, falling back to [`PLACEHOLDER_GLYPH`].
pub fn emoji_for(label: &str) -> &'static str {
    match label {
        "happy" => "😄",
        "sad" => "😢",
        "angry" => "😡",
        "surprise" => "😲",
        "neutral" => "😐",
        "fear" => "😨",
        "disgust" => "🤢",
        _ => PLACEHOLDER_GLYPH,
    }
}

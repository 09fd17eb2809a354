use crate::catalog::Track;
use crate::emotion::Emotion;
use crate::playback::TransportState;
use std::time::Instant;

pub const INITIAL_STATUS: &str = "Detecting emotion...";

/// Mutable state of one run, owned by the driver and handed to each component.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub current_emotion: Emotion,
    pub last_emotion_change: Instant,
    pub last_played_track: Option<Track>,
    /// Emotion that last triggered a playback decision.
    pub last_rendered_emotion_for_playback: Option<Emotion>,
    pub transport: TransportState,
    pub status: String,
}

impl SessionState {
    pub fn new(started_at: Instant) -> Self {
        Self {
            current_emotion: Emotion::Neutral,
            last_emotion_change: started_at,
            last_played_track: None,
            last_rendered_emotion_for_playback: None,
            transport: TransportState::Stopped,
            status: INITIAL_STATUS.to_owned(),
        }
    }

    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = status.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_neutral_and_stopped() {
        let t0 = Instant::now();
        let s = SessionState::new(t0);
        assert_eq!(s.current_emotion, Emotion::Neutral);
        assert_eq!(s.last_emotion_change, t0);
        assert!(s.last_played_track.is_none());
        assert!(s.last_rendered_emotion_for_playback.is_none());
        assert_eq!(s.transport, TransportState::Stopped);
        assert_eq!(s.status, INITIAL_STATUS);
    }
}

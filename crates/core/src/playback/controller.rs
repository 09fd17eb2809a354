use crate::catalog::{SongCatalog, Track};
use crate::emotion::Emotion;
use crate::playback::{AudioEngine, PlaybackError, PlaybackSelector, TrackStore, TransportState};
use crate::session::SessionState;

/// Transport control on top of an [`AudioEngine`].
///
/// Every operation records its outcome in [`SessionState::status`]. A failed
/// `play` leaves `transport` and `last_played_track` as they were.
pub struct PlaybackController<E, S> {
    engine: E,
    store: S,
}

impl<E, S> PlaybackController<E, S>
where
    E: AudioEngine,
    S: TrackStore,
{
    pub fn new(engine: E, store: S) -> Self {
        Self { engine, store }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.engine.set_volume(volume.clamp(0.0, 1.0));
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Plays `track`; `emotion` only labels the status line.
    pub fn play(
        &mut self,
        session: &mut SessionState,
        track: &Track,
        emotion: Option<Emotion>,
    ) -> Result<(), PlaybackError> {
        self.start(session, track)?;
        let name = track.display_name();
        match emotion {
            Some(e) => session.set_status(format!("Playing: {e} - {name}")),
            None => session.set_status(format!("Playing: {name}")),
        }
        Ok(())
    }

    /// Plays a random track other than the last one. Ignores emotion state.
    pub fn play_random(
        &mut self,
        session: &mut SessionState,
        catalog: &SongCatalog,
        selector: &mut PlaybackSelector,
    ) -> Result<Track, PlaybackError> {
        let track = selector
            .random_track(catalog, session.last_played_track.as_ref())
            .ok_or(PlaybackError::EmptyCatalog)?;
        self.start(session, &track)?;
        session.set_status(format!("Playing random: {}", track.display_name()));
        Ok(track)
    }

    pub fn stop(&mut self, session: &mut SessionState) {
        self.engine.stop();
        session.transport = TransportState::Stopped;
        session.set_status("Stopped");
    }

    pub fn pause(&mut self, session: &mut SessionState) {
        if session.transport != TransportState::Playing {
            tracing::debug!(state = ?session.transport, "pause ignored, nothing playing");
            return;
        }
        self.engine.pause();
        session.transport = TransportState::Paused;
        session.set_status("Paused");
    }

    pub fn resume(&mut self, session: &mut SessionState) {
        if session.transport != TransportState::Paused {
            tracing::debug!(state = ?session.transport, "resume ignored, not paused");
            return;
        }
        self.engine.unpause();
        session.transport = TransportState::Playing;
        let name = session
            .last_played_track
            .as_ref()
            .map(Track::display_name)
            .unwrap_or_default();
        session.set_status(format!("Playing: {name}"));
    }

    fn start(&mut self, session: &mut SessionState, track: &Track) -> Result<(), PlaybackError> {
        let Some(path) = self.store.locate(track) else {
            tracing::warn!(%track, "track file not found");
            session.set_status(format!("Track not found: {track}"));
            return Err(PlaybackError::TrackMissing(track.clone()));
        };

        if let Err(e) = self.engine.load(&path) {
            tracing::warn!(%track, error = %e, "failed to load track");
            session.set_status(format!("Error playing: {track}"));
            return Err(match e {
                PlaybackError::TrackLoad { .. } => e,
                other => PlaybackError::TrackLoad {
                    track: track.clone(),
                    details: other.to_string(),
                },
            });
        }

        self.engine.stop();
        self.engine.play();
        session.transport = TransportState::Playing;
        session.last_played_track = Some(track.clone());

        tracing::debug!(
            %track,
            busy = self.engine.is_busy(),
            volume = self.engine.volume(),
            "started playback"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{DummyAudioEngine, EngineCall};
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::time::Instant;

    struct MemStore(HashSet<Track>);

    impl TrackStore for MemStore {
        fn locate(&self, track: &Track) -> Option<PathBuf> {
            self.0.contains(track).then(|| track.path().to_path_buf())
        }
    }

    fn all_present(catalog: &SongCatalog) -> MemStore {
        MemStore(catalog.flat().iter().cloned().collect())
    }

    fn controller(catalog: &SongCatalog) -> PlaybackController<DummyAudioEngine, MemStore> {
        PlaybackController::new(DummyAudioEngine::new(), all_present(catalog))
    }

    #[test]
    fn play_commits_track_and_status() {
        let c = SongCatalog::default();
        let mut pc = controller(&c);
        let mut session = SessionState::new(Instant::now());
        let track = c.canonical(Emotion::Happy).unwrap().clone();

        pc.play(&mut session, &track, Some(Emotion::Happy)).unwrap();

        assert_eq!(session.transport, TransportState::Playing);
        assert_eq!(session.last_played_track, Some(track.clone()));
        assert_eq!(session.status, "Playing: happy - happy1");
        assert_eq!(pc.engine().play_count(), 1);
        assert!(pc.engine().is_busy());
    }

    #[test]
    fn missing_track_leaves_state_untouched() {
        let c = SongCatalog::default();
        let mut pc = PlaybackController::new(DummyAudioEngine::new(), MemStore(HashSet::new()));
        let mut session = SessionState::new(Instant::now());
        session.transport = TransportState::Paused;
        session.last_played_track = Some(Track::from("songs/songssad1.mp3"));
        let before = session.clone();

        let track = c.canonical(Emotion::Happy).unwrap().clone();
        let err = pc.play(&mut session, &track, Some(Emotion::Happy)).unwrap_err();

        assert!(matches!(err, PlaybackError::TrackMissing(_)));
        assert_eq!(session.transport, before.transport);
        assert_eq!(session.last_played_track, before.last_played_track);
        assert!(session.status.contains("songshappy1.mp3"));
        assert!(pc.engine().calls().is_empty());
    }

    #[test]
    fn load_failure_leaves_state_untouched_and_keeps_audio() {
        let c = SongCatalog::default();
        let bad = c.canonical(Emotion::Angry).unwrap().clone();
        let engine = DummyAudioEngine::new().failing_on(bad.path());
        let mut pc = PlaybackController::new(engine, all_present(&c));
        let mut session = SessionState::new(Instant::now());
        let good = c.canonical(Emotion::Sad).unwrap().clone();
        pc.play(&mut session, &good, None).unwrap();

        let err = pc.play(&mut session, &bad, Some(Emotion::Angry)).unwrap_err();

        assert!(matches!(err, PlaybackError::TrackLoad { .. }));
        assert_eq!(session.transport, TransportState::Playing);
        assert_eq!(session.last_played_track, Some(good));
        assert_eq!(session.status, format!("Error playing: {bad}"));
        assert_eq!(pc.engine().play_count(), 1);
        assert!(pc.engine().is_busy());
    }

    #[test]
    fn pause_and_resume_only_from_matching_state() {
        let c = SongCatalog::default();
        let mut pc = controller(&c);
        let mut session = SessionState::new(Instant::now());

        pc.pause(&mut session);
        pc.resume(&mut session);
        assert_eq!(session.transport, TransportState::Stopped);
        assert!(pc.engine().calls().is_empty());

        let track = c.canonical(Emotion::Fear).unwrap().clone();
        pc.play(&mut session, &track, Some(Emotion::Fear)).unwrap();
        pc.resume(&mut session);
        assert_eq!(session.transport, TransportState::Playing);

        pc.pause(&mut session);
        assert_eq!(session.transport, TransportState::Paused);
        assert_eq!(session.status, "Paused");
        assert!(!pc.engine().is_busy());

        pc.pause(&mut session);
        assert_eq!(session.transport, TransportState::Paused);

        pc.resume(&mut session);
        assert_eq!(session.transport, TransportState::Playing);
        assert_eq!(session.status, "Playing: fear1");
    }

    #[test]
    fn stop_is_idempotent() {
        let c = SongCatalog::default();
        let mut pc = controller(&c);
        let mut session = SessionState::new(Instant::now());
        pc.stop(&mut session);
        pc.stop(&mut session);
        assert_eq!(session.transport, TransportState::Stopped);
        assert_eq!(session.status, "Stopped");
        assert_eq!(pc.engine().calls(), &[EngineCall::Stop, EngineCall::Stop]);
    }

    #[test]
    fn play_random_skips_last_played() {
        let c = SongCatalog::default();
        let mut pc = controller(&c);
        let mut selector = PlaybackSelector::with_seed(8);
        let mut session = SessionState::new(Instant::now());

        let mut previous = pc.play_random(&mut session, &c, &mut selector).unwrap();
        assert!(c.contains(&previous));
        for _ in 0..20 {
            let next = pc.play_random(&mut session, &c, &mut selector).unwrap();
            assert_ne!(next, previous);
            assert_eq!(session.last_played_track.as_ref(), Some(&next));
            assert!(session.status.starts_with("Playing random: "));
            previous = next;
        }
    }

    #[test]
    fn volume_is_clamped() {
        let c = SongCatalog::default();
        let pc = controller(&c).with_volume(3.0);
        assert_eq!(pc.engine().volume(), 1.0);
    }
}

use crate::emotion::{Emotion, DEFAULT_DWELL};
use crate::session::SessionState;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Face-gated random emotion rotation.
///
/// While a face is present the committed emotion is held for at least `dwell`
/// and then redrawn from the active labels, never repeating the previous one.
/// Frames without a face report `Neutral` without touching the committed state.
pub struct EmotionSampler {
    dwell: Duration,
    candidates: Vec<Emotion>,
    rng: StdRng,
}

impl EmotionSampler {
    pub fn new(dwell: Duration, rng: StdRng) -> Self {
        Self {
            dwell,
            candidates: Emotion::ACTIVE.to_vec(),
            rng,
        }
    }

    pub fn with_seed(dwell: Duration, seed: u64) -> Self {
        Self::new(dwell, StdRng::seed_from_u64(seed))
    }

    pub fn with_dwell(dwell: Duration) -> Self {
        Self::new(dwell, StdRng::from_os_rng())
    }

    /// Restricts the draw to a subset of the active labels. Neutral is dropped.
    pub fn with_candidates(mut self, candidates: &[Emotion]) -> Self {
        let filtered: Vec<Emotion> = candidates.iter().copied().filter(Emotion::is_active).collect();
        if !filtered.is_empty() {
            self.candidates = filtered;
        }
        self
    }

    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    pub fn sample(&mut self, session: &mut SessionState, face_present: bool, now: Instant) -> Emotion {
        if !face_present {
            if session.current_emotion != Emotion::Neutral {
                tracing::trace!(held = %session.current_emotion, "no face detected, showing neutral");
            }
            return Emotion::Neutral;
        }

        if now.saturating_duration_since(session.last_emotion_change) > self.dwell {
            self.commit_draw(session, now);
        }
        session.current_emotion
    }

    /// Draws and commits a new emotion regardless of the dwell timer.
    pub fn force_change(&mut self, session: &mut SessionState, now: Instant) -> Emotion {
        self.commit_draw(session, now);
        session.current_emotion
    }

    fn commit_draw(&mut self, session: &mut SessionState, now: Instant) {
        let previous = session.current_emotion;
        let next = self.draw_excluding(previous);
        tracing::debug!(from = %previous, to = %next, "emotion changed");
        session.current_emotion = next;
        session.last_emotion_change = now;
    }

    fn draw_excluding(&mut self, previous: Emotion) -> Emotion {
        let others: Vec<Emotion> = self
            .candidates
            .iter()
            .copied()
            .filter(|e| *e != previous)
            .collect();
        let pool = if others.is_empty() {
            &self.candidates
        } else {
            &others
        };
        pool.choose(&mut self.rng)
            .copied()
            .unwrap_or(Emotion::Happy)
    }
}

impl Default for EmotionSampler {
    fn default() -> Self {
        Self::with_dwell(DEFAULT_DWELL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler(seed: u64) -> EmotionSampler {
        EmotionSampler::with_seed(DEFAULT_DWELL, seed)
    }

    #[test]
    fn no_face_reports_neutral_without_committing() {
        let t0 = Instant::now();
        let mut s = sampler(1);
        let mut session = SessionState::new(t0);
        session.current_emotion = Emotion::Sad;

        for i in 0..20 {
            let now = t0 + Duration::from_secs(i * 3);
            assert_eq!(s.sample(&mut session, false, now), Emotion::Neutral);
        }
        assert_eq!(session.current_emotion, Emotion::Sad);
        assert_eq!(session.last_emotion_change, t0);
    }

    #[test]
    fn first_draw_after_dwell_is_active_and_new() {
        let t0 = Instant::now();
        for seed in 0..32 {
            let mut s = sampler(seed);
            let mut session = SessionState::new(t0);
            let label = s.sample(&mut session, true, t0 + DEFAULT_DWELL + Duration::from_secs(1));
            assert!(label.is_active());
            assert_ne!(label, Emotion::Neutral);
            assert_eq!(session.current_emotion, label);
        }
    }

    #[test]
    fn holds_label_within_dwell() {
        let t0 = Instant::now();
        let mut s = sampler(7);
        let mut session = SessionState::new(t0);
        let first = s.sample(&mut session, true, t0 + Duration::from_secs(6));
        let changed_at = session.last_emotion_change;

        // exactly dwell after the change is not enough; the gate is strict
        for secs in [1, 2, 4, 5] {
            let label = s.sample(&mut session, true, changed_at + Duration::from_secs(secs));
            assert_eq!(label, first);
        }
        assert_eq!(session.last_emotion_change, changed_at);
    }

    #[test]
    fn continuous_face_never_repeats_and_respects_dwell() {
        let t0 = Instant::now();
        let mut s = sampler(42);
        let mut session = SessionState::new(t0);
        let mut previous = session.current_emotion;
        let mut last_change = t0;

        for tick in 1..=120u64 {
            let now = t0 + Duration::from_secs(tick);
            let label = s.sample(&mut session, true, now);
            if label != previous {
                assert!(now.duration_since(last_change) > DEFAULT_DWELL);
                last_change = now;
                previous = label;
            }
        }
        assert!(last_change > t0);
    }

    #[test]
    fn consecutive_draws_differ() {
        let t0 = Instant::now();
        let mut s = sampler(3);
        let mut session = SessionState::new(t0);
        let mut previous = session.current_emotion;
        for i in 1..50u32 {
            let label = s.force_change(&mut session, t0 + Duration::from_millis(u64::from(i)));
            assert_ne!(label, previous);
            previous = label;
        }
    }

    #[test]
    fn single_candidate_falls_back_to_full_set() {
        let t0 = Instant::now();
        let mut s = sampler(9).with_candidates(&[Emotion::Fear]);
        let mut session = SessionState::new(t0);
        assert_eq!(s.force_change(&mut session, t0), Emotion::Fear);
        assert_eq!(s.force_change(&mut session, t0), Emotion::Fear);
    }

    #[test]
    fn force_change_resets_dwell_timer() {
        let t0 = Instant::now();
        let mut s = sampler(11);
        let mut session = SessionState::new(t0);
        let at = t0 + Duration::from_millis(10);
        let label = s.force_change(&mut session, at);
        assert_eq!(session.last_emotion_change, at);
        assert_eq!(s.sample(&mut session, true, at + Duration::from_secs(2)), label);
    }

    #[test]
    fn same_seed_same_sequence() {
        let t0 = Instant::now();
        let run = |seed| {
            let mut s = sampler(seed);
            let mut session = SessionState::new(t0);
            (0..10)
                .map(|i| s.force_change(&mut session, t0 + Duration::from_secs(i)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(5), run(5));
    }
}

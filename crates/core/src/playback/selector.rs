use crate::catalog::{SongCatalog, Track};
use crate::emotion::Emotion;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

/// Chooses the next track for an emotion, avoiding an immediate repeat.
pub struct PlaybackSelector {
    rng: StdRng,
}

impl PlaybackSelector {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Canonical track for `emotion`, unless it was the one played last; then a
    /// random other track from the flat catalog.
    pub fn select_track(
        &mut self,
        catalog: &SongCatalog,
        emotion: Emotion,
        last_played: Option<&Track>,
    ) -> Option<Track> {
        let canonical = catalog.canonical(emotion)?;
        if last_played != Some(canonical) {
            tracing::debug!(%emotion, track = %canonical, "selected canonical track");
            return Some(canonical.clone());
        }

        let picked = self.pick_other(catalog.flat(), canonical).unwrap_or(canonical);
        tracing::debug!(%emotion, track = %picked, "canonical track just played, picked another");
        Some(picked.clone())
    }

    /// Uniform pick from the flat catalog minus `last_played`, or from the
    /// whole catalog when nothing else is left.
    pub fn random_track(&mut self, catalog: &SongCatalog, last_played: Option<&Track>) -> Option<Track> {
        let flat = catalog.flat();
        let picked = match last_played {
            Some(last) => self.pick_other(flat, last),
            None => None,
        };
        picked
            .or_else(|| flat.choose(&mut self.rng))
            .cloned()
    }

    fn pick_other<'a>(&mut self, flat: &'a [Track], exclude: &Track) -> Option<&'a Track> {
        let others: Vec<&Track> = flat.iter().filter(|t| *t != exclude).collect();
        others.choose(&mut self.rng).copied()
    }
}

impl Default for PlaybackSelector {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn catalog(entries: &[(Emotion, &str)]) -> SongCatalog {
        let mut by_emotion: BTreeMap<Emotion, Vec<Track>> = BTreeMap::new();
        for e in Emotion::ACTIVE {
            let track = entries
                .iter()
                .find(|(k, _)| *k == e)
                .map(|(_, t)| *t)
                .unwrap_or(entries[0].1);
            by_emotion.insert(e, vec![Track::from(track)]);
        }
        SongCatalog::new(by_emotion).unwrap()
    }

    #[test]
    fn canonical_track_when_not_last_played() {
        let c = SongCatalog::default();
        let mut s = PlaybackSelector::with_seed(1);
        let picked = s.select_track(&c, Emotion::Sad, None).unwrap();
        assert_eq!(picked, Track::from("songs/songssad1.mp3"));

        let last = Track::from("songs/songshappy1.mp3");
        let picked = s.select_track(&c, Emotion::Sad, Some(&last)).unwrap();
        assert_eq!(picked, Track::from("songs/songssad1.mp3"));
    }

    #[test]
    fn two_track_catalog_swaps_to_the_other_track() {
        let c = catalog(&[(Emotion::Happy, "A"), (Emotion::Sad, "B")]);
        assert_eq!(c.flat().len(), 2);
        let mut s = PlaybackSelector::with_seed(2);
        let a = Track::from("A");
        assert_eq!(s.select_track(&c, Emotion::Happy, Some(&a)), Some(Track::from("B")));
    }

    #[test]
    fn never_repeats_last_when_alternatives_exist() {
        let c = SongCatalog::default();
        for seed in 0..64 {
            let mut s = PlaybackSelector::with_seed(seed);
            for e in Emotion::ACTIVE {
                let last = c.canonical(e).unwrap().clone();
                let picked = s.select_track(&c, e, Some(&last)).unwrap();
                assert_ne!(picked, last);
                assert!(c.contains(&picked));
            }
        }
    }

    #[test]
    fn single_track_catalog_returns_canonical_anyway() {
        let c = catalog(&[(Emotion::Happy, "only.mp3")]);
        assert_eq!(c.flat().len(), 1);
        let mut s = PlaybackSelector::with_seed(3);
        let only = Track::from("only.mp3");
        assert_eq!(s.select_track(&c, Emotion::Fear, Some(&only)), Some(only.clone()));
        assert_eq!(s.random_track(&c, Some(&only)), Some(only));
    }

    #[test]
    fn neutral_without_tracks_selects_nothing() {
        let c = catalog(&[(Emotion::Happy, "A"), (Emotion::Sad, "B")]);
        let mut s = PlaybackSelector::with_seed(4);
        assert_eq!(s.select_track(&c, Emotion::Neutral, None), None);
    }

    #[test]
    fn random_track_avoids_last_played() {
        let c = SongCatalog::default();
        let mut s = PlaybackSelector::with_seed(5);
        let mut last = s.random_track(&c, None).unwrap();
        for _ in 0..100 {
            let next = s.random_track(&c, Some(&last)).unwrap();
            assert_ne!(next, last);
            last = next;
        }
    }
}

mod command;

use crate::capture::{FaceDetector, FrameSource};
use crate::catalog::{SongCatalog, Track};
use crate::emotion::{emoji_for, Emotion, EmotionSampler, STARTUP_GLYPH};
use crate::playback::{AudioEngine, PlaybackController, PlaybackSelector, TrackStore};
use crate::render::Renderer;
use crate::session::SessionState;
use crate::util::RateLimitedWarn;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub use command::{Command, UnknownCommand};

pub const CAPTURE_LOST_STATUS: &str = "Camera unavailable, retrying...";
const CAPTURE_WARN_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No frame this tick; nothing was sampled.
    CaptureFailed,
    /// Detector failed; previous label and emoji kept.
    DetectionFailed,
    Sampled {
        label: Emotion,
        /// Track started by this tick, if the label opened a new playback session.
        played: Option<Track>,
    },
}

/// Owns the session and every collaborator; ticks and user commands run on it
/// one at a time.
pub struct Driver<F, D, E, S, R> {
    session: SessionState,
    catalog: SongCatalog,
    sampler: EmotionSampler,
    selector: PlaybackSelector,
    controller: PlaybackController<E, S>,
    camera: F,
    detector: D,
    renderer: R,
    tick_period: Duration,
    capture_warn: RateLimitedWarn,
    // Status line shown before the camera dropped out, restored when it returns.
    status_before_capture_loss: Option<String>,
}

impl<F, D, E, S, R> Driver<F, D, E, S, R>
where
    F: FrameSource,
    D: FaceDetector,
    E: AudioEngine,
    S: TrackStore,
    R: Renderer,
{
    pub fn new(
        camera: F,
        detector: D,
        controller: PlaybackController<E, S>,
        renderer: R,
        catalog: SongCatalog,
        started_at: Instant,
    ) -> Self {
        Self {
            session: SessionState::new(started_at),
            catalog,
            sampler: EmotionSampler::default(),
            selector: PlaybackSelector::default(),
            controller,
            camera,
            detector,
            renderer,
            tick_period: crate::config::TickPeriod::default().duration(),
            capture_warn: RateLimitedWarn::new(CAPTURE_WARN_INTERVAL),
            status_before_capture_loss: None,
        }
    }

    pub fn with_sampler(mut self, sampler: EmotionSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_selector(mut self, selector: PlaybackSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn controller(&self) -> &PlaybackController<E, S> {
        &self.controller
    }

    pub fn camera(&self) -> &F {
        &self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Runs ticks at the configured period and applies commands as they
    /// arrive, until [`Command::Exit`]. A slow tick delays the next one.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<Command>) {
        self.renderer.show_emoji(STARTUP_GLYPH);
        self.renderer.show_status(&self.session.status);

        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                Some(command) = commands.recv() => {
                    if self.handle(command, Instant::now()).is_break() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick(Instant::now());
                }
            }
        }
        tracing::info!("driver loop finished");
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let frame = match self.camera.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                if let Some(suppressed) = self.capture_warn.should_log(now) {
                    tracing::warn!(error = %e, suppressed, "camera frame unavailable, skipping tick");
                }
                if self.status_before_capture_loss.is_none() {
                    self.status_before_capture_loss =
                        Some(std::mem::replace(&mut self.session.status, CAPTURE_LOST_STATUS.to_owned()));
                    self.renderer.show_status(&self.session.status);
                }
                return TickOutcome::CaptureFailed;
            }
        };

        if let Some(previous) = self.status_before_capture_loss.take() {
            tracing::info!("camera frames flowing again");
            self.capture_warn.reset();
            if self.session.status == CAPTURE_LOST_STATUS {
                self.session.status = previous;
            }
        }

        self.renderer.show_frame(&frame);

        let faces = match self.detector.detect_faces(&frame) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "emotion detection error, keeping current emoji");
                return TickOutcome::DetectionFailed;
            }
        };

        let label = self.sampler.sample(&mut self.session, faces > 0, now);
        self.renderer.show_emoji(emoji_for(label.as_str()));

        // Neutral frames are display-only and never open or close a playback session.
        let played = if label.is_active()
            && self.session.last_rendered_emotion_for_playback != Some(label)
        {
            tracing::debug!(
                %label,
                previous = ?self.session.last_rendered_emotion_for_playback,
                "emotion changed, playing song"
            );
            self.trigger_playback(label)
        } else {
            None
        };

        self.renderer.show_status(&self.session.status);
        TickOutcome::Sampled { label, played }
    }

    /// Forces a new emotion and always issues one play, even when the drawn
    /// label matches the one that last triggered playback.
    pub fn change_emotion_manually(&mut self, now: Instant) -> Option<Track> {
        let label = self.sampler.force_change(&mut self.session, now);
        tracing::info!(%label, "manual emotion change");
        let played = self.trigger_playback(label);
        self.renderer.show_emoji(label.emoji());
        self.renderer.show_status(&self.session.status);
        played
    }

    pub fn handle(&mut self, command: Command, now: Instant) -> ControlFlow<()> {
        tracing::debug!(%command, "command received");
        match command {
            Command::Stop => self.controller.stop(&mut self.session),
            Command::Pause => self.controller.pause(&mut self.session),
            Command::Resume => self.controller.resume(&mut self.session),
            Command::ChangeEmotion => {
                self.change_emotion_manually(now);
            }
            Command::RandomSong => {
                if let Err(e) =
                    self.controller
                        .play_random(&mut self.session, &self.catalog, &mut self.selector)
                {
                    tracing::warn!(error = %e, "random song failed");
                }
            }
            Command::Exit => {
                self.camera.release();
                return ControlFlow::Break(());
            }
        }
        self.renderer.show_status(&self.session.status);
        ControlFlow::Continue(())
    }

    fn trigger_playback(&mut self, label: Emotion) -> Option<Track> {
        // Recorded before playing: a track that fails to start is not retried
        // until the label changes.
        self.session.last_rendered_emotion_for_playback = Some(label);

        let Some(track) = self.selector.select_track(
            &self.catalog,
            label,
            self.session.last_played_track.as_ref(),
        ) else {
            tracing::warn!(%label, "no songs found for emotion");
            return None;
        };

        match self.controller.play(&mut self.session, &track, Some(label)) {
            Ok(()) => Some(track),
            Err(e) => {
                tracing::warn!(%label, error = %e, "playback failed");
                None
            }
        }
    }
}

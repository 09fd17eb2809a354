use crate::capture::CameraConfig;
use serde::{Deserialize, Serialize};
use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};

pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_DWELL_SECS: u64 = 5;
pub const DEFAULT_VOLUME: f32 = 1.0;
pub const DEFAULT_MUSIC_ROOT: &str = ".";
pub const DEFAULT_FRAME_WIDTH: u32 = 320;
pub const DEFAULT_FRAME_HEIGHT: u32 = 240;

#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_DEVICE: &str = "0";
#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_FORMAT: &str = "avfoundation";

#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_DEVICE: &str = "video=Integrated Camera";
#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_FORMAT: &str = "dshow";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_FORMAT: &str = "v4l2";

pub const ENV_CAMERA_DEVICE: &str = "MOODTUNE_CAMERA_DEVICE";
pub const ENV_MUSIC_ROOT: &str = "MOODTUNE_MUSIC_ROOT";
pub const ENV_CATALOG: &str = "MOODTUNE_CATALOG";
pub const ENV_OUTPUT_DEVICE: &str = "MOODTUNE_OUTPUT_DEVICE";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickPeriod {
    pub ms: u64,
}

impl TickPeriod {
    pub fn new(ms: u64) -> Result<Self, ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        Ok(Self { ms })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.ms)
    }

    pub fn frames_per_second(&self) -> f64 {
        1000.0 / self.ms as f64
    }
}

impl Default for TickPeriod {
    fn default() -> Self {
        Self {
            ms: DEFAULT_TICK_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Volume(f32);

impl Volume {
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::VolumeOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(DEFAULT_VOLUME)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    pub volume: Volume,
    pub output_device: Option<String>,
    /// Use the silent engine instead of a real output device.
    pub mute: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub music_root: PathBuf,
    /// JSON catalog; the built-in `songs/` layout is used when absent.
    pub catalog_path: Option<PathBuf>,
    pub tick: TickPeriod,
    pub dwell: Duration,
    pub audio: AudioConfig,
    pub seed: Option<u64>,
    pub start_time: SystemTime,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            music_root: PathBuf::from(DEFAULT_MUSIC_ROOT),
            catalog_path: None,
            tick: TickPeriod::default(),
            dwell: Duration::from_secs(DEFAULT_DWELL_SECS),
            audio: AudioConfig::default(),
            seed: None,
            start_time: SystemTime::now(),
        }
    }
}

pub fn camera_config(
    device: String,
    input_format: String,
    width: u32,
    height: u32,
) -> Result<CameraConfig, ConfigError> {
    if device.trim().is_empty() {
        return Err(ConfigError::EmptyCameraDevice);
    }
    if width == 0 || height == 0 {
        return Err(ConfigError::ZeroFrameSize);
    }
    Ok(CameraConfig {
        device,
        input_format,
        width,
        height,
    })
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("camera device must not be empty")]
    EmptyCameraDevice,
    #[error("frame size must be > 0 in both dimensions")]
    ZeroFrameSize,
    #[error("tick period must be > 0 ms")]
    ZeroTickPeriod,
    #[error("volume must be within 0.0..=1.0, got {0}")]
    VolumeOutOfRange(f32),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_period_rejects_zero() {
        assert_eq!(TickPeriod::new(0), Err(ConfigError::ZeroTickPeriod));
        let t = TickPeriod::new(500).expect("nonzero");
        assert_eq!(t.duration(), Duration::from_millis(500));
        assert!((t.frames_per_second() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn volume_bounds() {
        assert!(Volume::new(0.0).is_ok());
        assert!(Volume::new(1.0).is_ok());
        assert_eq!(Volume::new(1.2), Err(ConfigError::VolumeOutOfRange(1.2)));
        assert!(Volume::new(-0.1).is_err());
        assert_eq!(Volume::default().get(), 1.0);
    }

    #[test]
    fn camera_config_validates() {
        assert_eq!(
            camera_config("  ".to_owned(), "v4l2".to_owned(), 320, 240),
            Err(ConfigError::EmptyCameraDevice)
        );
        assert_eq!(
            camera_config("/dev/video1".to_owned(), "v4l2".to_owned(), 0, 240),
            Err(ConfigError::ZeroFrameSize)
        );
        let c = camera_config("/dev/video1".to_owned(), "v4l2".to_owned(), 64, 48).unwrap();
        assert_eq!(c.device, "/dev/video1");
    }

    #[test]
    fn defaults_match_original_timing() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.tick.duration(), Duration::from_secs(1));
        assert_eq!(cfg.dwell, Duration::from_secs(5));
        assert_eq!(cfg.audio.volume.get(), 1.0);
        assert!(cfg.catalog_path.is_none());
    }

    #[test]
    fn resolve_string_with_default_cli_takes_precedence() {
        let env = MapEnv::default().with_var(ENV_CAMERA_DEVICE, "env");
        let v = resolve_string_with_default(Some("cli".to_owned()), ENV_CAMERA_DEVICE, &env, "def");
        assert_eq!(v, "cli");
    }

    #[test]
    fn resolve_string_with_default_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_CAMERA_DEVICE, "env");
        let v = resolve_string_with_default(None, ENV_CAMERA_DEVICE, &env, "def");
        assert_eq!(v, "env");
    }

    #[test]
    fn resolve_string_with_default_default_used_when_both_missing() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_CAMERA_DEVICE, &env, "def");
        assert_eq!(v, "def");
    }

    #[test]
    fn resolve_optional_string_falls_back_to_env() {
        let env = MapEnv::default().with_var(ENV_CATALOG, "moods.json");
        assert_eq!(
            resolve_optional_string(None, ENV_CATALOG, &env).as_deref(),
            Some("moods.json")
        );
        assert_eq!(resolve_optional_string(None, ENV_OUTPUT_DEVICE, &env), None);
    }
}

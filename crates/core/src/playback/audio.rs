use crate::catalog::Track;
use crate::playback::{AudioEngine, PlaybackError};
use rodio::cpal::traits::DeviceTrait;
use rodio::cpal::traits::HostTrait;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, StreamError};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Rodio-backed engine. One [`Sink`] per loaded track.
///
/// The [`OutputStream`] is opened on the first `load` and kept for the rest of
/// the run; dropping it would silence every sink attached to its mixer.
pub struct RodioAudioEngine {
    output_device_name: Option<String>,
    output_stream: Option<OutputStream>,
    // Set once the host reports no output device; later loads fail fast.
    disabled_details: Option<String>,
    staged: Option<Sink>,
    current: Option<Sink>,
    volume: f32,
}

impl RodioAudioEngine {
    pub fn new() -> Self {
        Self {
            output_device_name: None,
            output_stream: None,
            disabled_details: None,
            staged: None,
            current: None,
            volume: 1.0,
        }
    }

    pub fn with_output_device_name<S: Into<String>>(mut self, name: S) -> Self {
        self.output_device_name = Some(name.into());
        self
    }

    fn open_output_stream(&self) -> Result<OutputStream, PlaybackError> {
        tracing::debug!(
            configured_output_device = %self.output_device_name.as_deref().unwrap_or("<default>"),
            "opening Rodio OutputStream"
        );

        match self.output_device_name.as_deref() {
            Some(wanted) => match open_named_output_stream(wanted) {
                Ok(stream) => Ok(stream),
                Err(NamedDeviceStreamError::DeviceNotFound { wanted, available }) => {
                    tracing::warn!(
                        wanted_device = %wanted,
                        available_devices = %format_device_list(&available),
                        "configured output device not found; falling back to default output device"
                    );
                    open_default(Some(wanted.as_str()), "default-device fallback after named device not found")
                }
                Err(NamedDeviceStreamError::OpenFailed {
                    wanted,
                    error,
                    available,
                }) => {
                    tracing::warn!(
                        wanted_device = %wanted,
                        error = %error,
                        available_devices = %format_device_list(&available),
                        "failed to open configured output device; falling back to default output device"
                    );
                    open_default(Some(wanted.as_str()), "default-device fallback after named device open failed")
                }
            },
            None => open_default(None, "open default output stream"),
        }
    }

    fn connect_sink(&mut self) -> Result<Sink, PlaybackError> {
        if let Some(details) = &self.disabled_details {
            return Err(PlaybackError::AudioOutputUnavailable {
                details: details.clone(),
            });
        }

        if self.output_stream.is_none() {
            match self.open_output_stream() {
                Ok(stream) => self.output_stream = Some(stream),
                Err(e) => {
                    if let PlaybackError::AudioOutputUnavailable { details } = &e {
                        if details.contains("NoDevice") {
                            self.disabled_details = Some(details.clone());
                        }
                    }
                    return Err(e);
                }
            }
        }

        match self.output_stream.as_ref() {
            Some(stream) => Ok(Sink::connect_new(stream.mixer())),
            None => Err(PlaybackError::AudioOutputUnavailable {
                details: "internal error: output stream missing after open".to_owned(),
            }),
        }
    }
}

impl Default for RodioAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for RodioAudioEngine {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        let load_err = |details: String| PlaybackError::TrackLoad {
            track: Track::new(path),
            details,
        };

        let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| load_err(e.to_string()))?;

        let sink = self.connect_sink()?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(source);

        // Replaces any earlier staged sink that was never played.
        self.staged = Some(sink);
        Ok(())
    }

    fn play(&mut self) {
        if let Some(sink) = self.staged.take() {
            if let Some(previous) = self.current.replace(sink) {
                previous.stop();
            }
        }
        match &self.current {
            Some(sink) => sink.play(),
            None => tracing::debug!("play requested with nothing loaded"),
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.current.take() {
            sink.stop();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.current {
            sink.pause();
        }
    }

    fn unpause(&mut self) {
        if let Some(sink) = &self.current {
            sink.play();
        }
    }

    fn is_busy(&self) -> bool {
        self.current
            .as_ref()
            .map(|s| !s.empty() && !s.is_paused())
            .unwrap_or(false)
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        for sink in self.current.iter().chain(self.staged.iter()) {
            sink.set_volume(self.volume);
        }
    }
}

fn open_default(wanted: Option<&str>, context: &str) -> Result<OutputStream, PlaybackError> {
    OutputStreamBuilder::open_default_stream().map_err(|e| PlaybackError::AudioOutputUnavailable {
        details: format_stream_error_details(e, wanted, context),
    })
}

#[derive(Debug)]
enum NamedDeviceStreamError {
    DeviceNotFound {
        wanted: String,
        available: Vec<String>,
    },
    OpenFailed {
        wanted: String,
        error: StreamError,
        available: Vec<String>,
    },
}

fn normalize_device_name(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

fn open_named_output_stream(wanted: &str) -> Result<OutputStream, NamedDeviceStreamError> {
    let wanted_norm = normalize_device_name(wanted);

    let host = rodio::cpal::default_host();
    let mut available: Vec<String> = Vec::new();
    let mut selected = None;

    if let Ok(devices) = host.output_devices() {
        for d in devices {
            let name = d.name().unwrap_or_else(|_| "<unnamed>".to_owned());
            if normalize_device_name(&name) == wanted_norm {
                selected = Some(d);
            }
            available.push(name);
        }
    }

    let Some(device) = selected else {
        return Err(NamedDeviceStreamError::DeviceNotFound {
            wanted: wanted.to_owned(),
            available,
        });
    };

    OutputStreamBuilder::from_device(device)
        .and_then(|b| b.open_stream_or_fallback())
        .map_err(|error| NamedDeviceStreamError::OpenFailed {
            wanted: wanted.to_owned(),
            error,
            available,
        })
}

fn format_device_list(devices: &[String]) -> String {
    if devices.is_empty() {
        return "<unknown>".to_owned();
    }
    devices.join(", ")
}

fn format_stream_error_details(err: StreamError, wanted: Option<&str>, context: &str) -> String {
    let mut s = format!("{context}: {err}");
    if let Some(w) = wanted {
        s.push_str(&format!(" (configured_device={w})"));
    }
    #[cfg(feature = "playback-device-enum")]
    {
        if let Ok(devices) = enumerate_output_device_names() {
            if devices.is_empty() {
                s.push_str("; available_output_devices=<none>");
            } else {
                s.push_str("; available_output_devices=");
                s.push_str(&devices.join(", "));
            }
        }
    }
    s
}

#[cfg(feature = "playback-device-enum")]
pub fn enumerate_output_device_names() -> Result<Vec<String>, PlaybackError> {
    let host = rodio::cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| PlaybackError::AudioOutputUnavailable {
            details: format!("failed to list output devices: {e}"),
        })?;

    Ok(devices
        .map(|d| d.name().unwrap_or_else(|_| "<unnamed>".to_owned()))
        .collect())
}

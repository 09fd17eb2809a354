#[cfg(feature = "ffmpeg-sidecar")]
mod ffmpeg;
mod presence;

use serde::{Deserialize, Serialize};

#[cfg(feature = "ffmpeg-sidecar")]
pub use ffmpeg::FfmpegCamera;
pub use presence::LumaContrastDetector;

/// One 8-bit grayscale frame, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, luma: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = frame_len(width, height);
        if luma.len() != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "expected {expected} bytes for {width}x{height}, got {}",
                luma.len()
            )));
        }
        Ok(Self { width, height, luma })
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            luma: vec![value; frame_len(width, height)],
        }
    }
}

pub(crate) fn frame_len(width: u32, height: u32) -> usize {
    (width as usize).saturating_mul(height as usize)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CameraConfig {
    /// Device path or name handed to ffmpeg, e.g. `/dev/video0`.
    pub device: String,
    /// ffmpeg input format, e.g. `v4l2`, `avfoundation`, `dshow`.
    pub input_format: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: crate::config::DEFAULT_CAMERA_DEVICE.to_owned(),
            input_format: crate::config::DEFAULT_CAMERA_FORMAT.to_owned(),
            width: crate::config::DEFAULT_FRAME_WIDTH,
            height: crate::config::DEFAULT_FRAME_HEIGHT,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("camera released")]
    Released,
}

#[derive(thiserror::Error, Debug)]
pub enum DetectionError {
    #[error("face detection failed: {0}")]
    Failed(String),
}

pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Gives the device back. Later reads fail with [`CaptureError::Released`].
    fn release(&mut self);
}

pub trait FaceDetector {
    fn detect_faces(&mut self, frame: &Frame) -> Result<usize, DetectionError>;
}

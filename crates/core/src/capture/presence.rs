use crate::capture::{FaceDetector, Frame, DetectionError};

/// Coarse presence heuristic used in place of a trained face detector.
///
/// Reports one face when the frame is neither too dark nor too flat: a covered
/// lens or an empty, evenly lit scene has little luma variation.
#[derive(Clone, Debug)]
pub struct LumaContrastDetector {
    pub min_mean: f64,
    pub max_mean: f64,
    pub min_std_dev: f64,
}

impl Default for LumaContrastDetector {
    fn default() -> Self {
        Self {
            min_mean: 20.0,
            max_mean: 235.0,
            min_std_dev: 12.0,
        }
    }
}

impl LumaContrastDetector {
    fn stats(frame: &Frame) -> Option<(f64, f64)> {
        if frame.luma.is_empty() {
            return None;
        }
        let n = frame.luma.len() as f64;
        let mean = frame.luma.iter().map(|&p| f64::from(p)).sum::<f64>() / n;
        let var = frame
            .luma
            .iter()
            .map(|&p| {
                let d = f64::from(p) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Some((mean, var.sqrt()))
    }
}

impl FaceDetector for LumaContrastDetector {
    fn detect_faces(&mut self, frame: &Frame) -> Result<usize, DetectionError> {
        let (mean, std_dev) = Self::stats(frame)
            .ok_or_else(|| DetectionError::Failed("empty frame".to_owned()))?;
        let present = mean >= self.min_mean && mean <= self.max_mean && std_dev >= self.min_std_dev;
        tracing::trace!(mean, std_dev, present, "luma presence check");
        Ok(usize::from(present))
    }
}

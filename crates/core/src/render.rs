use crate::capture::Frame;

/// Display surface: live frame, one emoji glyph, one status line.
pub trait Renderer {
    fn show_frame(&mut self, frame: &Frame);
    fn show_emoji(&mut self, glyph: &str);
    fn show_status(&mut self, status: &str);
}

//! Plain-text display for terminals and bench logs
//!
//! Each render writes one frame: an optional banner, the status lines, and a
//! blank separator line.
//!
//! ```text
//! !!! FLOOD: FLOOD DETECTED!
//! Soil  1200 !
//! Gas   900
//! ...
//! ```

use std::io::Write;

use hazardwatch_core::{
    errors::{SinkError, SinkResult},
    overlay::OverlayBanner,
    screen::DisplayLine,
    sinks::Display,
};

#[derive(Debug)]
pub struct TextDisplay<W: Write> {
    out: W,
    frames: u64,
}

impl<W: Write> TextDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, lines: &[DisplayLine], overlay: Option<&OverlayBanner>) -> std::io::Result<()> {
        if let Some(banner) = overlay {
            writeln!(self.out, "!!! {}: {}", banner.kind, banner.message)?;
        }
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> Display for TextDisplay<W> {
    fn render(&mut self, lines: &[DisplayLine], overlay: Option<&OverlayBanner>) -> SinkResult {
        self.write_frame(lines, overlay).map_err(|err| {
            log::warn!("display write failed: {}", err);
            SinkError::Unavailable
        })?;
        self.frames += 1;
        Ok(())
    }
}

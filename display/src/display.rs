use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use emu8::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use emu8::FrameBuffer;

/// # Display
/// The Chip-8 display is composed of 64x32 black/white pixels.
///
/// Frames are written to a terminal as text, two pixel rows per line of half-block characters,
/// so the whole screen fits in 64x16 cells.
/// The display only gets a call to `render` when the Chip-8 FrameBuffer is updated.
pub struct Display<W: Write> {
    out: W,
    in_place: bool,
}

impl<W: Write> Display<W> {
    /// Creates a new display that writes frames to `out`.
    ///
    /// # Arguments
    /// * `out` where frames are written, usually stdout
    /// * `in_place` whether each frame is drawn over the last one from the top left corner,
    ///   otherwise frames are appended one after another
    pub fn new(out: W, in_place: bool) -> Self {
        Display { out, in_place }
    }

    /// Formats a Chip-8 FrameBuffer as lines of text.
    ///
    /// Each character covers a pixel and the one below it:
    /// - both on -> `█`
    /// - only the top one on -> `▀`
    /// - only the bottom one on -> `▄`
    /// - both off -> ` `
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn frame_to_text(frame: &FrameBuffer) -> String {
        let mut text = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT / 2 * 3);
        for y in (0..DISPLAY_HEIGHT).step_by(2) {
            for x in 0..DISPLAY_WIDTH {
                text.push(match (frame.pixel(x, y), frame.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            text.push('\n');
        }
        text
    }

    /// Formats the Chip-8 FrameBuffer as text and writes it out.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn render(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        let text = Self::frame_to_text(frame);
        if self.in_place {
            queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
            // raw mode doesn't return the carriage on a newline, so every line is placed
            for (row, line) in (0u16..).zip(text.lines()) {
                queue!(self.out, MoveTo(0, row), Print(line))?;
            }
        } else {
            queue!(self.out, Print(text))?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(pixels: &[(usize, usize)]) -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        for &(x, y) in pixels {
            frame.blit(x, y, &[0x80], false);
        }
        frame
    }

    fn rendered(frame: &FrameBuffer, in_place: bool) -> Vec<u8> {
        let mut out = Vec::new();
        Display::new(&mut out, in_place).render(frame).unwrap();
        out
    }

    #[test]
    fn test_frame_to_text() {
        let frame = frame_with(&[(0, 0), (0, 1), (1, 0), (2, 1), (63, 31)]);
        let text = Display::<Vec<u8>>::frame_to_text(&frame);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), DISPLAY_HEIGHT / 2);
        assert!(lines.iter().all(|line| line.chars().count() == DISPLAY_WIDTH));
        assert!(lines[0].starts_with("█▀▄ "));
        assert!(lines[15].ends_with(" ▄"));
        assert!(lines[1].chars().all(|c| c == ' '));
    }

    #[test]
    fn test_render_appends_frame() {
        let frame = frame_with(&[(0, 0)]);
        let written = String::from_utf8(rendered(&frame, false)).unwrap();
        assert_eq!(written, Display::<Vec<u8>>::frame_to_text(&frame));
    }

    #[test]
    fn test_render_in_place_homes_and_clears() {
        let frame = frame_with(&[(0, 0)]);
        let written = rendered(&frame, true);

        let mut expected = Vec::new();
        queue!(expected, MoveTo(0, 0), Clear(ClearType::All), MoveTo(0, 0), Print("▀")).unwrap();
        assert!(written.starts_with(&expected));

        let mut last_row = Vec::new();
        queue!(last_row, MoveTo(0, 15)).unwrap();
        assert!(written
            .windows(last_row.len())
            .any(|window| window == last_row.as_slice()));
        assert!(!written.contains(&b'\n'));
    }
}

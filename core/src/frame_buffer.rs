use std::fmt;

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// # Frame Buffer
/// The contents of a single 64x32 monochrome Chip-8 frame.
///
/// Pixels are indexed as `[y][x]` and are either on or off. They only change through `clear`
/// and `blit`, which XORs sprites onto the frame.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    /// Whether the pixel at `(x, y)` is on; coordinates off the screen are never on.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool; DISPLAY_WIDTH]> {
        self.pixels.iter()
    }

    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().flatten().filter(|&&on| on).count()
    }

    /// XORs a sprite onto the frame with its top left corner at `(x, y)`.
    ///
    /// When clipping, pixels off the right or bottom edge are dropped, so a sprite whose origin is
    /// off the screen draws nothing. When wrapping, the origin is taken modulo the screen size and
    /// pixels hanging off an edge reappear on the opposite one.
    ///
    /// Returns whether any pixel was turned off.
    ///
    /// # Arguments
    /// * `x` horizontal position of the sprite's left edge
    /// * `y` vertical position of the sprite's top edge
    /// * `sprite` one byte per row, most significant bit leftmost
    /// * `wrap` whether pixels off the screen wrap around instead of being dropped
    pub fn blit(&mut self, x: usize, y: usize, sprite: &[u8], wrap: bool) -> bool {
        let (origin_x, origin_y) = if wrap {
            (x % DISPLAY_WIDTH, y % DISPLAY_HEIGHT)
        } else {
            (x, y)
        };
        let mut collided = false;

        for (row, byte) in sprite.iter().enumerate() {
            let py = origin_y + row;
            let py = match (py < DISPLAY_HEIGHT, wrap) {
                (true, _) => py,
                (false, true) => py % DISPLAY_HEIGHT,
                (false, false) => break,
            };
            for bit in 0..8 {
                let px = origin_x + bit;
                let px = match (px < DISPLAY_WIDTH, wrap) {
                    (true, _) => px,
                    (false, true) => px % DISPLAY_WIDTH,
                    (false, false) => break,
                };
                if (byte >> (7 - bit)) & 0x1 == 0x1 {
                    let pixel = &mut self.pixels[py][px];
                    collided |= *pixel;
                    *pixel = !*pixel;
                }
            }
        }

        collided
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&on| if on { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

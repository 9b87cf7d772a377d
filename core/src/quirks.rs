/// # Quirks
/// Behaviours that differ between Chip-8 interpreters and that some programs depend on.
///
/// The defaults match modern test suites:
/// - sprites are clipped at the edges of the screen
/// - `SHR`/`SHL` shift Vx in place
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// Sprite rows and columns that fall off the screen wrap around to the opposite edge.
    pub wrap_sprites: bool,
    /// `SHR`/`SHL` copy Vy into Vx before shifting (COSMAC VIP).
    pub shift_uses_vy: bool,
}

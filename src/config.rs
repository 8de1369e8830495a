//! Panel configuration and timing constants.

use embedded_graphics::pixelcolor::Rgb565;

use crate::orientation::Orientation;

/// ST7735S physical resolution (portrait).
pub const PANEL_WIDTH: u16 = 128;
pub const PANEL_HEIGHT: u16 = 160;

/// Bound on every command-transport wait loop and on each chunk wait.
pub const TRANSPORT_TIMEOUT_MS: u32 = 10;
/// Settle time after SWRESET before SLPOUT is accepted.
pub const RESET_SETTLE_MS: u32 = 150;
/// Settle time after SLPOUT before configuration commands.
pub const SLEEP_OUT_SETTLE_MS: u32 = 255;

/// Dark charcoal background and bright gray ink, RGB565.
pub const DARK_CHARCOAL: Rgb565 = Rgb565::new(6, 12, 6);
pub const BRIGHT_GRAY: Rgb565 = Rgb565::new(29, 58, 29);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub width: u16,
    pub height: u16,
    /// Controller RAM offsets of the visible area (module dependent).
    pub col_offset: u16,
    pub row_offset: u16,
    pub orientation: Orientation,
    pub background: Rgb565,
    pub foreground: Rgb565,
    pub timeout_ms: u32,
    pub reset_settle_ms: u32,
    pub sleep_out_settle_ms: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            col_offset: 0,
            row_offset: 0,
            orientation: Orientation::Landscape,
            background: DARK_CHARCOAL,
            foreground: BRIGHT_GRAY,
            timeout_ms: TRANSPORT_TIMEOUT_MS,
            reset_settle_ms: RESET_SETTLE_MS,
            sleep_out_settle_ms: SLEEP_OUT_SETTLE_MS,
        }
    }
}

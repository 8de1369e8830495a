//! Fixed-cell digit glyphs and the 1 bpp -> RGB565 row rasterizer.
//!
//! Each glyph is [`GLYPH_HEIGHT`] rows of [`GLYPH_WIDTH`] pixels, one bit per
//! pixel, most significant bit leftmost. A set bit is drawn with the
//! foreground colour, a clear bit with the background colour.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::IntoStorage;

use crate::config::{BRIGHT_GRAY, DARK_CHARCOAL};

pub const GLYPH_WIDTH: usize = 40;
pub const GLYPH_HEIGHT: usize = 49;
/// Bytes produced for one rasterized glyph row.
pub const GLYPH_ROW_BYTES: usize = GLYPH_WIDTH * 2;
const GLYPH_COUNT: usize = 14;

/// Foreground/background pair used when expanding bitmaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Rgb565,
    pub background: Rgb565,
}

impl Palette {
    pub const fn new(foreground: Rgb565, background: Rgb565) -> Self {
        Self { foreground, background }
    }

    #[inline]
    pub(crate) fn pixel(&self, set: bool) -> [u8; 2] {
        let c = if set { self.foreground } else { self.background };
        c.into_storage().to_be_bytes()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(BRIGHT_GRAY, DARK_CHARCOAL)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Glyph {
    Zero = 0,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Plus,
    Minus,
    Dot,
    Degree,
}

impl Glyph {
    const DIGITS: [Glyph; 10] = [
        Glyph::Zero,
        Glyph::One,
        Glyph::Two,
        Glyph::Three,
        Glyph::Four,
        Glyph::Five,
        Glyph::Six,
        Glyph::Seven,
        Glyph::Eight,
        Glyph::Nine,
    ];

    /// Glyph of a decimal digit (`0..=9`).
    pub fn digit(d: u8) -> Option<Self> {
        Self::DIGITS.get(d as usize).copied()
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => Self::digit(c as u8 - b'0'),
            '+' => Some(Glyph::Plus),
            '-' => Some(Glyph::Minus),
            '.' => Some(Glyph::Dot),
            '°' => Some(Glyph::Degree),
            _ => None,
        }
    }

    /// Raw bit pattern of one row.
    #[inline]
    pub fn row_bits(self, row: usize) -> u64 {
        GLYPH_ROWS[self as usize][row]
    }
}

/// Expand row `row` of `glyph` into `out[..GLYPH_ROW_BYTES]` as big-endian
/// RGB565, leftmost pixel first.
///
/// Panics if `row >= GLYPH_HEIGHT` or `out` is shorter than one glyph row.
pub fn rasterize_glyph_row(out: &mut [u8], glyph: Glyph, row: usize, palette: &Palette) {
    expand_bits(&mut out[..GLYPH_ROW_BYTES], glyph.row_bits(row), GLYPH_WIDTH, palette);
}

/// Write `width` pixels for the low `width` bits of `bits`, MSB first.
pub(crate) fn expand_bits(out: &mut [u8], bits: u64, width: usize, palette: &Palette) {
    let mut mask = 1u64 << (width - 1);
    for px in out.chunks_exact_mut(2).take(width) {
        px.copy_from_slice(&palette.pixel(bits & mask != 0));
        mask >>= 1;
    }
}

const GLYPH_ROWS: [[u64; GLYPH_HEIGHT]; GLYPH_COUNT] = [
    // Zero
    [
        0x0003FE0000, 0x001FFFC000, 0x007FFFF000, 0x00FFFFF800, 0x01FFFFFC00,
        0x03FE03FE00, 0x03F800FE00, 0x07F0007F00, 0x07E0003F00, 0x0FC0001F80,
        0x0FC0001F80, 0x0F80000F80, 0x1F80000FC0, 0x1F80000FC0, 0x1F80000FC0,
        0x1F800007C0, 0x3F000007C0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0,
        0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0,
        0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0,
        0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x1F00000FC0, 0x1F80000FC0,
        0x1F80000FC0, 0x1F80000FC0, 0x0F80000F80, 0x0FC0001F80, 0x0FC0001F80,
        0x07E0003F00, 0x07F0007F00, 0x03F800FE00, 0x03FE03FE00, 0x01FFFFFC00,
        0x00FFFFF800, 0x007FFFF000, 0x001FFFC000, 0x0003FE0000,
    ],
    // One
    [
        0x0000000000, 0x00007C0000, 0x00007C0000, 0x00007C0000, 0x0000FC0000,
        0x0003FC0000, 0x000FFC0000, 0x03FFFC0000, 0x03FFFC0000, 0x03FFFC0000,
        0x03FFFC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000,
        0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000,
        0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000,
        0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000,
        0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000,
        0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x0000FC0000,
        0x0000FC0000, 0x0000FC0000, 0x0000FC0000, 0x03FFFFFF00, 0x03FFFFFF00,
        0x03FFFFFF00, 0x03FFFFFF00, 0x03FFFFFF00, 0x0000000000,
    ],
    // Two
    [
        0x000FFC0000, 0x00FFFFC000, 0x07FFFFE000, 0x0FFFFFF800, 0x0FFFFFFC00,
        0x0FF807FE00, 0x0F8000FE00, 0x0E00007F00, 0x0800003F00, 0x0000003F80,
        0x0000001F80, 0x0000001F80, 0x0000001F80, 0x0000001F80, 0x0000001F80,
        0x0000001F80, 0x0000001F80, 0x0000003F00, 0x0000003F00, 0x0000007F00,
        0x0000007E00, 0x000000FE00, 0x000001FC00, 0x000001FC00, 0x000003F800,
        0x000007F000, 0x00000FE000, 0x00001FC000, 0x00003FC000, 0x00007F8000,
        0x0000FF0000, 0x0001FE0000, 0x0003F80000, 0x0007F00000, 0x000FE00000,
        0x003FC00000, 0x007F800000, 0x00FF000000, 0x01FE000000, 0x03FC000000,
        0x07F8000000, 0x1FE0000000, 0x1FC0000000, 0x1FFFFFFFE0, 0x1FFFFFFFE0,
        0x1FFFFFFFE0, 0x1FFFFFFFE0, 0x1FFFFFFFE0, 0x0000000000,
    ],
    // Three
    [
        0x000FFE0000, 0x00FFFFC000, 0x07FFFFF000, 0x0FFFFFF800, 0x0FFFFFFE00,
        0x0FF803FE00, 0x0FC000FF00, 0x0E00007F00, 0x0800003F80, 0x0000001F80,
        0x0000001F80, 0x0000001F80, 0x0000001F80, 0x0000001F80, 0x0000001F80,
        0x0000003F00, 0x0000003F00, 0x0000007E00, 0x000001FC00, 0x000007F800,
        0x0003FFE000, 0x0003FF8000, 0x0003FF8000, 0x0003FFF000, 0x0003FFF800,
        0x000003FE00, 0x000000FF00, 0x0000003F00, 0x0000001F80, 0x0000001F80,
        0x0000000FC0, 0x0000000FC0, 0x0000000FC0, 0x0000000FC0, 0x0000000FC0,
        0x0000000FC0, 0x0000000FC0, 0x0000000FC0, 0x0000001F80, 0x0000001F80,
        0x1000003F80, 0x1C00007F00, 0x1F8001FE00, 0x1FF007FE00, 0x1FFFFFFC00,
        0x1FFFFFF800, 0x0FFFFFE000, 0x01FFFF8000, 0x001FFC0000,
    ],
    // Four
    [
        0x0000000000, 0x000003F000, 0x000007F000, 0x00000FF000, 0x00001FF000,
        0x00003FF000, 0x00003FF000, 0x00007FF000, 0x0000FFF000, 0x0001FFF000,
        0x0003FBF000, 0x0007F3F000, 0x0007E3F000, 0x000FC3F000, 0x001F83F000,
        0x003F83F000, 0x007F03F000, 0x00FE03F000, 0x00FC03F000, 0x01F803F000,
        0x03F003F000, 0x07F003F000, 0x0FE003F000, 0x1FC003F000, 0x1F8003F000,
        0x3F0003F000, 0x7E0003F000, 0xFE0003F000, 0xFC0003F000, 0xF80003F000,
        0xFFFFFFFFE0, 0xFFFFFFFFE0, 0xFFFFFFFFE0, 0xFFFFFFFFE0, 0xFFFFFFFFE0,
        0x000003F000, 0x000003F000, 0x000003F000, 0x000003F000, 0x000003F000,
        0x000003F000, 0x000003F000, 0x000003F000, 0x000003F000, 0x000003F000,
        0x000003F000, 0x000003F000, 0x000003F000, 0x0000000000,
    ],
    // Five
    [
        0x03FFFFFFC0, 0x03FFFFFFC0, 0x03FFFFFFC0, 0x03FFFFFFC0, 0x03FFFFFFC0,
        0x03F0000000, 0x03F0000000, 0x03F0000000, 0x03F0000000, 0x03F0000000,
        0x03F0000000, 0x03F0000000, 0x03F0000000, 0x03F0000000, 0x03F0000000,
        0x03F0000000, 0x03F0000000, 0x03F0000000, 0x03FFFE0000, 0x03FFFFC000,
        0x03FFFFF000, 0x03FFFFF800, 0x03FFFFFE00, 0x038007FE00, 0x000000FF00,
        0x0000007F80, 0x0000003F80, 0x0000001F80, 0x0000001FC0, 0x0000000FC0,
        0x0000000FC0, 0x0000000FC0, 0x0000000FC0, 0x0000000FC0, 0x0000000FC0,
        0x0000000FC0, 0x0000000FC0, 0x0000001F80, 0x0000001F80, 0x0000003F80,
        0x0800003F00, 0x0E00007F00, 0x0FC001FE00, 0x0FF807FC00, 0x0FFFFFF800,
        0x0FFFFFF000, 0x0FFFFFE000, 0x01FFFF8000, 0x001FFC0000,
    ],
    // Six
    [
        0x00000FFC00, 0x0000FFFE00, 0x0003FFFE00, 0x000FFFFE00, 0x001FFFFE00,
        0x003FF00600, 0x007F800000, 0x00FE000000, 0x01FC000000, 0x03F8000000,
        0x03F0000000, 0x07E0000000, 0x07E0000000, 0x0FC0000000, 0x0FC0000000,
        0x0F80000000, 0x1F80000000, 0x1F80000000, 0x1F81FF8000, 0x1F0FFFF000,
        0x3F3FFFFC00, 0x3FFFFFFE00, 0x3FFFFFFF00, 0x3FFC01FF80, 0x3FE0003FC0,
        0x3F00001FC0, 0x3F00000FE0, 0x3F000007E0, 0x3F000007F0, 0x3F000003F0,
        0x3F000003F0, 0x3F000003F0, 0x3F000003F0, 0x3F000003F0, 0x1F800003F0,
        0x1F800003F0, 0x1F800003F0, 0x1F800007E0, 0x0FC00007E0, 0x0FE0000FE0,
        0x07E0000FC0, 0x07F0001FC0, 0x03FC007F80, 0x01FF01FF00, 0x00FFFFFE00,
        0x007FFFFC00, 0x003FFFF800, 0x000FFFE000, 0x0001FF0000,
    ],
    // Seven
    [
        0x0000000000, 0x1FFFFFFFE0, 0x1FFFFFFFE0, 0x1FFFFFFFE0, 0x1FFFFFFFE0,
        0x1FFFFFFFE0, 0x00000003E0, 0x00000007E0, 0x0000000FE0, 0x0000000FC0,
        0x0000001FC0, 0x0000001F80, 0x0000003F80, 0x0000003F00, 0x0000007F00,
        0x0000007E00, 0x000000FE00, 0x000000FC00, 0x000001F800, 0x000003F800,
        0x000003F000, 0x000007F000, 0x000007E000, 0x00000FE000, 0x00000FC000,
        0x00001FC000, 0x00001F8000, 0x00003F8000, 0x00003F0000, 0x00007F0000,
        0x0000FE0000, 0x0000FE0000, 0x0001FC0000, 0x0001FC0000, 0x0003F80000,
        0x0003F00000, 0x0007F00000, 0x0007E00000, 0x000FE00000, 0x000FC00000,
        0x001FC00000, 0x001F800000, 0x003F800000, 0x007F000000, 0x007F000000,
        0x00FE000000, 0x00FE000000, 0x01FC000000, 0x0000000000,
    ],
    // Eight
    [
        0x0003FF0000, 0x001FFFE000, 0x007FFFF800, 0x01FFFFFC00, 0x03FFFFFE00,
        0x07FE03FF00, 0x07F0007F80, 0x0FE0003F80, 0x0FC0001F80, 0x1F80001FC0,
        0x1F80000FC0, 0x1F80000FC0, 0x1F80000FC0, 0x1F80000FC0, 0x1FC0000FC0,
        0x1FC0001F80, 0x0FE0001F80, 0x0FF0001F00, 0x07FC003F00, 0x03FF007E00,
        0x01FFE1FC00, 0x00FFFFF800, 0x003FFFE000, 0x007FFFE000, 0x00FDFFF800,
        0x03F83FFC00, 0x07E007FE00, 0x07E001FF00, 0x0FC0007F80, 0x1F80003FC0,
        0x1F80000FC0, 0x3F00000FE0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0,
        0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x3F80000FE0, 0x1F80000FC0,
        0x1FC0001FC0, 0x0FE0003F80, 0x0FF8007F80, 0x07FE01FF00, 0x03FFFFFE00,
        0x01FFFFFC00, 0x00FFFFF000, 0x003FFFC000, 0x0003FE0000,
    ],
    // Nine
    [
        0x0003FE0000, 0x001FFF8000, 0x007FFFE000, 0x00FFFFF800, 0x01FFFFFC00,
        0x03FE07FE00, 0x07F000FE00, 0x0FE0007F00, 0x0FC0003F80, 0x1FC0001F80,
        0x1F80001F80, 0x1F80000FC0, 0x3F00000FC0, 0x3F00000FC0, 0x3F000007C0,
        0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0, 0x3F000007E0,
        0x3F800007E0, 0x1F800007E0, 0x1FC00007E0, 0x0FE00007E0, 0x0FF0001FE0,
        0x07FC01FFE0, 0x03FFFFFFE0, 0x01FFFFFFE0, 0x00FFFFE7E0, 0x003FFF87C0,
        0x0007FC0FC0, 0x0000000FC0, 0x0000000FC0, 0x0000000F80, 0x0000001F80,
        0x0000001F80, 0x0000001F00, 0x0000003F00, 0x0000007E00, 0x000000FE00,
        0x000001FC00, 0x000003F800, 0x000007F800, 0x01803FF000, 0x01FFFFE000,
        0x01FFFF8000, 0x01FFFF0000, 0x01FFF80000, 0x00FFC00000,
    ],
    // Plus
    [
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x00007C0000, 0x00007C0000,
        0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000,
        0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000,
        0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000,
        0xFFFFFFFFFE, 0xFFFFFFFFFE, 0xFFFFFFFFFE, 0xFFFFFFFFFE, 0xFFFFFFFFFE,
        0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000,
        0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000,
        0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000, 0x00007C0000,
        0x00007C0000, 0x00007C0000, 0x0000000000, 0x0000000000,
    ],
    // Minus
    [
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x007FFFF800, 0x007FFFF800, 0x007FFFF800, 0x007FFFF800, 0x007FFFF800,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
    ],
    // Dot
    [
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0001FC0000,
        0x0001FC0000, 0x0001FC0000, 0x0001FC0000, 0x0001FC0000, 0x0001FC0000,
        0x0001FC0000, 0x0001FC0000, 0x0001FC0000, 0x0000000000,
    ],
    // Degree
    [
        0x0001FC0000, 0x000FFF8000, 0x001FFFC000, 0x003FFFE000, 0x007FFFF000,
        0x00FF07F800, 0x01FC01FC00, 0x01F800FC00, 0x01F0007C00, 0x03F0007E00,
        0x03E0003E00, 0x03E0003E00, 0x03E0003E00, 0x03E0003E00, 0x03E0003E00,
        0x03F0007E00, 0x01F0007C00, 0x01F800FC00, 0x01FC01FC00, 0x00FF07F800,
        0x007FFFF000, 0x003FFFE000, 0x001FFFC000, 0x000FFF8000, 0x0001FC0000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
        0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000,
    ],
];

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::RgbColor;

    use super::*;

    fn decode(row: &[u8], palette: &Palette) -> u64 {
        let fg = palette.foreground.into_storage();
        row.chunks_exact(2)
            .fold(0u64, |acc, px| (acc << 1) | (u16::from_be_bytes([px[0], px[1]]) == fg) as u64)
    }

    #[test]
    fn rows_decode_back_to_their_bit_pattern() {
        let palette = Palette::new(Rgb565::WHITE, Rgb565::BLACK);
        let mut buf = [0u8; GLYPH_ROW_BYTES];
        for &glyph in Glyph::DIGITS.iter().chain(&[Glyph::Plus, Glyph::Minus, Glyph::Dot, Glyph::Degree]) {
            for row in 0..GLYPH_HEIGHT {
                rasterize_glyph_row(&mut buf, glyph, row, &palette);
                assert_eq!(decode(&buf, &palette), glyph.row_bits(row), "{:?} row {}", glyph, row);
            }
        }
    }

    #[test]
    fn colours_are_big_endian() {
        let palette = Palette::new(Rgb565::new(0x1F, 0, 0x01), Rgb565::new(0, 0x3F, 0));
        let mut buf = [0u8; GLYPH_ROW_BYTES];
        // Widest row of '0': bit 37 is set, bit 39 is not.
        rasterize_glyph_row(&mut buf, Glyph::Zero, 20, &palette);
        assert_eq!(&buf[0..2], &[0x07, 0xE0]);
        assert_eq!(&buf[4..6], &[0xF8, 0x01]);
    }

    #[test]
    fn only_one_row_is_written() {
        let mut buf = [0xAAu8; GLYPH_ROW_BYTES + 4];
        rasterize_glyph_row(&mut buf, Glyph::Eight, 0, &Palette::default());
        assert_eq!(&buf[GLYPH_ROW_BYTES..], &[0xAA; 4]);
    }

    #[test]
    fn char_mapping() {
        assert_eq!(Glyph::from_char('7'), Some(Glyph::Seven));
        assert_eq!(Glyph::from_char('°'), Some(Glyph::Degree));
        assert_eq!(Glyph::from_char('-'), Some(Glyph::Minus));
        assert_eq!(Glyph::from_char('x'), None);
        assert_eq!(Glyph::digit(10), None);
    }

    #[test]
    fn glyphs_fit_their_cell() {
        for glyph in GLYPH_ROWS.iter() {
            for &row in glyph.iter() {
                assert_eq!(row >> GLYPH_WIDTH, 0);
            }
        }
    }
}

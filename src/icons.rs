//! 32-pixel wide monochrome icons.

use crate::glyphs::{expand_bits, Palette};

pub const ICON_WIDTH: usize = 32;
pub const ICON_ROW_BYTES: usize = ICON_WIDTH * 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Icon {
    rows: &'static [u32],
}

impl Icon {
    pub const fn new(rows: &'static [u32]) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn row_bits(&self, row: usize) -> u32 {
        self.rows[row]
    }
}

/// Double arrow pair (horizontal above vertical) shown next to the readout.
pub const ARROWS: Icon = Icon::new(&ARROWS_ROWS);

/// Expand one icon row into `out[..ICON_ROW_BYTES]`, big-endian RGB565.
pub fn rasterize_icon_row(out: &mut [u8], icon: &Icon, row: usize, palette: &Palette) {
    expand_bits(&mut out[..ICON_ROW_BYTES], icon.row_bits(row) as u64, ICON_WIDTH, palette);
}

const ARROWS_ROWS: [u32; 64] = [
    0x00000000, 0x00000000, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00400200, 0x00C00300,
    0x01C00380, 0x03FFFFC0, 0x07FFFFE0, 0x0FFFFFF0,
    0x0FFFFFF0, 0x07FFFFE0, 0x03FFFFC0, 0x01C00380,
    0x00C00300, 0x00400200, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000,
    0x00018000, 0x0003C000, 0x0007E000, 0x000FF000,
    0x001FF800, 0x003FFC00, 0x0007E000, 0x0007E000,
    0x0007E000, 0x0007E000, 0x0007E000, 0x0007E000,
    0x0007E000, 0x0007E000, 0x0007E000, 0x0007E000,
    0x0007E000, 0x0007E000, 0x003FFC00, 0x001FF800,
    0x000FF000, 0x0007E000, 0x0003C000, 0x00018000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000,
];

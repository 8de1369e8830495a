//! Streaming transfer bookkeeping.
//!
//! The pixel payload of a window (a full-screen fill, a run of glyphs) is far
//! larger than the scratch buffer. A [`Transfer`] cuts the payload into
//! chunks no larger than the buffer; a [`PixelSource`] refills the buffer for
//! each chunk. The DMA side lives in [`crate::panel::Panel::stream_pixels`].

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::IntoStorage;

use crate::glyphs::{rasterize_glyph_row, Glyph, Palette, GLYPH_HEIGHT, GLYPH_ROW_BYTES};
use crate::icons::{rasterize_icon_row, Icon, ICON_ROW_BYTES};

/// Scratch buffer capacity in pixels. A whole number of glyph rows, icon rows
/// and panel rows so no source ever needs a rounded-down chunk.
pub const SCRATCH_PIXELS: usize = 640;
pub const SCRATCH_BYTES: usize = SCRATCH_PIXELS * 2;

/// DMA source buffer. Owned by the panel session, written only between
/// chunks.
/// `repr(C)` puts the bytes at the struct's address, which is what the
/// session hands to the DMA channel.
#[repr(C, align(32))]
pub struct ScratchBuffer([u8; SCRATCH_BYTES]);

impl ScratchBuffer {
    pub const fn new() -> Self {
        Self([0u8; SCRATCH_BYTES])
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// One DMA burst: `len` bytes starting `offset` bytes into the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub offset: usize,
    pub len: usize,
}

/// Remaining-bytes state of one streaming transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    total: usize,
    remaining: usize,
    capacity: usize,
}

impl Transfer {
    pub fn new(total: usize, capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self { total, remaining: total, capacity }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Next chunk to send, without consuming it.
    pub fn peek_chunk(&self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }
        Some(Chunk {
            offset: self.total - self.remaining,
            len: self.remaining.min(self.capacity),
        })
    }

    /// Account for a chunk whose completion has been observed.
    pub fn complete(&mut self, chunk: Chunk) {
        debug_assert_eq!(Some(chunk), self.peek_chunk());
        self.remaining -= chunk.len;
    }
}

impl Iterator for Transfer {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let chunk = self.peek_chunk()?;
        self.complete(chunk);
        Some(chunk)
    }
}

/// Producer of the bytes of one streaming transfer.
pub trait PixelSource {
    /// Chunks are cut on multiples of this many bytes.
    fn granule(&self) -> usize {
        2
    }

    /// Payload bytes the source can produce. `None` for sources without an
    /// end, such as a constant colour.
    fn payload_len(&self) -> Option<usize> {
        None
    }

    /// Write payload bytes `offset..offset + buf.len()` into `buf`. The
    /// range never reaches past [`Self::payload_len`].
    fn fill(&mut self, offset: usize, buf: &mut [u8]);
}

/// Constant colour. The buffer is only written once per transfer: later
/// chunks are never longer than the first one.
pub struct SolidFill {
    pixel: [u8; 2],
    primed: usize,
}

impl SolidFill {
    pub fn new(color: Rgb565) -> Self {
        Self { pixel: color.into_storage().to_be_bytes(), primed: 0 }
    }
}

impl PixelSource for SolidFill {
    fn fill(&mut self, _offset: usize, buf: &mut [u8]) {
        if self.primed >= buf.len() {
            return;
        }
        for px in buf.chunks_exact_mut(2) {
            px.copy_from_slice(&self.pixel);
        }
        self.primed = buf.len();
    }
}

/// Successive slices of a raw big-endian RGB565 payload.
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl PixelSource for SliceSource<'_> {
    fn payload_len(&self) -> Option<usize> {
        Some(self.data.len())
    }

    fn fill(&mut self, offset: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
    }
}

/// Glyphs laid side by side; each payload row is one row of every glyph.
pub struct GlyphRun<'a> {
    glyphs: &'a [Glyph],
    palette: Palette,
}

impl<'a> GlyphRun<'a> {
    pub fn new(glyphs: &'a [Glyph], palette: Palette) -> Self {
        Self { glyphs, palette }
    }
}

impl PixelSource for GlyphRun<'_> {
    fn granule(&self) -> usize {
        self.glyphs.len() * GLYPH_ROW_BYTES
    }

    fn payload_len(&self) -> Option<usize> {
        Some(self.granule() * GLYPH_HEIGHT)
    }

    fn fill(&mut self, offset: usize, buf: &mut [u8]) {
        let row_bytes = self.granule();
        let first_row = offset / row_bytes;
        for (i, line) in buf.chunks_exact_mut(row_bytes).enumerate() {
            for (cell, glyph) in line.chunks_exact_mut(GLYPH_ROW_BYTES).zip(self.glyphs) {
                rasterize_glyph_row(cell, *glyph, first_row + i, &self.palette);
            }
        }
    }
}

pub struct IconRows<'a> {
    icon: &'a Icon,
    palette: Palette,
}

impl<'a> IconRows<'a> {
    pub fn new(icon: &'a Icon, palette: Palette) -> Self {
        Self { icon, palette }
    }
}

impl PixelSource for IconRows<'_> {
    fn granule(&self) -> usize {
        ICON_ROW_BYTES
    }

    fn payload_len(&self) -> Option<usize> {
        Some(self.icon.height() * ICON_ROW_BYTES)
    }

    fn fill(&mut self, offset: usize, buf: &mut [u8]) {
        let first_row = offset / ICON_ROW_BYTES;
        for (i, line) in buf.chunks_exact_mut(ICON_ROW_BYTES).enumerate() {
            rasterize_icon_row(line, self.icon, first_row + i, &self.palette);
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::RgbColor;

    use super::*;

    #[test]
    fn chunk_count_is_ceiling_of_payload_over_capacity() {
        for &(total, cap) in &[(1usize, 8usize), (8, 8), (9, 8), (40960, 1280), (40962, 1280), (3920, 1280)] {
            let chunks: Vec<Chunk> = Transfer::new(total, cap).collect();
            assert_eq!(chunks.len(), total.div_ceil(cap));
            assert_eq!(chunks.iter().map(|c| c.len).sum::<usize>(), total);
            assert!(chunks.iter().all(|c| c.len <= cap));
        }
    }

    #[test]
    fn remaining_never_grows_and_ends_at_zero() {
        let mut t = Transfer::new(3000, 1280);
        let mut last = t.remaining();
        while let Some(chunk) = t.peek_chunk() {
            assert_eq!(chunk.len, last.min(1280));
            t.complete(chunk);
            assert!(t.remaining() < last);
            last = t.remaining();
        }
        assert_eq!(t.remaining(), 0);
        assert_eq!(t.peek_chunk(), None);
    }

    #[test]
    fn offsets_are_contiguous() {
        let mut expected = 0;
        for chunk in Transfer::new(5000, 1280) {
            assert_eq!(chunk.offset, expected);
            expected += chunk.len;
        }
        assert_eq!(expected, 5000);
    }

    #[test]
    fn solid_fill_writes_only_once() {
        let mut source = SolidFill::new(Rgb565::RED);
        let mut buf = [0u8; 8];
        source.fill(0, &mut buf);
        assert_eq!(buf, [0xF8, 0x00, 0xF8, 0x00, 0xF8, 0x00, 0xF8, 0x00]);
        buf[0] = 0;
        source.fill(8, &mut buf[..4]);
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn glyph_run_interleaves_rows() {
        let palette = Palette::new(Rgb565::WHITE, Rgb565::BLACK);
        let glyphs = [Glyph::One, Glyph::Minus];
        let mut source = GlyphRun::new(&glyphs, palette);
        assert_eq!(source.granule(), 2 * GLYPH_ROW_BYTES);

        let mut buf = [0u8; 2 * GLYPH_ROW_BYTES * 3];
        source.fill(2 * GLYPH_ROW_BYTES * 24, &mut buf);

        let mut expected = [0u8; GLYPH_ROW_BYTES];
        for (i, line) in buf.chunks_exact(2 * GLYPH_ROW_BYTES).enumerate() {
            rasterize_glyph_row(&mut expected, Glyph::One, 24 + i, &palette);
            assert_eq!(&line[..GLYPH_ROW_BYTES], &expected[..]);
            rasterize_glyph_row(&mut expected, Glyph::Minus, 24 + i, &palette);
            assert_eq!(&line[GLYPH_ROW_BYTES..], &expected[..]);
        }
        assert!(24 + 3 <= GLYPH_HEIGHT);
    }

    #[test]
    fn slice_source_copies_the_matching_window() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut source = SliceSource::new(&data);
        let mut buf = [0u8; 4];
        source.fill(100, &mut buf);
        assert_eq!(buf, [100, 101, 102, 103]);
        assert_eq!(source.payload_len(), Some(256));
    }

    #[test]
    fn bounded_sources_report_their_payload() {
        let palette = Palette::default();
        let glyphs = [Glyph::Two, Glyph::Dot, Glyph::Five];
        assert_eq!(GlyphRun::new(&glyphs, palette).payload_len(), Some(3 * GLYPH_ROW_BYTES * GLYPH_HEIGHT));
        assert_eq!(
            IconRows::new(&crate::icons::ARROWS, palette).payload_len(),
            Some(crate::icons::ARROWS.height() * ICON_ROW_BYTES)
        );
        assert_eq!(SolidFill::new(Rgb565::RED).payload_len(), None);
    }

    #[test]
    fn scratch_holds_whole_rows() {
        assert_eq!(SCRATCH_BYTES % GLYPH_ROW_BYTES, 0);
        assert_eq!(SCRATCH_BYTES % ICON_ROW_BYTES, 0);
        assert_eq!(SCRATCH_BYTES % (crate::config::PANEL_WIDTH as usize * 2), 0);
        assert_eq!(SCRATCH_BYTES % (crate::config::PANEL_HEIGHT as usize * 2), 0);
    }
}

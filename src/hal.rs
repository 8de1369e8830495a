//! Hardware seams of the panel driver.
//!
//! The driver only needs a handful of register-level operations from the SPI
//! peripheral and the DMA channel feeding it. Boards implement these traits
//! (see [`crate::bus`] for an embedded-hal backed implementation); tests plug
//! in recording mocks.

/// Byte-level view of the SPI peripheral driving the panel.
pub trait SpiPort {
    fn enable(&mut self);
    fn disable(&mut self);

    /// Transmit register empty: the next byte may be written.
    fn is_tx_empty(&mut self) -> bool;
    fn write_byte(&mut self, byte: u8);
    fn read_byte(&mut self) -> u8;

    /// Peripheral still shifting data out.
    fn is_busy(&mut self) -> bool;

    /// Clear a receive overrun left behind by write-only traffic.
    fn clear_overrun(&mut self);

    /// Route the TX-empty request line to the DMA channel.
    fn set_tx_dma(&mut self, enabled: bool);
}

/// DMA channel moving the scratch buffer into the SPI data register.
pub trait DmaChannel {
    /// Program the memory source address. Called once when the session is
    /// built; `source` stays valid for the session's lifetime.
    fn bind_source(&mut self, source: *const u8);

    fn clear_flags(&mut self);
    fn set_length(&mut self, bytes: usize);
    fn enable(&mut self);
    fn disable(&mut self);

    fn is_complete(&mut self) -> bool;
    fn has_error(&mut self) -> bool;
}

/// Monotonic millisecond counter.
pub trait Monotonic {
    fn now_ms(&self) -> u32;

    /// At least `span_ms` have passed since `since`. Wrapping-safe.
    #[inline]
    fn has_elapsed(&self, since: u32, span_ms: u32) -> bool {
        self.now_ms().wrapping_sub(since) >= span_ms
    }
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

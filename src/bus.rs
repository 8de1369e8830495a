//! [`SpiPort`] and [`DmaChannel`] on top of an embedded-hal `SpiBus`.
//!
//! On the ESP32-S3 the HAL owns the GDMA channel and its interrupt, so the
//! register-level seams are emulated: byte writes go straight to the bus and a
//! "DMA burst" is one blocking bus write of the scratch buffer, after which
//! the completion signal is raised the same way the interrupt handler would.
//!
//! The bus sits in a `critical_section::Mutex` so the port and the channel can
//! share it.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::hal::{DmaChannel, SpiPort};
use crate::signal::CompletionSignal;

pub struct SharedBus<B> {
    inner: Mutex<RefCell<Option<B>>>,
}

impl<B> SharedBus<B> {
    pub const fn new() -> Self {
        Self { inner: Mutex::new(RefCell::new(None)) }
    }

    pub fn install(&self, bus: B) {
        critical_section::with(|cs| {
            self.inner.borrow_ref_mut(cs).replace(bus);
        });
    }

    /// Run `f` on the bus. `None` when no bus is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<B> Default for SharedBus<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-level port. Chip select is asserted while the port is enabled.
///
/// A bus or pin error latches `faulted` until the next `enable`; while
/// latched the port reports "not ready", so the transport's bounded waits
/// expire and surface the failure as a timeout.
pub struct BusPort<'a, B, CS> {
    bus: &'a SharedBus<B>,
    cs: CS,
    faulted: bool,
}

impl<'a, B, CS> BusPort<'a, B, CS>
where
    B: SpiBus<u8>,
    CS: OutputPin,
{
    pub fn new(bus: &'a SharedBus<B>, mut cs: CS) -> Self {
        let faulted = cs.set_high().is_err();
        Self { bus, cs, faulted }
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    fn bus_op(&mut self, f: impl FnOnce(&mut B) -> Result<(), B::Error>) {
        let ok = matches!(self.bus.with(f), Some(Ok(())));
        self.faulted |= !ok;
    }
}

impl<B, CS> SpiPort for BusPort<'_, B, CS>
where
    B: SpiBus<u8>,
    CS: OutputPin,
{
    fn enable(&mut self) {
        self.faulted = self.cs.set_low().is_err();
    }

    fn disable(&mut self) {
        self.bus_op(|bus| bus.flush());
        if self.cs.set_high().is_err() {
            self.faulted = true;
        }
    }

    fn is_tx_empty(&mut self) -> bool {
        !self.faulted
    }

    fn write_byte(&mut self, byte: u8) {
        self.bus_op(|bus| bus.write(&[byte]));
    }

    fn read_byte(&mut self) -> u8 {
        let mut word = [0u8; 1];
        self.bus_op(|bus| bus.read(&mut word));
        word[0]
    }

    fn is_busy(&mut self) -> bool {
        self.bus_op(|bus| bus.flush());
        self.faulted
    }

    // Write-only traffic; the HAL discards received bytes.
    fn clear_overrun(&mut self) {}

    fn set_tx_dma(&mut self, _enabled: bool) {}
}

/// Burst engine on the shared bus.
pub struct BusDma<'a, B> {
    bus: &'a SharedBus<B>,
    signal: &'a CompletionSignal,
    source: *const u8,
    len: usize,
    complete: bool,
    error: bool,
}

impl<'a, B> BusDma<'a, B>
where
    B: SpiBus<u8>,
{
    pub fn new(bus: &'a SharedBus<B>, signal: &'a CompletionSignal) -> Self {
        Self {
            bus,
            signal,
            source: core::ptr::null(),
            len: 0,
            complete: false,
            error: false,
        }
    }
}

impl<B> DmaChannel for BusDma<'_, B>
where
    B: SpiBus<u8>,
{
    fn bind_source(&mut self, source: *const u8) {
        self.source = source;
    }

    fn clear_flags(&mut self) {
        self.complete = false;
        self.error = false;
    }

    fn set_length(&mut self, bytes: usize) {
        self.len = bytes;
    }

    fn enable(&mut self) {
        let ok = if self.source.is_null() || self.len == 0 {
            false
        } else {
            // SAFETY: `source` is the session's scratch buffer, bound once at
            // construction and borrowed for the whole session. The streaming
            // engine writes it only through this same pointer, never sets a
            // length beyond its capacity and does not touch the buffer until
            // this burst has been observed complete.
            let data = unsafe { core::slice::from_raw_parts(self.source, self.len) };
            matches!(
                self.bus.with(|bus| bus.write(data).and_then(|_| bus.flush())),
                Some(Ok(()))
            )
        };
        self.complete = ok;
        self.error = !ok;
        self.signal.notify();
    }

    fn disable(&mut self) {}

    fn is_complete(&mut self) -> bool {
        self.complete
    }

    fn has_error(&mut self) -> bool {
        self.error
    }
}

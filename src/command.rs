//! Command transport: register commands clocked out byte by byte.
//!
//! Frame on the wire: D/C low + register byte, then D/C high + parameter
//! bytes. Every wait on the peripheral is bounded by the transport timeout,
//! and the peripheral is always disabled again before returning.

use embedded_hal::digital::OutputPin;

use crate::error::{Error, ErrorKind};
use crate::hal::{Monotonic, SpiPort};

/// Largest parameter list a single command may carry.
pub const MAX_PARAMETERS: usize = 16;

/// ST7735S command set (subset used by the driver and its script).
pub mod reg {
    pub const NOP: u8 = 0x00;
    pub const SWRESET: u8 = 0x01;
    pub const SLPIN: u8 = 0x10;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVOFF: u8 = 0x20;
    pub const INVON: u8 = 0x21;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const FRMCTR1: u8 = 0xB1;
    pub const FRMCTR2: u8 = 0xB2;
    pub const FRMCTR3: u8 = 0xB3;
    pub const INVCTR: u8 = 0xB4;
    pub const PWCTR1: u8 = 0xC0;
    pub const PWCTR2: u8 = 0xC1;
    pub const PWCTR3: u8 = 0xC2;
    pub const PWCTR4: u8 = 0xC3;
    pub const PWCTR5: u8 = 0xC4;
    pub const VMCTR1: u8 = 0xC5;
    pub const GMCTRP1: u8 = 0xE0;
    pub const GMCTRN1: u8 = 0xE1;
}

/// One controller command: register, parameter count and parameter bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command<'a> {
    pub register: u8,
    pub count: usize,
    pub parameters: Option<&'a [u8]>,
}

impl<'a> Command<'a> {
    pub const fn bare(register: u8) -> Self {
        Self { register, count: 0, parameters: None }
    }

    pub const fn with(register: u8, parameters: &'a [u8]) -> Self {
        Self { register, count: parameters.len(), parameters: Some(parameters) }
    }

    /// Parameter bytes to clock out, after checking the descriptor.
    /// A zero count never looks at the parameter slice.
    fn payload(&self) -> Result<&'a [u8], ErrorKind> {
        if self.count > MAX_PARAMETERS {
            return Err(ErrorKind::TooManyParameters);
        }
        if self.count == 0 {
            return Ok(&[]);
        }
        match self.parameters {
            Some(p) if p.len() >= self.count => Ok(&p[..self.count]),
            _ => Err(ErrorKind::InvalidParameters),
        }
    }
}

/// SPI port plus data/command line.
pub struct Transport<S, DC> {
    spi: Option<S>,
    dc: DC,
    timeout_ms: u32,
}

impl<S, DC> Transport<S, DC>
where
    S: SpiPort,
    DC: OutputPin,
{
    pub fn new(spi: S, dc: DC, timeout_ms: u32) -> Self {
        Self { spi: Some(spi), dc, timeout_ms }
    }

    pub fn is_bound(&self) -> bool {
        self.spi.is_some()
    }

    pub fn bind(&mut self, spi: S) {
        self.spi = Some(spi);
    }

    /// Hand the SPI port back; further commands fail with `NoTransport`.
    pub fn release(&mut self) -> Option<S> {
        self.spi.take()
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Send `register` with the first `count` bytes of `parameters`.
    pub fn send_command<C: Monotonic>(
        &mut self,
        clock: &C,
        register: u8,
        parameters: Option<&[u8]>,
        count: usize,
    ) -> Result<(), Error> {
        self.send(clock, &Command { register, count, parameters })
    }

    pub fn send<C: Monotonic>(&mut self, clock: &C, command: &Command<'_>) -> Result<(), Error> {
        let spi = self.spi.as_mut().ok_or(ErrorKind::NoTransport)?;
        let payload = command.payload()?;

        self.dc.set_low().map_err(|_| ErrorKind::Pin)?;
        spi.enable();
        let result = Self::clock_out(spi, &mut self.dc, clock, self.timeout_ms, command.register, payload);
        spi.disable();
        result.map_err(Error::from)
    }

    fn clock_out<C: Monotonic>(
        spi: &mut S,
        dc: &mut DC,
        clock: &C,
        timeout_ms: u32,
        register: u8,
        payload: &[u8],
    ) -> Result<(), ErrorKind> {
        wait_until(clock, timeout_ms, || spi.is_tx_empty())?;
        spi.write_byte(register);

        dc.set_high().map_err(|_| ErrorKind::Pin)?;
        for &byte in payload {
            wait_until(clock, timeout_ms, || spi.is_tx_empty())?;
            spi.write_byte(byte);
        }

        wait_until(clock, timeout_ms, || !spi.is_busy())?;
        spi.clear_overrun();
        Ok(())
    }

    /// Prepare the port for a DMA-fed pixel stream: D/C high, peripheral on,
    /// DMA request line routed.
    pub(crate) fn begin_stream(&mut self) -> Result<(), Error> {
        let spi = self.spi.as_mut().ok_or(ErrorKind::NoTransport)?;
        self.dc.set_high().map_err(|_| ErrorKind::Pin)?;
        spi.enable();
        Ok(())
    }

    pub(crate) fn start_chunk(&mut self) {
        if let Some(spi) = self.spi.as_mut() {
            spi.set_tx_dma(true);
        }
    }

    /// Drop the DMA request line and switch the peripheral off.
    pub(crate) fn end_stream(&mut self) {
        if let Some(spi) = self.spi.as_mut() {
            spi.set_tx_dma(false);
            spi.disable();
        }
    }

    /// Wait for the last streamed byte to leave the shifter.
    pub(crate) fn drain<C: Monotonic>(&mut self, clock: &C) -> Result<(), Error> {
        let timeout_ms = self.timeout_ms;
        let spi = self.spi.as_mut().ok_or(ErrorKind::NoTransport)?;
        wait_until(clock, timeout_ms, || !spi.is_busy())?;
        spi.clear_overrun();
        Ok(())
    }
}

/// Spin until `ready` holds, at most `timeout_ms` from the call. Every wait
/// of a frame gets its own deadline.
fn wait_until<C: Monotonic>(clock: &C, timeout_ms: u32, mut ready: impl FnMut() -> bool) -> Result<(), ErrorKind> {
    let start = clock.now_ms();
    while !ready() {
        if clock.has_elapsed(start, timeout_ms) {
            return Err(ErrorKind::Timeout);
        }
    }
    Ok(())
}

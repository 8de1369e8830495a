//! ST7735S panel session: controller state machine, window addressing and
//! the DMA streaming engine.
//!
//! The session is driven by a single worker calling [`Panel::step`] in its
//! main loop. Bring-up runs as a sequence of non-blocking steps (reset,
//! sleep-out, configuration); once `Idle`, each step services one queued
//! [`Request`]. The only place the worker waits is inside a chunk transfer,
//! on the [`CompletionSignal`] raised by the DMA interrupt.

use core::marker::PhantomData;
use core::ptr::NonNull;
use core::sync::atomic::{compiler_fence, Ordering};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::digital::OutputPin;

use crate::command::{reg, Command, Transport};
use crate::config::PanelConfig;
use crate::error::{Error, ErrorKind, Operation, ResultExt};
use crate::glyphs::{Glyph, Palette, GLYPH_HEIGHT, GLYPH_ROW_BYTES, GLYPH_WIDTH};
use crate::hal::{DmaChannel, Monotonic, SpiPort};
use crate::icons::{Icon, ICON_WIDTH};
use crate::logging::diag;
use crate::orientation::{Geometry, Orientation};
use crate::request::{Request, RequestQueue, Window};
use crate::script::CONFIGURATION_SCRIPT;
use crate::signal::CompletionSignal;
use crate::transfer::{
    GlyphRun, IconRows, PixelSource, ScratchBuffer, SliceSource, SolidFill, Transfer, SCRATCH_BYTES,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelState {
    Startup,
    WaitingReset { since: u32 },
    ExitingSleep,
    WaitingSleepOut { since: u32 },
    Configuring,
    Idle,
    Error,
}

/// Everything a session is built from.
pub struct PanelParts<'a, S, DC, BL, D, C> {
    pub spi: S,
    pub dc: DC,
    pub backlight: BL,
    pub dma: D,
    pub clock: C,
    pub signal: &'a CompletionSignal,
    pub scratch: &'a mut ScratchBuffer,
    pub requests: &'a RequestQueue,
}

pub struct Panel<'a, S, DC, BL, D, C> {
    transport: Transport<S, DC>,
    backlight: BL,
    dma: D,
    clock: C,
    signal: &'a CompletionSignal,
    /// Scratch buffer base. The DMA channel holds a copy of this pointer, so
    /// the CPU fills go through it too, never through a `&mut` to the buffer.
    scratch: NonNull<u8>,
    _scratch: PhantomData<&'a mut ScratchBuffer>,
    requests: &'a RequestQueue,
    config: PanelConfig,
    palette: Palette,
    state: PanelState,
    geometry: Option<Geometry>,
    backlight_on: bool,
    fault: Option<Error>,
}

impl<'a, S, DC, BL, D, C> Panel<'a, S, DC, BL, D, C>
where
    S: SpiPort,
    DC: OutputPin,
    BL: OutputPin,
    D: DmaChannel,
    C: Monotonic,
{
    pub fn new(parts: PanelParts<'a, S, DC, BL, D, C>, config: PanelConfig) -> Self {
        let PanelParts { spi, dc, backlight, mut dma, clock, signal, scratch, requests } = parts;

        // DMA reads straight out of the scratch buffer; the address never changes.
        let scratch = NonNull::from(scratch).cast::<u8>();
        dma.bind_source(scratch.as_ptr());

        Self {
            transport: Transport::new(spi, dc, config.timeout_ms),
            backlight,
            dma,
            clock,
            signal,
            scratch,
            _scratch: PhantomData,
            requests,
            palette: Palette::new(config.foreground, config.background),
            config,
            state: PanelState::Startup,
            geometry: None,
            backlight_on: false,
            fault: None,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == PanelState::Idle
    }

    /// Current orientation and logical size; `None` until the first
    /// orientation has been applied.
    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    /// Error that moved the session into `Error`.
    pub fn fault(&self) -> Option<&Error> {
        self.fault.as_ref()
    }

    pub fn requests(&self) -> &'a RequestQueue {
        self.requests
    }

    /// Queue a request for the worker.
    pub fn submit(&self, request: Request) -> Result<(), Error> {
        self.requests.push(request).context(Operation::Request)
    }

    /// Leave `Error` (or any state) and run the whole bring-up again.
    pub fn restart(&mut self) {
        diag!("restart from {:?}", self.state);
        self.fault = None;
        self.geometry = None;
        self.state = PanelState::Startup;
    }

    /// Hand back the SPI port. The session can no longer reach the panel.
    pub fn release(&mut self) -> Option<S> {
        self.transport.release()
    }

    pub fn bind(&mut self, spi: S) {
        self.transport.bind(spi);
    }

    /// Run one state machine step.
    pub fn step(&mut self) -> Result<(), Error> {
        let next = match self.state {
            PanelState::Startup => self.st_startup(),
            PanelState::WaitingReset { since } => Ok(self.st_waiting_reset(since)),
            PanelState::ExitingSleep => self.st_exiting_sleep(),
            PanelState::WaitingSleepOut { since } => Ok(self.st_waiting_sleep_out(since)),
            PanelState::Configuring => self.st_configuring(),
            PanelState::Idle => return self.st_idle(),
            PanelState::Error => Ok(PanelState::Error),
        };

        match next {
            Ok(state) => {
                if state != self.state {
                    diag!("{:?} -> {:?}", self.state, state);
                }
                self.state = state;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn st_startup(&mut self) -> Result<PanelState, Error> {
        // Controller loses MADCTL on reset.
        self.geometry = None;
        self.command(&Command::bare(reg::SWRESET))
            .map_err(|e| e.context(Operation::Startup).wrap(ErrorKind::ResetFailed))?;
        Ok(PanelState::WaitingReset { since: self.clock.now_ms() })
    }

    fn st_waiting_reset(&mut self, since: u32) -> PanelState {
        if self.clock.has_elapsed(since, self.config.reset_settle_ms) {
            PanelState::ExitingSleep
        } else {
            PanelState::WaitingReset { since }
        }
    }

    fn st_exiting_sleep(&mut self) -> Result<PanelState, Error> {
        self.command(&Command::bare(reg::SLPOUT)).context(Operation::ExitingSleep)?;
        Ok(PanelState::WaitingSleepOut { since: self.clock.now_ms() })
    }

    fn st_waiting_sleep_out(&mut self, since: u32) -> PanelState {
        if self.clock.has_elapsed(since, self.config.sleep_out_settle_ms) {
            PanelState::Configuring
        } else {
            PanelState::WaitingSleepOut { since }
        }
    }

    fn st_configuring(&mut self) -> Result<PanelState, Error> {
        for (i, cmd) in CONFIGURATION_SCRIPT.iter().enumerate() {
            self.command(cmd).map_err(|e| {
                diag!("script entry {} (0x{:02X}) failed", i, cmd.register);
                e.wrap(ErrorKind::CommandFailed).context(Operation::Configuring)
            })?;
        }

        self.apply_orientation(self.config.orientation).context(Operation::Configuring)?;

        let geometry = self.logical()?;
        let screen = Window::new(0, 0, geometry.width, geometry.height);
        self.render_fill(screen, self.config.background).context(Operation::Configuring)?;

        if !self.backlight_on {
            self.backlight
                .set_high()
                .map_err(|_| Error::new(ErrorKind::Pin).context(Operation::Backlight))
                .context(Operation::Configuring)?;
            self.backlight_on = true;
        }
        Ok(PanelState::Idle)
    }

    fn st_idle(&mut self) -> Result<(), Error> {
        let Some(request) = self.requests.pop() else {
            return Ok(());
        };
        self.service(request).context(Operation::Request).map_err(|e| self.settle(e))
    }

    fn service(&mut self, request: Request) -> Result<(), Error> {
        match request {
            Request::SetOrientation(o) => self.apply_orientation(o),
            Request::Fill { window, color } => self.render_fill(window, color),
            Request::Blit { window, pixels } => self.render_blit(window, pixels),
            Request::Text { x, y, glyphs } => self.render_glyphs(x, y, &glyphs),
            Request::Icon { x, y, icon } => self.render_icon(x, y, &icon),
        }
    }

    // ---- Idle operations ----

    /// Select the orientation. A no-op when it is already active.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<(), Error> {
        self.ensure_idle(Operation::SetOrientation)?;
        self.apply_orientation(orientation).map_err(|e| self.settle(e))
    }

    /// Same as [`Self::set_orientation`] for a raw value coming from outside
    /// the firmware; out-of-range values never reach the controller.
    pub fn set_orientation_raw(&mut self, raw: u8) -> Result<(), Error> {
        let orientation = Orientation::try_from(raw).context(Operation::SetOrientation)?;
        self.set_orientation(orientation)
    }

    /// Address the window `w` x `h` at `(x, y)` for the next pixel write.
    pub fn set_window(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), Error> {
        self.ensure_idle(Operation::SetWindow)?;
        self.address(Window::new(x, y, w, h)).map_err(|e| self.settle(e))
    }

    /// Stream `total_bytes` into the addressed window. Expects
    /// [`Self::set_window`] to have been called. A `total_bytes` the source
    /// cannot supply is rejected before RAMWR.
    pub fn stream<P: PixelSource + ?Sized>(&mut self, total_bytes: usize, source: &mut P) -> Result<(), Error> {
        self.ensure_idle(Operation::StreamPixels)?;
        self.stream_pixels(total_bytes, source).map_err(|e| self.settle(e))
    }

    pub fn fill_rect(&mut self, window: Window, color: Rgb565) -> Result<(), Error> {
        self.ensure_idle(Operation::FillRect)?;
        self.render_fill(window, color).map_err(|e| self.settle(e))
    }

    /// Write raw big-endian RGB565 pixels into `window`.
    pub fn write_window(&mut self, window: Window, pixels: &[u8]) -> Result<(), Error> {
        self.ensure_idle(Operation::WriteWindow)?;
        self.render_blit(window, pixels).map_err(|e| self.settle(e))
    }

    pub fn draw_glyph(&mut self, x: u16, y: u16, glyph: Glyph) -> Result<(), Error> {
        self.draw_glyphs(x, y, &[glyph])
    }

    /// Draw glyphs side by side, top-left corner at `(x, y)`.
    pub fn draw_glyphs(&mut self, x: u16, y: u16, glyphs: &[Glyph]) -> Result<(), Error> {
        self.ensure_idle(Operation::DrawGlyphs)?;
        self.render_glyphs(x, y, glyphs).map_err(|e| self.settle(e))
    }

    pub fn draw_icon(&mut self, x: u16, y: u16, icon: &Icon) -> Result<(), Error> {
        self.ensure_idle(Operation::DrawIcon)?;
        self.render_icon(x, y, icon).map_err(|e| self.settle(e))
    }

    // ---- Rendering ----

    fn render_fill(&mut self, window: Window, color: Rgb565) -> Result<(), Error> {
        self.address(window).context(Operation::FillRect)?;
        self.stream_pixels(window.byte_count(), &mut SolidFill::new(color))
            .context(Operation::FillRect)
    }

    fn render_blit(&mut self, window: Window, pixels: &[u8]) -> Result<(), Error> {
        if pixels.len() != window.byte_count() {
            return Err(Error::new(ErrorKind::OutOfBounds).context(Operation::WriteWindow));
        }
        self.address(window).context(Operation::WriteWindow)?;
        self.stream_pixels(pixels.len(), &mut SliceSource::new(pixels))
            .context(Operation::WriteWindow)
    }

    fn render_glyphs(&mut self, x: u16, y: u16, glyphs: &[Glyph]) -> Result<(), Error> {
        if glyphs.is_empty() {
            return Ok(());
        }
        let row_bytes = glyphs.len() * GLYPH_ROW_BYTES;
        if row_bytes > SCRATCH_BYTES {
            return Err(Error::new(ErrorKind::OutOfBounds).context(Operation::DrawGlyphs));
        }
        let window = Window::new(x, y, (glyphs.len() * GLYPH_WIDTH) as u16, GLYPH_HEIGHT as u16);
        self.address(window).context(Operation::DrawGlyphs)?;
        self.stream_pixels(window.byte_count(), &mut GlyphRun::new(glyphs, self.palette))
            .context(Operation::DrawGlyphs)
    }

    fn render_icon(&mut self, x: u16, y: u16, icon: &Icon) -> Result<(), Error> {
        let window = Window::new(x, y, ICON_WIDTH as u16, icon.height() as u16);
        self.address(window).context(Operation::DrawIcon)?;
        self.stream_pixels(window.byte_count(), &mut IconRows::new(icon, self.palette))
            .context(Operation::DrawIcon)
    }

    // ---- Controller primitives ----

    fn command(&mut self, command: &Command<'_>) -> Result<(), Error> {
        self.transport.send(&self.clock, command).context(Operation::SendCommand)
    }

    fn apply_orientation(&mut self, orientation: Orientation) -> Result<(), Error> {
        if self.geometry.map(|g| g.orientation) == Some(orientation) {
            return Ok(());
        }
        self.command(&Command::with(reg::MADCTL, &[orientation.madctl()]))
            .context(Operation::SetOrientation)?;
        self.geometry = Some(Geometry::new(orientation, self.config.width, self.config.height));
        Ok(())
    }

    fn logical(&self) -> Result<Geometry, Error> {
        self.geometry.ok_or(Error::new(ErrorKind::NoOrientation))
    }

    /// CASET/RASET for `window`. Bounds are inclusive: end = start + size - 1.
    fn address(&mut self, window: Window) -> Result<(), Error> {
        let g = self.logical().context(Operation::SetWindow)?;

        let fits = |start: u16, size: u16, limit: u16| size > 0 && start as u32 + size as u32 <= limit as u32;
        if !fits(window.x, window.width, g.width) || !fits(window.y, window.height, g.height) {
            return Err(Error::new(ErrorKind::OutOfBounds).context(Operation::SetWindow));
        }

        // RAM offsets follow the physical axes.
        let (col_off, row_off) = if g.orientation.is_swapped() {
            (self.config.row_offset, self.config.col_offset)
        } else {
            (self.config.col_offset, self.config.row_offset)
        };
        let (Some(ca), Some(ra)) = (
            ram_bounds(window.x, window.width, col_off),
            ram_bounds(window.y, window.height, row_off),
        ) else {
            return Err(Error::new(ErrorKind::OutOfBounds).context(Operation::SetWindow));
        };
        self.command(&Command::with(reg::CASET, &ca)).context(Operation::SetWindow)?;
        self.command(&Command::with(reg::RASET, &ra)).context(Operation::SetWindow)
    }

    /// Push `total` bytes from `source` into the addressed window, one
    /// scratch-buffer chunk at a time.
    fn stream_pixels<P: PixelSource + ?Sized>(&mut self, total: usize, source: &mut P) -> Result<(), Error> {
        if total == 0 {
            return Ok(());
        }
        let granule = source.granule().max(1);
        let capacity = SCRATCH_BYTES / granule * granule;
        if capacity == 0 {
            return Err(Error::new(ErrorKind::OutOfBounds).context(Operation::StreamPixels));
        }
        let short = source.payload_len().is_some_and(|len| total > len);
        if short || total % granule != 0 {
            return Err(Error::new(ErrorKind::InvalidParameters).context(Operation::StreamPixels));
        }

        self.command(&Command::bare(reg::RAMWR)).context(Operation::StreamPixels)?;
        self.transport.begin_stream().context(Operation::StreamPixels)?;

        let mut transfer = Transfer::new(total, capacity);
        while let Some(chunk) = transfer.peek_chunk() {
            // SAFETY: `scratch` points at the session's `SCRATCH_BYTES` buffer,
            // exclusively borrowed for `'a`, and `chunk.len <= capacity`. No
            // burst is in flight here, so the DMA channel is not reading it.
            let buf = unsafe { core::slice::from_raw_parts_mut(self.scratch.as_ptr(), chunk.len) };
            source.fill(chunk.offset, buf);

            // Make sure DMA sees the bytes we just wrote
            compiler_fence(Ordering::Release);
            let burst = self.burst(chunk.len);
            compiler_fence(Ordering::Acquire);

            if let Err(kind) = burst {
                self.dma.disable();
                self.transport.end_stream();
                return Err(Error::new(kind).context(Operation::StreamPixels));
            }
            transfer.complete(chunk);
        }

        let drained = self.transport.drain(&self.clock);
        self.dma.disable();
        self.transport.end_stream();
        drained.context(Operation::StreamPixels)
    }

    /// One DMA chunk: arm, start, wait for the completion interrupt.
    fn burst(&mut self, len: usize) -> Result<(), ErrorKind> {
        self.dma.disable();
        self.dma.clear_flags();
        self.dma.set_length(len);
        self.signal.reset();
        self.dma.enable();
        self.transport.start_chunk();

        let notified = self.signal.wait(&self.clock, self.transport.timeout_ms());
        if self.dma.has_error() {
            return Err(ErrorKind::DmaError);
        }
        if !notified {
            return Err(ErrorKind::TransferTimeout);
        }
        Ok(())
    }

    // ---- State bookkeeping ----

    fn ensure_idle(&self, op: Operation) -> Result<(), Error> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::NotReady).context(op))
        }
    }

    /// Route transport failures to `Error`; rejected requests leave the
    /// session where it is.
    fn settle(&mut self, e: Error) -> Error {
        if e.kind().is_fatal() {
            self.fail(e)
        } else {
            diag!("request rejected: {}", e);
            e
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        diag!("{:?} -> Error: {}", self.state, e);
        self.dma.disable();
        self.transport.end_stream();
        self.fault = Some(e.clone());
        self.state = PanelState::Error;
        e
    }
}

/// CASET/RASET parameters for `size` pixels from `start` shifted by the RAM
/// offset. `None` when the end does not fit the 16-bit address.
fn ram_bounds(start: u16, size: u16, offset: u16) -> Option<[u8; 4]> {
    let first = start.checked_add(offset)?;
    let last = first.checked_add(size.checked_sub(1)?)?;
    let [s0, s1] = first.to_be_bytes();
    let [e0, e1] = last.to_be_bytes();
    Some([s0, s1, e0, e1])
}

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use tiltpanel::config::PanelConfig;
use tiltpanel::hal::{DmaChannel, Monotonic, SpiPort};
use tiltpanel::request::RequestQueue;
use tiltpanel::signal::CompletionSignal;
use tiltpanel::transfer::ScratchBuffer;
use tiltpanel::{Panel, PanelParts, PanelState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SpiOn,
    SpiOff,
    Dc(bool),
    Byte(u8),
    TxDma(bool),
    Burst(usize),
    Backlight(bool),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

/// Bytes the DMA channel read out of the source buffer, one entry per burst.
pub type Payloads = Rc<RefCell<Vec<Vec<u8>>>>;

/// How the mock DMA channel answers a burst.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DmaMode {
    #[default]
    Complete,
    /// Error flag on burst number `n` (0-based), complete otherwise.
    ErrorOn(usize),
    /// Never signals.
    Silent,
}

pub struct MockSpi {
    log: Log,
    stalled: Rc<Cell<bool>>,
    stall_on: Rc<Cell<Option<u8>>>,
    dc: Rc<Cell<bool>>,
}

impl SpiPort for MockSpi {
    fn enable(&mut self) {
        self.log.borrow_mut().push(Event::SpiOn);
    }

    fn disable(&mut self) {
        self.log.borrow_mut().push(Event::SpiOff);
    }

    fn is_tx_empty(&mut self) -> bool {
        !self.stalled.get()
    }

    fn write_byte(&mut self, byte: u8) {
        self.log.borrow_mut().push(Event::Byte(byte));
        if !self.dc.get() && self.stall_on.get() == Some(byte) {
            self.stalled.set(true);
        }
    }

    fn read_byte(&mut self) -> u8 {
        0
    }

    fn is_busy(&mut self) -> bool {
        self.stalled.get()
    }

    fn clear_overrun(&mut self) {}

    fn set_tx_dma(&mut self, enabled: bool) {
        self.log.borrow_mut().push(Event::TxDma(enabled));
    }
}

pub struct MockDma<'a> {
    log: Log,
    signal: &'a CompletionSignal,
    mode: Rc<Cell<DmaMode>>,
    enabled: Rc<Cell<bool>>,
    payloads: Payloads,
    source: *const u8,
    bursts: usize,
    len: usize,
    complete: bool,
    error: bool,
}

impl DmaChannel for MockDma<'_> {
    fn bind_source(&mut self, source: *const u8) {
        assert!(!source.is_null());
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
        self.enabled.set(true);
        self.log.borrow_mut().push(Event::Burst(self.len));
        // Read through the bound address the way the hardware would.
        let sent = unsafe { std::slice::from_raw_parts(self.source, self.len) };
        self.payloads.borrow_mut().push(sent.to_vec());
        let n = self.bursts;
        self.bursts += 1;
        match self.mode.get() {
            DmaMode::Complete => self.complete = true,
            DmaMode::ErrorOn(k) if k == n => self.error = true,
            DmaMode::ErrorOn(_) => self.complete = true,
            DmaMode::Silent => return,
        }
        self.signal.notify();
    }

    fn disable(&mut self) {
        self.enabled.set(false);
    }

    fn is_complete(&mut self) -> bool {
        self.complete
    }

    fn has_error(&mut self) -> bool {
        self.error
    }
}

/// Advances one millisecond per reading so every bounded wait terminates.
pub struct MockClock {
    now: Rc<Cell<u32>>,
}

impl Monotonic for MockClock {
    fn now_ms(&self) -> u32 {
        let t = self.now.get();
        self.now.set(t.wrapping_add(1));
        t
    }
}

pub struct MockPin {
    log: Log,
    level: Rc<Cell<bool>>,
    backlight: bool,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

impl MockPin {
    fn set(&mut self, high: bool) {
        self.level.set(high);
        let event = if self.backlight { Event::Backlight(high) } else { Event::Dc(high) };
        self.log.borrow_mut().push(event);
    }
}

/// Shared handles into the mocks.
#[derive(Clone, Default)]
pub struct Rig {
    pub log: Log,
    pub stalled: Rc<Cell<bool>>,
    pub stall_on: Rc<Cell<Option<u8>>>,
    pub dc: Rc<Cell<bool>>,
    pub dma_mode: Rc<Cell<DmaMode>>,
    pub dma_enabled: Rc<Cell<bool>>,
    pub payloads: Payloads,
    pub now: Rc<Cell<u32>>,
}

pub type TestPanel<'a> = Panel<'a, MockSpi, MockPin, MockPin, MockDma<'a>, MockClock>;

/// Statically placed pieces a session borrows.
pub struct Slots {
    pub signal: CompletionSignal,
    pub scratch: ScratchBuffer,
    pub requests: RequestQueue,
}

impl Slots {
    pub fn new() -> Self {
        Self {
            signal: CompletionSignal::new(),
            scratch: ScratchBuffer::new(),
            requests: RequestQueue::new(),
        }
    }
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dma(&self, mode: DmaMode) {
        self.dma_mode.set(mode);
    }

    pub fn spi(&self) -> MockSpi {
        MockSpi {
            log: self.log.clone(),
            stalled: self.stalled.clone(),
            stall_on: self.stall_on.clone(),
            dc: self.dc.clone(),
        }
    }

    pub fn dc_pin(&self) -> MockPin {
        MockPin { log: self.log.clone(), level: self.dc.clone(), backlight: false }
    }

    pub fn clock(&self) -> MockClock {
        MockClock { now: self.now.clone() }
    }

    pub fn panel<'a>(&self, slots: &'a mut Slots, config: PanelConfig) -> TestPanel<'a> {
        let dma = MockDma {
            log: self.log.clone(),
            signal: &slots.signal,
            mode: self.dma_mode.clone(),
            enabled: self.dma_enabled.clone(),
            payloads: self.payloads.clone(),
            source: std::ptr::null(),
            bursts: 0,
            len: 0,
            complete: false,
            error: false,
        };
        Panel::new(
            PanelParts {
                spi: self.spi(),
                dc: self.dc_pin(),
                backlight: MockPin {
                    log: self.log.clone(),
                    level: Rc::new(Cell::new(false)),
                    backlight: true,
                },
                dma,
                clock: self.clock(),
                signal: &slots.signal,
                scratch: &mut slots.scratch,
                requests: &slots.requests,
            },
            config,
        )
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
        self.payloads.borrow_mut().clear();
    }

    /// Everything the DMA channel streamed, bursts concatenated.
    pub fn streamed(&self) -> Vec<u8> {
        self.payloads.borrow().concat()
    }

    pub fn commands(&self) -> Vec<Cmd> {
        commands(&self.log.borrow())
    }

    pub fn bursts(&self) -> Vec<usize> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Burst(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.log.borrow().iter().filter(|e| *e == event).count()
    }
}

/// One register command as seen on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmd {
    pub register: u8,
    pub params: Vec<u8>,
}

/// Split logged bytes into commands using the D/C level.
pub fn commands(events: &[Event]) -> Vec<Cmd> {
    let mut dc = false;
    let mut out: Vec<Cmd> = Vec::new();
    for e in events {
        match e {
            Event::Dc(level) => dc = *level,
            Event::Byte(b) if !dc => out.push(Cmd { register: *b, params: Vec::new() }),
            Event::Byte(b) => {
                if let Some(last) = out.last_mut() {
                    last.params.push(*b);
                }
            }
            _ => {}
        }
    }
    out
}

pub fn registers(cmds: &[Cmd]) -> Vec<u8> {
    cmds.iter().map(|c| c.register).collect()
}

/// Step until the session settles in `Idle` or `Error`.
pub fn settle(panel: &mut TestPanel<'_>) -> PanelState {
    for _ in 0..10_000 {
        let _ = panel.step();
        match panel.state() {
            PanelState::Idle | PanelState::Error => return panel.state(),
            _ => {}
        }
    }
    panel.state()
}

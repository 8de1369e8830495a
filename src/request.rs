//! Display requests queued by application code and drained by the panel
//! worker while idle.
//!
//! The queue is shared state, so it sits behind a `critical_section::Mutex`
//! and can be filled from interrupt handlers (button presses) as well as from
//! the main loop.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_graphics::pixelcolor::Rgb565;
use heapless::{Deque, Vec};

use crate::error::{Error, ErrorKind};
use crate::glyphs::Glyph;
use crate::icons::Icon;
use crate::orientation::Orientation;

pub const REQUEST_DEPTH: usize = 8;
/// Longest glyph run a single text request may carry.
pub const MAX_TEXT: usize = 8;

pub type Text = Vec<Glyph, MAX_TEXT>;

/// Rectangle in logical (orientation-adjusted) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Window {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGB565 payload size.
    pub fn byte_count(&self) -> usize {
        self.pixel_count() * 2
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    SetOrientation(Orientation),
    Fill { window: Window, color: Rgb565 },
    /// Raw big-endian RGB565 pixels, `window.byte_count()` bytes.
    Blit { window: Window, pixels: &'static [u8] },
    Text { x: u16, y: u16, glyphs: Text },
    Icon { x: u16, y: u16, icon: Icon },
}

impl Request {
    /// Text request from a string of glyph characters; `None` if a character
    /// has no glyph or the string is too long.
    pub fn text(x: u16, y: u16, s: &str) -> Option<Self> {
        let mut glyphs = Text::new();
        for c in s.chars() {
            glyphs.push(Glyph::from_char(c)?).ok()?;
        }
        Some(Request::Text { x, y, glyphs })
    }
}

pub struct RequestQueue {
    inner: Mutex<RefCell<Deque<Request, REQUEST_DEPTH>>>,
}

impl RequestQueue {
    pub const fn new() -> Self {
        Self { inner: Mutex::new(RefCell::new(Deque::new())) }
    }

    pub fn push(&self, request: Request) -> Result<(), Error> {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref_mut(cs)
                .push_back(request)
                .map_err(|_| Error::new(ErrorKind::QueueFull))
        })
    }

    pub fn pop(&self) -> Option<Request> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

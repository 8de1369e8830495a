//! Panel orientation and the logical geometry derived from it.

use crate::error::{Error, ErrorKind};

// MADCTL bits
const MY: u8 = 0x80;
const MX: u8 = 0x40;
const MV: u8 = 0x20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Orientation {
    Portrait = 0,
    Landscape = 1,
    PortraitFlipped = 2,
    LandscapeFlipped = 3,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Portrait,
        Orientation::Landscape,
        Orientation::PortraitFlipped,
        Orientation::LandscapeFlipped,
    ];

    /// MADCTL parameter selecting this orientation (RGB order).
    pub fn madctl(self) -> u8 {
        match self {
            Orientation::Portrait => 0,
            Orientation::Landscape => MX | MV,
            Orientation::PortraitFlipped => MX | MY,
            Orientation::LandscapeFlipped => MY | MV,
        }
    }

    /// Row/column exchange: logical width and height are swapped.
    pub fn is_swapped(self) -> bool {
        self.madctl() & MV != 0
    }
}

impl TryFrom<u8> for Orientation {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(Error::new(ErrorKind::InvalidOrientation))
    }
}

/// Orientation together with the logical size it produces.
/// Replaced as a whole so a window is never computed from a half-updated pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub orientation: Orientation,
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    /// Logical geometry of a `width` x `height` (portrait) panel.
    pub fn new(orientation: Orientation, width: u16, height: u16) -> Self {
        if orientation.is_swapped() {
            Self { orientation, width: height, height: width }
        } else {
            Self { orientation, width, height }
        }
    }

    /// Byte count of a full-screen RGB565 payload.
    pub fn area_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 2
    }
}

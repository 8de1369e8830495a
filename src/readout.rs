//! Tilt angle maths and its glyph formatting.

use core::f32::consts::PI;

use crate::glyphs::{Glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::request::{Request, Text};

/// Widest readout: sign, two digits, degree mark.
pub const READOUT_GLYPHS: usize = 4;
pub const READOUT_WIDTH: u16 = (READOUT_GLYPHS * GLYPH_WIDTH) as u16;
pub const READOUT_HEIGHT: u16 = GLYPH_HEIGHT as u16;

/// Angle in degrees between an axis and the Z axis, from raw accelerometer
/// counts. Flat (0°) when Z reads zero.
pub fn tilt_degrees(axis: i16, z: i16) -> f32 {
    if z == 0 {
        return 0.0;
    }
    libm::atanf(axis as f32 / z as f32) * 180.0 / PI
}

/// Whole degrees, clamped to ±90, as `[sign][tens][units]°`.
/// The tens digit is left out below 10°.
pub fn format_angle(degrees: f32) -> Text {
    let rounded = libm::roundf(degrees).clamp(-90.0, 90.0) as i32;
    let magnitude = rounded.unsigned_abs() as u8;

    let mut text = Text::new();
    let sign = if rounded < 0 { Glyph::Minus } else { Glyph::Plus };
    let _ = text.push(sign);
    if magnitude >= 10 {
        let _ = text.push(digit(magnitude / 10));
    }
    let _ = text.push(digit(magnitude % 10));
    let _ = text.push(Glyph::Degree);
    text
}

/// Readout request for `degrees`, right-aligned in a [`READOUT_WIDTH`] slot
/// starting at `(x, y)`.
pub fn angle_request(x: u16, y: u16, degrees: f32) -> Request {
    let glyphs = format_angle(degrees);
    let pad = (READOUT_GLYPHS - glyphs.len()) * GLYPH_WIDTH;
    Request::Text { x: x + pad as u16, y, glyphs }
}

fn digit(d: u8) -> Glyph {
    Glyph::digit(d).unwrap_or(Glyph::Zero)
}

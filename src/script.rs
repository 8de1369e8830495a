//! Configuration script replayed once per boot, after sleep-out.
//!
//! Frame rate, power rails and gamma values are the panel vendor's; they are
//! passed through as-is. Orientation (MADCTL) is applied separately.

use crate::command::{reg, Command};

pub static CONFIGURATION_SCRIPT: &[Command<'static>] = &[
    Command::with(reg::FRMCTR1, &[0x01, 0x2C, 0x2D]),
    Command::with(reg::FRMCTR2, &[0x01, 0x2C, 0x2D]),
    Command::with(reg::FRMCTR3, &[0x01, 0x2C, 0x2D, 0x01, 0x2C, 0x2D]),
    Command::with(reg::INVCTR, &[0x07]),
    Command::with(reg::PWCTR1, &[0xA2, 0x02, 0x84]),
    Command::with(reg::PWCTR2, &[0xC5]),
    Command::with(reg::PWCTR3, &[0x0A, 0x00]),
    Command::with(reg::PWCTR4, &[0x8A, 0x2A]),
    Command::with(reg::PWCTR5, &[0x8A, 0xEE]),
    Command::with(reg::VMCTR1, &[0x0E]),
    Command::bare(reg::INVOFF),
    // 16-bit RGB565
    Command::with(reg::COLMOD, &[0x05]),
    Command::with(
        reg::GMCTRP1,
        &[0x02, 0x1C, 0x07, 0x12, 0x37, 0x32, 0x29, 0x2D, 0x29, 0x25, 0x2B, 0x39, 0x00, 0x01, 0x03, 0x10],
    ),
    Command::with(
        reg::GMCTRN1,
        &[0x03, 0x1D, 0x07, 0x06, 0x2E, 0x2C, 0x29, 0x2D, 0x2E, 0x2E, 0x37, 0x3F, 0x00, 0x00, 0x02, 0x10],
    ),
    Command::bare(reg::NORON),
    Command::bare(reg::DISPON),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MAX_PARAMETERS;

    #[test]
    fn every_entry_fits_the_transport() {
        for cmd in CONFIGURATION_SCRIPT {
            assert!(cmd.count <= MAX_PARAMETERS);
            assert_eq!(cmd.parameters.map_or(0, <[u8]>::len), cmd.count);
        }
    }

    #[test]
    fn script_ends_with_display_on() {
        assert_eq!(CONFIGURATION_SCRIPT.last().map(|c| c.register), Some(reg::DISPON));
    }
}

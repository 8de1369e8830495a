#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod command;
pub mod config;
pub mod error;
pub mod glyphs;
pub mod hal;
pub mod icons;
mod logging;
pub mod orientation;
pub mod panel;
pub mod readout;
pub mod request;
pub mod script;
pub mod signal;
pub mod transfer;

#[cfg(feature = "esp32s3")]
pub mod wiring;

pub use error::{Error, ErrorKind, Operation};
pub use panel::{Panel, PanelParts, PanelState};

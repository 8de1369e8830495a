// Board-specific pin mapping for the ESP32-S3 tilt board.
//! The following wiring is assumed:
//! - ST7735S SCK  => GPIO12
//! - ST7735S SDA  => GPIO11 (MOSI)
//! - ST7735S CS   => GPIO10
//! - ST7735S DC   => GPIO9
//! - ST7735S RST  => GPIO13 (held high; the driver resets over SPI)
//! - ST7735S BLK  => GPIO14
//! - Accelerometer SDA => GPIO8, SCL => GPIO18 (I2C, address 0x53)
//! - GND => GND
//! - 3.3V => 3.3V

use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::peripherals::{Peripherals, DMA_CH0, GPIO11, GPIO12, GPIO18, GPIO8, I2C0, SPI2};

pub struct BoardPins<'a> {
    pub lcd_cs: Output<'a>,
    pub lcd_dc: Output<'a>,
    pub lcd_rst: Output<'a>,
    pub lcd_bl: Output<'a>,
}

/// Peripherals handed to the SPI/DMA bring-up untouched.
pub struct DisplayBus<'a> {
    pub spi2: SPI2<'a>,
    pub sck: GPIO12<'a>,
    pub mosi: GPIO11<'a>,
    pub dma_ch0: DMA_CH0<'a>,
}

pub struct SensorBus<'a> {
    pub i2c0: I2C0<'a>,
    pub sda: GPIO8<'a>,
    pub scl: GPIO18<'a>,
}

pub fn init_board_pins<'a>(p: Peripherals) -> (BoardPins<'a>, DisplayBus<'a>, SensorBus<'a>) {
    // LCD control pins. Do NOT touch GPIO11/12 here (SPI SCK/MOSI)
    let lcd_cs = Output::new(p.GPIO10, Level::High, OutputConfig::default());
    let lcd_dc = Output::new(p.GPIO9, Level::Low, OutputConfig::default());
    let lcd_rst = Output::new(p.GPIO13, Level::High, OutputConfig::default());
    // backlight stays dark until the panel has been configured
    let lcd_bl = Output::new(p.GPIO14, Level::Low, OutputConfig::default());

    (
        BoardPins { lcd_cs, lcd_dc, lcd_rst, lcd_bl },
        DisplayBus { spi2: p.SPI2, sck: p.GPIO12, mosi: p.GPIO11, dma_ch0: p.DMA_CH0 },
        SensorBus { i2c0: p.I2C0, sda: p.GPIO8, scl: p.GPIO18 },
    )
}

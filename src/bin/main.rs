//! Tilt level
//! ========================================
//! source ~/export-esp.sh
//! cargo run --release --features esp32s3
//! ========================================
//!
//! Brings the ST7735S panel up through the polled driver state machine and
//! shows the roll and pitch angles read from the accelerometer.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Define the application description, which is placed in a special section of the binary.
// This is used by the bootloader to verify the application.
esp_bootloader_esp_idf::esp_app_desc!();

use esp_backtrace as _;
use esp_hal::{
    dma::{DmaRxBuf, DmaTxBuf},
    dma_buffers,
    i2c::master::{Config as I2cConfig, I2c},
    main,
    spi::{
        master::{Config as SpiConfig, Spi, SpiDmaBus},
        Mode,
    },
    time::Rate,
    timer::systimer::{SystemTimer, Unit},
    Blocking, Config,
};
use esp_println::println;

use tiltpanel::{
    bus::{BusDma, BusPort, SharedBus},
    config::PanelConfig,
    hal::Monotonic,
    icons::{ARROWS, ICON_WIDTH},
    readout::{angle_request, tilt_degrees, READOUT_HEIGHT},
    request::{Request, RequestQueue, Window},
    signal::CompletionSignal,
    transfer::ScratchBuffer,
    wiring::{init_board_pins, BoardPins, DisplayBus, SensorBus},
    Panel, PanelParts, PanelState,
};

const ACCEL_ADDR: u8 = 0x53;
const ACCEL_DATA_FORMAT: u8 = 0x31;
const ACCEL_POWER_CTL: u8 = 0x2D;
const ACCEL_DATAX0: u8 = 0x32;

const SPLASH_MS: u32 = 1500;
const SAMPLE_PERIOD_MS: u32 = 100;

// Two readout rows in the 160 x 128 landscape frame.
const ROLL_Y: u16 = 8;
const PITCH_Y: u16 = 71;

static SIGNAL: CompletionSignal = CompletionSignal::new();
static REQUESTS: RequestQueue = RequestQueue::new();

struct SysClock;

impl Monotonic for SysClock {
    fn now_ms(&self) -> u32 {
        let t = SystemTimer::unit_value(Unit::Unit0);
        (t.saturating_mul(1000) / SystemTimer::ticks_per_second()) as u32
    }
}

#[main]
fn main() -> ! {
    let peripherals = esp_hal::init(Config::default());

    let (pins, display_bus, sensor_bus) = init_board_pins(peripherals);
    let BoardPins { lcd_cs, lcd_dc, lcd_rst: _lcd_rst, lcd_bl } = pins;
    let DisplayBus { spi2, sck, mosi, dma_ch0 } = display_bus;
    let SensorBus { i2c0, sda, scl } = sensor_bus;

    // SPI @ 26 MHz, Mode 0 (ST7735S write cycle limit is ~66 ns)
    let spi = Spi::new(
        spi2,
        SpiConfig::default()
            .with_frequency(Rate::from_hz(26_000_000))
            .with_mode(Mode::_0),
    )
    .expect("SPI2 config rejected")
    .with_sck(sck)
    .with_mosi(mosi)
    .with_dma(dma_ch0);

    let (rx_buf, rx_desc, tx_buf, tx_desc) = dma_buffers!(32, 4096);
    let rx = DmaRxBuf::new(rx_desc, rx_buf).expect("DMA rx buffer");
    let tx = DmaTxBuf::new(tx_desc, tx_buf).expect("DMA tx buffer");
    let spi_bus: SpiDmaBus<'_, Blocking> = spi.with_buffers(rx, tx);

    let bus = SharedBus::new();
    bus.install(spi_bus);

    let mut accel = I2c::new(i2c0, I2cConfig::default().with_frequency(Rate::from_khz(400)))
        .expect("I2C0 config rejected")
        .with_sda(sda)
        .with_scl(scl);
    // +-2 g full resolution, then measurement mode (must be last)
    let accel_ok = accel.write(ACCEL_ADDR, &[ACCEL_DATA_FORMAT, 0x08]).is_ok()
        && accel.write(ACCEL_ADDR, &[ACCEL_POWER_CTL, 0x08]).is_ok();
    if !accel_ok {
        println!("accelerometer not answering at 0x{:02X}", ACCEL_ADDR);
    }

    let mut scratch = ScratchBuffer::new();
    let clock = SysClock;
    let config = PanelConfig::default();
    let mut panel = Panel::new(
        PanelParts {
            spi: BusPort::new(&bus, lcd_cs),
            dc: lcd_dc,
            backlight: lcd_bl,
            dma: BusDma::new(&bus, &SIGNAL),
            clock: SysClock,
            signal: &SIGNAL,
            scratch: &mut scratch,
            requests: &REQUESTS,
        },
        config,
    );

    let mut idle_since: Option<u32> = None;
    let mut next_sample = 0u32;
    let mut splash_cleared = false;
    let mut reported = false;

    loop {
        if let Err(e) = panel.step() {
            println!("panel: {}", e);
        }

        match panel.state() {
            PanelState::Idle => {
                let now = clock.now_ms();
                let since = *idle_since.get_or_insert_with(|| {
                    let splash = Window::new(0, 0, 160, 128);
                    let _ = REQUESTS.push(Request::Icon {
                        x: (splash.width - ICON_WIDTH as u16) / 2,
                        y: (splash.height - ARROWS.height() as u16) / 2,
                        icon: ARROWS,
                    });
                    now
                });

                if !clock.has_elapsed(since, SPLASH_MS) {
                    continue;
                }
                if !splash_cleared {
                    splash_cleared = REQUESTS
                        .push(Request::Fill {
                            window: Window::new(0, 0, 160, 128),
                            color: config.background,
                        })
                        .is_ok();
                }
                if !REQUESTS.is_empty() || !clock.has_elapsed(next_sample, SAMPLE_PERIOD_MS) {
                    continue;
                }
                next_sample = now;

                let mut raw = [0u8; 6];
                if accel.write_read(ACCEL_ADDR, &[ACCEL_DATAX0], &mut raw).is_err() {
                    continue;
                }
                let x = i16::from_le_bytes([raw[0], raw[1]]);
                let y = i16::from_le_bytes([raw[2], raw[3]]);
                let z = i16::from_le_bytes([raw[4], raw[5]]);

                show_angle(ROLL_Y, tilt_degrees(x, z), &config);
                show_angle(PITCH_Y, tilt_degrees(y, z), &config);
            }
            PanelState::Error if !reported => {
                reported = true;
                if let Some(fault) = panel.fault() {
                    println!("panel stopped: {}", fault);
                }
            }
            _ => {}
        }
    }
}

/// Queue one readout row, blanking the slot on the left of a short reading.
fn show_angle(y: u16, degrees: f32, config: &PanelConfig) {
    let request = angle_request(0, y, degrees);
    if let Request::Text { x, .. } = &request {
        if *x > 0 {
            let _ = REQUESTS.push(Request::Fill {
                window: Window::new(0, y, *x, READOUT_HEIGHT),
                color: config.background,
            });
        }
    }
    let _ = REQUESTS.push(request);
}

use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::mode::Blocking;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usb::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals, rcc, Config};
use embedded_hal::spi::{Mode, Phase, Polarity};

use crate::config::{SENSOR_COUNT, SPI_FREQUENCY_HZ};
use crate::drivers::{BusError, BusFormat, SpiRegisterBus};

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    USB_UCPD1_2 => usb::InterruptHandler<peripherals::USB>;
});

pub type SensorSpi = Spi<'static, Blocking>;
pub type SensorSelect = Output<'static>;
pub type SensorBus = SpiRegisterBus<SensorSpi, SensorSelect>;
pub type UsbDriver = Driver<'static, peripherals::USB>;

impl BusFormat for SensorSpi {
    fn set_format(&mut self, frequency_hz: u32, mode: Mode) -> Result<(), BusError> {
        let mut cfg = spi::Config::default();
        cfg.frequency = Hertz(frequency_hz);
        cfg.mode = spi::Mode {
            polarity: match mode.polarity {
                Polarity::IdleLow => spi::Polarity::IdleLow,
                Polarity::IdleHigh => spi::Polarity::IdleHigh,
            },
            phase: match mode.phase {
                Phase::CaptureOnFirstTransition => spi::Phase::CaptureOnFirstTransition,
                Phase::CaptureOnSecondTransition => spi::Phase::CaptureOnSecondTransition,
            },
        };
        self.set_config(&cfg).map_err(|_| BusError::Config)
    }
}

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    /// One bus per sensor, each with its own select line.
    pub sensors: [SensorBus; SENSOR_COUNT],
    pub usb: UsbDriver,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();

        // 64 MHz system clock from HSI through the PLL
        config.rcc.hsi = Some(rcc::Hsi {
            sys_div: rcc::HsiSysDiv::DIV1,
        });
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // 16MHz
            prediv: rcc::PllPreDiv::DIV2,   // 16MHz / 2 = 8MHz
            mul: rcc::PllMul::MUL16,        // 8MHz * 16 = 128MHz
            divp: None,
            divq: None,
            divr: Some(rcc::PllRDiv::DIV2), // 128MHz / 2 = 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R;

        // USB FS runs from HSI48 trimmed by the host SOF (CRS)
        config.rcc.hsi48 = Some(rcc::Hsi48Config {
            sync_from_usb: true,
        });
        config.rcc.mux.usbsel = rcc::mux::Usbsel::HSI48;

        let p = embassy_stm32::init(config);

        // The sensor driver reapplies speed and mode during bring-up.
        let mut spi_cfg = spi::Config::default();
        spi_cfg.frequency = Hertz(SPI_FREQUENCY_HZ);
        spi_cfg.mode = spi::MODE_3;

        // SPI1: SCK PA5, MOSI PA7, MISO PA6, CS PA4
        let spi1 = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, spi_cfg);
        let cs0 = Output::new(p.PA4, Level::High, Speed::VeryHigh);

        #[cfg(not(feature = "dual"))]
        let sensors = [SpiRegisterBus::new(spi1, cs0)];

        // SPI2: SCK PB13, MOSI PB15, MISO PB14, CS PB12
        #[cfg(feature = "dual")]
        let sensors = {
            let spi2 = Spi::new_blocking(p.SPI2, p.PB13, p.PB15, p.PB14, spi_cfg);
            let cs1 = Output::new(p.PB12, Level::High, Speed::VeryHigh);
            [SpiRegisterBus::new(spi1, cs0), SpiRegisterBus::new(spi2, cs1)]
        };

        // USB FS: DP PA12, DM PA11
        let usb = Driver::new(p.USB, Irqs, p.PA12, p.PA11);

        Self { sensors, usb }
    }
}

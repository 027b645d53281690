//! ADXL345 3-axis accelerometer on 4-wire SPI.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Mode, SpiBus, MODE_3};

use super::bus::{BusError, BusFormat, SpiRegisterBus};
use crate::config::SPI_FREQUENCY_HZ;

// Register map
pub const REG_DEVID: u8 = 0x00;
pub const REG_BW_RATE: u8 = 0x2C;
pub const REG_POWER_CTL: u8 = 0x2D;
pub const REG_DATA_FORMAT: u8 = 0x31;
pub const REG_DATAX0: u8 = 0x32;

pub const DEVICE_ID: u8 = 0xE5;

const DATA_FORMAT_FULL_RES: u8 = 1 << 3;
const BW_RATE_LOW_POWER: u8 = 1 << 4;
const POWER_CTL_MEASURE: u8 = 1 << 3;

/// DATAX0..DATAZ1
pub const DATA_LEN: usize = 6;

/// Full resolution keeps 3.9 mg/LSB at every range: 16 g over 4096 counts.
pub const SCALE_G_PER_LSB: f32 = 16.0 / 4096.0;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
    G2 = 0b00,
    G4 = 0b01,
    G8 = 0b10,
    G16 = 0b11,
}

/// Output data rate codes (BW_RATE bits 3:0).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    Hz6_25 = 0x06,
    Hz12_5 = 0x07,
    Hz25 = 0x08,
    Hz50 = 0x09,
    Hz100 = 0x0A,
    Hz200 = 0x0B,
    Hz400 = 0x0C,
    Hz800 = 0x0D,
    Hz1600 = 0x0E,
    Hz3200 = 0x0F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Normal,
    /// Reduced power operation, slightly noisier (BW_RATE bit 4).
    LowPower,
}

/// Written once at bring-up, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub bus_frequency_hz: u32,
    pub bus_mode: Mode,
    pub range: Range,
    pub data_rate: DataRate,
    pub power: PowerMode,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            bus_frequency_hz: SPI_FREQUENCY_HZ,
            bus_mode: MODE_3,
            range: Range::G16,
            data_rate: DataRate::Hz100,
            power: PowerMode::Normal,
        }
    }
}

impl DeviceConfig {
    pub const fn data_format(&self) -> u8 {
        DATA_FORMAT_FULL_RES | self.range as u8
    }

    pub const fn bw_rate(&self) -> u8 {
        match self.power {
            PowerMode::Normal => self.data_rate as u8,
            PowerMode::LowPower => self.data_rate as u8 | BW_RATE_LOW_POWER,
        }
    }

    pub const fn power_ctl(&self) -> u8 {
        POWER_CTL_MEASURE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawAxes {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One register snapshot of one device, raw counts and g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub raw: RawAxes,
    pub accel: Vector3,
}

impl RawAxes {
    pub fn to_g(self) -> Vector3 {
        Vector3 {
            x: self.x as f32 * SCALE_G_PER_LSB,
            y: self.y as f32 * SCALE_G_PER_LSB,
            z: self.z as f32 * SCALE_G_PER_LSB,
        }
    }
}

impl Sample {
    pub fn from_raw(raw: RawAxes) -> Self {
        Self {
            raw,
            accel: raw.to_g(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Adxl345Error {
    Bus(BusError),
    ShortBurst { expected: usize, actual: usize },
}

impl From<BusError> for Adxl345Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

/// Decodes the six data registers (x, y, z; low byte first).
pub fn decode_axes(bytes: &[u8]) -> Result<RawAxes, Adxl345Error> {
    if bytes.len() < DATA_LEN {
        return Err(Adxl345Error::ShortBurst {
            expected: DATA_LEN,
            actual: bytes.len(),
        });
    }
    Ok(RawAxes {
        x: i16::from_le_bytes([bytes[0], bytes[1]]),
        y: i16::from_le_bytes([bytes[2], bytes[3]]),
        z: i16::from_le_bytes([bytes[4], bytes[5]]),
    })
}

/// What the acquisition loop needs from a sensor.
pub trait Accelerometer {
    fn initialize(&mut self) -> Result<(), Adxl345Error>;

    /// `Ok(false)` when the device answers with an unexpected ID.
    fn verify_id(&mut self) -> Result<bool, Adxl345Error> {
        Ok(true)
    }

    fn read_sample(&mut self) -> Result<Sample, Adxl345Error>;
}

pub struct Adxl345<SPI, CS> {
    bus: SpiRegisterBus<SPI, CS>,
    config: DeviceConfig,
}

impl<SPI, CS> Adxl345<SPI, CS>
where
    SPI: SpiBus<u8> + BusFormat,
    CS: OutputPin,
{
    pub fn new(bus: SpiRegisterBus<SPI, CS>, config: DeviceConfig) -> Self {
        Self { bus, config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Bring-up sequence. The device stays in standby until POWER_CTL is
    /// written, so that write comes last.
    pub fn initialize(&mut self) -> Result<(), Adxl345Error> {
        let cfg = self.config;
        self.bus.configure(cfg.bus_frequency_hz, cfg.bus_mode)?;
        self.bus.write_register(REG_DATA_FORMAT, cfg.data_format())?;
        self.bus.write_register(REG_BW_RATE, cfg.bw_rate())?;
        self.bus.write_register(REG_POWER_CTL, cfg.power_ctl())?;

        info!(
            "ADXL345 configured: format=0x{:02X} bw_rate=0x{:02X} power=0x{:02X}",
            cfg.data_format(),
            cfg.bw_rate(),
            cfg.power_ctl()
        );
        Ok(())
    }

    pub fn device_id(&mut self) -> Result<u8, Adxl345Error> {
        let [id] = self.bus.read_burst::<1>(REG_DEVID)?;
        Ok(id)
    }

    pub fn read_sample(&mut self) -> Result<Sample, Adxl345Error> {
        let bytes = self.bus.read_burst::<DATA_LEN>(REG_DATAX0)?;
        let raw = decode_axes(&bytes)?;
        Ok(Sample::from_raw(raw))
    }
}

impl<SPI, CS> Accelerometer for Adxl345<SPI, CS>
where
    SPI: SpiBus<u8> + BusFormat,
    CS: OutputPin,
{
    fn initialize(&mut self) -> Result<(), Adxl345Error> {
        Adxl345::initialize(self)
    }

    fn verify_id(&mut self) -> Result<bool, Adxl345Error> {
        let id = self.device_id()?;
        if id != DEVICE_ID {
            warn!(
                "Unexpected ADXL345 ID: 0x{:02X}, expected 0x{:02X}",
                id, DEVICE_ID
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn read_sample(&mut self) -> Result<Sample, Adxl345Error> {
        Adxl345::read_sample(self)
    }
}

//! Register-level access to one SPI device with a dedicated select line.

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Mode, SpiBus};

/// Address byte flags for a read transaction.
pub const READ_FLAG: u8 = 0x80;
pub const MULTI_BYTE_FLAG: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    Spi(spi::ErrorKind),
    Select(digital::ErrorKind),
    Config,
}

/// Clock speed and mode selection for a bus peripheral. `embedded-hal` leaves
/// this to the HAL, so the board implements it for its SPI instance.
pub trait BusFormat {
    fn set_format(&mut self, frequency_hz: u32, mode: Mode) -> Result<(), BusError>;
}

/// Owns the SPI bus and the select pin of a single device. Transactions are
/// framed by select assert (low) / deassert (high) and never interleave.
pub struct SpiRegisterBus<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> SpiRegisterBus<SPI, CS>
where
    SPI: SpiBus<u8> + BusFormat,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Deselects the device and applies clock speed and mode.
    pub fn configure(&mut self, frequency_hz: u32, mode: Mode) -> Result<(), BusError> {
        self.cs.set_high().map_err(select_error)?;
        self.spi.set_format(frequency_hz, mode)
    }

    pub fn write_register(&mut self, addr: u8, value: u8) -> Result<(), BusError> {
        self.transaction(|spi| spi.write(&[addr, value]))
    }

    /// Reads `N` consecutive registers starting at `start`. Bytes are returned
    /// in the order they were clocked in.
    pub fn read_burst<const N: usize>(&mut self, start: u8) -> Result<[u8; N], BusError> {
        let mut buf = [0u8; N];
        self.transaction(|spi| {
            spi.write(&[READ_FLAG | MULTI_BYTE_FLAG | start])?;
            spi.transfer_in_place(&mut buf)
        })?;
        Ok(buf)
    }

    fn transaction<F>(&mut self, f: F) -> Result<(), BusError>
    where
        F: FnOnce(&mut SPI) -> Result<(), SPI::Error>,
    {
        self.cs.set_low().map_err(select_error)?;
        let result = f(&mut self.spi).and_then(|()| self.spi.flush());
        // select is released even if the transfer failed
        let released = self.cs.set_high().map_err(select_error);
        result.map_err(spi_error)?;
        released
    }
}

fn spi_error<E: spi::Error>(e: E) -> BusError {
    BusError::Spi(e.kind())
}

fn select_error<E: digital::Error>(e: E) -> BusError {
    BusError::Select(e.kind())
}

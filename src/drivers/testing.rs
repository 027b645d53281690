//! Recording `embedded-hal` stubs shared by the driver tests.

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorKind, ErrorType, Mode, SpiBus};

use super::bus::{BusError, BusFormat, SpiRegisterBus};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Select,
    Deselect,
    Write(Vec<u8>),
    /// Bytes shifted out during a transfer (dummy bytes for reads).
    Transfer(Vec<u8>),
    Flush,
    Format(u32, Mode),
}

#[derive(Default)]
struct Shared {
    events: Vec<Event>,
    responses: VecDeque<u8>,
    fail_transfer: bool,
}

#[derive(Clone, Default)]
pub struct BusLog(Rc<RefCell<Shared>>);

impl BusLog {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }

    pub fn queue_response(&self, bytes: &[u8]) {
        self.0.borrow_mut().responses.extend(bytes.iter().copied());
    }

    pub fn fail_next_transfer(&self) {
        self.0.borrow_mut().fail_transfer = true;
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().events.push(event);
    }
}

pub struct FakeSpi {
    log: BusLog,
}

impl ErrorType for FakeSpi {
    type Error = ErrorKind;
}

impl SpiBus<u8> for FakeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        self.transfer_in_place(words)
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.log.push(Event::Write(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.copy_from_slice(&write[..read.len()]);
        self.transfer_in_place(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut shared = self.log.0.borrow_mut();
        if core::mem::take(&mut shared.fail_transfer) {
            return Err(ErrorKind::Overrun);
        }
        shared.events.push(Event::Transfer(words.to_vec()));
        for w in words.iter_mut() {
            *w = shared.responses.pop_front().unwrap_or(0);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Flush);
        Ok(())
    }
}

impl BusFormat for FakeSpi {
    fn set_format(&mut self, frequency_hz: u32, mode: Mode) -> Result<(), BusError> {
        self.log.push(Event::Format(frequency_hz, mode));
        Ok(())
    }
}

pub struct FakeSelect {
    log: BusLog,
}

impl PinErrorType for FakeSelect {
    type Error = Infallible;
}

impl OutputPin for FakeSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Select);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Deselect);
        Ok(())
    }
}

pub type FakeBus = SpiRegisterBus<FakeSpi, FakeSelect>;

/// A register bus whose SPI and select pin record into one shared log.
/// `responses` are returned, in order, for clocked-in bytes.
pub fn bus_pair(responses: &[u8]) -> (FakeBus, BusLog) {
    let log = BusLog::default();
    log.queue_response(responses);
    let spi = FakeSpi { log: log.clone() };
    let cs = FakeSelect { log: log.clone() };
    (SpiRegisterBus::new(spi, cs), log)
}

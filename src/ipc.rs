use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex as RawMutex, pipe::Pipe};
use portable_atomic::{AtomicBool, Ordering};

use crate::config::{HOST_RX_PIPE_SIZE, HOST_TX_PIPE_SIZE};
use crate::host::{HostLink, LinkError};

/*  host byte pipes: USB tasks on one end, acquisition loop on the other */
pub static HOST_RX: Pipe<RawMutex, HOST_RX_PIPE_SIZE> = Pipe::new();
pub static HOST_TX: Pipe<RawMutex, HOST_TX_PIPE_SIZE> = Pipe::new();

/// Set while the CDC endpoints are enabled by the host.
pub static HOST_CONNECTED: AtomicBool = AtomicBool::new(false);

pub fn host_connected() -> bool {
    HOST_CONNECTED.load(Ordering::Acquire)
}

/// Non-blocking view of the USB serial port for the acquisition loop.
#[derive(Clone, Copy, Default)]
pub struct UsbLink;

impl HostLink for UsbLink {
    fn try_read(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match HOST_RX.try_read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        if !host_connected() {
            return Err(LinkError::Disconnected);
        }
        // single producer: once the room is there it stays there
        if HOST_TX.free_capacity() < bytes.len() {
            return Err(LinkError::Full);
        }
        let mut rest = bytes;
        while !rest.is_empty() {
            match HOST_TX.try_write(rest) {
                Ok(n) => rest = &rest[n..],
                Err(_) => return Err(LinkError::Full),
            }
        }
        Ok(())
    }
}

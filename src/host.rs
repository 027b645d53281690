//! Byte-duplex channel to the host computer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Nobody has the port open; output is suspended.
    Disconnected,
    /// Not enough room for the whole write; nothing was queued.
    Full,
}

pub trait HostLink {
    /// Next received byte, if one is already available. Never waits.
    fn try_read(&mut self) -> Option<u8>;

    /// Queues `bytes` as one unit: either all of them or none.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
}

//! Monotonic microsecond time source for the acquisition loop.

/// Free-running microsecond counter. The value wraps at `u32::MAX`; callers
/// compare instants with wrapping arithmetic only.
pub trait Monotonic {
    fn now_us(&mut self) -> u32;
}

/// `embassy-time` backed clock. Requires a 1 MHz tick rate.
#[cfg(feature = "firmware")]
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "firmware")]
impl Monotonic for EmbassyClock {
    #[inline]
    fn now_us(&mut self) -> u32 {
        // truncation is intended: the counter wraps every ~71.6 minutes
        embassy_time::Instant::now().as_micros() as u32
    }
}

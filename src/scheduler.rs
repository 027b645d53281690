//! Fixed-period sample scheduler on a wrapping microsecond counter.
//!
//! Deadlines advance by exactly one period per due tick, so a late tick does
//! not push later samples back. All instant comparisons use the signed
//! difference of two wrapping counter values.

use core::fmt;

use crate::config::{DEFAULT_SAMPLE_PERIOD_US, MAX_SAMPLE_RATE_HZ, MIN_SAMPLE_RATE_HZ};

/// Elapsed time since the last time-base reset, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }
}

/// Seconds with six fractional digits, e.g. `12.004000`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RateError {
    OutOfRange(u32),
}

/// `true` once `now` has reached or passed `deadline`.
#[inline]
pub fn reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) as i32 >= 0
}

/// Integer period for a sampling frequency. Truncates: 3200 Hz gives 312 us.
pub fn period_for(freq_hz: u32) -> Result<u32, RateError> {
    if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&freq_hz) {
        return Err(RateError::OutOfRange(freq_hz));
    }
    Ok(1_000_000 / freq_hz)
}

pub struct SampleScheduler {
    period_us: u32,
    next_deadline: u32,
    time_base: u32,
    /// Deadlines handed out since the last reset.
    emitted: u32,
    last_now: u32,
    elapsed_us: u64,
}

impl Default for SampleScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_PERIOD_US)
    }
}

impl SampleScheduler {
    pub const fn new(period_us: u32) -> Self {
        Self {
            period_us,
            next_deadline: 0,
            time_base: 0,
            emitted: 0,
            last_now: 0,
            elapsed_us: 0,
        }
    }

    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    pub fn next_deadline(&self) -> u32 {
        self.next_deadline
    }

    pub fn time_base(&self) -> u32 {
        self.time_base
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    /// Restarts the time base at `now`; the next poll at or after `now` is due.
    pub fn reset(&mut self, now: u32) {
        self.time_base = now;
        self.next_deadline = now;
        self.emitted = 0;
        self.last_now = now;
        self.elapsed_us = 0;
    }

    /// Applies a new sampling frequency and restarts the time base. Rejected
    /// frequencies leave every field untouched.
    pub fn set_frequency(&mut self, freq_hz: u32, now: u32) -> Result<u32, RateError> {
        let period = period_for(freq_hz)?;
        self.period_us = period;
        self.reset(now);
        Ok(period)
    }

    /// Returns the sample timestamp when a sample is due at `now`.
    pub fn poll(&mut self, now: u32) -> Option<Timestamp> {
        self.elapsed_us += u64::from(now.wrapping_sub(self.last_now));
        self.last_now = now;

        if !reached(now, self.next_deadline) {
            return None;
        }
        self.next_deadline = self.next_deadline.wrapping_add(self.period_us);
        self.emitted = self.emitted.wrapping_add(1);
        Some(Timestamp(self.elapsed_us))
    }

    /// Still behind after the last due tick: the next deadline has already passed.
    pub fn is_lagging(&self, now: u32) -> bool {
        reached(now, self.next_deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deadline_invariant_holds(s: &SampleScheduler) -> bool {
        s.next_deadline()
            == s
                .time_base()
                .wrapping_add(s.emitted().wrapping_mul(s.period_us()))
    }

    #[test]
    fn period_is_floor_of_one_million_over_frequency() {
        assert_eq!(period_for(250), Ok(4000));
        assert_eq!(period_for(500), Ok(2000));
        assert_eq!(period_for(3200), Ok(312));
        assert_eq!(period_for(3), Ok(333_333));
        assert_eq!(period_for(1), Ok(1_000_000));
        assert_eq!(period_for(0), Err(RateError::OutOfRange(0)));
        assert_eq!(period_for(3201), Err(RateError::OutOfRange(3201)));
    }

    #[test]
    fn first_poll_after_reset_is_due_at_zero() {
        let mut s = SampleScheduler::default();
        s.reset(1_000);
        assert_eq!(s.poll(1_000), Some(Timestamp::ZERO));
        assert_eq!(s.next_deadline(), 5_000);
        assert!(deadline_invariant_holds(&s));
    }

    #[test]
    fn not_due_ticks_have_no_effect() {
        let mut s = SampleScheduler::default();
        s.reset(0);
        s.poll(0);
        for now in [1, 100, 3_999] {
            assert_eq!(s.poll(now), None);
            assert_eq!(s.next_deadline(), 4_000);
        }
        assert_eq!(s.emitted(), 1);
    }

    #[test]
    fn late_tick_advances_by_one_period_without_drift() {
        let mut s = SampleScheduler::default();
        s.reset(0);
        s.poll(0);
        assert_eq!(s.poll(4_100), Some(Timestamp::from_micros(4_100)));
        assert_eq!(s.next_deadline(), 8_000);
        assert_eq!(s.poll(8_050), Some(Timestamp::from_micros(8_050)));
        assert_eq!(s.next_deadline(), 12_000);
        assert!(deadline_invariant_holds(&s));
    }

    #[test]
    fn catches_up_one_deadline_per_tick_when_behind() {
        let mut s = SampleScheduler::default();
        s.reset(0);
        s.poll(0);
        assert!(s.poll(12_500).is_some());
        assert!(s.is_lagging(12_500));
        assert!(s.poll(12_500).is_some());
        assert!(s.poll(12_500).is_some());
        assert!(!s.is_lagging(12_500));
        assert_eq!(s.poll(12_500), None);
    }

    #[test]
    fn deadlines_survive_counter_wraparound() {
        let start = u32::MAX - 1_000;
        let mut s = SampleScheduler::default();
        s.reset(start);
        assert_eq!(s.poll(start), Some(Timestamp::ZERO));
        assert_eq!(s.next_deadline(), 2_999);

        // a plain `now >= deadline` would fire here
        assert_eq!(s.poll(u32::MAX), None);
        assert_eq!(s.poll(2_000), None);
        assert_eq!(s.poll(3_000), Some(Timestamp::from_micros(4_001)));
        assert!(deadline_invariant_holds(&s));
    }

    #[test]
    fn rejected_frequency_leaves_state_untouched() {
        let mut s = SampleScheduler::default();
        s.reset(10);
        s.poll(10);
        assert_eq!(s.set_frequency(0, 999), Err(RateError::OutOfRange(0)));
        assert_eq!(s.set_frequency(5_000, 999), Err(RateError::OutOfRange(5_000)));
        assert_eq!(s.period_us(), 4_000);
        assert_eq!(s.time_base(), 10);
        assert_eq!(s.next_deadline(), 4_010);
    }

    #[test]
    fn accepted_frequency_resets_time_base() {
        let mut s = SampleScheduler::default();
        s.reset(0);
        s.poll(0);
        s.poll(4_000);
        assert_eq!(s.set_frequency(500, 6_000), Ok(2_000));
        assert_eq!(s.period_us(), 2_000);
        assert_eq!(s.time_base(), 6_000);
        assert_eq!(s.poll(6_000), Some(Timestamp::ZERO));
        assert_eq!(s.poll(8_000), Some(Timestamp::from_micros(2_000)));
    }

    #[test]
    fn timestamp_renders_six_fraction_digits() {
        let mut out = heapless::String::<32>::new();
        core::fmt::write(&mut out, format_args!("{}", Timestamp::from_micros(12_004_000))).unwrap();
        assert_eq!(out.as_str(), "12.004000");
        out.clear();
        core::fmt::write(&mut out, format_args!("{}", Timestamp::ZERO)).unwrap();
        assert_eq!(out.as_str(), "0.000000");
    }
}

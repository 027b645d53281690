//! The poll-sample-emit control loop.
//!
//! One owned context holds every piece of mutable state: sensors, clock, host
//! link, scheduler and command buffer. Each `tick` drains host commands,
//! polls the scheduler once and, when a sample is due, reads every sensor and
//! writes one CSV record.

use crate::clock::Monotonic;
use crate::command::{Command, CommandInterpreter};
use crate::config::{ERROR_LOG_EVERY, STATS_REPORT_PERIOD_US};
use crate::drivers::{Accelerometer, Adxl345Error, Sample};
use crate::host::HostLink;
use crate::scheduler::{SampleScheduler, Timestamp};
use crate::stream::{self, HELP_TEXT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// No sample due.
    Idle,
    Emitted(Timestamp),
    /// A sensor read failed; nothing was written for this deadline.
    Skipped,
    /// Sampled, but the host link refused the record.
    Dropped(Timestamp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionStats {
    pub emitted: u32,
    pub skipped: u32,
    pub dropped: u32,
    /// Due ticks that found the following deadline already passed.
    pub late: u32,
}

pub struct Acquisition<S, C, H, const N: usize> {
    sensors: [S; N],
    clock: C,
    host: H,
    scheduler: SampleScheduler,
    commands: CommandInterpreter,
    stats: AcquisitionStats,
    consecutive_errors: u32,
    window_start: u32,
    window_emitted: u32,
}

impl<S, C, H, const N: usize> Acquisition<S, C, H, N>
where
    S: Accelerometer,
    C: Monotonic,
    H: HostLink,
{
    pub fn new(sensors: [S; N], clock: C, host: H) -> Self {
        Self {
            sensors,
            clock,
            host,
            scheduler: SampleScheduler::default(),
            commands: CommandInterpreter::new(),
            stats: AcquisitionStats::default(),
            consecutive_errors: 0,
            window_start: 0,
            window_emitted: 0,
        }
    }

    /// Brings up every sensor in order, starts the time base and writes the
    /// column header. Returns the last initialization error, if any; the loop
    /// can run regardless.
    pub fn start(&mut self) -> Result<(), Adxl345Error> {
        let mut result = Ok(());

        for (i, sensor) in self.sensors.iter_mut().enumerate() {
            info!("Initializing sensor {}/{}", i + 1, N);
            if let Err(e) = sensor.initialize() {
                error!("Sensor {} initialization failed: {:?}", i, e);
                result = Err(e);
                continue;
            }
            match sensor.verify_id() {
                Ok(true) => info!("Sensor {} ID verified", i),
                Ok(false) => warn!("Sensor {} answered with a foreign ID", i),
                Err(e) => warn!("Sensor {} ID read failed: {:?}", i, e),
            }
        }

        let now = self.clock.now_us();
        self.scheduler.reset(now);
        self.restart_window(now);
        self.emit_header();
        info!(
            "Streaming {} sensor(s), period {} us",
            N,
            self.scheduler.period_us()
        );
        result
    }

    /// One loop iteration. Never blocks beyond the sensor bus transfers.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now_us();

        while let Some(byte) = self.host.try_read() {
            if let Some(command) = self.commands.push(byte) {
                self.execute(command, now);
            }
        }

        let Some(timestamp) = self.scheduler.poll(now) else {
            return TickOutcome::Idle;
        };
        if self.scheduler.is_lagging(now) {
            self.stats.late = self.stats.late.wrapping_add(1);
        }

        let mut samples = [Sample::default(); N];
        for i in 0..N {
            match self.sensors[i].read_sample() {
                Ok(sample) => samples[i] = sample,
                Err(e) => {
                    self.note_read_error(i, e);
                    return TickOutcome::Skipped;
                }
            }
        }
        if self.consecutive_errors > 0 {
            info!(
                "Sensor reads recovered after {} consecutive errors",
                self.consecutive_errors
            );
            self.consecutive_errors = 0;
        }

        let outcome = match stream::format_record(timestamp, &samples) {
            Ok(record) => match self.host.write_all(record.as_bytes()) {
                Ok(()) => {
                    self.stats.emitted = self.stats.emitted.wrapping_add(1);
                    self.window_emitted = self.window_emitted.wrapping_add(1);
                    TickOutcome::Emitted(timestamp)
                }
                Err(e) => {
                    self.stats.dropped = self.stats.dropped.wrapping_add(1);
                    debug!("record dropped: {:?}", e);
                    TickOutcome::Dropped(timestamp)
                }
            },
            Err(e) => {
                error!("record formatting failed: {:?}", e);
                self.stats.dropped = self.stats.dropped.wrapping_add(1);
                TickOutcome::Dropped(timestamp)
            }
        };

        self.report(now);
        outcome
    }

    fn execute(&mut self, command: Command, now: u32) {
        match command {
            Command::SetFrequency(hz) => match self.scheduler.set_frequency(hz, now) {
                Ok(period) => {
                    info!("Sample rate set to {} Hz ({} us period)", hz, period);
                    self.restart_window(now);
                    self.emit_header();
                }
                Err(e) => debug!("Rate command ignored: {:?}", e),
            },
            Command::Help => {
                debug!("Help requested");
                if let Err(e) = self.host.write_all(HELP_TEXT.as_bytes()) {
                    debug!("help text dropped: {:?}", e);
                }
            }
        }
    }

    fn emit_header(&mut self) {
        match stream::header(N) {
            Ok(header) => {
                if let Err(e) = self.host.write_all(header.as_bytes()) {
                    debug!("header dropped: {:?}", e);
                }
            }
            Err(e) => error!("header formatting failed: {:?}", e),
        }
    }

    fn note_read_error(&mut self, sensor: usize, e: Adxl345Error) {
        self.stats.skipped = self.stats.skipped.wrapping_add(1);
        self.consecutive_errors += 1;
        if self.consecutive_errors % ERROR_LOG_EVERY == 1 {
            warn!(
                "Sensor {} read error #{}: {:?}, sample skipped",
                sensor, self.stats.skipped, e
            );
        }
    }

    fn restart_window(&mut self, now: u32) {
        self.window_start = now;
        self.window_emitted = 0;
    }

    fn report(&mut self, now: u32) {
        let elapsed = now.wrapping_sub(self.window_start);
        if elapsed < STATS_REPORT_PERIOD_US {
            return;
        }
        info!(
            "Stream: {} records in {} us ({} skipped, {} dropped, {} late total)",
            self.window_emitted,
            elapsed,
            self.stats.skipped,
            self.stats.dropped,
            self.stats.late
        );
        self.restart_window(now);
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn scheduler(&self) -> &SampleScheduler {
        &self.scheduler
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn sensors_mut(&mut self) -> &mut [S; N] {
        &mut self.sensors
    }
}

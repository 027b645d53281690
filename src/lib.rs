#![cfg_attr(not(test), no_std)]

// must come first so the logging macros are visible to every module
mod fmt;

pub mod acquisition;
pub mod clock;
pub mod command;
pub mod config;
pub mod drivers;
pub mod host;
pub mod scheduler;
pub mod stream;

#[cfg(feature = "firmware")]
pub mod board;
#[cfg(feature = "firmware")]
pub mod ipc;
#[cfg(feature = "firmware")]
pub mod tasks;

pub use acquisition::{Acquisition, AcquisitionStats, TickOutcome};
pub use clock::Monotonic;
pub use command::{Command, CommandInterpreter};
pub use drivers::{Accelerometer, Adxl345, DeviceConfig, Sample};
pub use host::{HostLink, LinkError};
pub use scheduler::{SampleScheduler, Timestamp};

#[cfg(feature = "firmware")]
pub use board::Board;

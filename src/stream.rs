//! CSV rendering of sample sets for the host channel.

use core::fmt::Write;

use heapless::String;

use crate::config::RECORD_CAPACITY;
use crate::drivers::Sample;
use crate::scheduler::Timestamp;

pub const HELP_TEXT: &str = "Commands: F=<1-3200> Hz  | H help\n";

pub type Record = String<RECORD_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Rendered line does not fit in `RECORD_CAPACITY`.
    Capacity,
}

impl From<core::fmt::Error> for FormatError {
    fn from(_: core::fmt::Error) -> Self {
        Self::Capacity
    }
}

/// Column header for `arity` sensors: `time,x,y,z` for one, indexed
/// `time,x0,y0,z0,x1,y1,z1,...` otherwise.
pub fn header(arity: usize) -> Result<Record, FormatError> {
    let mut line = Record::new();
    line.push_str("time").map_err(|_| FormatError::Capacity)?;
    if arity == 1 {
        line.push_str(",x,y,z").map_err(|_| FormatError::Capacity)?;
    } else {
        for i in 0..arity {
            write!(line, ",x{i},y{i},z{i}")?;
        }
    }
    line.push('\n').map_err(|_| FormatError::Capacity)?;
    Ok(line)
}

/// `<t>,<x0>,<y0>,<z0>[,<x1>,<y1>,<z1>...]\n`, six decimals per field.
/// Every sample in the set shares the one timestamp.
pub fn format_record(timestamp: Timestamp, samples: &[Sample]) -> Result<Record, FormatError> {
    let mut line = Record::new();
    write!(line, "{timestamp}")?;
    for s in samples {
        write!(line, ",{:.6},{:.6},{:.6}", s.accel.x, s.accel.y, s.accel.z)?;
    }
    line.push('\n').map_err(|_| FormatError::Capacity)?;
    Ok(line)
}

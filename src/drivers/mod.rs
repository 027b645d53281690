pub mod adxl345;
pub mod bus;

#[cfg(test)]
pub(crate) mod testing;

pub use adxl345::{Accelerometer, Adxl345, Adxl345Error, DeviceConfig, RawAxes, Sample, Vector3};
pub use bus::{BusError, BusFormat, SpiRegisterBus};

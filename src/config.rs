// Centralize all configuration constants
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 250;
pub const DEFAULT_SAMPLE_PERIOD_US: u32 = 1_000_000 / DEFAULT_SAMPLE_RATE_HZ;
pub const MIN_SAMPLE_RATE_HZ: u32 = 1;
pub const MAX_SAMPLE_RATE_HZ: u32 = 3200;

pub const SPI_FREQUENCY_HZ: u32 = 2_000_000;

#[cfg(not(feature = "dual"))]
pub const SENSOR_COUNT: usize = 1;
#[cfg(feature = "dual")]
pub const SENSOR_COUNT: usize = 2;
pub const MAX_SENSORS: usize = 4;

// Buffer sizes
pub const COMMAND_LINE_CAPACITY: usize = 64;
pub const RECORD_CAPACITY: usize = 256;
pub const HOST_RX_PIPE_SIZE: usize = 128;
pub const HOST_TX_PIPE_SIZE: usize = 1024;

// USB identity
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0345;
pub const USB_MANUFACTURER: &str = "Fly";
pub const USB_PRODUCT: &str = "ADXL345 USB";
pub const USB_SERIAL_NUMBER: &str = "0001";
pub const USB_MAX_PACKET_SIZE: u16 = 64;

// Diagnostics
pub const STATS_REPORT_PERIOD_US: u32 = 1_000_000;
pub const ERROR_LOG_EVERY: u32 = 100;

const _: () = assert!(SENSOR_COUNT >= 1 && SENSOR_COUNT <= MAX_SENSORS);

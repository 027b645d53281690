pub mod acquire;
pub mod usb;

pub use acquire::{acquisition_task, FirmwareAcquisition};
pub use usb::{usb_device_task, usb_rx_task, usb_setup, usb_tx_task};

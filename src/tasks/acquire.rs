use embassy_executor::task;
use embassy_futures::yield_now;
use embassy_time::{Duration, Timer};

use crate::board::{SensorSelect, SensorSpi};
use crate::clock::EmbassyClock;
use crate::config::SENSOR_COUNT;
use crate::drivers::Adxl345;
use crate::ipc::{host_connected, UsbLink};
use crate::Acquisition;

pub type FirmwareAcquisition =
    Acquisition<Adxl345<SensorSpi, SensorSelect>, EmbassyClock, UsbLink, SENSOR_COUNT>;

#[task]
pub async fn acquisition_task(mut acq: FirmwareAcquisition) {
    // the header goes out once somebody is listening
    while !host_connected() {
        Timer::after(Duration::from_millis(10)).await;
    }

    if let Err(e) = acq.start() {
        error!("Sensor bring-up incomplete: {:?}", e);
    }
    info!("Acquisition loop running");

    loop {
        acq.tick();
        // lets the USB tasks run between polls
        yield_now().await;
    }
}

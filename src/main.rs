#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use {defmt_rtt as _, panic_probe as _};

use adxl345usb::{
    clock::EmbassyClock,
    config::SENSOR_COUNT,
    drivers::{Adxl345, DeviceConfig},
    ipc::UsbLink,
    tasks::{acquisition_task, usb_device_task, usb_rx_task, usb_setup, usb_tx_task},
    Acquisition, Board,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting adxl345usb with {} sensor(s)", SENSOR_COUNT);
    let board = Board::init();

    let (usb, tx, rx) = usb_setup(board.usb);
    spawner.spawn(usb_device_task(usb)).unwrap();
    spawner.spawn(usb_rx_task(rx)).unwrap();
    spawner.spawn(usb_tx_task(tx)).unwrap();
    info!("USB tasks spawned");

    let sensors = board
        .sensors
        .map(|bus| Adxl345::new(bus, DeviceConfig::default()));
    let acq = Acquisition::new(sensors, EmbassyClock, UsbLink);
    spawner.spawn(acquisition_task(acq)).unwrap();
    info!("Acquisition task spawned");
}

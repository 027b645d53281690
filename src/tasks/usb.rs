//! USB CDC-ACM transport feeding the host pipes.

use embassy_executor::task;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, UsbDevice};
use portable_atomic::Ordering;
use static_cell::StaticCell;

use crate::board::UsbDriver;
use crate::config::{
    USB_MANUFACTURER, USB_MAX_PACKET_SIZE, USB_PID, USB_PRODUCT, USB_SERIAL_NUMBER, USB_VID,
};
use crate::ipc::{HOST_CONNECTED, HOST_RX, HOST_TX};

const PACKET: usize = USB_MAX_PACKET_SIZE as usize;

pub fn usb_setup(
    driver: UsbDriver,
) -> (
    UsbDevice<'static, UsbDriver>,
    Sender<'static, UsbDriver>,
    Receiver<'static, UsbDriver>,
) {
    static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static MSOS_DESC: StaticCell<[u8; 64]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    static CDC_STATE: StaticCell<State> = StaticCell::new();

    let mut config = embassy_usb::Config::new(USB_VID, USB_PID);
    config.manufacturer = Some(USB_MANUFACTURER);
    config.product = Some(USB_PRODUCT);
    config.serial_number = Some(USB_SERIAL_NUMBER);
    config.max_power = 100;
    config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        MSOS_DESC.init([0; 64]),
        CONTROL_BUF.init([0; 64]),
    );
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), USB_MAX_PACKET_SIZE);
    let usb = builder.build();
    let (tx, rx) = class.split();

    (usb, tx, rx)
}

#[task]
pub async fn usb_device_task(mut usb: UsbDevice<'static, UsbDriver>) {
    usb.run().await;
}

#[task]
pub async fn usb_rx_task(mut rx: Receiver<'static, UsbDriver>) {
    let mut buf = [0u8; PACKET];

    loop {
        rx.wait_connection().await;
        // stale records from an earlier session are not replayed
        HOST_TX.clear();
        HOST_CONNECTED.store(true, Ordering::Release);
        info!("Host connected");

        loop {
            match rx.read_packet(&mut buf).await {
                Ok(n) => HOST_RX.write_all(&buf[..n]).await,
                Err(EndpointError::BufferOverflow) => warn!("USB RX packet overflow"),
                Err(EndpointError::Disabled) => break,
            }
        }

        HOST_CONNECTED.store(false, Ordering::Release);
        info!("Host disconnected, output suspended");
    }
}

#[task]
pub async fn usb_tx_task(mut tx: Sender<'static, UsbDriver>) {
    let mut buf = [0u8; PACKET];

    loop {
        tx.wait_connection().await;
        loop {
            let n = HOST_TX.read(&mut buf).await;
            if tx.write_packet(&buf[..n]).await.is_err() {
                break;
            }
            // a full packet needs a ZLP to end the transfer when nothing follows
            if n == PACKET && HOST_TX.is_empty() && tx.write_packet(&[]).await.is_err() {
                break;
            }
        }
    }
}

//! nRF52840-DK implementation of `Platform`.
//!
//! LEDs are driven directly. Advertising requests are handed to the
//! advertising task. Notifications go to the SoftDevice once the bound
//! link has enabled them.

use nrf_softdevice::ble::gatt_server::{self, NotifyValueError};
use nrf_softdevice::ble::Connection;

use crate::ble::gatt::ButtonServer;
use crate::ble::peripheral::{AdvertisingCommand, AdvertisingSignal};
use crate::ble::ConnHandle;
use crate::error::StackError;
use crate::platform::Platform;
use crate::ui::leds::StatusLeds;
use crate::ui::Led;

pub struct NrfBoard {
    leds: StatusLeds,
    server: &'static ButtonServer,
    advertising: &'static AdvertisingSignal,
}

impl NrfBoard {
    pub fn new(
        leds: StatusLeds,
        server: &'static ButtonServer,
        advertising: &'static AdvertisingSignal,
    ) -> Self {
        Self {
            leds,
            server,
            advertising,
        }
    }
}

impl Platform for NrfBoard {
    fn set_led(&mut self, led: Led, on: bool) {
        self.leds.set(led, on);
    }

    fn start_advertising(&mut self) -> Result<(), StackError> {
        self.advertising.signal(AdvertisingCommand::Start);
        Ok(())
    }

    fn stop_advertising(&mut self) {
        self.advertising.signal(AdvertisingCommand::Stop);
    }

    fn bind_write_queue(&mut self, conn: Option<ConnHandle>) {
        self.server.bind(conn);
    }

    fn notify(
        &mut self,
        conn: Option<ConnHandle>,
        value_handle: u16,
        data: &[u8],
    ) -> Result<(), StackError> {
        let target = self.server.notify_target(conn)?;
        let conn =
            Connection::from_handle(target.raw()).ok_or(StackError::InvalidConnection)?;

        gatt_server::notify_value(&conn, value_handle, data).map_err(|e| match e {
            NotifyValueError::Disconnected => StackError::InvalidConnection,
            NotifyValueError::Raw(raw) => {
                warn!("notify rejected: {:?}", raw);
                StackError::Raw(raw as u32)
            }
        })
    }
}

//! Platform trait - the boundary between the dispatcher and the hardware.
//!
//! ```text
//!   button task ─┐                    ┌─▶ LEDs
//!                ├─▶ EventDispatcher ─┤
//!   BLE stack  ──┘     (pure logic)   └─▶ SoftDevice (advertise, notify)
//! ```
//!
//! `board::NrfBoard` implements it on the nRF52840-DK; tests use a
//! recording mock.

use crate::ble::ConnHandle;
use crate::error::StackError;
use crate::ui::Led;

pub trait Platform {
    /// Drive a status LED.
    fn set_led(&mut self, led: Led, on: bool);

    /// Begin broadcasting the configured payload. Restarts from scratch if
    /// advertising was already running.
    fn start_advertising(&mut self) -> Result<(), StackError>;

    /// Halt advertising.
    fn stop_advertising(&mut self);

    /// Bind the GATT write queue to a link, or release it with `None`.
    fn bind_write_queue(&mut self, conn: Option<ConnHandle>);

    /// Queue a notification of `data` on attribute `value_handle`.
    ///
    /// `conn` is passed through as-is; with `None` the stack has no link
    /// to target and reports `StackError::InvalidConnection`.
    fn notify(
        &mut self,
        conn: Option<ConnHandle>,
        value_handle: u16,
        data: &[u8],
    ) -> Result<(), StackError>;
}

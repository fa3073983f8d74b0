//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Identity** - GAP name, appearance and preferred connection
//!    parameters.
//! 2. **Service catalog** - one vendor-UUID service with a 1-byte
//!    read/notify characteristic mirroring the button.
//! 3. **Advertising** - payload encoding and the advertise/connect loop.
//! 4. **Connection parameters** - post-connection negotiation.
//!
//! The pure parts (descriptors, encoders, policies) build on the host;
//! the SoftDevice bindings need the `embedded` feature. Link events are
//! published to the dispatcher task through the channel in `main.rs`.

pub mod adv_parser;
pub mod advertising;
pub mod conn_params;
pub mod identity;
pub mod service;

#[cfg(feature = "embedded")]
pub mod gap;
#[cfg(feature = "embedded")]
pub mod gatt;
#[cfg(feature = "embedded")]
pub mod negotiation;
#[cfg(feature = "embedded")]
pub mod peripheral;

use crate::error::StackError;

/// SoftDevice's `BLE_CONN_HANDLE_INVALID`.
pub const CONN_HANDLE_INVALID: u16 = 0xFFFF;

/// Handle of a live connection. Never holds `CONN_HANDLE_INVALID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnHandle(u16);

impl ConnHandle {
    /// `None` for the invalid sentinel.
    pub const fn from_raw(raw: u16) -> Option<Self> {
        if raw == CONN_HANDLE_INVALID {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Events the BLE stack publishes for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// A central connected.
    Connected(ConnHandle),
    /// The link with the given handle is gone.
    Disconnected(ConnHandle),
    /// Advertising ended without a connection (finite timeout).
    AdvertisingTimedOut,
    /// The stack refused to advertise.
    AdvertisingFailed(StackError),
}

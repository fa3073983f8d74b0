//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::ble::advertising::AdvertisingParams;
use crate::ble::conn_params::NegotiationConfig;
use crate::ble::identity::{
    ms_to_10ms_units, ms_to_1_25ms_units, ConnParams, PeripheralIdentity, SecurityMode,
};
use crate::ble::service::{ServiceDescriptor, Uuid128};
use crate::dispatcher::NotifyPolicy;
use crate::error::ConfigError;

// GAP

/// Advertised and GAP device name.
pub const DEVICE_NAME: &str = "nRF52840_TechDemo";

/// GAP appearance. 0 = "Unknown", which is what the SoftDevice reports
/// when nothing else is configured.
pub const DEVICE_APPEARANCE: u16 = 0;

/// Preferred connection interval range (in 1.25 ms units).
/// 80 = 100 ms, 160 = 200 ms.
pub const MIN_CONN_INTERVAL: u16 = ms_to_1_25ms_units(100);
pub const MAX_CONN_INTERVAL: u16 = ms_to_1_25ms_units(200);

/// Slave latency (number of connection events the peripheral can skip).
pub const SLAVE_LATENCY: u16 = 0;

/// Supervision timeout (in 10 ms units). 400 = 4 s.
pub const CONN_SUP_TIMEOUT: u16 = ms_to_10ms_units(4000);

/// Write permission on the device name characteristic.
pub const DEVICE_NAME_SECURITY: SecurityMode = SecurityMode::Open;

// Advertising

/// Advertising interval (in 0.625 ms units). 64 = 40 ms.
pub const ADV_INTERVAL: u32 = 64;

/// Advertising timeout (in 10 ms units). `None` advertises until a
/// central connects.
pub const ADV_TIMEOUT: Option<u16> = None;

// Connection parameter negotiation

/// Delay from connection to the first parameter update request (ms).
pub const FIRST_CONN_PARAMS_UPDATE_DELAY_MS: u64 = 20_000;

/// Delay between subsequent update requests (ms).
pub const NEXT_CONN_PARAMS_UPDATE_DELAY_MS: u64 = 5_000;

/// Number of update requests before giving up.
pub const MAX_CONN_PARAMS_UPDATE_COUNT: u8 = 3;

/// Drop the link when the central never accepts our parameters.
pub const DISCONNECT_ON_CONN_PARAMS_FAILURE: bool = true;

// GATT

/// Vendor-specific base UUID (little-endian, as the SoftDevice expects).
/// Bytes 12 and 13 are replaced by the 16-bit alias.
pub const UUID_BASE: Uuid128 = Uuid128::from_le_bytes([
    0x23, 0xD1, 0xBC, 0xEA, 0x5F, 0x78, 0x23, 0x15, 0xDE, 0xEF, 0x12, 0x12, 0x00, 0x00, 0x00, 0x00,
]);

/// 16-bit alias of the button service.
pub const UUID_SERVICE: u16 = 0x1234;

/// 16-bit alias of the button state characteristic.
pub const UUID_BUTTON_CHAR: u16 = 0x1234;

/// Whether a button edge notifies while no central is connected.
/// `Unguarded` hands the send to the stack anyway and logs its rejection.
pub const NOTIFY_POLICY: NotifyPolicy = NotifyPolicy::Unguarded;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  All LEDs are active-low.
//
//   Button 1            → P0.11  (button id 0)
//   LED2 button state   → P0.14
//   LED3 advertising    → P0.15
//   LED4 connected      → P0.16

/// Logical id of the button mirrored over BLE.
pub const BUTTON_0: u8 = 0;

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

// Tasks

/// Depth of the event queue feeding the dispatcher.
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Preferred connection parameters advertised through PPCP and enforced
/// by the negotiator.
pub const fn preferred_conn_params() -> ConnParams {
    ConnParams {
        min_interval: MIN_CONN_INTERVAL,
        max_interval: MAX_CONN_INTERVAL,
        slave_latency: SLAVE_LATENCY,
        supervision_timeout: CONN_SUP_TIMEOUT,
    }
}

/// GAP identity of this firmware.
pub fn identity() -> Result<PeripheralIdentity, ConfigError> {
    PeripheralIdentity::new(
        DEVICE_NAME,
        DEVICE_APPEARANCE,
        preferred_conn_params(),
        DEVICE_NAME_SECURITY,
    )
}

/// The one service this firmware exposes.
pub const fn button_service() -> ServiceDescriptor {
    ServiceDescriptor::button(UUID_BASE, UUID_SERVICE, UUID_BUTTON_CHAR)
}

pub const fn advertising_params() -> AdvertisingParams {
    AdvertisingParams {
        interval: ADV_INTERVAL,
        timeout: ADV_TIMEOUT,
        connectable: true,
    }
}

pub const fn negotiation() -> NegotiationConfig {
    NegotiationConfig {
        first_update_delay_ms: FIRST_CONN_PARAMS_UPDATE_DELAY_MS,
        next_update_delay_ms: NEXT_CONN_PARAMS_UPDATE_DELAY_MS,
        max_update_attempts: MAX_CONN_PARAMS_UPDATE_COUNT,
        disconnect_on_failure: DISCONNECT_ON_CONN_PARAMS_FAILURE,
    }
}

//! nRF52840 BLE peripheral tech demo.
//!
//! Advertises one custom service whose single 1-byte characteristic
//! mirrors a push-button (read + notify), and shows advertising /
//! connection / button state on three LEDs.
//!
//! The crate is split the usual way for firmware that wants host tests:
//!
//! - Pure logic (identity validation, service descriptors, advertising
//!   payload encoding, negotiation policy, the dispatcher state machine)
//!   builds everywhere and is tested with `cargo test`.
//! - SoftDevice / Embassy bindings sit behind the `embedded` feature and
//!   are wired together by `main.rs`.
//!
//! Usage: `cargo test` on the host; `cargo run --release --features
//! embedded --target thumbv7em-none-eabihf` to flash.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible everywhere below.
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Host-testable modules
// ═══════════════════════════════════════════════════════════════════════════

pub mod ble;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod platform;
pub mod ui;

pub use dispatcher::{AppEvent, EventDispatcher, LinkState, NotifyPolicy, PeripheralState};
pub use error::Error;
pub use platform::Platform;

// ═══════════════════════════════════════════════════════════════════════════
// Board support (embedded only)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "embedded")]
pub mod board;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - configuration sanity
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::ble::advertising::{AdvertisingContent, AdvertisingPayload, LE_ONLY_GENERAL_DISC_MODE};
    use super::config;

    #[test]
    fn shipped_identity_is_valid() {
        let identity = config::identity().unwrap();
        assert_eq!(identity.name(), "nRF52840_TechDemo");
        assert_eq!(identity.conn_params().min_interval, 80);
        assert_eq!(identity.conn_params().max_interval, 160);
        assert_eq!(identity.conn_params().supervision_timeout, 400);
    }

    #[test]
    fn shipped_payload_fits() {
        let service = config::button_service().service_uuid128();
        let content = AdvertisingContent {
            name: config::DEVICE_NAME,
            appearance: Some(config::DEVICE_APPEARANCE),
            flags: LE_ONLY_GENERAL_DISC_MODE,
            services: core::slice::from_ref(&service),
        };
        assert!(AdvertisingPayload::build(&content).is_ok());
    }

    #[test]
    fn shipped_negotiation_matches_reference() {
        let n = config::negotiation();
        assert_eq!(n.first_update_delay_ms, 20_000);
        assert_eq!(n.next_update_delay_ms, 5_000);
        assert_eq!(n.max_update_attempts, 3);
        assert!(n.disconnect_on_failure);
    }
}

//! GATT server - registers the button service with the SoftDevice.
//!
//! Built with `ServiceBuilder` rather than the `gatt_server` macro because
//! the service lives on a vendor base UUID described at runtime by a
//! `ServiceDescriptor`, and the dispatcher only needs the attribute handles.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode as SdSecurityMode, Uuid};
use nrf_softdevice::Softdevice;

use crate::ble::identity::SecurityMode;
use crate::ble::service::{
    cccd_notifications_enabled, CccdBinding, CharacteristicHandle, ServiceDescriptor,
};
use crate::ble::ConnHandle;
use crate::error::{Error, StackError};

/// Events surfaced from attribute writes.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonServerEvent {
    /// The central toggled notifications on the button characteristic.
    NotificationsEnabled(bool),
}

/// Registered button service.
pub struct ButtonServer {
    handle: CharacteristicHandle,
    binding: Mutex<CriticalSectionRawMutex, Cell<CccdBinding>>,
}

impl ButtonServer {
    pub fn handle(&self) -> CharacteristicHandle {
        self.handle
    }

    pub fn bind(&self, conn: Option<ConnHandle>) {
        self.update(|b| b.bind(conn));
    }

    /// See [`CccdBinding::notify_target`].
    pub fn notify_target(&self, conn: Option<ConnHandle>) -> Result<ConnHandle, StackError> {
        self.binding.lock(|b| b.get().notify_target(conn))
    }

    fn update<R>(&self, f: impl FnOnce(&mut CccdBinding) -> R) -> R {
        self.binding.lock(|cell| {
            let mut binding = cell.get();
            let r = f(&mut binding);
            cell.set(binding);
            r
        })
    }
}

/// Add the primary service and its characteristic.
///
/// Called once, before advertising is configured. The initial value is 0
/// ("released").
pub fn register_service(
    sd: &mut Softdevice,
    descriptor: &ServiceDescriptor,
) -> Result<ButtonServer, Error> {
    let service_uuid = Uuid::new_128(descriptor.service_uuid128().as_le_bytes());
    let mut service = ServiceBuilder::new(sd, service_uuid).map_err(register_error)?;

    let ch = &descriptor.characteristic;
    let mut props = Properties::default();
    if ch.props.read {
        props = props.read();
    }
    if ch.props.notify {
        props = props.notify();
    }

    let attribute = Attribute::new(ch.initial_value()?)
        .read_security(sd_security(ch.read_access))
        .write_security(SdSecurityMode::NoAccess);
    // CCCD permissions come from the metadata; open write unless told otherwise.
    let metadata = match ch.cccd_write_access {
        SecurityMode::Open => Metadata::new(props),
        SecurityMode::NoAccess => Metadata::with_security(props, SdSecurityMode::NoAccess),
    };

    let char_uuid = Uuid::new_128(descriptor.characteristic_uuid128().as_le_bytes());
    let handles = service
        .add_characteristic(char_uuid, attribute, metadata)
        .map_err(register_error)?
        .build();
    let _service_handle = service.build();

    let handle = CharacteristicHandle {
        value_handle: handles.value_handle,
        cccd_handle: handles.cccd_handle,
    };
    info!(
        "GATT: service 0x{:04x} char 0x{:04x} value={} cccd={}",
        descriptor.uuid, ch.uuid, handle.value_handle, handle.cccd_handle
    );

    Ok(ButtonServer {
        handle,
        binding: Mutex::new(Cell::new(CccdBinding::new())),
    })
}

impl gatt_server::Server for ButtonServer {
    type Event = ButtonServerEvent;

    fn on_write(
        &self,
        conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if handle != self.handle.cccd_handle {
            return None;
        }

        let from = conn.handle().and_then(ConnHandle::from_raw)?;
        let Some(enabled) = cccd_notifications_enabled(data) else {
            warn!("short CCCD write ({} bytes)", data.len());
            return None;
        };

        if !self.update(|b| b.on_cccd_write(from, enabled)) {
            warn!("CCCD write from unbound link {:?} dropped", from);
            return None;
        }
        Some(ButtonServerEvent::NotificationsEnabled(enabled))
    }
}

fn sd_security(mode: SecurityMode) -> SdSecurityMode {
    match mode {
        SecurityMode::Open => SdSecurityMode::Open,
        SecurityMode::NoAccess => SdSecurityMode::NoAccess,
    }
}

fn register_error(e: RegisterError) -> Error {
    warn!("GATT registration failed: {:?}", e);
    Error::Stack(StackError::RegisterFailed)
}

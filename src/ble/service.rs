//! GATT service catalog - the one custom service and its button
//! characteristic.
//!
//! Descriptors are plain data; `ble::gatt` turns them into SoftDevice
//! attributes.

use crate::ble::identity::SecurityMode;
use crate::ble::ConnHandle;
use crate::error::{ConfigError, StackError};

/// Largest value a characteristic may carry in one notification with the
/// default 23-byte ATT MTU.
pub const MAX_CHAR_VALUE_LEN: usize = 20;

static ZEROES: [u8; MAX_CHAR_VALUE_LEN] = [0; MAX_CHAR_VALUE_LEN];

/// 128-bit UUID stored little-endian, the byte order the SoftDevice uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uuid128([u8; 16]);

impl Uuid128 {
    pub const fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn as_le_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Full UUID for a 16-bit alias on this vendor base.
    ///
    /// The SoftDevice keeps the alias in bytes 12 and 13 (little-endian)
    /// of the registered base.
    pub const fn with_alias(self, alias: u16) -> Self {
        let mut bytes = self.0;
        let le = alias.to_le_bytes();
        bytes[12] = le[0];
        bytes[13] = le[1];
        Self(bytes)
    }
}

/// Characteristic properties we support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharProps {
    pub read: bool,
    pub notify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicDescriptor {
    /// 16-bit alias on the service's vendor base.
    pub uuid: u16,
    /// Fixed value length (bytes).
    pub len: usize,
    pub props: CharProps,
    pub read_access: SecurityMode,
    /// Who may enable notifications.
    pub cccd_write_access: SecurityMode,
}

impl CharacteristicDescriptor {
    /// All-zero value of `len` bytes, registered as the initial value.
    pub fn initial_value(&self) -> Result<&'static [u8], ConfigError> {
        match self.len {
            0 => Err(ConfigError::ValueLength),
            n => ZEROES.get(..n).ok_or(ConfigError::ValueLength),
        }
    }
}

/// A primary service with a single characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceDescriptor {
    pub base: Uuid128,
    pub uuid: u16,
    pub characteristic: CharacteristicDescriptor,
}

impl ServiceDescriptor {
    /// Button service: one byte, readable and notifiable, open security.
    pub const fn button(base: Uuid128, service_uuid: u16, characteristic_uuid: u16) -> Self {
        Self {
            base,
            uuid: service_uuid,
            characteristic: CharacteristicDescriptor {
                uuid: characteristic_uuid,
                len: 1,
                props: CharProps {
                    read: true,
                    notify: true,
                },
                read_access: SecurityMode::Open,
                cccd_write_access: SecurityMode::Open,
            },
        }
    }

    pub const fn service_uuid128(&self) -> Uuid128 {
        self.base.with_alias(self.uuid)
    }

    pub const fn characteristic_uuid128(&self) -> Uuid128 {
        self.base.with_alias(self.characteristic.uuid)
    }
}

/// Attribute handles assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicHandle {
    pub value_handle: u16,
    pub cccd_handle: u16,
}

/// Decode a CCCD write. Bit 0 enables notifications.
///
/// Returns `None` for a write too short to be a CCCD value.
pub fn cccd_notifications_enabled(data: &[u8]) -> Option<bool> {
    data.first().map(|b| b & 0x01 != 0)
}

/// Write-queue binding of the button characteristic.
///
/// Tracks the link the dispatcher bound and the last CCCD value that link
/// wrote. Notifications only go out to the bound link once it has enabled
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CccdBinding {
    bound: Option<ConnHandle>,
    cccd: Option<(ConnHandle, bool)>,
}

impl CccdBinding {
    pub const fn new() -> Self {
        Self {
            bound: None,
            cccd: None,
        }
    }

    pub fn bound(&self) -> Option<ConnHandle> {
        self.bound
    }

    /// Bind to `conn`, or release with `None`.
    ///
    /// A CCCD write `conn` made before the bind (the GATT server runs
    /// before the dispatcher sees the connect) is kept; any other is
    /// forgotten.
    pub fn bind(&mut self, conn: Option<ConnHandle>) {
        self.bound = conn;
        let keep = matches!((self.cccd, conn), (Some((h, _)), Some(c)) if h == c);
        if !keep {
            self.cccd = None;
        }
    }

    /// Record a CCCD write. Returns `false` when it came from a link other
    /// than the bound one and was dropped.
    pub fn on_cccd_write(&mut self, from: ConnHandle, enabled: bool) -> bool {
        match self.bound {
            Some(bound) if bound != from => false,
            _ => {
                self.cccd = Some((from, enabled));
                true
            }
        }
    }

    pub fn notifications_enabled(&self, conn: ConnHandle) -> bool {
        self.bound == Some(conn) && self.cccd == Some((conn, true))
    }

    /// Link a notification may be sent on.
    ///
    /// `InvalidConnection` without a link or for a link that isn't bound;
    /// `NotifyFailed` while the bound link has notifications off.
    pub fn notify_target(&self, conn: Option<ConnHandle>) -> Result<ConnHandle, StackError> {
        let conn = conn.ok_or(StackError::InvalidConnection)?;
        if self.bound != Some(conn) {
            return Err(StackError::InvalidConnection);
        }
        if !self.notifications_enabled(conn) {
            return Err(StackError::NotifyFailed);
        }
        Ok(conn)
    }
}

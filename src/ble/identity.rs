//! GAP identity: device name, appearance, and preferred connection
//! parameters.
//!
//! Everything here is validated against the Bluetooth Core limits before
//! it reaches the SoftDevice, so a bad constant fails at startup instead
//! of being silently clamped by the stack.

use crate::error::ConfigError;

/// Longest device name we accept (bytes).
pub const MAX_DEVICE_NAME_LEN: usize = 32;

const CONN_INTERVAL_MIN: u16 = 6; // 7.5 ms
const CONN_INTERVAL_MAX: u16 = 3200; // 4 s
const SLAVE_LATENCY_MAX: u16 = 499;
const SUP_TIMEOUT_MIN: u16 = 10; // 100 ms
const SUP_TIMEOUT_MAX: u16 = 3200; // 32 s

/// Convert milliseconds to 1.25 ms units (connection interval).
pub const fn ms_to_1_25ms_units(ms: u32) -> u16 {
    (ms * 1000 / 1250) as u16
}

/// Convert milliseconds to 10 ms units (supervision timeout).
pub const fn ms_to_10ms_units(ms: u32) -> u16 {
    (ms / 10) as u16
}

/// Connection parameters, in the SoftDevice's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnParams {
    /// 1.25 ms units.
    pub min_interval: u16,
    /// 1.25 ms units.
    pub max_interval: u16,
    pub slave_latency: u16,
    /// 10 ms units.
    pub supervision_timeout: u16,
}

impl ConnParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval_range = CONN_INTERVAL_MIN..=CONN_INTERVAL_MAX;
        if !interval_range.contains(&self.min_interval)
            || !interval_range.contains(&self.max_interval)
        {
            return Err(ConfigError::IntervalOutOfRange);
        }
        if self.min_interval > self.max_interval {
            return Err(ConfigError::IntervalOrder);
        }
        if self.slave_latency > SLAVE_LATENCY_MAX {
            return Err(ConfigError::LatencyOutOfRange);
        }
        if !(SUP_TIMEOUT_MIN..=SUP_TIMEOUT_MAX).contains(&self.supervision_timeout) {
            return Err(ConfigError::TimeoutOutOfRange);
        }

        // timeout_ms > (1 + latency) * interval_ms * 2, with timeout in
        // 10 ms units and interval in 1.25 ms units: timeout * 4 > (1 + latency) * interval.
        let timeout = u32::from(self.supervision_timeout) * 4;
        let window = (1 + u32::from(self.slave_latency)) * u32::from(self.max_interval);
        if timeout <= window {
            return Err(ConfigError::TimeoutTooShort);
        }
        Ok(())
    }

    /// Whether the parameters a central picked satisfy these preferred ones.
    pub fn accepts(&self, current: &ConnParams) -> bool {
        (self.min_interval..=self.max_interval).contains(&current.min_interval)
            && current.slave_latency == self.slave_latency
            && current.supervision_timeout == self.supervision_timeout
    }
}

/// Security mode 1 levels we use for GAP attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityMode {
    /// No access at all.
    NoAccess,
    /// Mode 1 level 1: no encryption, no authentication.
    Open,
}

impl SecurityMode {
    /// `(security mode, level)` pair as packed by the SoftDevice.
    pub const fn mode_level(self) -> (u8, u8) {
        match self {
            SecurityMode::NoAccess => (0, 0),
            SecurityMode::Open => (1, 1),
        }
    }
}

/// Validated GAP identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralIdentity {
    name: &'static str,
    appearance: u16,
    conn_params: ConnParams,
    security: SecurityMode,
}

impl PeripheralIdentity {
    pub fn new(
        name: &'static str,
        appearance: u16,
        conn_params: ConnParams,
        security: SecurityMode,
    ) -> Result<Self, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::NameEmpty);
        }
        if name.len() > MAX_DEVICE_NAME_LEN {
            return Err(ConfigError::NameTooLong);
        }
        conn_params.validate()?;

        Ok(Self {
            name,
            appearance,
            conn_params,
            security,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn appearance(&self) -> u16 {
        self.appearance
    }

    pub fn conn_params(&self) -> &ConnParams {
        &self.conn_params
    }

    pub fn security(&self) -> SecurityMode {
        self.security
    }
}

//! Unified error type for techdemo.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (with the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The SoftDevice (or the platform standing in for it) refused a call.
    Stack(StackError),

    /// A compile-time setting violates a Bluetooth Core limit.
    Config(ConfigError),

    /// The advertising payload could not be encoded.
    Advertising(AdvError),
}

/// Failures reported by the BLE stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackError {
    /// Raw error code from the SoftDevice.
    Raw(u32),
    /// The call targeted a connection that does not exist.
    InvalidConnection,
    /// Service or characteristic registration failed.
    RegisterFailed,
    /// Advertising could not be started.
    AdvertiseFailed,
    /// The bound link has not enabled notifications.
    NotifyFailed,
}

/// Invalid compile-time settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    NameEmpty,
    NameTooLong,
    /// Connection interval outside 7.5 ms ..= 4 s.
    IntervalOutOfRange,
    /// Minimum interval above maximum.
    IntervalOrder,
    LatencyOutOfRange,
    /// Supervision timeout outside 100 ms ..= 32 s.
    TimeoutOutOfRange,
    /// Supervision timeout shorter than `(1 + latency) * max_interval * 2`.
    TimeoutTooShort,
    /// Characteristic value length outside 1 ..= `MAX_CHAR_VALUE_LEN`.
    ValueLength,
}

/// Which of the two advertising buffers overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvBuffer {
    Advertising,
    ScanResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvError {
    /// Encoded content needs `needed` bytes; a legacy PDU carries 31.
    SizeExceeded { buffer: AdvBuffer, needed: usize },
}

// Convenience conversions

impl From<StackError> for Error {
    fn from(e: StackError) -> Self {
        Error::Stack(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<AdvError> for Error {
    fn from(e: AdvError) -> Self {
        Error::Advertising(e)
    }
}

//! GAP setup - applies a validated `PeripheralIdentity` to the SoftDevice.

use nrf_softdevice::{raw, RawError, Softdevice};

use crate::ble::identity::{ConnParams, PeripheralIdentity, SecurityMode};
use crate::error::{Error, StackError};

/// Set device name, appearance and preferred connection parameters.
///
/// Must run after `Softdevice::enable`; the `&Softdevice` is proof of that.
pub fn configure(_sd: &Softdevice, identity: &PeripheralIdentity) -> Result<(), Error> {
    let sec_mode = sec_mode(identity.security());
    let name = identity.name().as_bytes();

    // SAFETY: the SoftDevice is enabled and copies the name and params
    // before returning.
    let ret = unsafe {
        raw::sd_ble_gap_device_name_set(&sec_mode, name.as_ptr(), name.len() as u16)
    };
    RawError::convert(ret).map_err(raw_error)?;

    let ret = unsafe { raw::sd_ble_gap_appearance_set(identity.appearance()) };
    RawError::convert(ret).map_err(raw_error)?;

    let ppcp = to_raw(identity.conn_params());
    let ret = unsafe { raw::sd_ble_gap_ppcp_set(&ppcp) };
    RawError::convert(ret).map_err(raw_error)?;

    info!(
        "GAP: name={} interval={}..{} latency={} timeout={}",
        identity.name(),
        ppcp.min_conn_interval,
        ppcp.max_conn_interval,
        ppcp.slave_latency,
        ppcp.conn_sup_timeout
    );
    Ok(())
}

pub(crate) fn sec_mode(mode: SecurityMode) -> raw::ble_gap_conn_sec_mode_t {
    let (sm, lv) = mode.mode_level();
    raw::ble_gap_conn_sec_mode_t {
        _bitfield_1: raw::ble_gap_conn_sec_mode_t::new_bitfield_1(sm, lv),
    }
}

pub(crate) fn to_raw(params: &ConnParams) -> raw::ble_gap_conn_params_t {
    raw::ble_gap_conn_params_t {
        min_conn_interval: params.min_interval,
        max_conn_interval: params.max_interval,
        slave_latency: params.slave_latency,
        conn_sup_timeout: params.supervision_timeout,
    }
}

pub(crate) fn from_raw(params: &raw::ble_gap_conn_params_t) -> ConnParams {
    ConnParams {
        min_interval: params.min_conn_interval,
        max_interval: params.max_conn_interval,
        slave_latency: params.slave_latency,
        supervision_timeout: params.conn_sup_timeout,
    }
}

pub(crate) fn raw_error(e: RawError) -> Error {
    Error::Stack(StackError::Raw(e as u32))
}

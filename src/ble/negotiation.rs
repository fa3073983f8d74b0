//! Connection parameter negotiation task body.
//!
//! Drives a `Negotiator` against a live `Connection`. Runs alongside the
//! GATT server for the lifetime of the link and returns once the outcome
//! is settled; the caller keeps the link open afterwards.

use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::Connection;

use crate::ble::conn_params::{NegotiationStep, Negotiator};
use crate::ble::gap;

pub async fn negotiate(conn: &Connection, mut negotiator: Negotiator) {
    Timer::after(Duration::from_millis(negotiator.first_update_delay_ms())).await;

    loop {
        let current = gap::from_raw(&conn.conn_params());
        match negotiator.evaluate(&current) {
            NegotiationStep::Accept => {
                info!(
                    "conn params accepted: interval={} latency={} timeout={}",
                    current.min_interval, current.slave_latency, current.supervision_timeout
                );
                return;
            }
            NegotiationStep::Request(preferred) => {
                info!(
                    "conn params update request {} ({}..{})",
                    negotiator.attempts(),
                    preferred.min_interval,
                    preferred.max_interval
                );
                if let Err(e) = conn.set_conn_params(gap::to_raw(&preferred)) {
                    warn!("conn params update request failed: {:?}", e);
                }
                Timer::after(Duration::from_millis(negotiator.next_update_delay_ms())).await;
            }
            NegotiationStep::Disconnect => {
                warn!("conn params negotiation failed, disconnecting");
                if let Err(e) = conn.disconnect() {
                    warn!("disconnect failed: {:?}", e);
                }
                return;
            }
            NegotiationStep::GiveUp => {
                warn!("conn params negotiation failed, keeping link");
                return;
            }
        }
    }
}

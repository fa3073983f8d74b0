//! Advertise / connect loop.
//!
//! Owns the SoftDevice's peripheral role. The dispatcher asks for
//! advertising through an `AdvertisingSignal`; this task runs the
//! advertisement, serves the GATT table while a central is connected, and
//! reports every link change back as an `AppEvent`.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::Softdevice;

use crate::ble::advertising::{AdvertisingKind, AdvertisingParams, AdvertisingPayload};
use crate::ble::conn_params::{NegotiationConfig, Negotiator};
use crate::ble::gatt::{ButtonServer, ButtonServerEvent};
use crate::ble::identity::ConnParams;
use crate::ble::negotiation::negotiate;
use crate::ble::{ConnHandle, LinkEvent};
use crate::config::EVENT_QUEUE_DEPTH;
use crate::dispatcher::AppEvent;
use crate::error::StackError;

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingCommand {
    /// (Re)start advertising from scratch.
    Start,
    Stop,
}

pub type AdvertisingSignal = Signal<CriticalSectionRawMutex, AdvertisingCommand>;

pub type EventSender = Sender<'static, CriticalSectionRawMutex, AppEvent, EVENT_QUEUE_DEPTH>;

/// Everything the loop needs that doesn't change after boot.
pub struct PeripheralContext {
    pub sd: &'static Softdevice,
    pub server: &'static ButtonServer,
    pub payload: &'static AdvertisingPayload,
    pub params: AdvertisingParams,
    pub negotiation: NegotiationConfig,
    pub preferred: ConnParams,
}

enum AdvOutcome {
    Connected(Connection),
    /// Timeout, or the end of a non-connectable run.
    Ended,
    Failed(StackError),
}

pub async fn advertising_task(
    ctx: &PeripheralContext,
    commands: &'static AdvertisingSignal,
    events: &EventSender,
) -> ! {
    let mut pending_cmd: Option<AdvertisingCommand> = None;

    loop {
        let cmd = match pending_cmd.take() {
            Some(cmd) => cmd,
            None => commands.wait().await,
        };

        match cmd {
            AdvertisingCommand::Stop => {}
            AdvertisingCommand::Start => {
                info!("advertising start ({})", ctx.params.kind());
                match select(advertise(ctx), commands.wait()).await {
                    Either::First(AdvOutcome::Connected(conn)) => {
                        serve(ctx, conn, events).await;
                    }
                    Either::First(AdvOutcome::Ended) => {
                        events
                            .send(AppEvent::Link(LinkEvent::AdvertisingTimedOut))
                            .await;
                    }
                    Either::First(AdvOutcome::Failed(e)) => {
                        events
                            .send(AppEvent::Link(LinkEvent::AdvertisingFailed(e)))
                            .await;
                    }
                    Either::Second(next_cmd) => {
                        info!("advertising interrupted by {}", next_cmd);
                        if next_cmd == AdvertisingCommand::Start {
                            pending_cmd = Some(next_cmd);
                        }
                    }
                }
            }
        }
    }
}

async fn advertise(ctx: &PeripheralContext) -> AdvOutcome {
    let config = peripheral::Config {
        interval: ctx.params.interval,
        timeout: ctx.params.timeout,
        ..Default::default()
    };
    let adv_data = ctx.payload.adv_data();
    let scan_data = ctx.payload.scan_data();

    let result = match ctx.params.kind() {
        AdvertisingKind::ConnectableScannableUndirected => {
            let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
                adv_data,
                scan_data,
            };
            peripheral::advertise_connectable(ctx.sd, adv, &config)
                .await
                .map(AdvOutcome::Connected)
        }
        AdvertisingKind::ScannableUndirected => {
            let adv = peripheral::NonconnectableAdvertisement::ScannableUndirected {
                adv_data,
                scan_data,
            };
            peripheral::advertise(ctx.sd, adv, &config)
                .await
                .map(|()| AdvOutcome::Ended)
        }
    };

    match result {
        Ok(outcome) => outcome,
        Err(peripheral::AdvertiseError::Timeout) => {
            info!("advertising timed out");
            AdvOutcome::Ended
        }
        Err(peripheral::AdvertiseError::Raw(e)) => {
            warn!("advertising refused: {:?}", e);
            AdvOutcome::Failed(StackError::Raw(e as u32))
        }
        Err(e) => {
            warn!("advertising failed: {:?}", e);
            AdvOutcome::Failed(StackError::AdvertiseFailed)
        }
    }
}

/// Run one connection to completion.
async fn serve(ctx: &PeripheralContext, conn: Connection, events: &EventSender) {
    let Some(handle) = conn.handle().and_then(ConnHandle::from_raw) else {
        warn!("connected without a handle");
        return;
    };
    events
        .send(AppEvent::Link(LinkEvent::Connected(handle)))
        .await;

    let negotiator = Negotiator::new(ctx.negotiation, ctx.preferred);
    let params = async {
        negotiate(&conn, negotiator).await;
        core::future::pending::<()>().await
    };
    let server = gatt_server::run(&conn, ctx.server, |e| match e {
        ButtonServerEvent::NotificationsEnabled(on) => {
            info!("button notifications {}", if on { "enabled" } else { "disabled" });
        }
    });

    if let Either::First(e) = select(server, params).await {
        info!("link {} closed: {:?}", handle, e);
    }

    events
        .send(AppEvent::Link(LinkEvent::Disconnected(handle)))
        .await;
}

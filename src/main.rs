//! nRF52840 BLE peripheral tech demo firmware.
//!
//! Boot order:
//!   1. Embassy HAL (interrupt priorities compatible with the SoftDevice)
//!   2. SoftDevice enable
//!   3. GATT service registration, then GAP identity
//!   4. Advertising payload
//!   5. Tasks: SoftDevice runner, advertise/connect loop, button, dispatcher
//!
//! Any failure before the dispatcher is running is fatal, and so is the
//! SoftDevice refusing the first advertising run.

#![no_std]
#![no_main]

use core::mem;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::AnyPin;
use embassy_nrf::interrupt::Priority;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use techdemo::ble::advertising::{
    AdvertisingContent, AdvertisingPayload, LE_ONLY_GENERAL_DISC_MODE,
};
use techdemo::ble::gatt::{register_service, ButtonServer};
use techdemo::ble::identity::MAX_DEVICE_NAME_LEN;
use techdemo::ble::peripheral::{advertising_task, AdvertisingSignal, EventSender, PeripheralContext};
use techdemo::ble::gap;
use techdemo::board::NrfBoard;
use techdemo::config;
use techdemo::ui::buttons::button_task;
use techdemo::ui::leds::StatusLeds;
use techdemo::{AppEvent, EventDispatcher, PeripheralState};

static EVENTS: Channel<CriticalSectionRawMutex, AppEvent, { config::EVENT_QUEUE_DEPTH }> =
    Channel::new();
static ADVERTISING: AdvertisingSignal = Signal::new();

static SERVER: StaticCell<ButtonServer> = StaticCell::new();
static PAYLOAD: StaticCell<AdvertisingPayload> = StaticCell::new();
static PERIPHERAL: StaticCell<PeripheralContext> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn peripheral_task(ctx: &'static PeripheralContext, events: EventSender) -> ! {
    advertising_task(ctx, &ADVERTISING, &events).await
}

#[embassy_executor::task]
async fn button_0_task(pin: AnyPin, events: EventSender) -> ! {
    button_task(pin, config::BUTTON_0, &events).await
}

#[embassy_executor::task]
async fn app_task(board: NrfBoard, server: &'static ButtonServer) -> ! {
    let mut dispatcher = EventDispatcher::new(
        board,
        server.handle(),
        config::BUTTON_0,
        config::NOTIFY_POLICY,
    );
    let mut state = PeripheralState::new();

    unwrap!(dispatcher.start(&mut state));
    info!("dispatcher running");

    loop {
        let event = EVENTS.receive().await;
        if let Err(e) = dispatcher.dispatch(&mut state, event) {
            defmt::panic!("advertising never started: {}", e);
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("techdemo starting");

    let mut hal_config = embassy_nrf::config::Config::default();
    hal_config.gpiote_interrupt_priority = Priority::P3;
    hal_config.time_interrupt_priority = Priority::P3;
    let p = embassy_nrf::init(hal_config);

    let leds = StatusLeds::new(
        AnyPin::from(p.P0_14),
        AnyPin::from(p.P0_15),
        AnyPin::from(p.P0_16),
    );

    let identity = unwrap!(config::identity());

    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: MAX_DEVICE_NAME_LEN as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    let sd = Softdevice::enable(&sd_config);
    let server: &'static ButtonServer =
        SERVER.init(unwrap!(register_service(sd, &config::button_service())));
    let sd: &'static Softdevice = sd;
    unwrap!(gap::configure(sd, &identity));
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let service_uuid = config::button_service().service_uuid128();
    let content = AdvertisingContent {
        name: identity.name(),
        appearance: Some(identity.appearance()),
        flags: LE_ONLY_GENERAL_DISC_MODE,
        services: core::slice::from_ref(&service_uuid),
    };
    let payload: &'static AdvertisingPayload =
        PAYLOAD.init(unwrap!(AdvertisingPayload::build(&content)));

    let ctx = PERIPHERAL.init(PeripheralContext {
        sd,
        server,
        payload,
        params: config::advertising_params(),
        negotiation: config::negotiation(),
        preferred: *identity.conn_params(),
    });

    let events = EVENTS.sender();
    unwrap!(spawner.spawn(peripheral_task(ctx, events)));
    unwrap!(spawner.spawn(button_0_task(AnyPin::from(p.P0_11), events)));

    let board = NrfBoard::new(leds, server, &ADVERTISING);
    unwrap!(spawner.spawn(app_task(board, server)));
}

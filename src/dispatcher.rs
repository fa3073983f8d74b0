//! Connection state tracker and event dispatcher.
//!
//! The dispatcher is the only runtime logic in the firmware. It runs in a
//! single task that drains the event channel, so every handler completes
//! before the next event is looked at and `PeripheralState` needs no lock.
//!
//! ```text
//!   Idle ──start──▶ Advertising ──Connected(h)──▶ Connected(h)
//!    ▲                 │   ▲                           │
//!    └─stop / timeout──┘   └──────Disconnected(h)──────┘
//! ```
//!
//! Button edges are handled the same way in every state.
//!
//! The one fatal link event is the stack refusing to advertise before
//! advertising has ever run: `dispatch` returns it so the firmware can
//! halt instead of sitting unreachable.

use crate::ble::service::CharacteristicHandle;
use crate::ble::{ConnHandle, LinkEvent};
use crate::error::StackError;
use crate::platform::Platform;
use crate::ui::{ButtonEdge, ButtonEvent, Led};

/// Link state. The connection handle only exists inside `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Idle,
    Advertising,
    Connected(ConnHandle),
}

/// Everything the dispatcher mutates, owned by the dispatcher task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralState {
    link: LinkState,
    /// Advertising has run at least once (a central connected or the
    /// advertising timeout expired).
    advertised: bool,
}

impl PeripheralState {
    pub const fn new() -> Self {
        Self {
            link: LinkState::Idle,
            advertised: false,
        }
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    /// Handle of the active connection, if any.
    pub fn conn_handle(&self) -> Option<ConnHandle> {
        match self.link {
            LinkState::Connected(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_advertising(&self) -> bool {
        self.link == LinkState::Advertising
    }

    pub fn has_advertised(&self) -> bool {
        self.advertised
    }
}

impl Default for PeripheralState {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether button notifications are attempted without a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyPolicy {
    /// Always hand the notification to the stack; a missing link is
    /// reported back as an error and logged.
    Unguarded,
    /// Skip the send while disconnected.
    ConnectedOnly,
}

/// Everything the dispatcher task receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppEvent {
    Button(ButtonEvent),
    Link(LinkEvent),
}

pub struct EventDispatcher<P> {
    platform: P,
    characteristic: CharacteristicHandle,
    button_pin: u8,
    notify_policy: NotifyPolicy,
}

impl<P: Platform> EventDispatcher<P> {
    pub fn new(
        platform: P,
        characteristic: CharacteristicHandle,
        button_pin: u8,
        notify_policy: NotifyPolicy,
    ) -> Self {
        Self {
            platform,
            characteristic,
            button_pin,
            notify_policy,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Startup: begin advertising.
    ///
    /// Unlike a restart after disconnect, a failure here is returned so the
    /// firmware can refuse to run unreachable.
    pub fn start(&mut self, state: &mut PeripheralState) -> Result<(), StackError> {
        match state.link {
            LinkState::Idle => self.begin_advertising(state),
            other => {
                debug!("start ignored in {:?}", other);
                Ok(())
            }
        }
    }

    /// Explicitly halt advertising.
    pub fn stop(&mut self, state: &mut PeripheralState) {
        if state.link == LinkState::Advertising {
            self.platform.stop_advertising();
            self.platform.set_led(Led::Advertising, false);
            state.link = LinkState::Idle;
            info!("advertising stopped");
        }
    }

    /// Handle one event. Errors only for a startup advertising failure.
    pub fn dispatch(
        &mut self,
        state: &mut PeripheralState,
        event: AppEvent,
    ) -> Result<(), StackError> {
        match event {
            AppEvent::Button(e) => {
                self.on_button_event(state, e);
                Ok(())
            }
            AppEvent::Link(e) => self.on_link_event(state, e),
        }
    }

    pub fn on_link_event(
        &mut self,
        state: &mut PeripheralState,
        event: LinkEvent,
    ) -> Result<(), StackError> {
        match (state.link, event) {
            (LinkState::Connected(current), LinkEvent::Connected(handle)) => {
                // Single-link design; the newest link wins.
                warn!("connected {:?} while tracking {:?}", handle, current);
                state.link = LinkState::Connected(handle);
                state.advertised = true;
                self.platform.bind_write_queue(Some(handle));
            }
            (_, LinkEvent::Connected(handle)) => {
                info!("connected: {:?}", handle);
                self.platform.set_led(Led::Advertising, false);
                self.platform.set_led(Led::Connected, true);
                state.link = LinkState::Connected(handle);
                state.advertised = true;
                self.platform.bind_write_queue(Some(handle));
            }
            (LinkState::Connected(current), LinkEvent::Disconnected(handle))
                if current == handle =>
            {
                info!("disconnected: {:?}", handle);
                self.platform.set_led(Led::Connected, false);
                state.link = LinkState::Idle;
                self.platform.bind_write_queue(None);
                if let Err(e) = self.begin_advertising(state) {
                    error!("advertising restart failed: {:?}", e);
                }
            }
            (_, LinkEvent::Disconnected(handle)) => {
                debug!("stale disconnect {:?} ignored", handle);
            }
            (LinkState::Advertising, LinkEvent::AdvertisingTimedOut) => {
                info!("advertising timed out");
                self.platform.set_led(Led::Advertising, false);
                state.link = LinkState::Idle;
                state.advertised = true;
            }
            (_, LinkEvent::AdvertisingTimedOut) => {}
            (LinkState::Advertising, LinkEvent::AdvertisingFailed(e)) => {
                self.platform.set_led(Led::Advertising, false);
                state.link = LinkState::Idle;
                if !state.advertised {
                    return Err(e);
                }
                error!("advertising failed: {:?}", e);
            }
            (_, LinkEvent::AdvertisingFailed(e)) => {
                debug!("late advertising failure {:?} ignored", e);
            }
        }
        Ok(())
    }

    pub fn on_button_event(&mut self, state: &mut PeripheralState, event: ButtonEvent) {
        if event.pin != self.button_pin {
            return;
        }

        self.platform
            .set_led(Led::Button, event.edge == ButtonEdge::Pressed);
        self.send_notification(state, event.edge.value());
    }

    /// Fire-and-forget 1-byte notification on the button characteristic.
    fn send_notification(&mut self, state: &PeripheralState, value: u8) {
        let conn = state.conn_handle();
        if conn.is_none() && self.notify_policy == NotifyPolicy::ConnectedOnly {
            trace!("no link, notification skipped");
            return;
        }

        if let Err(e) = self
            .platform
            .notify(conn, self.characteristic.value_handle, &[value])
        {
            warn!("notify {} failed: {:?}", value, e);
        }
    }

    fn begin_advertising(&mut self, state: &mut PeripheralState) -> Result<(), StackError> {
        self.platform.start_advertising()?;
        self.platform.set_led(Led::Advertising, true);
        state.link = LinkState::Advertising;
        info!("advertising");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        leds: Vec<(Led, bool)>,
        adv_starts: usize,
        adv_stops: usize,
        fail_start: bool,
        bound: Option<ConnHandle>,
        sent: Vec<(Option<ConnHandle>, u16, u8)>,
    }

    impl Platform for Recorder {
        fn set_led(&mut self, led: Led, on: bool) {
            self.leds.push((led, on));
        }

        fn start_advertising(&mut self) -> Result<(), StackError> {
            if self.fail_start {
                return Err(StackError::AdvertiseFailed);
            }
            self.adv_starts += 1;
            Ok(())
        }

        fn stop_advertising(&mut self) {
            self.adv_stops += 1;
        }

        fn bind_write_queue(&mut self, conn: Option<ConnHandle>) {
            self.bound = conn;
        }

        fn notify(
            &mut self,
            conn: Option<ConnHandle>,
            value_handle: u16,
            data: &[u8],
        ) -> Result<(), StackError> {
            self.sent.push((conn, value_handle, data[0]));
            conn.map(|_| ()).ok_or(StackError::InvalidConnection)
        }
    }

    const CHAR: CharacteristicHandle = CharacteristicHandle {
        value_handle: 0x0c,
        cccd_handle: 0x0d,
    };

    fn handle(raw: u16) -> ConnHandle {
        ConnHandle::from_raw(raw).unwrap()
    }

    fn dispatcher(policy: NotifyPolicy) -> EventDispatcher<Recorder> {
        EventDispatcher::new(Recorder::default(), CHAR, 0, policy)
    }

    #[test]
    fn start_only_from_idle() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.start(&mut s).unwrap();
        assert_eq!(d.platform().adv_starts, 1);
        assert!(s.is_advertising());
    }

    #[test]
    fn start_failure_is_reported_and_state_stays_idle() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        d.platform_mut().fail_start = true;
        let mut s = PeripheralState::new();
        assert_eq!(d.start(&mut s), Err(StackError::AdvertiseFailed));
        assert_eq!(s.link(), LinkState::Idle);
        assert!(d.platform().leds.is_empty());
    }

    #[test]
    fn stop_returns_to_idle() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.stop(&mut s);
        assert_eq!(s.link(), LinkState::Idle);
        assert_eq!(d.platform().adv_stops, 1);
        assert_eq!(d.platform().leds.last(), Some(&(Led::Advertising, false)));

        // Nothing to stop any more.
        d.stop(&mut s);
        assert_eq!(d.platform().adv_stops, 1);
    }

    #[test]
    fn stale_disconnect_keeps_current_link() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.on_link_event(&mut s, LinkEvent::Connected(handle(1))).unwrap();
        d.on_link_event(&mut s, LinkEvent::Disconnected(handle(2))).unwrap();
        assert_eq!(s.conn_handle(), Some(handle(1)));
        assert_eq!(d.platform().adv_starts, 1);
    }

    #[test]
    fn second_connect_replaces_handle() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.on_link_event(&mut s, LinkEvent::Connected(handle(1))).unwrap();
        d.on_link_event(&mut s, LinkEvent::Connected(handle(2))).unwrap();
        assert_eq!(s.conn_handle(), Some(handle(2)));
        assert_eq!(d.platform().bound, Some(handle(2)));
    }

    #[test]
    fn restart_failure_falls_back_to_idle() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.on_link_event(&mut s, LinkEvent::Connected(handle(1))).unwrap();
        d.platform_mut().fail_start = true;
        d.on_link_event(&mut s, LinkEvent::Disconnected(handle(1))).unwrap();
        assert_eq!(s.link(), LinkState::Idle);
        assert_eq!(s.conn_handle(), None);
        assert_eq!(d.platform().bound, None);
    }

    #[test]
    fn advertising_timeout_goes_idle() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.on_link_event(&mut s, LinkEvent::AdvertisingTimedOut).unwrap();
        assert_eq!(s.link(), LinkState::Idle);
        assert_eq!(d.platform().leds.last(), Some(&(Led::Advertising, false)));

        // A late timeout while connected changes nothing.
        d.start(&mut s).unwrap();
        d.on_link_event(&mut s, LinkEvent::Connected(handle(3))).unwrap();
        d.on_link_event(&mut s, LinkEvent::AdvertisingTimedOut).unwrap();
        assert_eq!(s.conn_handle(), Some(handle(3)));
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.on_button_event(&mut s, ButtonEvent::new(3, ButtonEdge::Pressed));
        assert!(d.platform().leds.is_empty());
        assert!(d.platform().sent.is_empty());
    }

    #[test]
    fn connected_only_policy_skips_send_without_link() {
        let mut d = dispatcher(NotifyPolicy::ConnectedOnly);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.on_button_event(&mut s, ButtonEvent::new(0, ButtonEdge::Pressed));
        assert!(d.platform().sent.is_empty());
        assert_eq!(d.platform().leds.last(), Some(&(Led::Button, true)));

        d.on_link_event(&mut s, LinkEvent::Connected(handle(4))).unwrap();
        d.on_button_event(&mut s, ButtonEvent::new(0, ButtonEdge::Released));
        assert_eq!(d.platform().sent, vec![(Some(handle(4)), 0x0c, 0)]);
    }

    #[test]
    fn dispatch_routes_both_event_kinds() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.dispatch(&mut s, AppEvent::Link(LinkEvent::Connected(handle(9))))
            .unwrap();
        d.dispatch(
            &mut s,
            AppEvent::Button(ButtonEvent::new(0, ButtonEdge::Pressed)),
        )
        .unwrap();
        assert_eq!(s.conn_handle(), Some(handle(9)));
        assert_eq!(d.platform().sent, vec![(Some(handle(9)), 0x0c, 1)]);
    }

    #[test]
    fn advertising_failure_before_first_run_is_fatal() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        assert!(!s.has_advertised());

        let failure = LinkEvent::AdvertisingFailed(StackError::Raw(0x08));
        assert_eq!(d.on_link_event(&mut s, failure), Err(StackError::Raw(0x08)));
        assert_eq!(s.link(), LinkState::Idle);
        assert_eq!(d.platform().leds.last(), Some(&(Led::Advertising, false)));
    }

    #[test]
    fn advertising_failure_after_disconnect_falls_back_to_idle() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.on_link_event(&mut s, LinkEvent::Connected(handle(1))).unwrap();
        d.on_link_event(&mut s, LinkEvent::Disconnected(handle(1))).unwrap();
        assert!(s.is_advertising());

        let failure = LinkEvent::AdvertisingFailed(StackError::AdvertiseFailed);
        assert_eq!(d.on_link_event(&mut s, failure), Ok(()));
        assert_eq!(s.link(), LinkState::Idle);
        assert!(s.has_advertised());
        assert_eq!(d.platform().leds.last(), Some(&(Led::Advertising, false)));
    }

    #[test]
    fn advertising_failure_outside_advertising_is_ignored() {
        let mut d = dispatcher(NotifyPolicy::Unguarded);
        let mut s = PeripheralState::new();
        d.start(&mut s).unwrap();
        d.stop(&mut s);

        // Stop raced with the stack's refusal.
        let failure = LinkEvent::AdvertisingFailed(StackError::AdvertiseFailed);
        assert_eq!(d.on_link_event(&mut s, failure), Ok(()));
        assert_eq!(s.link(), LinkState::Idle);
    }
}

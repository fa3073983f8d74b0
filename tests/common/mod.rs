//! Mock board for host tests.
//!
//! Records every platform call and keeps the resulting LED / radio state
//! so tests can assert on both the history and the end result.

#![allow(dead_code)]

use techdemo::ble::service::CharacteristicHandle;
use techdemo::ble::ConnHandle;
use techdemo::error::StackError;
use techdemo::ui::Led;
use techdemo::{EventDispatcher, NotifyPolicy, Platform};

pub const CHAR: CharacteristicHandle = CharacteristicHandle {
    value_handle: 0x0c,
    cccd_handle: 0x0d,
};

pub const BUTTON: u8 = 0;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCall {
    SetLed(Led, bool),
    StartAdvertising,
    StopAdvertising,
    Bind(Option<ConnHandle>),
    Notify {
        conn: Option<ConnHandle>,
        value_handle: u16,
        data: Vec<u8>,
    },
}

// ── MockBoard ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    pub advertising: bool,
    pub bound: Option<ConnHandle>,
    /// Link the fake stack considers alive; notifies elsewhere fail.
    pub live_link: Option<ConnHandle>,
    pub fail_start: bool,
    button_led: bool,
    advertising_led: bool,
    connected_led: bool,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn led(&self, led: Led) -> bool {
        match led {
            Led::Button => self.button_led,
            Led::Advertising => self.advertising_led,
            Led::Connected => self.connected_led,
        }
    }

    /// Notifications the stack accepted or rejected, in order.
    pub fn notifications(&self) -> Vec<(Option<ConnHandle>, u8)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Notify { conn, data, .. } => Some((*conn, data[0])),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &BoardCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Platform for MockBoard {
    fn set_led(&mut self, led: Led, on: bool) {
        self.calls.push(BoardCall::SetLed(led, on));
        match led {
            Led::Button => self.button_led = on,
            Led::Advertising => self.advertising_led = on,
            Led::Connected => self.connected_led = on,
        }
    }

    fn start_advertising(&mut self) -> Result<(), StackError> {
        self.calls.push(BoardCall::StartAdvertising);
        if self.fail_start {
            return Err(StackError::AdvertiseFailed);
        }
        self.advertising = true;
        Ok(())
    }

    fn stop_advertising(&mut self) {
        self.calls.push(BoardCall::StopAdvertising);
        self.advertising = false;
    }

    fn bind_write_queue(&mut self, conn: Option<ConnHandle>) {
        self.calls.push(BoardCall::Bind(conn));
        self.bound = conn;
    }

    fn notify(
        &mut self,
        conn: Option<ConnHandle>,
        value_handle: u16,
        data: &[u8],
    ) -> Result<(), StackError> {
        self.calls.push(BoardCall::Notify {
            conn,
            value_handle,
            data: data.to_vec(),
        });
        match conn {
            Some(h) if Some(h) == self.live_link => Ok(()),
            _ => Err(StackError::InvalidConnection),
        }
    }
}

pub fn handle(raw: u16) -> ConnHandle {
    ConnHandle::from_raw(raw).unwrap()
}

pub fn dispatcher(policy: NotifyPolicy) -> EventDispatcher<MockBoard> {
    EventDispatcher::new(MockBoard::new(), CHAR, BUTTON, policy)
}

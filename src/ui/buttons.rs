//! GPIO button input with async debouncing.
//!
//! The button is active-low with the internal pull-up. Both edges matter:
//! press and release each become a `ButtonEvent` on the app channel.

use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};

use crate::ble::peripheral::EventSender;
use crate::config::BUTTON_DEBOUNCE_MS;
use crate::dispatcher::AppEvent;
use crate::ui::debounce::Debouncer;
use crate::ui::ButtonEvent;

/// Run a single button loop.
///
/// Waits for the level opposite the last reported state, lets the contact
/// settle, then reports the edge if the settled level still differs. A
/// level wait returns at once if the pin changed while the previous event
/// was being queued, so no transition is lost.
pub async fn button_task(pin: AnyPin, id: u8, tx: &EventSender) -> ! {
    let mut btn = Input::new(pin, Pull::Up);
    let mut debouncer = Debouncer::new(btn.is_low());

    loop {
        if debouncer.awaits_low() {
            btn.wait_for_low().await;
        } else {
            btn.wait_for_high().await;
        }

        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if let Some(edge) = debouncer.settle(btn.is_low()) {
            let event = ButtonEvent::new(id, edge);
            info!("Button: {}", event);
            tx.send(AppEvent::Button(event)).await;
        }
    }
}

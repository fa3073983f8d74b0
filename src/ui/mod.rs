//! User interface subsystem - status LEDs + physical button.
//!
//! ## Components
//!
//! - **LEDs**: button, advertising and connected indicators (active-low)
//! - **Button**: one tactile switch with debouncing

pub mod debounce;

#[cfg(feature = "embedded")]
pub mod buttons;
#[cfg(feature = "embedded")]
pub mod leds;

/// Status LEDs driven by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    /// Mirrors the button state.
    Button,
    /// On while advertising.
    Advertising,
    /// On while a central is connected.
    Connected,
}

/// Debounced button transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEdge {
    Pressed,
    Released,
}

impl ButtonEdge {
    /// Characteristic value carried by the notification for this edge.
    pub const fn value(self) -> u8 {
        match self {
            ButtonEdge::Pressed => 1,
            ButtonEdge::Released => 0,
        }
    }
}

/// Physical button events (after debouncing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    /// Logical button id.
    pub pin: u8,
    pub edge: ButtonEdge,
}

impl ButtonEvent {
    pub const fn new(pin: u8, edge: ButtonEdge) -> Self {
        Self { pin, edge }
    }
}

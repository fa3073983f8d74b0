//! Status LEDs (active-low on the nRF52840-DK).

use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive};

use crate::ui::Led;

pub struct StatusLeds {
    button: Output<'static>,
    advertising: Output<'static>,
    connected: Output<'static>,
}

impl StatusLeds {
    /// All LEDs start off.
    pub fn new(button: AnyPin, advertising: AnyPin, connected: AnyPin) -> Self {
        Self {
            button: Output::new(button, Level::High, OutputDrive::Standard),
            advertising: Output::new(advertising, Level::High, OutputDrive::Standard),
            connected: Output::new(connected, Level::High, OutputDrive::Standard),
        }
    }

    pub fn set(&mut self, led: Led, on: bool) {
        let pin = match led {
            Led::Button => &mut self.button,
            Led::Advertising => &mut self.advertising,
            Led::Connected => &mut self.connected,
        };
        if on {
            pin.set_low();
        } else {
            pin.set_high();
        }
    }
}

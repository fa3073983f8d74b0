use crate::ui::ButtonEdge;

/// Tracks the last stable level of an active-low button.
///
/// Call [`settle`](Debouncer::settle) with a sample taken after the
/// debounce window; an edge is reported only when the level really changed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    pressed: bool,
}

impl Debouncer {
    pub fn new(initially_pressed: bool) -> Self {
        Self {
            pressed: initially_pressed,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Level the pin must reach for the next edge: low while released,
    /// high while pressed.
    pub fn awaits_low(&self) -> bool {
        !self.pressed
    }

    /// Feed a settled sample (`true` = pin low = pressed).
    pub fn settle(&mut self, level_low: bool) -> Option<ButtonEdge> {
        if level_low == self.pressed {
            return None;
        }
        self.pressed = level_low;
        Some(if level_low {
            ButtonEdge::Pressed
        } else {
            ButtonEdge::Released
        })
    }
}

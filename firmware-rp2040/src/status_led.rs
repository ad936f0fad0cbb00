//! On-board LED showing the adapter status.

use embassy_rp::gpio::{Level, Output};
use psx_core::StatusIndicator;

pub struct StatusLed<'d> {
    led: Output<'d>,
    tick: u32,
}

impl<'d> StatusLed<'d> {
    #[must_use]
    pub fn new(led: Output<'d>) -> Self {
        Self { led, tick: 0 }
    }

    /// Show `indicator` for one tick.
    pub fn update(&mut self, indicator: StatusIndicator) {
        self.led.set_level(Level::from(indicator.led_level(self.tick)));
        self.tick = self.tick.wrapping_add(1);
    }
}

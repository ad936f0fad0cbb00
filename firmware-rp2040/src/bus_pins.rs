//! Controller-port lines on RP2040 GPIO.

use embassy_rp::gpio::{Flex, Pull, SlewRate};
use psx_core::{BusLines, Direction, Line};

/// The five bus pins.
///
/// Data and Acknowledge keep a low output latch and are switched between
/// input and output to emulate open drain; the console provides the
/// pull-ups.
pub struct RpBusLines<'d> {
    attention: Flex<'d>,
    clock: Flex<'d>,
    command: Flex<'d>,
    data: Flex<'d>,
    acknowledge: Flex<'d>,
}

impl<'d> RpBusLines<'d> {
    #[must_use]
    pub fn new(
        attention: Flex<'d>,
        clock: Flex<'d>,
        command: Flex<'d>,
        data: Flex<'d>,
        acknowledge: Flex<'d>,
    ) -> Self {
        let mut lines = Self {
            attention,
            clock,
            command,
            data,
            acknowledge,
        };
        for pin in [&mut lines.attention, &mut lines.clock, &mut lines.command] {
            pin.set_pull(Pull::None);
            pin.set_as_input();
        }
        for pin in [&mut lines.data, &mut lines.acknowledge] {
            pin.set_pull(Pull::None);
            pin.set_slew_rate(SlewRate::Slow);
            pin.set_low();
            pin.set_as_input();
        }
        lines
    }

    fn pin(&mut self, line: Line) -> &mut Flex<'d> {
        match line {
            Line::Attention => &mut self.attention,
            Line::Clock => &mut self.clock,
            Line::Command => &mut self.command,
            Line::Data => &mut self.data,
            Line::Acknowledge => &mut self.acknowledge,
        }
    }
}

impl BusLines for RpBusLines<'_> {
    #[inline]
    fn read_line(&mut self, line: Line) -> bool {
        self.pin(line).is_high()
    }

    #[inline]
    fn set_direction(&mut self, line: Line, direction: Direction) {
        // Console-driven lines are never switched to output.
        if !matches!(line, Line::Data | Line::Acknowledge) {
            return;
        }
        let pin = self.pin(line);
        match direction {
            Direction::Input => pin.set_as_input(),
            Direction::Output => pin.set_as_output(),
        }
    }
}

//! Status indicator derived from the controller registers.

use crate::types::{ControllerSnapshot, Protocol};

/// Ticks per blink phase while searching for a device.
pub const SEARCH_BLINK_TICKS: u32 = 10;
/// Ticks per blink phase while the keyboard reports rollover.
pub const OVERFLOW_BLINK_TICKS: u32 = 2;

/// What the status LED shows.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusIndicator {
    #[default]
    Off,
    /// No usable device attached.
    Searching,
    MouseActive,
    KeyboardActive,
    /// A mouse button or pad button is held.
    Click,
    /// The keyboard reported rollover.
    Overflow,
}

impl StatusIndicator {
    #[must_use]
    pub fn from_snapshot(snapshot: &ControllerSnapshot) -> Self {
        match snapshot.protocol {
            Protocol::None => StatusIndicator::Searching,
            Protocol::Mouse if snapshot.left.held || snapshot.right.held => StatusIndicator::Click,
            Protocol::Mouse => StatusIndicator::MouseActive,
            Protocol::Keyboard if snapshot.overflow => StatusIndicator::Overflow,
            Protocol::Keyboard if !snapshot.pad.is_empty() => StatusIndicator::Click,
            Protocol::Keyboard => StatusIndicator::KeyboardActive,
        }
    }

    /// Level of a single LED at `tick`.
    ///
    /// Active devices light it steadily, a held button turns it off, and
    /// searching and overflow blink at different rates.
    #[must_use]
    pub fn led_level(self, tick: u32) -> bool {
        match self {
            StatusIndicator::Off | StatusIndicator::Click => false,
            StatusIndicator::MouseActive | StatusIndicator::KeyboardActive => true,
            StatusIndicator::Searching => (tick / SEARCH_BLINK_TICKS) % 2 == 0,
            StatusIndicator::Overflow => (tick / OVERFLOW_BLINK_TICKS) % 2 == 0,
        }
    }
}

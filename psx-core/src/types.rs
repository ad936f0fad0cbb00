//! Core controller types: Protocol, ButtonSample, ControllerSnapshot.

pub use hid_proto::PadButtons;

/// Which console peripheral is currently being emulated.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    /// No usable USB device attached.
    #[default]
    None,
    /// Console mouse, fed by a USB mouse.
    Mouse,
    /// Digital pad, fed by a USB keyboard.
    Keyboard,
}

/// Mouse button latch.
///
/// `held` follows the latest USB report. `pressed` and `released` record
/// whether a press or a release was seen since the last console poll, so a
/// click that starts and ends between two polls is not lost.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSample {
    pub held: bool,
    pub pressed: bool,
    pub released: bool,
}

impl ButtonSample {
    pub const UP: Self = Self {
        held: false,
        pressed: false,
        released: false,
    };

    /// Record the state carried by a new USB report.
    #[inline]
    pub fn record(&mut self, held: bool) {
        self.held = held;
        if held {
            self.pressed = true;
        } else {
            self.released = true;
        }
    }

    /// Start a new poll interval from the current held state.
    #[inline]
    pub fn rearm(&mut self) {
        self.pressed = self.held;
        self.released = !self.held;
    }

    /// Combine an older sample with a newer one.
    #[inline]
    #[must_use]
    pub fn merge(self, newer: ButtonSample) -> Self {
        Self {
            held: newer.held,
            pressed: self.pressed || newer.pressed,
            released: self.released || newer.released,
        }
    }

    /// Button value to report, given the value of the previous reply.
    ///
    /// When both a press and a release happened since then, the reported
    /// value flips so the console sees the transition.
    ///
    /// ```
    /// use psx_core::ButtonSample;
    ///
    /// let mut click = ButtonSample::UP;
    /// click.record(true);
    /// click.record(false);
    /// assert!(click.resolve(false));
    /// ```
    #[inline]
    #[must_use]
    pub fn resolve(self, previous: bool) -> bool {
        if self.pressed && self.released {
            !previous
        } else {
            self.pressed
        }
    }
}

/// Copy of the shared controller registers.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerSnapshot {
    pub protocol: Protocol,
    /// Accumulated relative motion since the last poll.
    pub dx: i8,
    pub dy: i8,
    pub left: ButtonSample,
    pub right: ButtonSample,
    /// Pad buttons from the latest decodable keyboard report.
    pub pad: PadButtons,
    /// Latest keyboard report signalled rollover.
    pub overflow: bool,
    /// Bumped whenever the active protocol changes. Pointer data held back
    /// from an older session is stale.
    pub session: u8,
}

impl ControllerSnapshot {
    /// Power-on register values.
    pub const IDLE: Self = Self {
        protocol: Protocol::None,
        dx: 0,
        dy: 0,
        left: ButtonSample::UP,
        right: ButtonSample::UP,
        pad: PadButtons::NONE,
        overflow: false,
        session: 0,
    };

    /// Drop accumulated motion and mouse button state.
    #[inline]
    pub fn reset_pointer(&mut self) {
        self.dx = 0;
        self.dy = 0;
        self.left = ButtonSample::UP;
        self.right = ButtonSample::UP;
    }

    /// Clear every register and make `protocol` active in a new session.
    #[inline]
    pub fn restart(&mut self, protocol: Protocol) {
        *self = Self {
            protocol,
            session: self.session.wrapping_add(1),
            ..Self::IDLE
        };
    }
}

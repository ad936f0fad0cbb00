//! Keyboard to digital pad mapping.
//!
//! [`PadButtons`] uses the bit order of the digital pad's two status bytes:
//! bit 0 of the first byte is Select, bit 7 of the second byte is Square.
//! On the wire the bits are active low; [`PadButtons`] stores them active
//! high.
//!
//! | Pad button | Keys |
//! |------------|------|
//! | Up / Down / Left / Right | W S A D, arrow keys |
//! | Triangle | O, T |
//! | Circle | G, `;` |
//! | Cross | F, L |
//! | Square | K, R |
//! | L1 / R1 | Q / P |
//! | L2 / R2 | E / I |
//! | Start | Right Ctrl |
//! | Select | Right Shift |

use core::ops::{BitOr, BitOrAssign};

/// Digital pad button bitfield.
///
/// ```
/// use hid_proto::PadButtons;
///
/// let buttons = PadButtons::CROSS | PadButtons::UP;
/// assert!(buttons.contains(PadButtons::CROSS));
/// assert_eq!(buttons.raw(), 0x4010);
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadButtons(pub u16);

impl PadButtons {
    pub const SELECT: Self = Self(1 << 0);
    pub const L3: Self = Self(1 << 1);
    pub const R3: Self = Self(1 << 2);
    pub const START: Self = Self(1 << 3);
    pub const UP: Self = Self(1 << 4);
    pub const RIGHT: Self = Self(1 << 5);
    pub const DOWN: Self = Self(1 << 6);
    pub const LEFT: Self = Self(1 << 7);
    pub const L2: Self = Self(1 << 8);
    pub const R2: Self = Self(1 << 9);
    pub const L1: Self = Self(1 << 10);
    pub const R1: Self = Self(1 << 11);
    pub const TRIANGLE: Self = Self(1 << 12);
    pub const CIRCLE: Self = Self(1 << 13);
    pub const CROSS: Self = Self(1 << 14);
    pub const SQUARE: Self = Self(1 << 15);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn contains(self, button: PadButtons) -> bool {
        (self.0 & button.0) == button.0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The two active-low status bytes sent to the console, low byte first.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> [u8; 2] {
        let inverted = !self.0;
        [inverted as u8, (inverted >> 8) as u8]
    }
}

impl BitOr for PadButtons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PadButtons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Pad buttons per modifier bit (bit 0 Left Ctrl ... bit 7 Right GUI).
pub static MODIFIER_BUTTONS: [PadButtons; 8] = [
    PadButtons::NONE,   // Left Ctrl
    PadButtons::NONE,   // Left Shift
    PadButtons::NONE,   // Left Alt
    PadButtons::NONE,   // Left GUI
    PadButtons::START,  // Right Ctrl
    PadButtons::SELECT, // Right Shift
    PadButtons::NONE,   // Right Alt
    PadButtons::NONE,   // Right GUI
];

const KEY_BINDINGS: [(u8, PadButtons); 20] = [
    (0x04, PadButtons::LEFT),     // A
    (0x07, PadButtons::RIGHT),    // D
    (0x08, PadButtons::L2),       // E
    (0x09, PadButtons::CROSS),    // F
    (0x0A, PadButtons::CIRCLE),   // G
    (0x0C, PadButtons::R2),       // I
    (0x0E, PadButtons::SQUARE),   // K
    (0x0F, PadButtons::CROSS),    // L
    (0x12, PadButtons::TRIANGLE), // O
    (0x13, PadButtons::R1),       // P
    (0x14, PadButtons::L1),       // Q
    (0x15, PadButtons::SQUARE),   // R
    (0x16, PadButtons::DOWN),     // S
    (0x17, PadButtons::TRIANGLE), // T
    (0x1A, PadButtons::UP),       // W
    (0x33, PadButtons::CIRCLE),   // ;
    (0x4F, PadButtons::RIGHT),    // Right arrow
    (0x50, PadButtons::LEFT),     // Left arrow
    (0x51, PadButtons::DOWN),     // Down arrow
    (0x52, PadButtons::UP),       // Up arrow
];

/// Pad buttons per boot keyboard usage ID. Unmapped keys are empty.
pub static KEYCODE_BUTTONS: [PadButtons; 256] = build_keycode_table();

const fn build_keycode_table() -> [PadButtons; 256] {
    let mut table = [PadButtons::NONE; 256];
    let mut i = 0;
    while i < KEY_BINDINGS.len() {
        let (code, buttons) = KEY_BINDINGS[i];
        table[code as usize] = buttons;
        i += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_table_values() {
        assert_eq!(MODIFIER_BUTTONS[4].raw(), 0x0008);
        assert_eq!(MODIFIER_BUTTONS[5].raw(), 0x0001);
        assert_eq!(KEYCODE_BUTTONS[0x04].raw(), 0x0080);
        assert_eq!(KEYCODE_BUTTONS[0x08].raw(), 0x0100);
        assert_eq!(KEYCODE_BUTTONS[0x09].raw(), 0x4000);
        assert_eq!(KEYCODE_BUTTONS[0x0E].raw(), 0x8000);
        assert_eq!(KEYCODE_BUTTONS[0x1A].raw(), 0x0010);
        assert_eq!(KEYCODE_BUTTONS[0x33].raw(), 0x2000);
        assert_eq!(KEYCODE_BUTTONS[0x4F].raw(), 0x0020);
    }

    #[test]
    fn test_unmapped_keys_empty() {
        let mapped = KEYCODE_BUTTONS.iter().filter(|b| !b.is_empty()).count();
        assert_eq!(mapped, KEY_BINDINGS.len());
        assert!(KEYCODE_BUTTONS[0x00].is_empty());
        assert!(KEYCODE_BUTTONS[0x28].is_empty()); // Enter
        assert!(KEYCODE_BUTTONS[0xFF].is_empty());
    }

    #[test]
    fn test_wire_bytes_active_low() {
        assert_eq!(PadButtons::NONE.to_wire(), [0xFF, 0xFF]);
        assert_eq!((PadButtons::START | PadButtons::SQUARE).to_wire(), [0xF7, 0x7F]);
    }
}

//! Boot keyboard report decoding.
//!
//! Boot reports are always 8 bytes: modifier bitmap, a reserved byte and up
//! to six pressed keycodes. When more keys are held than the report can
//! carry, every keycode slot holds `ErrorRollOver` (0x01).

use crate::keymap::{PadButtons, KEYCODE_BUTTONS, MODIFIER_BUTTONS};

/// Length of a boot keyboard report.
pub const BOOT_REPORT_LEN: usize = 8;

/// Keycode reported in every slot during phantom/rollover conditions.
pub const KEY_ERROR_ROLLOVER: u8 = 0x01;

/// Keyboard report decode errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyboardError {
    /// Report is not exactly [`BOOT_REPORT_LEN`] bytes.
    InvalidLength(usize),
    /// The keyboard signalled rollover; the report carries no key state.
    Rollover,
}

/// Map a boot keyboard report to pad buttons.
///
/// ```
/// use hid_proto::{decode_boot_keyboard, KeyboardError, PadButtons};
///
/// // Right Ctrl held, W pressed
/// let buttons = decode_boot_keyboard(&[0x10, 0, 0x1A, 0, 0, 0, 0, 0]).unwrap();
/// assert_eq!(buttons, PadButtons::START | PadButtons::UP);
///
/// let rollover = [0, 0, 1, 1, 1, 1, 1, 1];
/// assert_eq!(decode_boot_keyboard(&rollover), Err(KeyboardError::Rollover));
/// ```
pub fn decode_boot_keyboard(report: &[u8]) -> Result<PadButtons, KeyboardError> {
    let report: &[u8; BOOT_REPORT_LEN] = report
        .try_into()
        .map_err(|_| KeyboardError::InvalidLength(report.len()))?;
    let keys = &report[2..];

    if keys.contains(&KEY_ERROR_ROLLOVER) {
        return Err(KeyboardError::Rollover);
    }

    let modifiers = report[0];
    let mut buttons = PadButtons::NONE;
    for (bit, mapped) in MODIFIER_BUTTONS.iter().enumerate() {
        if modifiers & (1 << bit) != 0 {
            buttons |= *mapped;
        }
    }
    for &code in keys.iter().filter(|&&code| code != 0) {
        buttons |= KEYCODE_BUTTONS[usize::from(code)];
    }
    Ok(buttons)
}

/// True if a report descriptor opens with `Usage Page (Generic Desktop),
/// Usage (Keyboard)`.
///
/// Used to recognise keyboards whose interface does not advertise the boot
/// keyboard protocol.
#[must_use]
pub fn is_keyboard_descriptor(descriptor: &[u8]) -> bool {
    descriptor.starts_with(&[0x05, 0x01, 0x09, 0x06])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_keys() {
        assert_eq!(decode_boot_keyboard(&[0; 8]), Ok(PadButtons::NONE));
    }

    #[test]
    fn test_keys_and_modifiers_combine() {
        // Right Shift, A + arrow left + K + unmapped Enter
        let report = [0x20, 0x00, 0x04, 0x50, 0x0E, 0x28, 0x00, 0x00];
        assert_eq!(
            decode_boot_keyboard(&report),
            Ok(PadButtons::SELECT | PadButtons::LEFT | PadButtons::SQUARE)
        );
    }

    #[test]
    fn test_left_modifiers_unmapped() {
        let report = [0x0F, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(decode_boot_keyboard(&report), Ok(PadButtons::NONE));
    }

    #[test]
    fn test_rollover_in_any_slot() {
        let mut report = [0u8; 8];
        report[5] = KEY_ERROR_ROLLOVER;
        assert_eq!(decode_boot_keyboard(&report), Err(KeyboardError::Rollover));
    }

    #[test]
    fn test_reserved_byte_ignored() {
        // A 0x01 in the reserved byte is not a rollover marker.
        let report = [0x00, 0x01, 0x1A, 0, 0, 0, 0, 0];
        assert_eq!(decode_boot_keyboard(&report), Ok(PadButtons::UP));
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            decode_boot_keyboard(&[0; 9]),
            Err(KeyboardError::InvalidLength(9))
        );
        assert_eq!(
            decode_boot_keyboard(&[0; 3]),
            Err(KeyboardError::InvalidLength(3))
        );
    }

    #[test]
    fn test_keyboard_descriptor_prefix() {
        assert!(is_keyboard_descriptor(&[0x05, 0x01, 0x09, 0x06, 0xA1, 0x01]));
        assert!(!is_keyboard_descriptor(&[0x05, 0x01, 0x09, 0x02, 0xA1, 0x01]));
        assert!(!is_keyboard_descriptor(&[0x05, 0x01]));
    }
}

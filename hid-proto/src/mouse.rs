//! Mouse input report decoding.

use crate::descriptor::{FieldLocation, FieldWidth, MouseFieldMap};

/// Mouse button bits as found in the report's button byte.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseButtons(pub u8);

impl MouseButtons {
    pub const LEFT: Self = Self(1 << 0);
    pub const RIGHT: Self = Self(1 << 1);
    pub const MIDDLE: Self = Self(1 << 2);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn contains(self, button: MouseButtons) -> bool {
        (self.0 & button.0) == button.0
    }

    #[inline]
    #[must_use]
    pub const fn left(self) -> bool {
        self.contains(Self::LEFT)
    }

    #[inline]
    #[must_use]
    pub const fn right(self) -> bool {
        self.contains(Self::RIGHT)
    }
}

/// One decoded mouse report, axes clamped to `i8`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: MouseButtons,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
}

/// Mouse report decode errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Zero-length report.
    Empty,
    /// Report belongs to another report ID of the same interface.
    ReportIdMismatch { expected: u8, found: u8 },
    /// A mapped field lies beyond the end of the report.
    OutOfRange,
}

impl MouseFieldMap {
    /// Decode a raw input report using this layout.
    ///
    /// Fields absent from the layout read as zero.
    ///
    /// ```
    /// use hid_proto::{FieldLocation, FieldWidth, MouseFieldMap};
    ///
    /// let map = MouseFieldMap {
    ///     buttons: Some(0),
    ///     x: Some(FieldLocation::new(1, FieldWidth::Byte)),
    ///     y: Some(FieldLocation::new(2, FieldWidth::Byte)),
    ///     ..MouseFieldMap::default()
    /// };
    /// let report = map.decode(&[0x01, 0x05, 0xFB]).unwrap();
    /// assert!(report.buttons.left());
    /// assert_eq!((report.x, report.y), (5, -5));
    /// ```
    pub fn decode(&self, report: &[u8]) -> Result<MouseReport, DecodeError> {
        let first = *report.first().ok_or(DecodeError::Empty)?;
        if let Some(expected) = self.report_id {
            if first != expected {
                return Err(DecodeError::ReportIdMismatch {
                    expected,
                    found: first,
                });
            }
        }

        let buttons = match self.buttons {
            Some(offset) => MouseButtons(*report.get(offset).ok_or(DecodeError::OutOfRange)?),
            None => MouseButtons::NONE,
        };

        Ok(MouseReport {
            buttons,
            x: read_axis(report, self.x)?,
            y: read_axis(report, self.y)?,
            wheel: read_axis(report, self.wheel)?,
        })
    }
}

fn read_axis(report: &[u8], field: Option<FieldLocation>) -> Result<i8, DecodeError> {
    let Some(field) = field else {
        return Ok(0);
    };
    let bytes = report
        .get(field.offset..field.end())
        .ok_or(DecodeError::OutOfRange)?;

    Ok(match field.width {
        FieldWidth::Byte => bytes[0] as i8,
        FieldWidth::Word => {
            let wide = i16::from_le_bytes([bytes[0], bytes[1]]);
            wide.clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boot_layout() -> MouseFieldMap {
        MouseFieldMap {
            report_id: None,
            buttons: Some(0),
            x: Some(FieldLocation::new(1, FieldWidth::Byte)),
            y: Some(FieldLocation::new(2, FieldWidth::Byte)),
            wheel: Some(FieldLocation::new(3, FieldWidth::Byte)),
        }
    }

    #[test]
    fn test_decode_byte_axes() {
        let report = boot_layout().decode(&[0x03, 0x7F, 0x80, 0xFF]).unwrap();
        assert!(report.buttons.left());
        assert!(report.buttons.right());
        assert!(!report.buttons.contains(MouseButtons::MIDDLE));
        assert_eq!(report.x, 127);
        assert_eq!(report.y, -128);
        assert_eq!(report.wheel, -1);
    }

    #[test]
    fn test_decode_word_axes_clamped() {
        let map = MouseFieldMap {
            report_id: Some(4),
            buttons: Some(1),
            x: Some(FieldLocation::new(2, FieldWidth::Word)),
            y: Some(FieldLocation::new(4, FieldWidth::Word)),
            wheel: None,
        };
        // x = 300, y = -1000
        let report = map.decode(&[0x04, 0x00, 0x2C, 0x01, 0x18, 0xFC]).unwrap();
        assert_eq!(report.x, 127);
        assert_eq!(report.y, -128);
        assert_eq!(report.wheel, 0);

        // x = -20, y = 100 pass through unchanged
        let report = map.decode(&[0x04, 0x00, 0xEC, 0xFF, 0x64, 0x00]).unwrap();
        assert_eq!(report.x, -20);
        assert_eq!(report.y, 100);
    }

    #[test]
    fn test_report_id_mismatch() {
        let map = MouseFieldMap {
            report_id: Some(2),
            ..boot_layout()
        };
        assert_eq!(
            map.decode(&[0x01, 0x00, 0x00, 0x00]),
            Err(DecodeError::ReportIdMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_short_report_is_error() {
        assert_eq!(boot_layout().decode(&[0x01, 0x05, 0x05]), Err(DecodeError::OutOfRange));
        assert_eq!(boot_layout().decode(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn test_absent_fields_read_zero() {
        let map = MouseFieldMap {
            report_id: None,
            buttons: None,
            x: Some(FieldLocation::new(0, FieldWidth::Byte)),
            y: Some(FieldLocation::new(1, FieldWidth::Byte)),
            wheel: None,
        };
        let report = map.decode(&[0x10, 0xF0]).unwrap();
        assert_eq!(report.buttons, MouseButtons::NONE);
        assert_eq!((report.x, report.y, report.wheel), (16, -16, 0));
    }
}

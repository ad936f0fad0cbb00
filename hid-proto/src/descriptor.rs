//! Mouse report layout discovery.
//!
//! [`MouseFieldMap::parse`] walks a report descriptor and locates the button
//! byte and the X, Y and wheel axes of the first mouse application
//! collection, so reports from non-boot mice can be decoded without
//! switching the device to boot protocol.
//!
//! Only byte-aligned 8- or 16-bit axes are supported. Anything else leaves
//! the affected field unset; a descriptor without both X and Y is rejected.

use crate::item::{global_tag, local_tag, main_tag, ItemType, Items};

/// Usage page codes of interest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsagePage {
    /// Generic Desktop (mouse, keyboard, axes).
    GenericDesktop,
    /// Button.
    Button,
    /// Unknown/unsupported.
    Other(u16),
}

impl From<u16> for UsagePage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => UsagePage::GenericDesktop,
            0x09 => UsagePage::Button,
            other => UsagePage::Other(other),
        }
    }
}

/// Generic Desktop usage codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DesktopUsage {
    Pointer,
    Mouse,
    Keyboard,
    X,
    Y,
    Wheel,
    Other(u16),
}

impl From<u16> for DesktopUsage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => DesktopUsage::Pointer,
            0x02 => DesktopUsage::Mouse,
            0x06 => DesktopUsage::Keyboard,
            0x30 => DesktopUsage::X,
            0x31 => DesktopUsage::Y,
            0x38 => DesktopUsage::Wheel,
            other => DesktopUsage::Other(other),
        }
    }
}

/// Width of a signed axis field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldWidth {
    /// One byte, `i8`.
    Byte,
    /// Two bytes, little-endian `i16`.
    Word,
}

impl FieldWidth {
    #[inline]
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            FieldWidth::Byte => 1,
            FieldWidth::Word => 2,
        }
    }
}

/// Byte position of one axis inside a raw report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldLocation {
    /// Offset from the first byte of the report, report-ID byte included.
    pub offset: usize,
    pub width: FieldWidth,
}

impl FieldLocation {
    #[must_use]
    pub const fn new(offset: usize, width: FieldWidth) -> Self {
        Self { offset, width }
    }

    /// One past the last byte of the field.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.width.bytes()
    }
}

/// Why a descriptor did not yield a field map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorError {
    /// No mouse collection with usable X and Y axes.
    NotAMouse,
    /// End Collection without a matching Collection.
    CollectionUnderflow,
}

/// Layout of a mouse's input report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseFieldMap {
    /// Report ID prefixing every mouse report, if the device uses IDs.
    pub report_id: Option<u8>,
    /// Byte holding the button bits (bit 0 left, bit 1 right, bit 2 middle).
    pub buttons: Option<usize>,
    pub x: Option<FieldLocation>,
    pub y: Option<FieldLocation>,
    pub wheel: Option<FieldLocation>,
}

impl MouseFieldMap {
    /// Walk `descriptor` and build the field map of its mouse collection.
    ///
    /// # Example
    ///
    /// ```
    /// use hid_proto::{FieldLocation, FieldWidth, MouseFieldMap};
    ///
    /// // Report ID 2, buttons in byte 1, 8-bit X and Y in bytes 2 and 3.
    /// let descriptor = [
    ///     0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x85, 0x02, 0x09, 0x01, 0xA1, 0x00,
    ///     0x05, 0x09, 0x95, 0x08, 0x75, 0x01, 0x81, 0x02,
    ///     0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x95, 0x02, 0x75, 0x08, 0x81, 0x06,
    ///     0xC0, 0xC0,
    /// ];
    /// let map = MouseFieldMap::parse(&descriptor).unwrap();
    /// assert_eq!(map.report_id, Some(2));
    /// assert_eq!(map.buttons, Some(1));
    /// assert_eq!(map.x, Some(FieldLocation::new(2, FieldWidth::Byte)));
    /// ```
    pub fn parse(descriptor: &[u8]) -> Result<Self, DescriptorError> {
        let mut walker = Walker::default();
        for item in Items::new(descriptor) {
            match item.kind {
                ItemType::Main => walker.main_item(item.tag)?,
                ItemType::Global => walker.global_item(item.tag, item.data),
                ItemType::Local if item.tag == local_tag::USAGE => {
                    walker.usage(item.size, item.data);
                }
                _ => {}
            }
        }

        let map = walker.map;
        if map.x.is_none() || map.y.is_none() {
            return Err(DescriptorError::NotAMouse);
        }
        Ok(map)
    }
}

/// Axis usages declared since the last main item, by ordinal.
#[derive(Default)]
struct PendingUsages {
    count: u32,
    x: Option<u32>,
    y: Option<u32>,
    wheel: Option<u32>,
}

#[derive(Default)]
struct Walker {
    usage_page: u16,
    level: u8,
    in_mouse: bool,
    /// Items currently belong to another report ID of the mouse collection.
    foreign_report: bool,
    button_page_seen: bool,
    /// Bit offset of the next input field in the mouse report.
    accum: u32,
    report_size: u32,
    report_count: u32,
    pending: PendingUsages,
    map: MouseFieldMap,
}

impl Walker {
    fn tracking(&self) -> bool {
        self.in_mouse && !self.foreign_report
    }

    fn main_item(&mut self, tag: u8) -> Result<(), DescriptorError> {
        match tag {
            main_tag::INPUT if self.tracking() => self.close_input_group(),
            main_tag::COLLECTION => self.level = self.level.saturating_add(1),
            main_tag::END_COLLECTION => {
                self.level = self
                    .level
                    .checked_sub(1)
                    .ok_or(DescriptorError::CollectionUnderflow)?;
            }
            _ => {}
        }
        // Local state never outlives a main item.
        self.pending = PendingUsages::default();
        Ok(())
    }

    fn close_input_group(&mut self) {
        let size = self.report_size;
        let locate = |ordinal: Option<u32>| {
            let bit = ordinal?.checked_mul(size)?.checked_add(self.accum)?;
            let width = match size {
                8 => FieldWidth::Byte,
                16 => FieldWidth::Word,
                _ => return None,
            };
            (bit % 8 == 0).then(|| FieldLocation::new((bit / 8) as usize, width))
        };

        let x = locate(self.pending.x);
        let y = locate(self.pending.y);
        let wheel = locate(self.pending.wheel);
        self.map.x = self.map.x.or(x);
        self.map.y = self.map.y.or(y);
        self.map.wheel = self.map.wheel.or(wheel);

        self.accum = self
            .accum
            .saturating_add(self.report_count.saturating_mul(size));
    }

    fn global_item(&mut self, tag: u8, data: u32) {
        match tag {
            global_tag::USAGE_PAGE => {
                self.usage_page = data as u16;
                if self.tracking()
                    && !self.button_page_seen
                    && UsagePage::from(self.usage_page) == UsagePage::Button
                {
                    self.button_page_seen = true;
                    if self.accum % 8 == 0 {
                        self.map.buttons = Some((self.accum / 8) as usize);
                    }
                }
            }
            global_tag::REPORT_SIZE => self.report_size = data,
            global_tag::REPORT_COUNT => self.report_count = data,
            global_tag::REPORT_ID if self.in_mouse => {
                let id = data as u8;
                match self.map.report_id {
                    None => {
                        self.map.report_id = Some(id);
                        self.accum = self.accum.saturating_add(8);
                    }
                    Some(current) => self.foreign_report = current != id,
                }
            }
            _ => {}
        }
    }

    fn usage(&mut self, size: u8, data: u32) {
        let (page, usage) = if size == 4 {
            ((data >> 16) as u16, data as u16)
        } else {
            (self.usage_page, data as u16)
        };
        let desktop = UsagePage::from(page) == UsagePage::GenericDesktop;

        if self.level == 0 {
            self.in_mouse = desktop && DesktopUsage::from(usage) == DesktopUsage::Mouse;
            return;
        }
        if !self.tracking() {
            return;
        }

        let ordinal = self.pending.count;
        self.pending.count += 1;
        if !desktop {
            return;
        }
        let slot = match DesktopUsage::from(usage) {
            DesktopUsage::X => &mut self.pending.x,
            DesktopUsage::Y => &mut self.pending.y,
            DesktopUsage::Wheel => &mut self.pending.wheel,
            _ => return,
        };
        slot.get_or_insert(ordinal);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    /// Standard 3-button wheel mouse, no report ID.
    const WHEEL_MOUSE: [u8; 52] = [
        0x05, 0x01, // Usage Page (Generic Desktop)
        0x09, 0x02, // Usage (Mouse)
        0xA1, 0x01, // Collection (Application)
        0x09, 0x01, //   Usage (Pointer)
        0xA1, 0x00, //   Collection (Physical)
        0x05, 0x09, //     Usage Page (Button)
        0x19, 0x01, //     Usage Minimum (1)
        0x29, 0x03, //     Usage Maximum (3)
        0x15, 0x00, //     Logical Minimum (0)
        0x25, 0x01, //     Logical Maximum (1)
        0x95, 0x03, //     Report Count (3)
        0x75, 0x01, //     Report Size (1)
        0x81, 0x02, //     Input (Data, Var, Abs)
        0x95, 0x01, //     Report Count (1)
        0x75, 0x05, //     Report Size (5)
        0x81, 0x03, //     Input (Const)
        0x05, 0x01, //     Usage Page (Generic Desktop)
        0x09, 0x30, //     Usage (X)
        0x09, 0x31, //     Usage (Y)
        0x09, 0x38, //     Usage (Wheel)
        0x15, 0x81, //     Logical Minimum (-127)
        0x25, 0x7F, //     Logical Maximum (127)
        0x75, 0x08, //     Report Size (8)
        0x95, 0x03, //     Report Count (3)
        0x81, 0x06, //     Input (Data, Var, Rel)
        0xC0, //   End Collection
        0xC0, // End Collection
    ];

    #[test]
    fn test_wheel_mouse_layout() {
        let map = MouseFieldMap::parse(&WHEEL_MOUSE).unwrap();
        assert_eq!(map.report_id, None);
        assert_eq!(map.buttons, Some(0));
        assert_eq!(map.x, Some(FieldLocation::new(1, FieldWidth::Byte)));
        assert_eq!(map.y, Some(FieldLocation::new(2, FieldWidth::Byte)));
        assert_eq!(map.wheel, Some(FieldLocation::new(3, FieldWidth::Byte)));
    }

    #[test]
    fn test_report_id_shifts_offsets() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, // Mouse application
            0x85, 0x07, // Report ID (7)
            0x09, 0x01, 0xA1, 0x00, // Pointer
            0x05, 0x09, 0x95, 0x08, 0x75, 0x01, 0x81, 0x02, // 8 buttons
            0x05, 0x01, 0x09, 0x30, 0x09, 0x31, // X, Y
            0x95, 0x02, 0x75, 0x08, 0x81, 0x06, // 2 x 8 bit
            0xC0, 0xC0,
        ];
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.report_id, Some(7));
        assert_eq!(map.buttons, Some(1));
        assert_eq!(map.x, Some(FieldLocation::new(2, FieldWidth::Byte)));
        assert_eq!(map.y, Some(FieldLocation::new(3, FieldWidth::Byte)));
        assert_eq!(map.wheel, None);
    }

    #[test]
    fn test_sixteen_bit_axes() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x09, 0x01, 0xA1, 0x00, //
            0x05, 0x09, 0x95, 0x10, 0x75, 0x01, 0x81, 0x02, // 16 buttons
            0x05, 0x01, 0x16, 0x01, 0x80, 0x26, 0xFF, 0x7F, // -32767..32767
            0x09, 0x30, 0x09, 0x31, 0x75, 0x10, 0x95, 0x02, 0x81, 0x06, //
            0x09, 0x38, 0x75, 0x08, 0x95, 0x01, 0x81, 0x06, //
            0xC0, 0xC0,
        ];
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.buttons, Some(0));
        assert_eq!(map.x, Some(FieldLocation::new(2, FieldWidth::Word)));
        assert_eq!(map.y, Some(FieldLocation::new(4, FieldWidth::Word)));
        assert_eq!(map.wheel, Some(FieldLocation::new(6, FieldWidth::Byte)));
    }

    #[test]
    fn test_missing_y_rejected() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x09, 0x01, 0xA1, 0x00, //
            0x05, 0x09, 0x95, 0x08, 0x75, 0x01, 0x81, 0x02, //
            0x05, 0x01, 0x09, 0x30, 0x95, 0x01, 0x75, 0x08, 0x81, 0x06, //
            0xC0, 0xC0,
        ];
        assert_eq!(
            MouseFieldMap::parse(&descriptor),
            Err(DescriptorError::NotAMouse)
        );
    }

    #[test]
    fn test_misaligned_axes_left_unset() {
        // 12-bit X/Y packed after 4 button bits.
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x09, 0x01, 0xA1, 0x00, //
            0x05, 0x09, 0x95, 0x04, 0x75, 0x01, 0x81, 0x02, //
            0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x95, 0x02, 0x75, 0x0C, 0x81, 0x06, //
            0xC0, 0xC0,
        ];
        assert_eq!(
            MouseFieldMap::parse(&descriptor),
            Err(DescriptorError::NotAMouse)
        );
    }

    #[test]
    fn test_keyboard_descriptor_rejected() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, // Keyboard application
            0x05, 0x07, 0x19, 0xE0, 0x29, 0xE7, 0x75, 0x01, 0x95, 0x08, 0x81, 0x02, //
            0x95, 0x06, 0x75, 0x08, 0x19, 0x00, 0x29, 0x65, 0x81, 0x00, //
            0xC0,
        ];
        assert_eq!(
            MouseFieldMap::parse(&descriptor),
            Err(DescriptorError::NotAMouse)
        );
    }

    #[test]
    fn test_composite_keyboard_then_mouse() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, 0x85, 0x01, // Keyboard, ID 1
            0x05, 0x07, 0x75, 0x08, 0x95, 0x08, 0x81, 0x00, //
            0xC0, //
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x85, 0x02, // Mouse, ID 2
            0x09, 0x01, 0xA1, 0x00, //
            0x05, 0x09, 0x95, 0x05, 0x75, 0x01, 0x81, 0x02, //
            0x95, 0x01, 0x75, 0x03, 0x81, 0x03, //
            0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x75, 0x08, 0x95, 0x02, 0x81, 0x06, //
            0xC0, 0xC0,
        ];
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.report_id, Some(2));
        assert_eq!(map.buttons, Some(1));
        assert_eq!(map.x, Some(FieldLocation::new(2, FieldWidth::Byte)));
        assert_eq!(map.y, Some(FieldLocation::new(3, FieldWidth::Byte)));
    }

    #[test]
    fn test_second_report_id_ignored() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x85, 0x01, //
            0x05, 0x09, 0x95, 0x08, 0x75, 0x01, 0x81, 0x02, //
            0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x75, 0x08, 0x95, 0x02, 0x81, 0x06, //
            0x85, 0x02, // Report ID (2): a different report
            0x09, 0x38, 0x75, 0x08, 0x95, 0x01, 0x81, 0x06, //
            0xC0,
        ];
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.report_id, Some(1));
        assert_eq!(map.x, Some(FieldLocation::new(2, FieldWidth::Byte)));
        assert_eq!(map.wheel, None);
    }

    #[test]
    fn test_output_and_feature_items_do_not_shift_inputs() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x09, 0x01, 0xA1, 0x00, //
            0x05, 0x09, 0x95, 0x08, 0x75, 0x01, 0x81, 0x02, // 8 buttons
            0x05, 0x01, 0x09, 0x48, 0x95, 0x04, 0x75, 0x08, 0xB1, 0x02, // Feature 4 x 8
            0x95, 0x01, 0x75, 0x08, 0x91, 0x02, // Output 1 x 8
            0x09, 0x30, 0x09, 0x31, 0x95, 0x02, 0x75, 0x08, 0x81, 0x06, //
            0xC0, 0xC0,
        ];
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.buttons, Some(0));
        assert_eq!(map.x, Some(FieldLocation::new(1, FieldWidth::Byte)));
        assert_eq!(map.y, Some(FieldLocation::new(2, FieldWidth::Byte)));
    }

    #[test]
    fn test_return_to_own_report_id() {
        // Resolution multiplier feature under ID 0x12, wheel back under 0x1A.
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x85, 0x1A, // Mouse, ID 0x1A
            0x09, 0x01, 0xA1, 0x00, //
            0x05, 0x09, 0x95, 0x05, 0x75, 0x01, 0x81, 0x02, // 5 buttons
            0x95, 0x03, 0x75, 0x01, 0x81, 0x03, // padding
            0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x95, 0x02, 0x75, 0x10, 0x81, 0x06, //
            0xA1, 0x02, // Collection (Logical)
            0x85, 0x12, 0x09, 0x48, 0x95, 0x01, 0x75, 0x02, 0xB1, 0x02, //
            0x95, 0x01, 0x75, 0x06, 0xB1, 0x03, //
            0x85, 0x1A, 0x09, 0x38, 0x95, 0x01, 0x75, 0x08, 0x81, 0x06, //
            0xC0, 0xC0, 0xC0,
        ];
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.report_id, Some(0x1A));
        assert_eq!(map.buttons, Some(1));
        assert_eq!(map.x, Some(FieldLocation::new(2, FieldWidth::Word)));
        assert_eq!(map.y, Some(FieldLocation::new(4, FieldWidth::Word)));
        assert_eq!(map.wheel, Some(FieldLocation::new(6, FieldWidth::Byte)));
    }

    #[test]
    fn test_collection_underflow() {
        let mut descriptor = WHEEL_MOUSE.to_vec();
        descriptor.push(0xC0);
        assert_eq!(
            MouseFieldMap::parse(&descriptor),
            Err(DescriptorError::CollectionUnderflow)
        );
    }

    #[test]
    fn test_truncated_descriptor_keeps_found_fields() {
        let mut descriptor = WHEEL_MOUSE.to_vec();
        descriptor.truncate(descriptor.len() - 2);
        descriptor.push(0x95); // Report Count missing its data byte
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.x, Some(FieldLocation::new(1, FieldWidth::Byte)));
    }

    #[test]
    fn test_extended_usage() {
        let descriptor = [
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, //
            0x05, 0x09, 0x95, 0x08, 0x75, 0x01, 0x81, 0x02, //
            0x06, 0x00, 0xFF, // vendor page active
            0x0B, 0x30, 0x00, 0x01, 0x00, // Usage (Generic Desktop:X)
            0x0B, 0x31, 0x00, 0x01, 0x00, // Usage (Generic Desktop:Y)
            0x75, 0x08, 0x95, 0x02, 0x81, 0x06, //
            0xC0,
        ];
        let map = MouseFieldMap::parse(&descriptor).unwrap();
        assert_eq!(map.x, Some(FieldLocation::new(1, FieldWidth::Byte)));
        assert_eq!(map.y, Some(FieldLocation::new(2, FieldWidth::Byte)));
    }
}

//! HID report descriptor item tokenizer.
//!
//! A report descriptor is a flat sequence of items. Each short item starts
//! with a prefix byte:
//!
//! ```text
//!  7   4 3  2 1  0
//! [ tag ][type][size]
//! ```
//!
//! `size` encodes 0, 1, 2 or 4 little-endian data bytes. The prefix `0xFE`
//! introduces a long item whose data length is given by the following byte;
//! long items carry no layout information and are skipped.

/// Prefix byte of a long item.
const LONG_ITEM_PREFIX: u8 = 0xFE;

/// Item type from bits 2-3 of the prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ItemType {
    Main,
    Global,
    Local,
    Reserved,
}

impl From<u8> for ItemType {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ItemType::Main,
            1 => ItemType::Global,
            2 => ItemType::Local,
            _ => ItemType::Reserved,
        }
    }
}

/// Main item tags.
pub mod main_tag {
    pub const INPUT: u8 = 0x8;
    pub const OUTPUT: u8 = 0x9;
    pub const COLLECTION: u8 = 0xA;
    pub const FEATURE: u8 = 0xB;
    pub const END_COLLECTION: u8 = 0xC;
}

/// Global item tags.
pub mod global_tag {
    pub const USAGE_PAGE: u8 = 0x0;
    pub const REPORT_SIZE: u8 = 0x7;
    pub const REPORT_ID: u8 = 0x8;
    pub const REPORT_COUNT: u8 = 0x9;
}

/// Local item tags.
pub mod local_tag {
    pub const USAGE: u8 = 0x0;
}

/// One decoded short item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Item {
    pub kind: ItemType,
    pub tag: u8,
    /// Number of data bytes that followed the prefix (0, 1, 2 or 4).
    pub size: u8,
    /// Data bytes, little-endian, zero-extended.
    pub data: u32,
}

impl Item {
    /// Decode the short item starting at `bytes[0]`.
    ///
    /// Returns the item and the total number of bytes it occupies, or `None`
    /// if the declared data runs past the end of `bytes`.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let prefix = *bytes.first()?;
        let size = match prefix & 0x03 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        let payload = bytes.get(1..1 + size)?;

        let data = payload
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

        let item = Item {
            kind: ItemType::from(prefix >> 2),
            tag: (prefix >> 4) & 0x0F,
            size: size as u8,
            data,
        };
        Some((item, 1 + size))
    }

    /// True for the given main/global/local tag.
    #[inline]
    #[must_use]
    pub fn is(&self, kind: ItemType, tag: u8) -> bool {
        self.kind == kind && self.tag == tag
    }
}

/// Iterator over the short items of a report descriptor.
///
/// Stops at the end of the buffer or at the first truncated item. Long
/// items are skipped transparently.
pub struct Items<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Items<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl Iterator for Items<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        loop {
            let rest = self.bytes.get(self.pos..)?;
            if rest.first() == Some(&LONG_ITEM_PREFIX) {
                // 0xFE, bDataSize, bLongItemTag, data...
                let data_len = usize::from(*rest.get(1)?);
                let total = 3 + data_len;
                if total > rest.len() {
                    self.pos = self.bytes.len();
                    return None;
                }
                self.pos += total;
                continue;
            }

            return match Item::decode(rest) {
                Some((item, len)) => {
                    self.pos += len;
                    Some(item)
                }
                None => {
                    self.pos = self.bytes.len();
                    None
                }
            };
        }
    }
}

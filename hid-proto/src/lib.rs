//! USB HID report parsing for the controller-port adapter.
//!
//! This crate turns raw USB HID data into values the console side can use:
//!
//! - **Descriptors**: [`MouseFieldMap::parse`] walks a report descriptor and
//!   locates the button byte and X/Y/wheel axes of a mouse.
//! - **Mouse reports**: [`MouseFieldMap::decode`] extracts a [`MouseReport`]
//!   using that layout, clamping 16-bit axes to `i8`.
//! - **Keyboard reports**: [`decode_boot_keyboard`] maps an 8-byte boot
//!   report to digital pad [`PadButtons`] through fixed lookup tables.
//!
//! # Example
//!
//! ```
//! use hid_proto::{decode_boot_keyboard, MouseFieldMap, PadButtons};
//!
//! // Boot mouse: buttons, X, Y, wheel
//! let descriptor = [
//!     0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x09, 0x01, 0xA1, 0x00,
//!     0x05, 0x09, 0x19, 0x01, 0x29, 0x03, 0x95, 0x03, 0x75, 0x01, 0x81, 0x02,
//!     0x95, 0x01, 0x75, 0x05, 0x81, 0x03,
//!     0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x09, 0x38, 0x75, 0x08, 0x95, 0x03, 0x81, 0x06,
//!     0xC0, 0xC0,
//! ];
//! let map = MouseFieldMap::parse(&descriptor).unwrap();
//! let report = map.decode(&[0x02, 0x10, 0xF0, 0x00]).unwrap();
//! assert!(report.buttons.right());
//! assert_eq!((report.x, report.y), (16, -16));
//!
//! let pad = decode_boot_keyboard(&[0, 0, 0x52, 0, 0, 0, 0, 0]).unwrap();
//! assert_eq!(pad, PadButtons::UP);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod descriptor;
pub mod item;
pub mod keyboard;
pub mod keymap;
pub mod mouse;

pub use descriptor::{DescriptorError, FieldLocation, FieldWidth, MouseFieldMap};
pub use keyboard::{decode_boot_keyboard, is_keyboard_descriptor, KeyboardError};
pub use keymap::PadButtons;
pub use mouse::{DecodeError, MouseButtons, MouseReport};

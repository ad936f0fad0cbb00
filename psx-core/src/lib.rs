//! Platform-agnostic core of the USB to controller-port adapter.
//!
//! Two contexts run side by side. The host side receives USB HID events and
//! folds decoded reports into a [`SharedControllerState`]. The bus side runs
//! [`PsxBus::poll`] in a tight loop, answering the console's controller
//! polls from one snapshot of that state per transaction.
//!
//! # Overview
//!
//! - [`types`]: Controller registers ([`ControllerSnapshot`], [`Protocol`], [`ButtonSample`])
//! - [`shared`]: The mutex-guarded register block ([`SharedControllerState`])
//! - [`devices`]: Attached HID interfaces ([`DeviceTable`])
//! - [`host`]: USB host callbacks ([`HidEventSink`], [`HidAdapter`])
//! - [`bus`]: Console bus state machine ([`PsxBus`], [`BusLines`])
//! - [`status`]: Status LED state ([`StatusIndicator`])
//! - [`link`]: UART framing for host events from a companion USB host controller
//!
//! # Example
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use psx_core::{HidAdapter, HidEventSink, HidProtocolClass, ReportRequester};
//! use psx_core::{Protocol, SharedControllerState};
//!
//! struct Requests;
//! impl ReportRequester for Requests {
//!     fn request_next_report(&mut self, _address: u8, _instance: u8) {}
//! }
//!
//! let shared = SharedControllerState::<NoopRawMutex>::new();
//! let mut adapter = HidAdapter::new(&shared, Requests);
//! adapter.on_device_attached(1, 0, HidProtocolClass::Keyboard, &[]).unwrap();
//! adapter.on_report_received(1, 0, &[0, 0, 0x1A, 0, 0, 0, 0, 0]).unwrap();
//!
//! let snapshot = shared.take_snapshot_and_clear_motion();
//! assert_eq!(snapshot.protocol, Protocol::Keyboard);
//! assert_eq!(snapshot.pad.raw(), 0x0010);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod devices;
pub mod host;
pub mod link;
pub mod shared;
pub mod status;
pub mod types;

// Re-export main types at crate root
pub use bus::{AbortReason, BusEvent, BusLines, BusState, Direction, Line, PsxBus};
pub use devices::{DeviceKind, DeviceSlot, DeviceTable, MAX_DEVICES};
pub use host::{HidAdapter, HidEventSink, HidProtocolClass, HostError, ReportRequester};
pub use link::{HostEvent, LinkDecoder, LinkError};
pub use shared::SharedControllerState;
pub use status::StatusIndicator;
pub use types::{ButtonSample, ControllerSnapshot, PadButtons, Protocol};

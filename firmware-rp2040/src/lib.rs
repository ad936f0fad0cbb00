//! USB mouse and keyboard to PlayStation controller port adapter for RP2040.
//!
//! # Overview
//!
//! A companion USB host controller forwards HID attach, report and detach
//! events over UART. This firmware decodes them into controller registers
//! and answers the console's controller polls on the bus lines:
//! 1. Host events arrive on UART1 (115200 baud, 8N1)
//! 2. Mouse and boot keyboard reports update the shared registers
//! 3. Core 1 answers each console poll as a mouse or digital pad
//!
//! # Hardware Configuration
//!
//! See [`config`] for the pin table.
//!
//! # Architecture
//!
//! - **Core 0**: Embassy executor with the host task (UART events into
//!   [`HidAdapter`](psx_core::HidAdapter)) and the status task (LED)
//! - **Core 1**: Busy loop running [`PsxBus::poll`](psx_core::PsxBus::poll),
//!   since the bus timing leaves no room for an executor
//!
//! Both cores share one
//! [`SharedControllerState`](psx_core::SharedControllerState) behind a
//! critical-section mutex, which embassy-rp backs with a hardware spinlock.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

// Re-export core types for convenience
pub use psx_core::{
    BusEvent, HidAdapter, HostEvent, LinkError, PsxBus, SharedControllerState, StatusIndicator,
};

pub mod bus_pins;
pub mod config;
pub mod host_link;
pub mod status_led;

pub use bus_pins::RpBusLines;
pub use host_link::{UartHostLink, UartReportRequester};
pub use status_led::StatusLed;

//! USB host side: HID callbacks folded into the shared controller state.
//!
//! The USB host stack calls [`HidEventSink`] when an interface appears,
//! delivers a report or goes away. [`HidAdapter`] classifies interfaces,
//! decodes their reports and asks for the next report through a
//! [`ReportRequester`].

use embassy_sync::blocking_mutex::raw::RawMutex;
use hid_proto::{
    decode_boot_keyboard, is_keyboard_descriptor, DecodeError, DescriptorError, KeyboardError,
    MouseFieldMap,
};

use crate::devices::{DeviceKind, DeviceTable, TableFull};
use crate::shared::SharedControllerState;

/// HID interface protocol reported by the host stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidProtocolClass {
    None,
    Keyboard,
    Mouse,
}

impl From<u8> for HidProtocolClass {
    fn from(value: u8) -> Self {
        match value {
            1 => HidProtocolClass::Keyboard,
            2 => HidProtocolClass::Mouse,
            _ => HidProtocolClass::None,
        }
    }
}

/// Host callback errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostError {
    /// Neither a mouse nor a keyboard.
    UnsupportedDevice,
    /// Mouse descriptor could not be mapped.
    Descriptor(DescriptorError),
    /// No free device slot.
    TableFull,
    /// Report or detach for an interface that is not tracked.
    UnknownDevice,
    Mouse(DecodeError),
    Keyboard(KeyboardError),
}

impl From<DescriptorError> for HostError {
    fn from(e: DescriptorError) -> Self {
        HostError::Descriptor(e)
    }
}

impl From<TableFull> for HostError {
    fn from(_: TableFull) -> Self {
        HostError::TableFull
    }
}

impl From<DecodeError> for HostError {
    fn from(e: DecodeError) -> Self {
        HostError::Mouse(e)
    }
}

impl From<KeyboardError> for HostError {
    fn from(e: KeyboardError) -> Self {
        HostError::Keyboard(e)
    }
}

/// Callbacks from the USB host stack.
pub trait HidEventSink {
    fn on_device_attached(
        &mut self,
        address: u8,
        instance: u8,
        class: HidProtocolClass,
        descriptor: &[u8],
    ) -> Result<(), HostError>;

    fn on_report_received(
        &mut self,
        address: u8,
        instance: u8,
        report: &[u8],
    ) -> Result<(), HostError>;

    fn on_device_detached(&mut self, address: u8, instance: u8) -> Result<(), HostError>;
}

/// Asks the host stack for the next interrupt report of an interface.
pub trait ReportRequester {
    fn request_next_report(&mut self, address: u8, instance: u8);
}

/// [`HidEventSink`] feeding a [`SharedControllerState`].
pub struct HidAdapter<'a, M: RawMutex, R> {
    shared: &'a SharedControllerState<M>,
    devices: DeviceTable,
    requester: R,
}

impl<'a, M: RawMutex, R: ReportRequester> HidAdapter<'a, M, R> {
    pub fn new(shared: &'a SharedControllerState<M>, requester: R) -> Self {
        Self {
            shared,
            devices: DeviceTable::new(),
            requester,
        }
    }

    #[inline]
    pub fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    #[inline]
    pub fn requester(&self) -> &R {
        &self.requester
    }

    fn classify(class: HidProtocolClass, descriptor: &[u8]) -> Result<DeviceKind, HostError> {
        match class {
            HidProtocolClass::Keyboard => Ok(DeviceKind::Keyboard),
            HidProtocolClass::Mouse => Ok(DeviceKind::Mouse(MouseFieldMap::parse(descriptor)?)),
            HidProtocolClass::None if is_keyboard_descriptor(descriptor) => {
                Ok(DeviceKind::Keyboard)
            }
            HidProtocolClass::None => MouseFieldMap::parse(descriptor)
                .map(DeviceKind::Mouse)
                .map_err(|_| HostError::UnsupportedDevice),
        }
    }
}

impl<M: RawMutex, R: ReportRequester> HidEventSink for HidAdapter<'_, M, R> {
    fn on_device_attached(
        &mut self,
        address: u8,
        instance: u8,
        class: HidProtocolClass,
        descriptor: &[u8],
    ) -> Result<(), HostError> {
        let kind = Self::classify(class, descriptor)?;
        self.devices.attach(address, instance, kind)?;
        self.shared.select_protocol(kind.protocol());
        self.requester.request_next_report(address, instance);
        Ok(())
    }

    fn on_report_received(
        &mut self,
        address: u8,
        instance: u8,
        report: &[u8],
    ) -> Result<(), HostError> {
        let slot = *self
            .devices
            .get(address, instance)
            .ok_or(HostError::UnknownDevice)?;

        let result = match slot.kind {
            DeviceKind::Mouse(map) => map
                .decode(report)
                .map(|decoded| {
                    self.shared.apply_mouse_delta(
                        decoded.x,
                        decoded.y,
                        decoded.buttons.left(),
                        decoded.buttons.right(),
                    );
                })
                .map_err(HostError::from),
            DeviceKind::Keyboard => {
                let decoded = decode_boot_keyboard(report);
                self.shared.apply_keyboard_state(decoded.ok());
                decoded.map(|_| ()).map_err(HostError::from)
            }
        };

        self.requester.request_next_report(address, instance);
        result
    }

    fn on_device_detached(&mut self, address: u8, instance: u8) -> Result<(), HostError> {
        let slot = self
            .devices
            .detach(address, instance)
            .ok_or(HostError::UnknownDevice)?;
        let protocol = slot.kind.protocol();
        if !self.devices.serves(protocol) {
            self.shared.detach(protocol);
        }
        Ok(())
    }
}

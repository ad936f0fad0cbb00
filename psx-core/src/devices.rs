//! Fixed table of attached HID interfaces.

use hid_proto::MouseFieldMap;

use crate::types::Protocol;

/// Number of HID interfaces tracked at once.
pub const MAX_DEVICES: usize = 8;

/// What an attached interface is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    Mouse(MouseFieldMap),
    Keyboard,
}

impl DeviceKind {
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            DeviceKind::Mouse(_) => Protocol::Mouse,
            DeviceKind::Keyboard => Protocol::Keyboard,
        }
    }
}

/// One tracked interface, keyed by USB address and HID instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSlot {
    pub address: u8,
    pub instance: u8,
    pub kind: DeviceKind,
}

/// No free slot left for a new interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TableFull;

/// Bounded pool of device slots.
#[derive(Debug)]
pub struct DeviceTable {
    slots: [Option<DeviceSlot>; MAX_DEVICES],
}

impl DeviceTable {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; MAX_DEVICES],
        }
    }

    fn position(&self, address: u8, instance: u8) -> Option<usize> {
        self.slots.iter().position(|slot| {
            matches!(slot, Some(s) if s.address == address && s.instance == instance)
        })
    }

    /// Track an interface. A re-attached interface reuses its old slot.
    pub fn attach(&mut self, address: u8, instance: u8, kind: DeviceKind) -> Result<(), TableFull> {
        let index = self
            .position(address, instance)
            .or_else(|| self.slots.iter().position(Option::is_none))
            .ok_or(TableFull)?;
        self.slots[index] = Some(DeviceSlot {
            address,
            instance,
            kind,
        });
        Ok(())
    }

    #[must_use]
    pub fn get(&self, address: u8, instance: u8) -> Option<&DeviceSlot> {
        self.position(address, instance)
            .and_then(|index| self.slots[index].as_ref())
    }

    /// Forget an interface, returning what it was.
    pub fn detach(&mut self, address: u8, instance: u8) -> Option<DeviceSlot> {
        let index = self.position(address, instance)?;
        self.slots[index].take()
    }

    /// True if any tracked interface feeds `protocol`.
    #[must_use]
    pub fn serves(&self, protocol: Protocol) -> bool {
        self.iter().any(|slot| slot.kind.protocol() == protocol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceSlot> {
        self.slots.iter().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::new()
    }
}

//! Controller registers shared between the USB host side and the bus side.
//!
//! The host side writes decoded reports, the bus side takes one snapshot per
//! console poll. Every operation is a short register copy under a single
//! [`blocking_mutex::Mutex`](embassy_sync::blocking_mutex::Mutex), so the bus
//! side never waits longer than one such copy.
//!
//! With `CriticalSectionRawMutex` on the RP2040 the lock is a hardware
//! spinlock and the state can be shared between both cores as a `static`:
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use psx_core::{Protocol, SharedControllerState};
//!
//! let shared = SharedControllerState::<NoopRawMutex>::new();
//! shared.apply_mouse_delta(100, -100, false, false);
//! shared.apply_mouse_delta(100, -100, true, false);
//!
//! let snapshot = shared.take_snapshot_and_clear_motion();
//! assert_eq!(snapshot.protocol, Protocol::Mouse);
//! assert_eq!((snapshot.dx, snapshot.dy), (127, -128));
//! assert_eq!(shared.peek().dx, 0);
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::types::{ControllerSnapshot, PadButtons, Protocol};

/// Mutex-guarded controller registers.
pub struct SharedControllerState<M: RawMutex> {
    registers: Mutex<M, RefCell<ControllerSnapshot>>,
}

impl<M: RawMutex> SharedControllerState<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registers: Mutex::new(RefCell::new(ControllerSnapshot::IDLE)),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut ControllerSnapshot) -> R) -> R {
        self.registers.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Accumulate one mouse report.
    ///
    /// Switching from another protocol starts from zero motion.
    pub fn apply_mouse_delta(&self, dx: i8, dy: i8, left: bool, right: bool) {
        self.update(|regs| {
            if regs.protocol != Protocol::Mouse {
                regs.restart(Protocol::Mouse);
            }
            regs.dx = regs.dx.saturating_add(dx);
            regs.dy = regs.dy.saturating_add(dy);
            regs.left.record(left);
            regs.right.record(right);
            regs.protocol = Protocol::Mouse;
            regs.overflow = false;
        });
    }

    /// Store one keyboard report.
    ///
    /// `None` marks an undecodable report: the previous pad buttons stay in
    /// place and the overflow flag is raised.
    pub fn apply_keyboard_state(&self, decoded: Option<PadButtons>) {
        self.update(|regs| {
            if regs.protocol != Protocol::Keyboard {
                regs.restart(Protocol::Keyboard);
            }
            regs.reset_pointer();
            if let Some(pad) = decoded {
                regs.pad = pad;
            }
            regs.overflow = decoded.is_none();
        });
    }

    /// Copy the registers for one console poll and clear the motion.
    ///
    /// Buttons and the pad mask are kept. Press/release edges restart from
    /// the current held state.
    pub fn take_snapshot_and_clear_motion(&self) -> ControllerSnapshot {
        self.update(|regs| {
            let snapshot = *regs;
            regs.dx = 0;
            regs.dy = 0;
            regs.left.rearm();
            regs.right.rearm();
            snapshot
        })
    }

    /// Make `protocol` active ahead of its first report.
    pub fn select_protocol(&self, protocol: Protocol) {
        self.update(|regs| {
            if regs.protocol != protocol {
                regs.restart(protocol);
            }
        });
    }

    /// The device feeding `protocol` went away.
    ///
    /// Motion, buttons and pad state are dropped, and a new session starts so
    /// the bus side discards pointer data it still holds.
    pub fn detach(&self, protocol: Protocol) {
        self.update(|regs| {
            if regs.protocol == protocol {
                regs.restart(Protocol::None);
            }
        });
    }

    /// Copy the registers without clearing anything.
    #[must_use]
    pub fn peek(&self) -> ControllerSnapshot {
        self.update(|regs| *regs)
    }
}

impl<M: RawMutex> Default for SharedControllerState<M> {
    fn default() -> Self {
        Self::new()
    }
}

//! Console controller-port state machine.
//!
//! The console is the bus master. Each transaction starts with Attention
//! pulled low, after which the console clocks bytes LSB first: it changes
//! Command and the peripheral changes Data while Clock is low, and both
//! sides sample on the rising edge. After every byte except the last the
//! peripheral pulses Acknowledge low to ask for the next one.
//!
//! ```text
//! Command:  0x01   0x42   0x00   0x00   0x00   0x00   0x00
//! Data:     --     0x12   0x5A   0xFF   btns   dx     dy      (mouse)
//! Data:     --     0x41   0x5A   lo     hi                     (digital pad)
//! ```
//!
//! [`PsxBus::poll`] reads the lines once and handles at most one edge, so
//! the caller runs it in a tight loop. Data and Acknowledge are open drain:
//! a line is driven low by switching it to output with a low latch and
//! released by switching it back to input.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;

use crate::shared::SharedControllerState;
use crate::types::{ButtonSample, ControllerSnapshot, PadButtons, Protocol};

/// Delay between the last rising clock edge of a byte and releasing Data.
pub const ACK_DELAY_US: u32 = 11;
/// Width of the Acknowledge pulse.
pub const ACK_PULSE_US: u32 = 3;

/// First command byte: controller port addressed.
pub const CMD_ADDRESS: u8 = 0x01;
/// Second command byte: read controller state.
pub const CMD_READ_STATE: u8 = 0x42;

/// Largest reply payload handled.
pub const MAX_PAYLOAD: usize = 10;

const MOUSE_ID: u8 = 0x12;
const DIGITAL_PAD_ID: u8 = 0x41;
const DATA_START: u8 = 0x5A;

/// The five controller-port signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Console to peripheral, active low.
    Attention,
    /// Console to peripheral.
    Clock,
    /// Console to peripheral.
    Command,
    /// Peripheral to console, open drain.
    Data,
    /// Peripheral to console, open drain, active low.
    Acknowledge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// GPIO access for the bus lines.
///
/// Implementations must keep the output latch of Data and Acknowledge low,
/// so that switching to [`Direction::Output`] pulls the line low.
pub trait BusLines {
    /// Current level of a line, `true` for high.
    fn read_line(&mut self, line: Line) -> bool;

    fn set_direction(&mut self, line: Line, direction: Direction);

    #[inline]
    fn drive_low(&mut self, line: Line) {
        self.set_direction(line, Direction::Output);
    }

    /// Let the pull-up take the line high.
    #[inline]
    fn release(&mut self, line: Line) {
        self.set_direction(line, Direction::Input);
    }
}

/// State machine position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Attention high, waiting for a transaction.
    Idle,
    /// Attention just went low.
    AttentionAsserted,
    /// Waiting for the falling clock edge of the next bit.
    ClockHigh,
    /// Waiting for the rising clock edge of the current bit.
    ClockLow,
    /// Not taking part; waiting for Attention to go high.
    Draining,
}

/// Why a transaction ended without a full reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    /// First byte did not address the controller.
    UnsupportedCommand(u8),
    /// Second byte was not a read-state command.
    BadHandshake(u8),
    /// Attention went high mid-transaction.
    AttentionReleased { byte: u8, bit: u8 },
}

/// Outcome reported by [`PsxBus::poll`] when a transaction ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// The whole reply was shifted out.
    Completed(Protocol),
    Aborted(AbortReason),
}

/// Mouse data taken from the shared state for one reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PointerReport {
    dx: i8,
    dy: i8,
    left: ButtonSample,
    right: ButtonSample,
}

impl PointerReport {
    fn from_snapshot(snapshot: &ControllerSnapshot) -> Self {
        Self {
            dx: snapshot.dx,
            dy: snapshot.dy,
            left: snapshot.left,
            right: snapshot.right,
        }
    }

    fn merge(self, newer: PointerReport) -> Self {
        Self {
            dx: self.dx.saturating_add(newer.dx),
            dy: self.dy.saturating_add(newer.dy),
            left: self.left.merge(newer.left),
            right: self.right.merge(newer.right),
        }
    }
}

/// Mouse reply in flight, committed only once fully sent.
#[derive(Clone, Copy, Debug)]
struct PointerReply {
    report: PointerReport,
    left: bool,
    right: bool,
}

/// Working registers of one transaction.
#[derive(Clone, Copy, Debug)]
struct BusTransaction {
    bit: u8,
    byte: u8,
    /// The two header bytes received from the console.
    command: [u8; 2],
    payload: [u8; MAX_PAYLOAD],
    len: u8,
    protocol: Protocol,
    pointer: Option<PointerReply>,
}

impl BusTransaction {
    const EMPTY: Self = Self {
        bit: 0,
        byte: 0,
        command: [0; 2],
        payload: [0; MAX_PAYLOAD],
        len: 0,
        protocol: Protocol::None,
        pointer: None,
    };

    fn set_payload(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(MAX_PAYLOAD);
        self.payload[..len].copy_from_slice(&bytes[..len]);
        self.len = len as u8;
    }

    /// Payload byte shifted out while console byte `byte` comes in.
    fn outgoing(&self) -> Option<u8> {
        let index = usize::from(self.byte).checked_sub(1)?;
        self.payload[..usize::from(self.len)].get(index).copied()
    }
}

/// Controller-port peripheral.
pub struct PsxBus {
    state: BusState,
    txn: BusTransaction,
    /// Mouse data of an aborted reply, resent with the next one.
    carry: Option<PointerReport>,
    /// Buttons of the last completed mouse reply: left, right.
    reported: (bool, bool),
    /// Register session the carry and `reported` belong to.
    session: u8,
}

impl PsxBus {
    /// Starts in [`BusState::Draining`] so a transaction already under way
    /// at power-on is ignored.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: BusState::Draining,
            txn: BusTransaction::EMPTY,
            carry: None,
            reported: (false, false),
            session: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> BusState {
        self.state
    }

    /// Put every line into input mode.
    pub fn reset<L: BusLines>(&mut self, lines: &mut L) {
        for line in [
            Line::Attention,
            Line::Clock,
            Line::Command,
            Line::Data,
            Line::Acknowledge,
        ] {
            lines.release(line);
        }
        self.state = BusState::Draining;
        self.txn = BusTransaction::EMPTY;
    }

    /// Sample the lines once and advance by at most one edge.
    pub fn poll<L, D, M>(
        &mut self,
        lines: &mut L,
        delay: &mut D,
        shared: &SharedControllerState<M>,
    ) -> Option<BusEvent>
    where
        L: BusLines,
        D: DelayNs,
        M: RawMutex,
    {
        let attention = !lines.read_line(Line::Attention);

        match self.state {
            BusState::Idle => {
                if attention {
                    self.txn = BusTransaction::EMPTY;
                    lines.release(Line::Data);
                    lines.release(Line::Acknowledge);
                    self.state = BusState::AttentionAsserted;
                }
                None
            }
            BusState::Draining => {
                if !attention {
                    self.state = BusState::Idle;
                }
                None
            }
            _ if !attention => {
                let reason = AbortReason::AttentionReleased {
                    byte: self.txn.byte,
                    bit: self.txn.bit,
                };
                self.abort(lines);
                self.state = BusState::Idle;
                Some(BusEvent::Aborted(reason))
            }
            BusState::AttentionAsserted => {
                self.state = BusState::ClockHigh;
                None
            }
            BusState::ClockHigh => {
                if !lines.read_line(Line::Clock) {
                    self.state = BusState::ClockLow;
                    self.drive_bit(lines);
                }
                None
            }
            BusState::ClockLow => {
                if lines.read_line(Line::Clock) {
                    self.state = BusState::ClockHigh;
                    return self.sample_bit(lines, delay, shared);
                }
                None
            }
        }
    }

    fn drive_bit<L: BusLines>(&mut self, lines: &mut L) {
        if let Some(byte) = self.txn.outgoing() {
            if byte & (1 << self.txn.bit) != 0 {
                lines.release(Line::Data);
            } else {
                lines.drive_low(Line::Data);
            }
        }
    }

    fn sample_bit<L, D, M>(
        &mut self,
        lines: &mut L,
        delay: &mut D,
        shared: &SharedControllerState<M>,
    ) -> Option<BusEvent>
    where
        L: BusLines,
        D: DelayNs,
        M: RawMutex,
    {
        let byte = usize::from(self.txn.byte);
        if lines.read_line(Line::Command) {
            // Only the header is kept; later command bytes carry nothing we use.
            if let Some(slot) = self.txn.command.get_mut(byte) {
                *slot |= 1 << self.txn.bit;
            }
        }
        self.txn.bit += 1;
        if self.txn.bit < 8 {
            return None;
        }

        match (byte, self.txn.command.get(byte).copied()) {
            (0, Some(CMD_ADDRESS)) => self.build_reply(shared.take_snapshot_and_clear_motion()),
            (0, Some(other)) => {
                return Some(self.fail(lines, AbortReason::UnsupportedCommand(other)));
            }
            (1, Some(other)) if other != CMD_READ_STATE => {
                return Some(self.fail(lines, AbortReason::BadHandshake(other)));
            }
            _ => {}
        }

        delay.delay_us(ACK_DELAY_US);
        lines.release(Line::Data);
        if self.txn.byte < self.txn.len {
            lines.drive_low(Line::Acknowledge);
            delay.delay_us(ACK_PULSE_US);
            lines.release(Line::Acknowledge);
        }

        self.txn.byte += 1;
        self.txn.bit = 0;

        if self.txn.byte > self.txn.len {
            self.complete();
            return Some(BusEvent::Completed(self.txn.protocol));
        }
        None
    }

    fn build_reply(&mut self, snapshot: ControllerSnapshot) {
        self.txn.protocol = snapshot.protocol;
        if snapshot.session != self.session {
            self.session = snapshot.session;
            self.carry = None;
            self.reported = (false, false);
        }
        match snapshot.protocol {
            Protocol::Mouse => {
                let mut report = PointerReport::from_snapshot(&snapshot);
                if let Some(carry) = self.carry.take() {
                    report = carry.merge(report);
                }
                let left = report.left.resolve(self.reported.0);
                let right = report.right.resolve(self.reported.1);

                let mut buttons = 0x03;
                if right {
                    buttons |= 0x04;
                }
                if left {
                    buttons |= 0x08;
                }
                self.txn.set_payload(&[
                    MOUSE_ID,
                    DATA_START,
                    0xFF,
                    !buttons,
                    report.dx as u8,
                    report.dy as u8,
                ]);
                self.txn.pointer = Some(PointerReply {
                    report,
                    left,
                    right,
                });
            }
            Protocol::Keyboard => {
                self.carry = None;
                let [lo, hi] = snapshot.pad.to_wire();
                self.txn.set_payload(&[DIGITAL_PAD_ID, DATA_START, lo, hi]);
            }
            Protocol::None => {
                self.carry = None;
                let [lo, hi] = PadButtons::NONE.to_wire();
                self.txn.set_payload(&[DIGITAL_PAD_ID, DATA_START, lo, hi]);
            }
        }
    }

    fn complete(&mut self) {
        if let Some(reply) = self.txn.pointer.take() {
            self.reported = (reply.left, reply.right);
        }
        self.state = BusState::Draining;
    }

    fn fail<L: BusLines>(&mut self, lines: &mut L, reason: AbortReason) -> BusEvent {
        self.abort(lines);
        self.state = BusState::Draining;
        BusEvent::Aborted(reason)
    }

    /// Release the outputs and keep any unsent mouse data for the next reply.
    fn abort<L: BusLines>(&mut self, lines: &mut L) {
        lines.release(Line::Data);
        lines.release(Line::Acknowledge);
        if let Some(reply) = self.txn.pointer.take() {
            self.carry = Some(reply.report);
        }
    }
}

impl Default for PsxBus {
    fn default() -> Self {
        Self::new()
    }
}

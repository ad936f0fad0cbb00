//! Host link: USB host events carried over a UART line protocol.
//!
//! The USB host stack runs on a companion controller that forwards its
//! callbacks as ASCII lines. Each line is framed as
//! `<prefix><payload>*<checksum>\n` where the checksum is CRC-8/SMBUS of the
//! payload bytes, written as two hex digits.
//!
//! ```text
//! A<addr>:<inst>:<class>:<descriptor hex>*CC   device attached
//! R<addr>:<inst>:<report hex>*CC               report received
//! D<addr>:<inst>*CC                            device detached
//! N<addr>:<inst>*CC                            request next report (outgoing)
//! ```
//!
//! `addr` and `inst` are two hex digits, `class` is the HID interface
//! protocol as one digit (0 none, 1 keyboard, 2 mouse).

use crc::{Crc, CRC_8_SMBUS};
use heapless::Vec;

use crate::host::{HidEventSink, HidProtocolClass, HostError};

/// Longest accepted line, without the newline.
pub const MAX_LINE_LENGTH: usize = 600;
/// Largest descriptor or report carried by one line.
pub const MAX_PAYLOAD_LENGTH: usize = 256;
/// Length of an encoded request line, newline included.
pub const REQUEST_LENGTH: usize = 10;

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Host link errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Malformed line.
    Parse,
    /// Checksum mismatch.
    Checksum,
    /// Line longer than [`MAX_LINE_LENGTH`] or a receive overrun; the line
    /// was discarded.
    Overflow,
    /// UART framing error.
    Framing,
    /// Other transport error.
    Io,
}

/// One USB host callback received over the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostEvent<'a> {
    Attached {
        address: u8,
        instance: u8,
        class: HidProtocolClass,
        descriptor: &'a [u8],
    },
    Report {
        address: u8,
        instance: u8,
        report: &'a [u8],
    },
    Detached {
        address: u8,
        instance: u8,
    },
}

impl HostEvent<'_> {
    /// Forward the event to the matching sink callback.
    pub fn dispatch<S: HidEventSink>(&self, sink: &mut S) -> Result<(), HostError> {
        match *self {
            HostEvent::Attached {
                address,
                instance,
                class,
                descriptor,
            } => sink.on_device_attached(address, instance, class, descriptor),
            HostEvent::Report {
                address,
                instance,
                report,
            } => sink.on_report_received(address, instance, report),
            HostEvent::Detached { address, instance } => {
                sink.on_device_detached(address, instance)
            }
        }
    }
}

/// CRC-8/SMBUS of a line payload.
#[inline]
#[must_use]
pub fn checksum(payload: &[u8]) -> u8 {
    CRC8.checksum(payload)
}

/// Parse one line (line ending optional).
///
/// Hex data is decoded into `scratch`, which the returned event borrows.
pub fn parse_event<'a>(
    line: &[u8],
    scratch: &'a mut [u8; MAX_PAYLOAD_LENGTH],
) -> Result<HostEvent<'a>, LinkError> {
    let line = strip_line_ending(line);
    let (&prefix, _) = line.split_first().ok_or(LinkError::Parse)?;
    let payload = verified_payload(line)?;

    let mut fields = payload.split(|&b| b == b':');
    let address = parse_hex_u8(fields.next().ok_or(LinkError::Parse)?)?;
    let instance = parse_hex_u8(fields.next().ok_or(LinkError::Parse)?)?;

    let event = match prefix {
        b'A' => {
            let class = match fields.next().ok_or(LinkError::Parse)? {
                [digit] => HidProtocolClass::from(hex_digit(*digit)?),
                _ => return Err(LinkError::Parse),
            };
            let data = fields.next().ok_or(LinkError::Parse)?;
            HostEvent::Attached {
                address,
                instance,
                class,
                descriptor: decode_hex(data, scratch)?,
            }
        }
        b'R' => {
            let data = fields.next().ok_or(LinkError::Parse)?;
            HostEvent::Report {
                address,
                instance,
                report: decode_hex(data, scratch)?,
            }
        }
        b'D' => HostEvent::Detached { address, instance },
        _ => return Err(LinkError::Parse),
    };

    if fields.next().is_some() {
        return Err(LinkError::Parse);
    }
    Ok(event)
}

/// Encode a request-next-report line.
///
/// ```
/// use psx_core::link::encode_request;
///
/// let line = encode_request(0x01, 0x00);
/// assert!(line.starts_with(b"N01:00*"));
/// assert_eq!(line.last(), Some(&b'\n'));
/// ```
#[must_use]
pub fn encode_request(address: u8, instance: u8) -> [u8; REQUEST_LENGTH] {
    let mut line = [0u8; REQUEST_LENGTH];
    line[0] = b'N';
    write_hex_u8(&mut line[1..3], address);
    line[3] = b':';
    write_hex_u8(&mut line[4..6], instance);
    let crc = checksum(&line[1..6]);
    line[6] = b'*';
    write_hex_u8(&mut line[7..9], crc);
    line[9] = b'\n';
    line
}

/// Incremental line decoder for bytes arriving from the UART.
///
/// Overlong lines are dropped up to the next newline and reported once as
/// [`LinkError::Overflow`].
pub struct LinkDecoder {
    line: Vec<u8, MAX_LINE_LENGTH>,
    scratch: [u8; MAX_PAYLOAD_LENGTH],
    discarding: bool,
    overflowed: bool,
    complete: bool,
}

impl LinkDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            scratch: [0; MAX_PAYLOAD_LENGTH],
            discarding: false,
            overflowed: false,
            complete: false,
        }
    }

    /// Feed one byte. Returns `true` when a non-empty line has ended and
    /// [`LinkDecoder::event`] has something to decode.
    pub fn accept(&mut self, byte: u8) -> bool {
        if self.complete {
            self.line.clear();
            self.complete = false;
            self.overflowed = false;
        }

        match byte {
            b'\n' => {
                self.complete = true;
                self.overflowed = core::mem::take(&mut self.discarding);
                self.overflowed || !strip_line_ending(&self.line).is_empty()
            }
            _ if self.discarding => false,
            _ => {
                if self.line.push(byte).is_err() {
                    self.discarding = true;
                }
                false
            }
        }
    }

    /// Decode the line completed by the last [`LinkDecoder::accept`].
    pub fn event(&mut self) -> Result<HostEvent<'_>, LinkError> {
        if self.overflowed {
            return Err(LinkError::Overflow);
        }
        parse_event(&self.line, &mut self.scratch)
    }

    /// [`LinkDecoder::accept`] followed by [`LinkDecoder::event`] once a
    /// line is complete.
    pub fn push_byte(&mut self, byte: u8) -> Option<Result<HostEvent<'_>, LinkError>> {
        if self.accept(byte) {
            Some(self.event())
        } else {
            None
        }
    }
}

impl Default for LinkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Check the trailing `*CC` and return the bytes between prefix and `*`.
fn verified_payload(line: &[u8]) -> Result<&[u8], LinkError> {
    let star = line
        .iter()
        .rposition(|&b| b == b'*')
        .ok_or(LinkError::Parse)?;
    if star == 0 {
        return Err(LinkError::Parse);
    }

    let payload = &line[1..star];
    let received = parse_hex_u8(&line[star + 1..])?;
    if checksum(payload) != received {
        return Err(LinkError::Checksum);
    }
    Ok(payload)
}

fn decode_hex<'a>(
    hex: &[u8],
    scratch: &'a mut [u8; MAX_PAYLOAD_LENGTH],
) -> Result<&'a [u8], LinkError> {
    if hex.len() % 2 != 0 || hex.len() / 2 > MAX_PAYLOAD_LENGTH {
        return Err(LinkError::Parse);
    }
    let len = hex.len() / 2;
    for (out, pair) in scratch.iter_mut().zip(hex.chunks_exact(2)) {
        *out = parse_hex_u8(pair)?;
    }
    Ok(&scratch[..len])
}

#[inline]
fn parse_hex_u8(s: &[u8]) -> Result<u8, LinkError> {
    match s {
        [high, low] => Ok((hex_digit(*high)? << 4) | hex_digit(*low)?),
        _ => Err(LinkError::Parse),
    }
}

#[inline]
fn hex_digit(b: u8) -> Result<u8, LinkError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(LinkError::Parse),
    }
}

#[inline]
fn write_hex_u8(buf: &mut [u8], value: u8) {
    buf[0] = HEX_DIGITS[usize::from(value >> 4)];
    buf[1] = HEX_DIGITS[usize::from(value & 0xF)];
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;
    use std::string::String;
    use std::vec::Vec as StdVec;

    fn frame(prefix: char, payload: &str) -> StdVec<u8> {
        let crc = checksum(payload.as_bytes());
        format!("{prefix}{payload}*{crc:02X}\n").into_bytes()
    }

    fn parse(line: &[u8]) -> Result<HostEvent<'static>, LinkError> {
        let scratch = std::boxed::Box::leak(std::boxed::Box::new([0u8; MAX_PAYLOAD_LENGTH]));
        parse_event(line, scratch)
    }

    #[test]
    fn test_parse_attach() {
        let line = frame('A', "01:00:2:05010902A101C0");
        assert_eq!(
            parse(&line),
            Ok(HostEvent::Attached {
                address: 1,
                instance: 0,
                class: HidProtocolClass::Mouse,
                descriptor: &[0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0xC0],
            })
        );
    }

    #[test]
    fn test_parse_report_and_detach() {
        let line = frame('R', "1F:02:0105fb");
        assert_eq!(
            parse(&line),
            Ok(HostEvent::Report {
                address: 0x1F,
                instance: 2,
                report: &[0x01, 0x05, 0xFB],
            })
        );

        let line = frame('D', "1F:02");
        assert_eq!(
            parse(&line),
            Ok(HostEvent::Detached {
                address: 0x1F,
                instance: 2
            })
        );
    }

    #[test]
    fn test_bad_checksum() {
        let mut line = frame('D', "01:00");
        let len = line.len();
        line[len - 2] = if line[len - 2] == b'0' { b'1' } else { b'0' };
        assert_eq!(parse(&line), Err(LinkError::Checksum));
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(parse(&frame('X', "01:00")), Err(LinkError::Parse));
        assert_eq!(parse(&frame('R', "01:00:123")), Err(LinkError::Parse));
        assert_eq!(parse(&frame('A', "01:00:12:00")), Err(LinkError::Parse));
        assert_eq!(parse(&frame('D', "01:00:00")), Err(LinkError::Parse));
        assert_eq!(parse(&frame('D', "01")), Err(LinkError::Parse));
        assert_eq!(parse(b"D01:00"), Err(LinkError::Parse));
        assert_eq!(parse(b"*00"), Err(LinkError::Parse));

        let long: String = "00".repeat(MAX_PAYLOAD_LENGTH + 1);
        assert_eq!(parse(&frame('R', &format!("01:00:{long}"))), Err(LinkError::Parse));
    }

    #[test]
    fn test_request_round_trip() {
        let line = encode_request(0xAB, 0x03);
        assert_eq!(&line[..7], b"NAB:03*");
        let crc = checksum(b"AB:03");
        assert_eq!(parse_hex_u8(&line[7..9]), Ok(crc));
    }

    #[test]
    fn test_decoder_lines() {
        let mut decoder = LinkDecoder::new();
        let mut events = 0;
        let mut input = frame('D', "02:00");
        input.extend_from_slice(b"\r\n\n");
        input.extend_from_slice(&frame('R', "02:00:00"));

        for byte in input {
            if let Some(result) = decoder.push_byte(byte) {
                assert!(result.is_ok());
                events += 1;
            }
        }
        assert_eq!(events, 2);
    }

    #[test]
    fn test_decoder_overflow_recovers() {
        let mut decoder = LinkDecoder::new();
        let mut results = StdVec::new();
        let mut input = StdVec::from([b'R'; MAX_LINE_LENGTH + 10]);
        input.push(b'\n');
        input.extend_from_slice(&frame('D', "05:01"));

        for byte in input {
            if let Some(result) = decoder.push_byte(byte) {
                results.push(result.map(|_| ()));
            }
        }
        assert_eq!(results, [Err(LinkError::Overflow), Ok(())]);
    }
}

//! UART link to the companion USB host controller.
//!
//! Host events arrive as checksummed lines on UART1 RX; report requests go
//! out on UART1 TX. See [`psx_core::link`] for the line format.

use defmt::warn;
use embassy_rp::uart::{Async, Error as UartError, UartRx, UartTx};
use psx_core::link::{encode_request, LinkDecoder};
use psx_core::{HostEvent, LinkError, ReportRequester};

/// Convert UART errors to [`LinkError`].
///
/// A helper instead of a `From` impl: both types live in other crates.
#[inline]
fn uart_error_to_link_error(e: UartError) -> LinkError {
    match e {
        UartError::Framing => LinkError::Framing,
        UartError::Overrun => LinkError::Overflow,
        _ => LinkError::Io,
    }
}

/// Receiving half of the host link.
pub struct UartHostLink<'d> {
    rx: UartRx<'d, Async>,
    decoder: LinkDecoder,
}

impl<'d> UartHostLink<'d> {
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>) -> Self {
        Self {
            rx,
            decoder: LinkDecoder::new(),
        }
    }

    /// Wait for the next complete line and decode it.
    pub async fn next_event(&mut self) -> Result<HostEvent<'_>, LinkError> {
        let mut byte = [0u8; 1];
        loop {
            self.rx
                .read(&mut byte)
                .await
                .map_err(uart_error_to_link_error)?;
            if self.decoder.accept(byte[0]) {
                break;
            }
        }
        self.decoder.event()
    }
}

/// Sending half of the host link.
pub struct UartReportRequester<'d> {
    tx: UartTx<'d, Async>,
}

impl<'d> UartReportRequester<'d> {
    #[must_use]
    pub fn new(tx: UartTx<'d, Async>) -> Self {
        Self { tx }
    }
}

impl ReportRequester for UartReportRequester<'_> {
    fn request_next_report(&mut self, address: u8, instance: u8) {
        if let Err(e) = self.tx.blocking_write(&encode_request(address, instance)) {
            warn!("Report request for {}:{} failed: {:?}", address, instance, e);
        }
    }
}

//! Board configuration.
//!
//! | Function     | GPIO | Direction |
//! |--------------|------|-----------|
//! | UART1 TX     | 8    | report requests to the USB host controller |
//! | UART1 RX     | 9    | host events from the USB host controller |
//! | Attention    | 7    | in, active low |
//! | Clock        | 10   | in |
//! | Data         | 11   | open drain |
//! | Command      | 14   | in |
//! | Acknowledge  | 15   | open drain, active low |
//! | LED          | 25   | on-board status LED |

use embassy_time::Duration;

/// Baud rate of the host link.
pub const HOST_LINK_BAUD: u32 = 115_200;

/// Status LED refresh period.
pub const STATUS_TICK: Duration = Duration::from_millis(50);

/// Stack of the core running the console bus.
pub const BUS_CORE_STACK_SIZE: usize = 4096;

//! # LinkCart Protocol
//!
//! Builds the 64KB cartridge image from up to two ROMs and streams it to the
//! MSX LinkCart over a serial link.
//!
//! ## Image Layout
//!
//! | Slot | First 16KB | Remaining 16KB |
//! |------|------------|----------------|
//! | 1    | 0x4000     | 0x0000         |
//! | 2    | 0xC000     | 0x8000         |
//!
//! Bytes not covered by a ROM are 0xFF.
//!
//! ## Wire Protocol
//!
//! No framing or length prefixes. Message boundaries come from the fixed
//! step order:
//!
//! | Step | Host sends | Device replies |
//! |------|------------|----------------|
//! | 1 | `W` | `W` |
//! | 2 | slot 1 name (1-28 bytes UTF-8) | `W` |
//! | 3 | slot 2 name (1-28 bytes UTF-8) | `W` |
//! | 4 | 2048 x 32-byte image chunks | `N` after each chunk |
//!
//! The link runs at 115200 baud. The first bad reply ends the session.

mod error;
mod image;
#[cfg(test)]
mod mock;
mod response;
mod rom;
pub mod session;
pub mod transport;

pub use error::{RomError, TransferError};
pub use image::{RomImage, CHUNK_COUNT, CHUNK_SIZE, FILL_BYTE, IMAGE_SIZE};
pub use response::{check_response, Verdict, CHUNK_ACK, READY};
pub use rom::{
    RomName, RomSlot, Slot, HALF_SIZE, MAX_DISPLAY_NAME_CHARS, MAX_WIRE_NAME_LEN, SLOT_SIZE,
};
pub use session::{
    Progress, State, Step, Timing, TransferJob, TransferReport, TransferSession,
    MAX_RESPONSE_TIMEOUT,
};
pub use transport::Transport;

/// Fixed serial baud rate of the cartridge
pub const BAUD_RATE: u32 = 115_200;

/// Format bytes as hex string for trace output
pub fn fmt_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

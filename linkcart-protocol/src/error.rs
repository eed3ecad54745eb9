//! Error types for ROM loading and transfer sessions.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::Step;

/// Errors raised while preparing ROM inputs, before any session starts
#[derive(Debug, Error)]
pub enum RomError {
    /// Source ROM is larger than one slot
    #[error("ROM is {len} bytes, a slot holds at most {max} bytes")]
    InputTooLarge { len: u64, max: usize },

    /// ROM file could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Session-level failure. The first one raised ends the transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Serial port could not be opened
    #[error("cannot open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// Handshake or name step got something other than the ready byte
    #[error(
        "{step}: expected {:?}, device replied {:?}",
        byte_char(.expected),
        byte_char(.received)
    )]
    HandshakeMismatch { step: Step, expected: u8, received: u8 },

    /// Image chunk was not acknowledged
    #[error(
        "chunk {chunk}: expected {:?}, device replied {:?}",
        byte_char(.expected),
        byte_char(.received)
    )]
    ChunkAckMismatch {
        chunk: usize,
        expected: u8,
        received: u8,
    },

    /// Device did not reply within the response timeout
    #[error("{step}: no reply within {waited:?}")]
    Timeout { step: Step, waited: Duration },

    /// Read, write or flush failed on the transport
    #[error("transport fault: {0}")]
    Io(#[from] std::io::Error),
}

fn byte_char(b: &u8) -> char {
    char::from(*b)
}

impl TransferError {
    /// Step the session was on when it failed, if known
    pub fn step(&self) -> Option<Step> {
        match self {
            TransferError::HandshakeMismatch { step, .. } => Some(*step),
            TransferError::ChunkAckMismatch { chunk, .. } => Some(Step::Chunk(*chunk)),
            TransferError::Timeout { step, .. } => Some(*step),
            TransferError::Open { .. } | TransferError::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::Slot;

    #[test]
    fn test_mismatch_message_shows_bytes_as_chars() {
        let err = TransferError::HandshakeMismatch {
            step: Step::Name(Slot::Second),
            expected: b'W',
            received: b'?',
        };
        assert_eq!(err.to_string(), "slot 2 name: expected 'W', device replied '?'");
    }

    #[test]
    fn test_step_of_chunk_mismatch() {
        let err = TransferError::ChunkAckMismatch {
            chunk: 17,
            expected: b'N',
            received: b'W',
        };
        assert_eq!(err.step(), Some(Step::Chunk(17)));
        assert_eq!(TransferError::Io(std::io::ErrorKind::BrokenPipe.into()).step(), None);
    }
}

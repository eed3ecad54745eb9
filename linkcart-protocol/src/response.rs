//! Device reply bytes and how they are judged.

/// Device is ready / step accepted
pub const READY: u8 = b'W';

/// Image chunk accepted
pub const CHUNK_ACK: u8 = b'N';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
}

/// Compare a reply against the byte the current step expects.
/// No reply at all is a mismatch.
pub fn check_response(expected: u8, observed: Option<u8>) -> Verdict {
    match observed {
        Some(b) if b == expected => Verdict::Match,
        _ => Verdict::Mismatch,
    }
}

//! Transfer session: handshake, name exchange and chunked image upload.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use crate::image::{RomImage, CHUNK_COUNT};
use crate::response::{check_response, Verdict, CHUNK_ACK, READY};
use crate::rom::{RomName, RomSlot, Slot};
use crate::transport::{Link, Transport};
use crate::{fmt_hex, TransferError};

/// Wait after opening the port before talking to the device
pub const STABILIZE_DELAY: Duration = Duration::from_secs(3);

/// Wait between sending the handshake byte and polling for the reply
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Sleep between polls for a reply byte
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pause after each name field before polling for the reply
pub const NAME_GAP: Duration = Duration::from_millis(100);

/// Give up waiting for a reply after this long
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest reply wait a session will honour
pub const MAX_RESPONSE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Delays used by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub stabilize: Duration,
    pub settle: Duration,
    pub poll_interval: Duration,
    pub name_gap: Duration,
    pub response_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            stabilize: STABILIZE_DELAY,
            settle: SETTLE_DELAY,
            poll_interval: POLL_INTERVAL,
            name_gap: NAME_GAP,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl Timing {
    /// No delays, and a short response timeout
    #[cfg(test)]
    pub(crate) fn immediate() -> Self {
        Timing {
            stabilize: Duration::ZERO,
            settle: Duration::ZERO,
            poll_interval: Duration::ZERO,
            name_gap: Duration::ZERO,
            response_timeout: Duration::from_millis(20),
        }
    }

    /// Set the reply wait, capped at `MAX_RESPONSE_TIMEOUT`
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout.min(MAX_RESPONSE_TIMEOUT);
        self
    }

    fn reply_limit(&self) -> Duration {
        self.response_timeout.min(MAX_RESPONSE_TIMEOUT)
    }
}

/// Protocol step awaiting a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Handshake,
    Name(Slot),
    Chunk(usize),
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Handshake => write!(f, "handshake"),
            Step::Name(slot) => write!(f, "{} name", slot),
            Step::Chunk(i) => write!(f, "chunk {}", i),
        }
    }
}

/// Session state. `Done` and `Failed` are terminal; no state is re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    HandshakeSent,
    Name1Acked,
    Name2Acked,
    ChunkSent(usize),
    ChunkAcked(usize),
    Done,
    Failed,
}

/// Progress notification passed to the caller's callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub state: State,
    pub chunks_acked: usize,
    pub chunks_total: usize,
}

/// What to send: up to two ROMs and the names shown for them
#[derive(Debug, Clone, Default)]
pub struct TransferJob {
    pub slot1: Option<RomSlot>,
    pub slot2: Option<RomSlot>,
    pub name1: RomName,
    pub name2: RomName,
}

impl TransferJob {
    pub fn name(&self, slot: Slot) -> &RomName {
        match slot {
            Slot::First => &self.name1,
            Slot::Second => &self.name2,
        }
    }
}

/// Outcome of a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Every byte written, handshake and names included
    pub bytes_written: usize,
    pub payload_bytes: usize,
    pub chunks_acked: usize,
    pub elapsed: Duration,
}

/// One transfer over one transport.
///
/// `run` consumes the session, so a session can only ever be driven once.
/// The transport is closed when `run` returns, or when the session is
/// dropped without running.
pub struct TransferSession<T: Transport> {
    link: Link<T>,
    timing: Timing,
    bytes_written: usize,
    chunks_acked: usize,
}

impl<T: Transport> TransferSession<T> {
    pub fn new(transport: T, timing: Timing) -> Self {
        TransferSession {
            link: Link::new(transport),
            timing,
            bytes_written: 0,
            chunks_acked: 0,
        }
    }

    /// Run the full protocol, reporting each state change to `progress`
    pub fn run<F>(
        mut self,
        job: &TransferJob,
        mut progress: F,
    ) -> Result<TransferReport, TransferError>
    where
        F: FnMut(Progress),
    {
        let started = Instant::now();
        let result = self.drive(job, &mut progress);

        let end = if result.is_ok() { State::Done } else { State::Failed };
        self.enter(end, &mut progress);
        if let Err(e) = self.link.close() {
            warn!("closing transport failed: {}", e);
        }

        match result {
            Ok(()) => {
                let report = TransferReport {
                    bytes_written: self.bytes_written,
                    payload_bytes: self.chunks_acked * crate::CHUNK_SIZE,
                    chunks_acked: self.chunks_acked,
                    elapsed: started.elapsed(),
                };
                info!(
                    "[LINK] Transfer complete: {} bytes in {:.1}s",
                    report.bytes_written,
                    report.elapsed.as_secs_f32()
                );
                Ok(report)
            }
            Err(e) => {
                info!("[LINK] Transfer aborted: {}", e);
                Err(e)
            }
        }
    }

    fn drive<F: FnMut(Progress)>(
        &mut self,
        job: &TransferJob,
        progress: &mut F,
    ) -> Result<(), TransferError> {
        self.prepare()?;

        debug!("[LINK] -> handshake");
        self.send(&[READY])?;
        self.enter(State::HandshakeSent, progress);
        thread::sleep(self.timing.settle);
        self.expect(READY, Step::Handshake)?;
        info!("[LINK] Device ready");

        let names = [
            (Slot::First, State::Name1Acked),
            (Slot::Second, State::Name2Acked),
        ];
        for (slot, acked) in names {
            let name = job.name(slot);
            debug!("[LINK] -> {} name {:?}", slot, name.as_str());
            self.send(&name.wire_bytes())?;
            self.link.get_mut().flush()?;
            thread::sleep(self.timing.name_gap);
            self.expect(READY, Step::Name(slot))?;
            self.enter(acked, progress);
        }

        let image = RomImage::build(job.slot1.as_ref(), job.slot2.as_ref());
        debug!("[LINK] Built {:?}", image);

        for (i, chunk) in image.chunks().enumerate() {
            self.send(chunk)?;
            self.link.get_mut().flush()?;
            self.enter(State::ChunkSent(i), progress);
            self.expect(CHUNK_ACK, Step::Chunk(i))?;
            self.chunks_acked += 1;
            self.enter(State::ChunkAcked(i), progress);
        }

        Ok(())
    }

    /// Clear both buffers, then give the device's listener time to come up
    fn prepare(&mut self) -> Result<(), TransferError> {
        let transport = self.link.get_mut();
        transport.reset_input()?;
        transport.reset_output()?;
        transport.flush()?;
        debug!(
            "[LINK] Waiting {:?} for the device to settle",
            self.timing.stabilize
        );
        thread::sleep(self.timing.stabilize);
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        trace!("[LINK] -> {}", fmt_hex(bytes));
        self.link.get_mut().write_all(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    fn expect(&mut self, expected: u8, step: Step) -> Result<(), TransferError> {
        let observed = self.wait_for_byte()?;
        if let Some(b) = observed {
            trace!("[LINK] <- {:02X} ({})", b, step);
        }
        match (check_response(expected, observed), observed) {
            (Verdict::Match, _) => Ok(()),
            (Verdict::Mismatch, None) => Err(TransferError::Timeout {
                step,
                waited: self.timing.reply_limit(),
            }),
            (Verdict::Mismatch, Some(received)) => Err(match step {
                Step::Chunk(chunk) => TransferError::ChunkAckMismatch {
                    chunk,
                    expected,
                    received,
                },
                _ => TransferError::HandshakeMismatch {
                    step,
                    expected,
                    received,
                },
            }),
        }
    }

    /// Poll until a byte arrives or the response timeout passes.
    /// `None` means nothing arrived in time.
    fn wait_for_byte(&mut self) -> Result<Option<u8>, TransferError> {
        let limit = self.timing.reply_limit();
        let started = Instant::now();
        let transport = self.link.get_mut();
        loop {
            if transport.bytes_available()? > 0 {
                return Ok(Some(transport.read_byte()?));
            }
            if started.elapsed() >= limit {
                return Ok(None);
            }
            thread::sleep(self.timing.poll_interval);
        }
    }

    fn enter<F: FnMut(Progress)>(&mut self, state: State, progress: &mut F) {
        progress(Progress {
            state,
            chunks_acked: self.chunks_acked,
            chunks_total: CHUNK_COUNT,
        });
    }
}
